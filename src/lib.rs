//! bench-board - Hierarchical benchmark leaderboard engine
//!
//! This library owns the model-vs-benchmark leaderboard: a forest of
//! benchmarks whose parents aggregate their children's scores, one row
//! per submitted model, and the filter controls that carve both down.
//!
//! # Features
//!
//! - Parse the embedded leaderboard payload (rows, benchmark tree,
//!   benchmark metadata)
//! - Recompute aggregate and global scores under an exclusion set
//! - Derive cell colors from each column's score distribution
//! - Reconcile grid column visibility with exclusions and expansion
//! - Round-trip filter state through URL query strings
//! - Export CSV/ZIP archives and static HTML snapshots
//!
//! # Example
//!
//! ```no_run
//! use bench_board::coordinator::{FilterCoordinator, FilterEvent};
//! use bench_board::data::LeaderboardPayload;
//! use std::time::Instant;
//!
//! let payload =
//!     LeaderboardPayload::load_from_file("leaderboard.json".as_ref()).unwrap();
//! let mut coordinator = FilterCoordinator::new(payload).unwrap();
//!
//! coordinator.submit(FilterEvent::Exclude("bench_a".into()), Instant::now());
//! coordinator.flush();
//!
//! for row in &coordinator.view().rows {
//!     println!("{}: {:?}", row.model.name, row.filtered_score);
//! }
//! ```

pub mod aggregate;
pub mod color;
pub mod columns;
pub mod coordinator;
pub mod data;
pub mod error;
pub mod export;
pub mod filters;
pub mod hierarchy;
pub mod html;
pub mod query;
pub mod schedule;

pub use coordinator::{FilterCoordinator, FilterEvent, GridView, Phase};
pub use data::{BenchmarkNode, LeaderboardPayload, ModelRow, ScoreCell};
pub use error::{Error, Result};
pub use filters::FilterState;
pub use hierarchy::HierarchyIndex;
