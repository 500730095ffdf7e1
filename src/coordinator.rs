//! Filter coordination
//!
//! `FilterCoordinator` owns all leaderboard state: the authoritative
//! payload, the hierarchy index, the filter and expansion state, and the
//! rendered view. Filter-control events go through a queue and a
//! debouncer; a drain runs the full pipeline (rebuild exclusions, filter
//! rows, aggregate, recolor, reconcile columns, serialize the URL) and
//! publishes an immutable `GridView`. Nothing here is global and nothing
//! re-enters: events that arrive while a recompute would be in flight
//! simply wait in the queue for the next drain.

use crate::aggregate::recompute_scores;
use crate::color::{affected_columns, recolor};
use crate::columns::{visible_columns, ColumnExpansion, VisibilityContext};
use crate::data::{LeaderboardPayload, ModelRow};
use crate::error::Result;
use crate::filters::FilterState;
use crate::hierarchy::HierarchyIndex;
use crate::query::{from_query_string, to_query_string};
use crate::schedule::Debouncer;
use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;
use tracing::{debug, info};

/// Recompute lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Recomputing,
    Rendered,
}

/// A filter-control event. Events are applied in submission order during
/// a drain; none of them touches shared state directly.
#[derive(Debug, Clone)]
pub enum FilterEvent {
    /// A benchmark checkbox was unchecked
    Exclude(String),
    /// A benchmark checkbox was re-checked
    Include(String),
    /// A dropdown/slider/search control produced a whole new state
    Replace(FilterState),
    /// Reset every filter control
    Reset,
    /// A parent column's expand/collapse toggle was clicked
    ToggleColumn(String),
    /// Expand every parent column
    ExpandAll,
    /// Filter state arrived from the page URL
    UrlLoaded(String),
}

/// The rendered grid: sorted rows (rank is the position), the surviving
/// column set, and the query string encoding the filters that produced it
#[derive(Debug, Clone, Default)]
pub struct GridView {
    pub rows: Vec<ModelRow>,
    pub visible: BTreeSet<String>,
    pub query_string: String,
}

/// Owns the leaderboard and serializes every filter change through one
/// recompute pipeline
#[derive(Debug)]
pub struct FilterCoordinator {
    payload: LeaderboardPayload,
    hierarchy: HierarchyIndex,
    state: FilterState,
    expansion: ColumnExpansion,
    phase: Phase,
    queue: VecDeque<FilterEvent>,
    debounce: Debouncer,
    all_columns: Vec<String>,
    view: GridView,
}

impl FilterCoordinator {
    /// Build the coordinator and render the unfiltered view
    pub fn new(payload: LeaderboardPayload) -> Result<Self> {
        let hierarchy = HierarchyIndex::build(&payload.benchmarks);

        let mut all_columns: Vec<String> = crate::columns::IDENTITY_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        all_columns.push(crate::columns::GLOBAL_SCORE_COLUMN.to_string());
        all_columns.push(crate::columns::FILTERED_SCORE_COLUMN.to_string());
        all_columns.extend(hierarchy.ids_preorder());

        let mut coordinator = Self {
            payload,
            hierarchy,
            state: FilterState::default(),
            expansion: ColumnExpansion::new(),
            phase: Phase::Idle,
            queue: VecDeque::new(),
            debounce: Debouncer::default(),
            all_columns,
            view: GridView::default(),
        };
        coordinator.recompute();
        Ok(coordinator)
    }

    pub fn view(&self) -> &GridView {
        &self.view
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn hierarchy(&self) -> &HierarchyIndex {
        &self.hierarchy
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Queue an event and (re)arm the debouncer
    pub fn submit(&mut self, event: FilterEvent, now: Instant) {
        self.queue.push_back(event);
        self.debounce.trigger(now);
    }

    /// Drive the debouncer; drains the queue when the quiet window has
    /// elapsed. Returns whether a recompute ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.debounce.poll(now) {
            self.drain();
            return true;
        }
        false
    }

    /// Apply everything queued immediately, bypassing the debounce window
    pub fn flush(&mut self) {
        self.debounce.cancel();
        if !self.queue.is_empty() {
            self.drain();
        }
    }

    fn drain(&mut self) {
        while let Some(event) = self.queue.pop_front() {
            self.apply(event);
        }
        self.recompute();
    }

    fn apply(&mut self, event: FilterEvent) {
        match event {
            FilterEvent::Exclude(id) => {
                self.state.excluded_benchmarks.insert(id);
            }
            FilterEvent::Include(id) => {
                self.state.excluded_benchmarks.remove(&id);
            }
            FilterEvent::Replace(state) => self.state = state,
            FilterEvent::Reset => self.state = FilterState::default(),
            FilterEvent::ToggleColumn(id) => self.expansion.toggle(&id),
            FilterEvent::ExpandAll => self.expansion.expand_all(&self.hierarchy),
            FilterEvent::UrlLoaded(query) => self.state = from_query_string(&query),
        }
    }

    /// The full pipeline, run synchronously on every drain
    fn recompute(&mut self) {
        self.phase = Phase::Recomputing;

        let excluded = self
            .state
            .exclusion_set(&self.hierarchy, &self.payload.benchmark_metadata);
        debug!(
            excluded = excluded.len(),
            touched = affected_columns(&self.hierarchy, &excluded).len(),
            "rebuilt exclusion set"
        );

        let surviving: Vec<ModelRow> = self
            .payload
            .rows
            .iter()
            .filter(|row| self.state.matches_row(row))
            .cloned()
            .collect();

        let mut rows = recompute_scores(&surviving, &self.hierarchy, &excluded);
        rows.sort_by(|a, b| {
            let a_score = a.effective_score();
            let b_score = b.effective_score();
            b_score
                .partial_cmp(&a_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.model.name.cmp(&b.model.name))
        });

        recolor(&mut rows, &self.hierarchy);

        let ctx = VisibilityContext {
            hierarchy: &self.hierarchy,
            excluded: &excluded,
            expansion: &self.expansion,
            rows: &rows,
            wayback_active: self.state.wayback_active(),
        };
        let visible = visible_columns(&self.all_columns, &ctx);

        self.view = GridView {
            rows,
            visible,
            query_string: to_query_string(&self.state),
        };
        self.phase = Phase::Rendered;

        info!(
            rows = self.view.rows.len(),
            columns = self.view.visible.len(),
            "leaderboard view rendered"
        );
        self.phase = Phase::Idle;
    }
}
