//! Data structures for the leaderboard payload
//!
//! The payload mirrors what the server embeds in the page: a forest of
//! benchmarks, one row per submitted model, and per-benchmark metadata.
//! Rows loaded here are the authoritative copy; recomputation always
//! works on clones and never writes back into them.

use crate::color::Rgba;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use tracing::warn;

/// A node in the benchmark forest. Leaves (empty `children`) are the only
/// nodes carrying raw measured scores; parents aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkNode {
    /// Benchmark identifier, unique across the forest
    pub id: String,
    /// Display label
    pub label: String,
    /// Child benchmarks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BenchmarkNode>,
}

impl BenchmarkNode {
    /// Convenience constructor for a leaf
    pub fn leaf(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            children: Vec::new(),
        }
    }

    /// Convenience constructor for a parent
    pub fn parent(id: &str, label: &str, children: Vec<BenchmarkNode>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            children,
        }
    }
}

/// A single score cell: either a measured/aggregated value with an
/// optional fill color, or missing (the `"X"` sentinel of the payload,
/// distinct from zero).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScoreCell {
    #[default]
    Missing,
    Scored { value: f64, color: Option<Rgba> },
}

impl ScoreCell {
    pub fn scored(value: f64) -> Self {
        Self::Scored { value, color: None }
    }

    /// The numeric value, `None` when missing
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Missing => None,
            Self::Scored { value, .. } => Some(*value),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn color(&self) -> Option<Rgba> {
        match self {
            Self::Missing => None,
            Self::Scored { color, .. } => *color,
        }
    }

    /// Attach a fill color; a no-op on missing cells
    pub fn set_color(&mut self, new: Rgba) {
        if let Self::Scored { color, .. } = self {
            *color = Some(new);
        }
    }
}

impl Serialize for ScoreCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::Missing => map.serialize_entry("value", "X")?,
            Self::Scored { value, color } => {
                map.serialize_entry("value", value)?;
                if let Some(color) = color {
                    map.serialize_entry("color", color)?;
                }
            }
        }
        map.end()
    }
}

/// Accepted payload shapes: a bare number, the `"X"` sentinel string, or a
/// `{value, color}` object
#[derive(Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Number(f64),
    Text(String),
    Object {
        value: CellValueRepr,
        #[serde(default)]
        color: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CellValueRepr {
    Number(f64),
    Text(String),
}

fn cell_from_text(text: &str) -> ScoreCell {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("x") {
        return ScoreCell::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(v) => ScoreCell::scored(v),
        Err(_) => ScoreCell::Missing,
    }
}

impl<'de> Deserialize<'de> for ScoreCell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = CellRepr::deserialize(deserializer)?;
        Ok(match repr {
            CellRepr::Number(v) => ScoreCell::scored(v),
            CellRepr::Text(s) => cell_from_text(&s),
            CellRepr::Object { value, color } => {
                let mut cell = match value {
                    CellValueRepr::Number(v) => ScoreCell::scored(v),
                    CellValueRepr::Text(s) => cell_from_text(&s),
                };
                if let Some(css) = color {
                    match Rgba::parse_css(&css) {
                        Some(rgba) => cell.set_color(rgba),
                        None => warn!(color = %css, "ignoring unparseable cell color"),
                    }
                }
                cell
            }
        })
    }
}

/// Identity of a submitted model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: u64,
    pub name: String,
    pub submitter: String,
}

/// Model-level metadata used by the property filters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_dataset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_specialization: Option<String>,
    /// Trainable parameters, in millions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_count: Option<f64>,
    /// On-disk size in megabytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_size_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runnable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted: Option<DateTime<Utc>>,
}

/// Per-benchmark metadata used by the benchmark filters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BenchmarkMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Whether the benchmark's stimuli are publicly available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_data: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stimuli_count: Option<u64>,
    /// When the benchmark first appeared on the leaderboard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,
}

/// One leaderboard row per submitted model. `scores` is keyed by
/// benchmark ID; `filtered_score` is written by the aggregator and never
/// present in the server payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelRow {
    pub id: u64,
    pub model: ModelInfo,
    #[serde(default)]
    pub metadata: ModelMetadata,
    #[serde(default)]
    pub scores: HashMap<String, ScoreCell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_score: Option<ScoreCell>,
}

impl ModelRow {
    /// Numeric value of a score column, `None` for missing/absent cells
    pub fn score_value(&self, benchmark_id: &str) -> Option<f64> {
        self.scores.get(benchmark_id).and_then(ScoreCell::value)
    }

    /// The row's effective score: the filtered score when one has been
    /// computed, otherwise the payload's global score column
    pub fn effective_score(&self) -> Option<f64> {
        self.filtered_score
            .as_ref()
            .and_then(ScoreCell::value)
            .or_else(|| self.score_value(crate::columns::GLOBAL_SCORE_COLUMN))
    }
}

/// The full embedded payload: benchmark forest, model rows, benchmark
/// metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LeaderboardPayload {
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkNode>,
    #[serde(default)]
    pub rows: Vec<ModelRow>,
    #[serde(default)]
    pub benchmark_metadata: HashMap<String, BenchmarkMeta>,
}

impl LeaderboardPayload {
    /// Parse a payload, degrading malformed sections to empty with a
    /// warning rather than failing the whole load. Only a top-level
    /// non-object is a hard error.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let serde_json::Value::Object(mut map) = value else {
            return Err(Error::ParseError(
                "leaderboard payload must be a JSON object".to_string(),
            ));
        };

        let benchmarks = take_section(&mut map, "benchmarks");
        let rows = take_section(&mut map, "rows");
        let benchmark_metadata = take_section(&mut map, "benchmark_metadata");

        Ok(Self {
            benchmarks,
            rows,
            benchmark_metadata,
        })
    }

    /// Load a payload from a JSON file
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }
}

fn take_section<T: serde::de::DeserializeOwned + Default>(
    map: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> T {
    match map.remove(key) {
        None => T::default(),
        Some(value) => match serde_json::from_value(value) {
            Ok(section) => section,
            Err(e) => {
                warn!(section = key, error = %e, "malformed payload section, using empty default");
                T::default()
            }
        },
    }
}
