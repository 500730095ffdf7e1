//! Score aggregation under an exclusion set
//!
//! Parents average their surviving children bottom-up; the global filtered
//! score averages the surviving top-level scoring categories. The two
//! edge-case policies that matter:
//!
//! - a missing child counts as zero only when at least one sibling has a
//!   real value; a parent with no real-valued children collapses to
//!   missing, never to zero
//! - a fully excluded subtree drops out of its parent's average entirely
//!   rather than contributing a zero

use crate::data::{ModelRow, ScoreCell};
use crate::hierarchy::HierarchyIndex;
use std::collections::HashSet;

/// Round to 3 decimals, the precision displayed by the grid
fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Mean of the sibling group with the X-counts-as-zero rule: `None`
/// entries are zeros only if some sibling is `Some`; an all-`None` group
/// has no mean.
fn sibling_mean(values: &[Option<f64>]) -> Option<f64> {
    if values.is_empty() || values.iter().all(Option::is_none) {
        return None;
    }
    let sum: f64 = values.iter().map(|v| v.unwrap_or(0.0)).sum();
    Some(sum / values.len() as f64)
}

/// Recompute every aggregate cell and the global filtered score for each
/// row, under `excluded`.
///
/// Input rows are the authoritative unfiltered copies and are not
/// mutated; the returned rows are fresh clones with leaf cells forced to
/// missing where excluded and every parent cell rewritten bottom-up.
/// Because aggregation always starts from the originals, repeated calls
/// with the same inputs are idempotent.
pub fn recompute_scores(
    rows: &[ModelRow],
    hierarchy: &HierarchyIndex,
    excluded: &HashSet<String>,
) -> Vec<ModelRow> {
    rows.iter()
        .map(|row| recompute_row(row, hierarchy, excluded))
        .collect()
}

fn recompute_row(row: &ModelRow, hierarchy: &HierarchyIndex, excluded: &HashSet<String>) -> ModelRow {
    let mut row = row.clone();

    // children always precede parents in depth order
    for id in hierarchy.ids_by_depth() {
        if hierarchy.is_leaf(id) {
            if excluded.contains(id) {
                if let Some(cell) = row.scores.get_mut(id) {
                    *cell = ScoreCell::Missing;
                }
            }
            continue;
        }

        let values: Vec<Option<f64>> = hierarchy
            .children_of(id)
            .iter()
            .filter(|child| {
                !excluded.contains(*child) && !hierarchy.is_fully_excluded(child, excluded)
            })
            .map(|child| row.score_value(child))
            .collect();

        let cell = match sibling_mean(&values) {
            Some(mean) => ScoreCell::scored(round3(mean)),
            None => ScoreCell::Missing,
        };
        row.scores.insert(id.to_string(), cell);
    }

    let root_values: Vec<Option<f64>> = hierarchy
        .scoring_roots()
        .filter(|root| !hierarchy.is_fully_excluded(root, excluded))
        .map(|root| row.score_value(root))
        .collect();
    row.filtered_score = Some(match sibling_mean(&root_values) {
        Some(mean) => ScoreCell::scored(round3(mean)),
        None => ScoreCell::Missing,
    });

    row
}
