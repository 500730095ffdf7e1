//! Column visibility reconciliation
//!
//! Decides which grid columns survive the current exclusion set, the
//! expansion state, and the displayed row values. Rules are ordered;
//! the first matching rule wins.

use crate::data::ModelRow;
use crate::hierarchy::HierarchyIndex;
use std::collections::{BTreeSet, HashMap, HashSet};

pub const MODEL_COLUMN: &str = "model";
pub const RANK_COLUMN: &str = "rank";
pub const STATUS_COLUMN: &str = "status";

/// The payload's unfiltered score column
pub const GLOBAL_SCORE_COLUMN: &str = "global_score";
/// The aggregator's recomputed score column
pub const FILTERED_SCORE_COLUMN: &str = "filtered_score";

/// Columns that are always shown
pub const IDENTITY_COLUMNS: [&str; 3] = [MODEL_COLUMN, RANK_COLUMN, STATUS_COLUMN];

/// Per-parent expansion state of the grid. Purely a display concern,
/// independent of the exclusion set. Parents default to collapsed.
#[derive(Debug, Clone, Default)]
pub struct ColumnExpansion {
    expanded: HashMap<String, bool>,
}

impl ColumnExpansion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: &str, expanded: bool) {
        self.expanded.insert(id.to_string(), expanded);
    }

    pub fn toggle(&mut self, id: &str) {
        let next = !self.is_expanded(id);
        self.expanded.insert(id.to_string(), next);
    }

    /// Expand every parent in the hierarchy
    pub fn expand_all(&mut self, hierarchy: &HierarchyIndex) {
        for id in hierarchy.ids_by_depth() {
            if !hierarchy.is_leaf(id) {
                self.expanded.insert(id.to_string(), true);
            }
        }
    }
}

/// Inputs the reconciler needs beyond the column list
pub struct VisibilityContext<'a> {
    pub hierarchy: &'a HierarchyIndex,
    pub excluded: &'a HashSet<String>,
    pub expansion: &'a ColumnExpansion,
    /// The currently displayed (property-filtered, recomputed) rows
    pub rows: &'a [ModelRow],
    /// While the wayback date filter is active a zero can be a real
    /// score, so only all-missing hides a column
    pub wayback_active: bool,
}

/// Compute the visible subset of `all_columns`.
///
/// Per column, first matching rule wins: identity columns always show;
/// excluded benchmarks hide; the global and filtered score columns are
/// mutually exclusive on whether any exclusion is active; a top-level
/// category hides when no leaf under it survives; a deeper column hides
/// when every displayed row is missing-or-zero for it; otherwise it shows
/// only under a visible, expanded parent. IDs without a known parent are
/// treated as top-level candidates.
pub fn visible_columns(all_columns: &[String], ctx: &VisibilityContext<'_>) -> BTreeSet<String> {
    let mut memo: HashMap<String, bool> = HashMap::new();
    all_columns
        .iter()
        .filter(|id| column_visible(id, ctx, &mut memo))
        .cloned()
        .collect()
}

fn column_visible(id: &str, ctx: &VisibilityContext<'_>, memo: &mut HashMap<String, bool>) -> bool {
    if let Some(&cached) = memo.get(id) {
        return cached;
    }
    let visible = decide(id, ctx, memo);
    memo.insert(id.to_string(), visible);
    visible
}

fn decide(id: &str, ctx: &VisibilityContext<'_>, memo: &mut HashMap<String, bool>) -> bool {
    if IDENTITY_COLUMNS.contains(&id) {
        return true;
    }
    if ctx.excluded.contains(id) {
        return false;
    }

    let filtering_active = !ctx.excluded.is_empty();
    if id == GLOBAL_SCORE_COLUMN {
        return !filtering_active;
    }
    if id == FILTERED_SCORE_COLUMN {
        return filtering_active;
    }

    let top_level = match ctx.hierarchy.parent_of(id) {
        Some(_) => false,
        // unknown IDs and roots are both visibility candidates at the top
        None => true,
    };
    if top_level {
        if ctx.hierarchy.contains(id) {
            return ctx.hierarchy.surviving_leaves(id, ctx.excluded) > 0;
        }
        return true;
    }

    if all_rows_blank(id, ctx) {
        return false;
    }

    let parent = ctx.hierarchy.parent_of(id).unwrap_or_default().to_string();
    column_visible(&parent, ctx, memo) && ctx.expansion.is_expanded(&parent)
}

/// Every displayed row is missing (or zero, outside wayback mode) for
/// this column
fn all_rows_blank(id: &str, ctx: &VisibilityContext<'_>) -> bool {
    if ctx.rows.is_empty() {
        return false;
    }
    ctx.rows.iter().all(|row| match row.score_value(id) {
        None => true,
        Some(v) => !ctx.wayback_active && v == 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ModelInfo, ModelMetadata, ModelRow, ScoreCell};
    use crate::hierarchy::tests::fixture_forest;

    fn make_row(scores: &[(&str, Option<f64>)]) -> ModelRow {
        ModelRow {
            id: 1,
            model: ModelInfo {
                id: 1,
                name: "m".to_string(),
                submitter: "s".to_string(),
            },
            metadata: ModelMetadata::default(),
            scores: scores
                .iter()
                .map(|(id, v)| {
                    let cell = match v {
                        Some(v) => ScoreCell::scored(*v),
                        None => ScoreCell::Missing,
                    };
                    (id.to_string(), cell)
                })
                .collect(),
            filtered_score: None,
        }
    }

    fn all_columns(hierarchy: &HierarchyIndex) -> Vec<String> {
        let mut cols: Vec<String> = IDENTITY_COLUMNS.iter().map(|s| s.to_string()).collect();
        cols.push(GLOBAL_SCORE_COLUMN.to_string());
        cols.push(FILTERED_SCORE_COLUMN.to_string());
        cols.extend(hierarchy.ids_preorder());
        cols
    }

    struct Fixture {
        hierarchy: HierarchyIndex,
        excluded: HashSet<String>,
        expansion: ColumnExpansion,
        rows: Vec<ModelRow>,
        wayback_active: bool,
    }

    impl Fixture {
        fn new() -> Self {
            let hierarchy = HierarchyIndex::build(&fixture_forest());
            let rows = vec![make_row(&[
                ("bench_a", Some(0.5)),
                ("bench_b", Some(0.7)),
                ("bench_c", Some(0.9)),
                ("V1", Some(0.6)),
                ("neural", Some(0.6)),
                ("behavior", Some(0.9)),
                ("imagenet", Some(0.8)),
                ("engineering", Some(0.8)),
            ])];
            Self {
                hierarchy,
                excluded: HashSet::new(),
                expansion: ColumnExpansion::new(),
                rows,
                wayback_active: false,
            }
        }

        fn visible(&self) -> BTreeSet<String> {
            let ctx = VisibilityContext {
                hierarchy: &self.hierarchy,
                excluded: &self.excluded,
                expansion: &self.expansion,
                rows: &self.rows,
                wayback_active: self.wayback_active,
            };
            visible_columns(&all_columns(&self.hierarchy), &ctx)
        }
    }

    #[test]
    fn test_identity_columns_always_visible() {
        let fx = Fixture::new();
        let visible = fx.visible();
        for col in IDENTITY_COLUMNS {
            assert!(visible.contains(col), "{col} should be visible");
        }
    }

    #[test]
    fn test_score_columns_mutually_exclusive() {
        let mut fx = Fixture::new();
        let visible = fx.visible();
        assert!(visible.contains(GLOBAL_SCORE_COLUMN));
        assert!(!visible.contains(FILTERED_SCORE_COLUMN));

        fx.excluded.insert("bench_a".to_string());
        let visible = fx.visible();
        assert!(!visible.contains(GLOBAL_SCORE_COLUMN));
        assert!(visible.contains(FILTERED_SCORE_COLUMN));
    }

    #[test]
    fn test_collapsed_parents_hide_children() {
        let fx = Fixture::new();
        let visible = fx.visible();
        assert!(visible.contains("neural"));
        assert!(!visible.contains("V1"));
        assert!(!visible.contains("bench_a"));
    }

    #[test]
    fn test_expansion_reveals_children_recursively() {
        let mut fx = Fixture::new();
        fx.expansion.set("neural", true);
        let visible = fx.visible();
        assert!(visible.contains("V1"));
        assert!(!visible.contains("bench_a"));

        fx.expansion.set("V1", true);
        let visible = fx.visible();
        assert!(visible.contains("bench_a"));
        assert!(visible.contains("bench_b"));
    }

    #[test]
    fn test_excluded_column_hidden_even_when_expanded() {
        let mut fx = Fixture::new();
        fx.expansion.expand_all(&fx.hierarchy);
        fx.excluded.insert("bench_a".to_string());
        let visible = fx.visible();
        assert!(!visible.contains("bench_a"));
        assert!(visible.contains("bench_b"));
    }

    #[test]
    fn test_category_without_surviving_leaves_hidden() {
        let mut fx = Fixture::new();
        fx.excluded.insert("bench_a".to_string());
        fx.excluded.insert("bench_b".to_string());
        let visible = fx.visible();
        assert!(!visible.contains("neural"));
        assert!(visible.contains("behavior"));
    }

    #[test]
    fn test_all_blank_column_hidden() {
        let mut fx = Fixture::new();
        fx.expansion.expand_all(&fx.hierarchy);
        for row in &mut fx.rows {
            row.scores.insert("bench_b".to_string(), ScoreCell::Missing);
        }
        let visible = fx.visible();
        assert!(!visible.contains("bench_b"));
        assert!(visible.contains("bench_a"));
    }

    #[test]
    fn test_all_zero_column_hidden_unless_wayback() {
        let mut fx = Fixture::new();
        fx.expansion.expand_all(&fx.hierarchy);
        for row in &mut fx.rows {
            row.scores.insert("bench_b".to_string(), ScoreCell::scored(0.0));
        }
        assert!(!fx.visible().contains("bench_b"));

        // zeros are legitimate while the date filter is active
        fx.wayback_active = true;
        assert!(fx.visible().contains("bench_b"));
    }

    #[test]
    fn test_unknown_parentless_column_treated_top_level() {
        let mut fx = Fixture::new();
        let mut cols = all_columns(&fx.hierarchy);
        cols.push("mystery".to_string());
        fx.rows[0]
            .scores
            .insert("mystery".to_string(), ScoreCell::scored(0.4));
        let ctx = VisibilityContext {
            hierarchy: &fx.hierarchy,
            excluded: &fx.excluded,
            expansion: &fx.expansion,
            rows: &fx.rows,
            wayback_active: false,
        };
        assert!(visible_columns(&cols, &ctx).contains("mystery"));
    }
}
