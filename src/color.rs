//! Score-to-color mapping
//!
//! Cell fills are derived from the score distribution of a column: hue is
//! picked from a precomputed 101-entry ramp via a gamma-corrected index,
//! alpha is a plain linear interpolation over the same range. The two
//! stages are deliberately independent.

use crate::data::{ModelRow, ScoreCell};
use crate::hierarchy::HierarchyIndex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Number of entries in each precomputed color ramp
pub const RAMP_LEN: usize = 101;

/// Fraction of the ramp reachable after gamma correction
const RAMP_COMPRESSION: f64 = 0.8;

/// Gamma exponent applied to the normalized score (1 / 0.5)
const GAMMA: f64 = 2.0;

/// Alpha assigned at the minimum of a score column
const MIN_ALPHA: f64 = 0.1;

/// An RGBA fill color, alpha in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// CSS `rgba(...)` form, alpha to 3 decimals
    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
    }

    /// Parse a CSS `rgba(r, g, b, a)` string
    pub fn parse_css(s: &str) -> Option<Self> {
        let inner = s.trim().strip_prefix("rgba(")?.strip_suffix(')')?;
        let mut parts = inner.split(',').map(str::trim);
        let r = parts.next()?.parse().ok()?;
        let g = parts.next()?.parse().ok()?;
        let b = parts.next()?.parse().ok()?;
        let a = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { r, g, b, a })
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.css())
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.css())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_css(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid rgba string: {s}")))
    }
}

/// Neutral gray used for missing/unscored cells
pub const NEUTRAL: Rgba = Rgba::new(170, 170, 170, 0.3);

fn build_ramp(lo: (u8, u8, u8), hi: (u8, u8, u8)) -> Vec<Rgba> {
    (0..RAMP_LEN)
        .map(|i| {
            let t = i as f64 / (RAMP_LEN - 1) as f64;
            let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
            Rgba::new(mix(lo.0, hi.0), mix(lo.1, hi.1), mix(lo.2, hi.2), 1.0)
        })
        .collect()
}

/// Red-to-green ramp for standard benchmark categories
fn standard_ramp() -> &'static [Rgba] {
    static RAMP: OnceLock<Vec<Rgba>> = OnceLock::new();
    RAMP.get_or_init(|| build_ramp((202, 0, 32), (26, 150, 65)))
}

/// Grayscale ramp for engineering-rooted categories
fn engineering_ramp() -> &'static [Rgba] {
    static RAMP: OnceLock<Vec<Rgba>> = OnceLock::new();
    RAMP.get_or_init(|| build_ramp((220, 220, 220), (70, 70, 70)))
}

/// Map a score to its fill color given the column's `[min, max]` range.
///
/// Hue: normalize into `[0, 1]` (midpoint on a degenerate range), raise to
/// the gamma exponent, compress into the lower 80% of the ramp, index.
/// Alpha: linear from 0.1 at `min` to 1.0 at `max`; a degenerate range
/// gets full alpha.
pub fn color_for(value: Option<f64>, min: f64, max: f64, engineering: bool) -> Rgba {
    let v = match value {
        Some(v) if v.is_finite() => v,
        _ => return NEUTRAL,
    };
    if !min.is_finite() || !max.is_finite() {
        return NEUTRAL;
    }

    let (normalized, alpha) = if max > min {
        let n = ((v - min) / (max - min)).clamp(0.0, 1.0);
        (n, MIN_ALPHA + (1.0 - MIN_ALPHA) * n)
    } else {
        (0.5, 1.0)
    };

    let index = (normalized.powf(GAMMA) * RAMP_COMPRESSION * (RAMP_LEN - 1) as f64).round()
        as usize;
    let ramp = if engineering {
        engineering_ramp()
    } else {
        standard_ramp()
    };
    let base = ramp[index.min(RAMP_LEN - 1)];
    Rgba::new(base.r, base.g, base.b, alpha)
}

/// Min/max of a score column over the given rows, `None` if no row has a
/// finite value for it.
fn column_range(rows: &[ModelRow], column: &str) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for row in rows {
        if let Some(v) = row.score_value(column) {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
    }
    range
}

/// Recolor every benchmark column and the filtered-score column in place.
///
/// Every column is recolored on every call; nothing tracks which columns a
/// filter change actually touched.
pub fn recolor(rows: &mut [ModelRow], hierarchy: &HierarchyIndex) {
    let columns: Vec<(String, bool)> = hierarchy
        .ids_by_depth()
        .map(|id| (id.to_string(), hierarchy.is_engineering(id)))
        .collect();

    for (column, engineering) in &columns {
        let range = column_range(rows, column);
        for row in rows.iter_mut() {
            if let Some(cell) = row.scores.get_mut(column.as_str()) {
                let color = match range {
                    Some((min, max)) => color_for(cell.value(), min, max, *engineering),
                    None => NEUTRAL,
                };
                cell.set_color(color);
            }
        }
    }

    // filtered score is always on the standard palette
    let mut range: Option<(f64, f64)> = None;
    for row in rows.iter() {
        if let Some(v) = row.filtered_score.as_ref().and_then(ScoreCell::value) {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
    }
    if let Some((min, max)) = range {
        for row in rows.iter_mut() {
            if let Some(cell) = row.filtered_score.as_mut() {
                let color = color_for(cell.value(), min, max, false);
                cell.set_color(color);
            }
        }
    }
}

/// Columns whose exclusion context differs from the baseline (descendant or
/// ancestor membership in the exclusion set). Retained for callers that
/// want to know what a filter change touched; `recolor` itself does not
/// consult it.
pub fn affected_columns(
    hierarchy: &HierarchyIndex,
    excluded: &HashSet<String>,
) -> HashSet<String> {
    let mut affected = HashSet::new();
    for id in excluded {
        let mut cursor = Some(id.as_str());
        while let Some(cur) = cursor {
            affected.insert(cur.to_string());
            cursor = hierarchy.parent_of(cur);
        }
        for leaf in hierarchy.leaf_descendants(id) {
            affected.insert(leaf);
        }
    }
    affected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_value_is_neutral() {
        assert_eq!(color_for(None, 0.0, 1.0, false), NEUTRAL);
        assert_eq!(color_for(Some(f64::NAN), 0.0, 1.0, false), NEUTRAL);
    }

    #[test]
    fn test_minimum_gets_lowest_index_and_min_alpha() {
        let c = color_for(Some(0.2), 0.2, 0.9, false);
        let bottom = standard_ramp()[0];
        assert_eq!((c.r, c.g, c.b), (bottom.r, bottom.g, bottom.b));
        assert!((c.a - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_maximum_gets_top_index_and_full_alpha() {
        let c = color_for(Some(0.9), 0.2, 0.9, false);
        // gamma(1.0) compressed into 80% of the ramp
        let top = standard_ramp()[80];
        assert_eq!((c.r, c.g, c.b), (top.r, top.g, top.b));
        assert!((c.a - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_range_is_midpoint_hue_full_alpha() {
        let c = color_for(Some(0.5), 0.5, 0.5, false);
        // 0.5^2 * 0.8 * 100 = 20
        let mid = standard_ramp()[20];
        assert_eq!((c.r, c.g, c.b), (mid.r, mid.g, mid.b));
        assert!((c.a - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_engineering_uses_grayscale_ramp() {
        let c = color_for(Some(1.0), 0.0, 1.0, true);
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);
    }

    #[test]
    fn test_rgba_css_round_trip() {
        let c = Rgba::new(26, 150, 65, 0.55);
        let parsed = Rgba::parse_css(&c.css()).unwrap();
        assert_eq!((parsed.r, parsed.g, parsed.b), (26, 150, 65));
        assert!((parsed.a - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_affected_columns_span_ancestors_and_leaves() {
        use crate::hierarchy::tests::fixture_forest;
        let hierarchy = crate::hierarchy::HierarchyIndex::build(&fixture_forest());
        let excluded: HashSet<String> = ["V1".to_string()].into_iter().collect();

        let affected = affected_columns(&hierarchy, &excluded);
        for id in ["V1", "neural", "bench_a", "bench_b"] {
            assert!(affected.contains(id), "{id} should be affected");
        }
        assert!(!affected.contains("behavior"));
    }

    #[test]
    fn test_ramp_length() {
        assert_eq!(standard_ramp().len(), RAMP_LEN);
        assert_eq!(engineering_ramp().len(), RAMP_LEN);
    }
}
