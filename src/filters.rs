//! Filter state and exclusion-set construction
//!
//! `FilterState` is the single source of truth for every filter control:
//! list selections, boolean toggles, numeric/date ranges, the free-text
//! search, and the manually unchecked benchmarks. The exclusion set is
//! always rebuilt from scratch from it, never diffed.

use crate::data::{BenchmarkMeta, ModelRow};
use crate::hierarchy::HierarchyIndex;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};

/// An optional closed interval. Unbounded ends pass everything; a bounded
/// range fails values that are absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// A bounded range rejects missing values
    pub fn admits(&self, value: Option<T>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        value.is_some_and(|v| self.contains(v))
    }
}

/// Complete filter-control state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    // model property lists; empty means unconstrained
    pub architecture: BTreeSet<String>,
    pub model_family: BTreeSet<String>,
    pub training_dataset: BTreeSet<String>,
    pub task_specialization: BTreeSet<String>,

    // benchmark metadata lists
    pub benchmark_regions: BTreeSet<String>,
    pub benchmark_species: BTreeSet<String>,
    pub benchmark_tasks: BTreeSet<String>,

    pub public_data_only: bool,
    pub runnable_only: bool,

    /// Manually unchecked benchmark IDs
    pub excluded_benchmarks: BTreeSet<String>,

    pub param_count: Range<f64>,
    pub model_size: Range<f64>,
    pub score: Range<f64>,
    pub stimuli_count: Range<u64>,
    /// "Wayback" date window over when benchmarks appeared
    pub wayback: Range<DateTime<Utc>>,

    /// Model-name substring search; not persisted to the URL
    pub search: Option<String>,
}

impl FilterState {
    /// Whether the state constrains anything at all
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn wayback_active(&self) -> bool {
        !self.wayback.is_unbounded()
    }

    /// AND of every model-property predicate; empty lists and unbounded
    /// ranges constrain nothing.
    pub fn matches_row(&self, row: &ModelRow) -> bool {
        let meta = &row.metadata;
        list_admits(&self.architecture, meta.architecture.as_deref())
            && list_admits(&self.model_family, meta.model_family.as_deref())
            && list_admits(&self.training_dataset, meta.training_dataset.as_deref())
            && list_admits(&self.task_specialization, meta.task_specialization.as_deref())
            && (!self.runnable_only || meta.runnable == Some(true))
            && self.param_count.admits(meta.parameter_count)
            && self.model_size.admits(meta.model_size_mb)
            && self.score.admits(row.effective_score())
            && self.search_matches(row)
    }

    fn search_matches(&self, row: &ModelRow) -> bool {
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => row
                .model
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }

    /// Whether a benchmark's metadata fails any active benchmark filter
    fn benchmark_filtered_out(&self, meta: &BenchmarkMeta) -> bool {
        if !list_admits(&self.benchmark_regions, meta.region.as_deref()) {
            return true;
        }
        if !list_admits(&self.benchmark_species, meta.species.as_deref()) {
            return true;
        }
        if !list_admits(&self.benchmark_tasks, meta.task.as_deref()) {
            return true;
        }
        if self.public_data_only && meta.public_data != Some(true) {
            return true;
        }
        if !self.stimuli_count.admits(meta.stimuli_count) {
            return true;
        }
        if self.wayback_active() && !self.wayback.admits(meta.first_seen) {
            return true;
        }
        false
    }

    /// Rebuild the exclusion set from scratch: manual unchecks unioned
    /// with every benchmark whose metadata fails an active filter.
    pub fn exclusion_set(
        &self,
        hierarchy: &HierarchyIndex,
        metadata: &HashMap<String, BenchmarkMeta>,
    ) -> HashSet<String> {
        let mut excluded: HashSet<String> = self
            .excluded_benchmarks
            .iter()
            .filter(|id| hierarchy.contains(id))
            .cloned()
            .collect();

        for (id, meta) in metadata {
            if hierarchy.contains(id) && self.benchmark_filtered_out(meta) {
                excluded.insert(id.clone());
            }
        }
        excluded
    }
}

fn list_admits(selected: &BTreeSet<String>, value: Option<&str>) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|v| selected.contains(v))
}
