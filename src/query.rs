//! Query-string persistence of filter state
//!
//! Active filters round-trip through the page URL: list filters are
//! comma-joined, booleans appear only when true, range bounds only when
//! set. Unknown keys and unparseable values are skipped with a log line
//! rather than failing the load.

use crate::filters::{FilterState, Range};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeSet;
use tracing::{debug, warn};
use url::form_urlencoded;

const LIST_KEYS: [&str; 8] = [
    "architecture",
    "model_family",
    "training_dataset",
    "task_specialization",
    "benchmark_regions",
    "benchmark_species",
    "benchmark_tasks",
    "excluded_benchmarks",
];

/// Serialize the state into a query string (no leading `?`). Defaults are
/// omitted, so an unconstrained state serializes to the empty string.
pub fn to_query_string(state: &FilterState) -> String {
    let mut ser = form_urlencoded::Serializer::new(String::new());

    for key in LIST_KEYS {
        let values = list_field(state, key);
        if !values.is_empty() {
            let joined = values.iter().cloned().collect::<Vec<_>>().join(",");
            ser.append_pair(key, &joined);
        }
    }

    if state.public_data_only {
        ser.append_pair("public_data_only", "true");
    }
    if state.runnable_only {
        ser.append_pair("runnable_only", "true");
    }

    append_f64(&mut ser, "min_param_count", state.param_count.min);
    append_f64(&mut ser, "max_param_count", state.param_count.max);
    append_f64(&mut ser, "min_model_size", state.model_size.min);
    append_f64(&mut ser, "max_model_size", state.model_size.max);
    append_f64(&mut ser, "min_score", state.score.min);
    append_f64(&mut ser, "max_score", state.score.max);

    if let Some(min) = state.stimuli_count.min {
        ser.append_pair("min_stimuli_count", &min.to_string());
    }
    if let Some(max) = state.stimuli_count.max {
        ser.append_pair("max_stimuli_count", &max.to_string());
    }

    if let Some(min) = state.wayback.min {
        ser.append_pair("min_wayback_timestamp", &min.timestamp().to_string());
    }
    if let Some(max) = state.wayback.max {
        ser.append_pair("max_wayback_timestamp", &max.timestamp().to_string());
    }

    ser.finish()
}

/// Parse a query string (with or without a leading `?`) back into filter
/// state. Missing keys take their defaults.
pub fn from_query_string(query: &str) -> FilterState {
    let mut state = FilterState::default();
    let query = query.trim().trim_start_matches('?');

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let key = key.as_ref();
        let value = value.as_ref();
        if let Some(list) = list_field_mut(&mut state, key) {
            *list = split_list(value);
            continue;
        }
        match key {
            "public_data_only" => state.public_data_only = parse_bool(key, value),
            "runnable_only" => state.runnable_only = parse_bool(key, value),
            "min_param_count" => state.param_count.min = parse_f64(key, value),
            "max_param_count" => state.param_count.max = parse_f64(key, value),
            "min_model_size" => state.model_size.min = parse_f64(key, value),
            "max_model_size" => state.model_size.max = parse_f64(key, value),
            "min_score" => state.score.min = parse_f64(key, value),
            "max_score" => state.score.max = parse_f64(key, value),
            "min_stimuli_count" => state.stimuli_count.min = parse_u64(key, value),
            "max_stimuli_count" => state.stimuli_count.max = parse_u64(key, value),
            "min_wayback_timestamp" => state.wayback.min = parse_timestamp(key, value),
            "max_wayback_timestamp" => state.wayback.max = parse_timestamp(key, value),
            _ => debug!(key, "ignoring unknown query parameter"),
        }
    }
    state
}

fn list_field<'a>(state: &'a FilterState, key: &str) -> &'a BTreeSet<String> {
    match key {
        "architecture" => &state.architecture,
        "model_family" => &state.model_family,
        "training_dataset" => &state.training_dataset,
        "task_specialization" => &state.task_specialization,
        "benchmark_regions" => &state.benchmark_regions,
        "benchmark_species" => &state.benchmark_species,
        "benchmark_tasks" => &state.benchmark_tasks,
        "excluded_benchmarks" => &state.excluded_benchmarks,
        _ => unreachable!("not a list key: {key}"),
    }
}

fn list_field_mut<'a>(state: &'a mut FilterState, key: &str) -> Option<&'a mut BTreeSet<String>> {
    Some(match key {
        "architecture" => &mut state.architecture,
        "model_family" => &mut state.model_family,
        "training_dataset" => &mut state.training_dataset,
        "task_specialization" => &mut state.task_specialization,
        "benchmark_regions" => &mut state.benchmark_regions,
        "benchmark_species" => &mut state.benchmark_species,
        "benchmark_tasks" => &mut state.benchmark_tasks,
        "excluded_benchmarks" => &mut state.excluded_benchmarks,
        _ => return None,
    })
}

fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> bool {
    match value {
        "true" | "1" => true,
        "false" | "0" | "" => false,
        other => {
            warn!(key, value = other, "unparseable boolean, treating as false");
            false
        }
    }
}

fn parse_f64(key: &str, value: &str) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!(key, value, "unparseable number, ignoring bound");
            None
        }
    }
}

fn parse_u64(key: &str, value: &str) -> Option<u64> {
    match value.parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value, "unparseable count, ignoring bound");
            None
        }
    }
}

fn parse_timestamp(key: &str, value: &str) -> Option<DateTime<Utc>> {
    let secs = match value.parse::<i64>() {
        Ok(s) => s,
        Err(_) => {
            warn!(key, value, "unparseable timestamp, ignoring bound");
            return None;
        }
    };
    match Utc.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(ts) => Some(ts),
        _ => {
            warn!(key, value, "timestamp out of range, ignoring bound");
            None
        }
    }
}

fn append_f64(ser: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: Option<f64>) {
    if let Some(v) = value {
        ser.append_pair(key, &format_f64(v));
    }
}

/// Render without a trailing `.0` for integral bounds, matching how the
/// UI writes slider values
fn format_f64(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
