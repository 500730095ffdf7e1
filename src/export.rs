//! CSV/ZIP export
//!
//! Bundles two CSV files into one archive: `leaderboard.csv` with the
//! visible score columns of the current view, and `plugin-info.csv` with
//! model identity and metadata. Both start with `#`-prefixed comment
//! lines recording when the export was generated and the effective date
//! range of the data.

use crate::columns::{FILTERED_SCORE_COLUMN, GLOBAL_SCORE_COLUMN};
use crate::coordinator::GridView;
use crate::data::ModelRow;
use crate::error::{Error, Result};
use crate::hierarchy::HierarchyIndex;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use tracing::info;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const LEADERBOARD_CSV: &str = "leaderboard.csv";
pub const PLUGIN_INFO_CSV: &str = "plugin-info.csv";

/// Export parameters recorded in the CSV comment headers
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub generated_at: DateTime<Utc>,
    /// Submission window covered by the export, when one is known
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl ExportOptions {
    pub fn now() -> Self {
        Self {
            generated_at: Utc::now(),
            date_range: None,
        }
    }
}

/// Write the two-CSV archive to `path`
pub fn write_archive(
    path: &Path,
    view: &GridView,
    hierarchy: &HierarchyIndex,
    opts: &ExportOptions,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    let file = std::fs::File::create(path).map_err(|e| Error::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut archive = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    archive.start_file(LEADERBOARD_CSV, options)?;
    archive.write_all(&leaderboard_csv(view, hierarchy, opts)?)?;

    archive.start_file(PLUGIN_INFO_CSV, options)?;
    archive.write_all(&plugin_info_csv(view, opts)?)?;

    archive.finish()?;
    info!(path = %path.display(), rows = view.rows.len(), "wrote leaderboard archive");
    Ok(())
}

fn comment_header(opts: &ExportOptions) -> String {
    let mut header = format!(
        "# Generated {}\n",
        opts.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    match opts.date_range {
        Some((from, to)) => {
            header.push_str(&format!(
                "# Effective date range: {} to {}\n",
                from.format("%Y-%m-%d"),
                to.format("%Y-%m-%d")
            ));
        }
        None => header.push_str("# Effective date range: all submissions\n"),
    }
    header
}

/// Score columns of the export: the active score column first, then every
/// visible benchmark column in grid (pre-order) order
fn score_columns(view: &GridView, hierarchy: &HierarchyIndex) -> Vec<String> {
    let mut columns = Vec::new();
    if view.visible.contains(FILTERED_SCORE_COLUMN) {
        columns.push(FILTERED_SCORE_COLUMN.to_string());
    } else {
        columns.push(GLOBAL_SCORE_COLUMN.to_string());
    }
    columns.extend(
        hierarchy
            .ids_preorder()
            .into_iter()
            .filter(|id| view.visible.contains(id)),
    );
    columns
}

fn cell_text(row: &ModelRow, column: &str) -> String {
    let value = if column == FILTERED_SCORE_COLUMN {
        row.filtered_score.as_ref().and_then(|c| c.value())
    } else {
        row.score_value(column)
    };
    match value {
        Some(v) => format!("{v}"),
        None => "X".to_string(),
    }
}

pub(crate) fn leaderboard_csv(
    view: &GridView,
    hierarchy: &HierarchyIndex,
    opts: &ExportOptions,
) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = comment_header(opts).into_bytes();
    let columns = score_columns(view, hierarchy);

    let mut writer = csv::Writer::from_writer(&mut buf);
    let mut header = vec![
        "model_id".to_string(),
        "model".to_string(),
        "submitter".to_string(),
        "rank".to_string(),
    ];
    header.extend(columns.iter().cloned());
    writer.write_record(&header)?;

    for (position, row) in view.rows.iter().enumerate() {
        let mut record = vec![
            row.model.id.to_string(),
            row.model.name.clone(),
            row.model.submitter.clone(),
            (position + 1).to_string(),
        ];
        record.extend(columns.iter().map(|c| cell_text(row, c)));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    drop(writer);
    Ok(buf)
}

pub(crate) fn plugin_info_csv(view: &GridView, opts: &ExportOptions) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = comment_header(opts).into_bytes();

    let mut writer = csv::Writer::from_writer(&mut buf);
    writer.write_record([
        "model_id",
        "model",
        "submitter",
        "architecture",
        "model_family",
        "training_dataset",
        "task_specialization",
        "parameter_count",
        "model_size_mb",
        "runnable",
    ])?;

    for row in &view.rows {
        let meta = &row.metadata;
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        writer.write_record([
            row.model.id.to_string(),
            row.model.name.clone(),
            row.model.submitter.clone(),
            opt(&meta.architecture),
            opt(&meta.model_family),
            opt(&meta.training_dataset),
            opt(&meta.task_specialization),
            meta.parameter_count.map(|v| v.to_string()).unwrap_or_default(),
            meta.model_size_mb.map(|v| v.to_string()).unwrap_or_default(),
            meta.runnable.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    drop(writer);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::FilterCoordinator;
    use crate::data::{BenchmarkNode, LeaderboardPayload, ModelInfo, ModelMetadata, ScoreCell};
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::io::Read;

    fn payload() -> LeaderboardPayload {
        LeaderboardPayload {
            benchmarks: vec![BenchmarkNode::parent(
                "neural",
                "Neural",
                vec![BenchmarkNode::leaf("bench_a", "Bench A")],
            )],
            rows: vec![crate::data::ModelRow {
                id: 3,
                model: ModelInfo {
                    id: 3,
                    name: "resnet".to_string(),
                    submitter: "lab".to_string(),
                },
                metadata: ModelMetadata {
                    architecture: Some("CNN".to_string()),
                    parameter_count: Some(25.6),
                    ..Default::default()
                },
                scores: HashMap::from([("bench_a".to_string(), ScoreCell::scored(0.5))]),
                filtered_score: None,
            }],
            benchmark_metadata: HashMap::new(),
        }
    }

    fn opts() -> ExportOptions {
        ExportOptions {
            generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            date_range: Some((
                Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            )),
        }
    }

    #[test]
    fn test_leaderboard_csv_has_comment_header_and_rows() {
        let c = FilterCoordinator::new(payload()).unwrap();
        let csv = leaderboard_csv(c.view(), c.hierarchy(), &opts()).unwrap();
        let text = String::from_utf8(csv).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "# Generated 2024-03-01 12:00:00 UTC");
        assert_eq!(
            lines.next().unwrap(),
            "# Effective date range: 2020-01-01 to 2024-03-01"
        );
        let header = lines.next().unwrap();
        assert!(header.starts_with("model_id,model,submitter,rank"));
        assert!(header.contains("global_score"));

        let row = lines.next().unwrap();
        assert!(row.starts_with("3,resnet,lab,1"));
    }

    #[test]
    fn test_missing_cells_export_as_x() {
        let mut p = payload();
        p.rows[0]
            .scores
            .insert("bench_a".to_string(), ScoreCell::Missing);
        let c = FilterCoordinator::new(p).unwrap();
        let csv = leaderboard_csv(c.view(), c.hierarchy(), &opts()).unwrap();
        let text = String::from_utf8(csv).unwrap();
        let row = text.lines().last().unwrap();
        assert!(row.ends_with(",X") || row.contains(",X,"));
    }

    #[test]
    fn test_plugin_info_carries_metadata() {
        let c = FilterCoordinator::new(payload()).unwrap();
        let csv = plugin_info_csv(c.view(), &opts()).unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert!(text.contains("resnet,lab,CNN"));
        assert!(text.contains("25.6"));
    }

    #[test]
    fn test_archive_contains_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export").join("leaderboard.zip");
        let c = FilterCoordinator::new(payload()).unwrap();

        write_archive(&path, c.view(), c.hierarchy(), &opts()).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec![LEADERBOARD_CSV, PLUGIN_INFO_CSV]);

        let mut content = String::new();
        archive
            .by_name(LEADERBOARD_CSV)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.starts_with("# Generated"));
    }
}
