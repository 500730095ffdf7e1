//! Static HTML snapshot of the leaderboard grid

use crate::columns::{FILTERED_SCORE_COLUMN, GLOBAL_SCORE_COLUMN};
use crate::coordinator::GridView;
use crate::error::{Error, Result};
use crate::hierarchy::HierarchyIndex;
use minijinja::{context, Environment};
use serde::Serialize;
use std::path::Path;

/// HTML template for the grid snapshot
const GRID_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
            background: #f6f8fa;
            color: #1f2328;
            margin: 0;
            padding: 2rem;
        }
        h1 {
            font-size: 1.5rem;
            margin-bottom: 0.25rem;
        }
        .meta {
            color: #656d76;
            font-size: 0.85rem;
            margin-bottom: 1.5rem;
        }
        table {
            border-collapse: collapse;
            background: #ffffff;
            box-shadow: 0 1px 3px rgba(0, 0, 0, 0.1);
        }
        th, td {
            border: 1px solid #d0d7de;
            padding: 0.4rem 0.7rem;
            font-size: 0.85rem;
            text-align: right;
            white-space: nowrap;
        }
        th {
            background: #eaeef2;
            position: sticky;
            top: 0;
        }
        td.model, th.model {
            text-align: left;
        }
        td.missing {
            color: #8c959f;
        }
    </style>
</head>
<body>
    <h1>{{ title }}</h1>
    <p class="meta">{{ row_count }} models · {{ column_count }} score columns{% if query %} · filters: <code>?{{ query }}</code>{% endif %}</p>
    <table>
        <thead>
            <tr>
                <th class="model">Rank</th>
                <th class="model">Model</th>
                <th class="model">Submitter</th>
                {% for column in columns %}<th>{{ column.label }}</th>{% endfor %}
            </tr>
        </thead>
        <tbody>
            {% for row in rows %}
            <tr>
                <td class="model">{{ row.rank }}</td>
                <td class="model">{{ row.model }}</td>
                <td class="model">{{ row.submitter }}</td>
                {% for cell in row.cells %}
                <td{% if cell.missing %} class="missing"{% endif %}{% if cell.fill %} style="background-color: {{ cell.fill }}"{% endif %}>{{ cell.text }}</td>
                {% endfor %}
            </tr>
            {% endfor %}
        </tbody>
    </table>
</body>
</html>
"#;

#[derive(Serialize)]
struct ColumnCtx {
    id: String,
    label: String,
}

#[derive(Serialize)]
struct CellCtx {
    text: String,
    fill: Option<String>,
    missing: bool,
}

#[derive(Serialize)]
struct RowCtx {
    rank: usize,
    model: String,
    submitter: String,
    cells: Vec<CellCtx>,
}

/// Render the current view to an HTML string
pub fn render_grid(view: &GridView, hierarchy: &HierarchyIndex, title: &str) -> Result<String> {
    let score_column = if view.visible.contains(FILTERED_SCORE_COLUMN) {
        FILTERED_SCORE_COLUMN
    } else {
        GLOBAL_SCORE_COLUMN
    };

    let mut columns = vec![ColumnCtx {
        id: score_column.to_string(),
        label: if score_column == FILTERED_SCORE_COLUMN {
            "Filtered score".to_string()
        } else {
            "Global score".to_string()
        },
    }];
    columns.extend(
        hierarchy
            .ids_preorder()
            .into_iter()
            .filter(|id| view.visible.contains(id))
            .map(|id| ColumnCtx {
                label: hierarchy.label(&id).unwrap_or(&id).to_string(),
                id,
            }),
    );

    let rows: Vec<RowCtx> = view
        .rows
        .iter()
        .enumerate()
        .map(|(position, row)| {
            let cells = columns
                .iter()
                .map(|column| {
                    let cell = if column.id == FILTERED_SCORE_COLUMN {
                        row.filtered_score.clone()
                    } else {
                        row.scores.get(&column.id).cloned()
                    };
                    match cell {
                        Some(cell) if !cell.is_missing() => CellCtx {
                            text: format!("{:.3}", cell.value().unwrap_or_default()),
                            fill: cell.color().map(|c| c.css()),
                            missing: false,
                        },
                        _ => CellCtx {
                            text: "X".to_string(),
                            fill: None,
                            missing: true,
                        },
                    }
                })
                .collect();
            RowCtx {
                rank: position + 1,
                model: row.model.name.clone(),
                submitter: row.model.submitter.clone(),
                cells,
            }
        })
        .collect();

    let mut env = Environment::new();
    env.add_template("grid", GRID_TEMPLATE)?;
    let template = env.get_template("grid")?;
    let html = template.render(context! {
        title => title,
        rows => rows,
        columns => columns,
        row_count => view.rows.len(),
        column_count => columns.len(),
        query => view.query_string,
    })?;
    Ok(html)
}

/// Render the view and write it to `path`
pub fn render_to_file(
    path: &Path,
    view: &GridView,
    hierarchy: &HierarchyIndex,
    title: &str,
) -> Result<()> {
    let html = render_grid(view, hierarchy, title)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(path, html).map_err(|e| Error::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}
