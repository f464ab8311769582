//! Plain-text rendering of controller state.

use viewer_core::controller::{GridView, ResultSetController, Snapshot};
use viewer_core::models::MatchRecord;
use viewer_core::resource::{ResourceStatus, LOAD_FAILED};

pub fn status_label(status: &ResourceStatus) -> String {
    match status {
        ResourceStatus::Idle => "-".to_string(),
        ResourceStatus::Pending => "Loading...".to_string(),
        ResourceStatus::Ready { width, height, .. } => format!("{}x{}", width, height),
        ResourceStatus::Failed { .. } => format!("[{}]", LOAD_FAILED),
    }
}

fn record_line(number: usize, record: &MatchRecord, status: &ResourceStatus) -> String {
    format!(
        "{:>3}. {:<24} {:<20} {:>8.4}  {}",
        number,
        record.display_name(),
        record.timestamp,
        record.distance,
        status_label(status)
    )
}

/// One line per cell, numbered from 1, or the empty-state message.
pub fn render_grid(grid: &GridView) -> String {
    match grid {
        GridView::Empty { message } => message.to_string(),
        GridView::Cells(cells) => cells
            .iter()
            .map(|cell| record_line(cell.index + 1, &cell.record, &cell.status()))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Loading and error lines shown above the grid.
pub fn render_banner(snapshot: &Snapshot) -> Option<String> {
    if snapshot.loading {
        Some("Loading...".to_string())
    } else {
        snapshot.error.clone()
    }
}

pub fn render_viewer(ctl: &ResultSetController) -> Option<String> {
    let state = ctl.viewer_state()?;
    let label = ctl.viewer_label().unwrap_or_default();
    let image = ctl
        .viewer_image()
        .map(|s| status_label(&s))
        .unwrap_or_default();
    Some(format!(
        "{} of {}  {}  {}",
        label,
        state.sequence().len(),
        state.current_path(),
        image
    ))
}

pub fn grid_json(grid: &GridView) -> serde_json::Value {
    match grid {
        GridView::Empty { message } => serde_json::json!({ "matches": [], "message": message }),
        GridView::Cells(cells) => {
            let matches: Vec<serde_json::Value> = cells
                .iter()
                .map(|cell| {
                    serde_json::json!({
                        "index": cell.index,
                        "image_path": cell.record.image_path,
                        "application_name": cell.record.display_name(),
                        "timestamp": cell.record.timestamp,
                        "distance": cell.record.distance,
                        "image": status_label(&cell.status()),
                    })
                })
                .collect();
            serde_json::json!({ "matches": matches })
        }
    }
}
