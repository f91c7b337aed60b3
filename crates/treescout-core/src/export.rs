/// Export of the visible rows to CSV or JSON.
///
/// Exports exactly what the view shows: filtered, in the current sort order,
/// with collapsed subtrees omitted.
use crate::browser::{Browser, RowView};
use crate::error::ExportError;
use crate::model::{EntryKind, ListModel};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub depth: u16,
    pub name: String,
    pub display_name: String,
    pub kind: EntryKind,
    pub path: String,
    pub icon: String,
}

impl From<&RowView> for ExportRow {
    fn from(row: &RowView) -> Self {
        Self {
            depth: row.depth,
            name: row.name().to_owned(),
            display_name: row.display_name().to_owned(),
            kind: row.entry.kind(),
            path: row.path().to_string_lossy().into_owned(),
            icon: row.icon().to_owned(),
        }
    }
}

/// Snapshot the browser's visible rows.
pub fn collect_rows(browser: &Browser) -> Vec<ExportRow> {
    browser
        .rows(0, browser.len())
        .iter()
        .map(ExportRow::from)
        .collect()
}

pub fn write_csv<W: Write>(rows: &[ExportRow], writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(rows: &[ExportRow], mut writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write the visible rows to `path`, choosing the format from its extension
/// (`.csv` or `.json`). Returns the number of rows written.
pub fn export_to_path(browser: &Browser, path: &Path) -> Result<usize, ExportError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let rows = collect_rows(browser);

    match extension.as_str() {
        "csv" => write_csv(&rows, BufWriter::new(File::create(path)?))?,
        "json" => write_json(&rows, BufWriter::new(File::create(path)?))?,
        _ => return Err(ExportError::UnknownFormat(path.display().to_string())),
    }

    info!("exported {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}
