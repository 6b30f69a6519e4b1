//! Export file loading.
//!
//! Exports are a top-level JSON array of header and table objects. The
//! records live in the `data` array of one of those objects.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ExportLayout;
use crate::errors::MigrationError;

/// One source row, keyed by column name.
pub type Record = Map<String, Value>;

/// Position of the table object in a positional export.
pub const EXPORT_DATA_INDEX: usize = 2;

/// Read `path` and return the records of `table`.
///
/// With [`ExportLayout::Positional`] the table name is ignored and the
/// element at [`EXPORT_DATA_INDEX`] is used.
pub async fn load_table(
    path: &Path,
    layout: ExportLayout,
    table: &str,
) -> Result<Vec<Record>, MigrationError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MigrationError::FileError {
            path: path.to_path_buf(),
            source,
        })?;

    let records =
        parse_table(&raw, layout, table).map_err(|reason| MigrationError::parse(path, reason))?;

    debug!(path = %path.display(), table = %table, records = records.len(), "Loaded export");

    Ok(records)
}

/// Extract the records of `table` from the raw export text.
pub fn parse_table(raw: &str, layout: ExportLayout, table: &str) -> Result<Vec<Record>, String> {
    let mut root: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    let element = match layout {
        ExportLayout::Positional => root
            .get_mut(EXPORT_DATA_INDEX)
            .ok_or_else(|| format!("no top-level element at index {}", EXPORT_DATA_INDEX))?,
        ExportLayout::Named => root
            .as_array_mut()
            .and_then(|items| {
                items.iter_mut().find(|item| {
                    item.get("type").and_then(Value::as_str) == Some("table")
                        && item.get("name").and_then(Value::as_str) == Some(table)
                })
            })
            .ok_or_else(|| format!("no table named {:?}", table))?,
    };

    let data = match element.get_mut("data").map(Value::take) {
        Some(Value::Array(items)) => items,
        Some(_) => return Err("`data` is not an array".to_string()),
        None => return Err("table element has no `data` field".to_string()),
    };

    data.into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(format!("record {} is not an object: {}", idx, other)),
        })
        .collect()
}
