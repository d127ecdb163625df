//! Readers for the input tables. Every file is comma-delimited with a header row.

pub mod attendance;
pub mod table;

pub use attendance::{read_attendance, RawRecord};
pub use table::{read_source_table, SourceTable, SourceValue};

use anyhow::{bail, Context, Result};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::{fs::File, path::Path};

use crate::normalize::clean_str;

/// Open `path` as a headed CSV. Rows may have any field count; short rows are
/// dealt with by the individual readers.
fn open_csv(path: &Path) -> Result<Reader<File>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

/// Position of `name` in `headers`, ignoring surrounding whitespace, quotes and a BOM.
fn column_index(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    let wanted = clean_str(name);
    match headers
        .iter()
        .position(|h| clean_str(h.trim_start_matches('\u{feff}')) == wanted)
    {
        Some(idx) => Ok(idx),
        None => bail!(
            "column `{}` not found in {} (headers: {:?})",
            name,
            path.display(),
            headers.iter().collect::<Vec<_>>()
        ),
    }
}

/// Cleaned, non-empty cell at `idx`.
fn cell(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .map(clean_str)
        .filter(|value| !value.is_empty())
}
