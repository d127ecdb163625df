use anyhow::{Context, Result};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{cell, column_index, open_csv};
use crate::{config::TableSource, join::NOT_AVAILABLE, normalize::MunicipalityKey};

/// A value read from an auxiliary source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceValue {
    /// The cell text, trimmed.
    Reported(String),
    /// The source's placeholder for "no data".
    NotApplicable,
}

/// One auxiliary source reduced to `municipality → value`.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    values: HashMap<MunicipalityKey, SourceValue>,
}

impl SourceTable {
    pub fn get(&self, key: &MunicipalityKey) -> Option<&SourceValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(MunicipalityKey, SourceValue)> for SourceTable {
    fn from_iter<I: IntoIterator<Item = (MunicipalityKey, SourceValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Read `source.path`, keyed by the normalized `source.key_column`.
///
/// Rows lacking either cell are skipped; a value reading `N/A` counts as lacking,
/// so it stays distinct from a real value in the joined table. When a municipality
/// appears more than once the last row wins.
#[tracing::instrument(level = "info", skip(source), fields(path = %source.path.display(), column = %source.value_column))]
pub fn read_source_table(source: &TableSource) -> Result<SourceTable> {
    let path = source.path.as_path();
    let mut rdr = open_csv(path)?;
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header row of {}", path.display()))?
        .clone();
    let key_idx = column_index(&headers, &source.key_column, path)?;
    let value_idx = column_index(&headers, &source.value_column, path)?;
    let sentinel = source.sentinel.as_deref().map(str::trim);

    let mut values = HashMap::new();
    let mut skipped = 0usize;
    let mut sentinels = 0usize;
    for (line, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), line))?;

        let key = cell(&record, key_idx).and_then(|raw| MunicipalityKey::new(&raw));
        let value = cell(&record, value_idx).filter(|v| v.as_str() != NOT_AVAILABLE);
        let (Some(key), Some(value)) = (key, value) else {
            skipped += 1;
            continue;
        };

        let value = if sentinel == Some(value.as_str()) {
            sentinels += 1;
            SourceValue::NotApplicable
        } else {
            SourceValue::Reported(value)
        };
        values.insert(key, value);
    }

    if skipped > 0 {
        debug!(skipped, "rows missing key or value");
    }
    if sentinels > 0 {
        debug!(sentinels, "sentinel values marked not applicable");
    }
    info!(municipalities = values.len(), "loaded source table");
    Ok(SourceTable { values })
}
