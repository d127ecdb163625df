use std::collections::HashMap;
use tracing::debug;

use crate::{normalize::MunicipalityKey, sources::RawRecord};

/// Attendance counts per municipality, iterated in the order each municipality was
/// first seen in the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MunicipalityCounts {
    entries: Vec<(MunicipalityKey, u64)>,
    index: HashMap<MunicipalityKey, usize>,
}

impl MunicipalityCounts {
    fn increment(&mut self, key: MunicipalityKey) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MunicipalityKey, u64)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

/// Count records per normalized municipality. Records whose name normalizes to
/// nothing are ignored.
pub fn count_by_municipality(records: &[RawRecord]) -> MunicipalityCounts {
    let mut counts = MunicipalityCounts::default();
    for record in records {
        if let Some(key) = MunicipalityKey::new(&record.municipality) {
            counts.increment(key);
        }
    }
    debug!(
        municipalities = counts.len(),
        records = counts.total(),
        "aggregated attendance"
    );
    counts
}
