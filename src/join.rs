use tracing::{debug, warn};

use crate::{
    aggregate::MunicipalityCounts,
    normalize::MunicipalityKey,
    sources::{SourceTable, SourceValue},
};

/// Marker written wherever a source had nothing for a municipality.
pub const NOT_AVAILABLE: &str = "N/A";

/// A joined value. `NotAvailable` is kept apart from a reported zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metric {
    Reported(String),
    NotAvailable,
}

impl Metric {
    /// Resolve a table lookup. A sentinel becomes a reported zero.
    fn from_lookup(value: Option<&SourceValue>) -> Self {
        match value {
            Some(SourceValue::Reported(text)) => Metric::Reported(text.clone()),
            Some(SourceValue::NotApplicable) => Metric::Reported("0".to_string()),
            None => Metric::NotAvailable,
        }
    }

    /// Parse from the text form produced by [`Metric::as_str`].
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text == NOT_AVAILABLE {
            Metric::NotAvailable
        } else {
            Metric::Reported(text.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Metric::Reported(text) => text,
            Metric::NotAvailable => NOT_AVAILABLE,
        }
    }

    /// Numeric reading of a reported value; `None` when unavailable or not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Metric::Reported(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Metric::NotAvailable => None,
        }
    }
}

/// One line of the joined table.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    /// 1-based, in first-seen order of the attendance file.
    pub id: usize,
    pub municipality: MunicipalityKey,
    pub attended: u64,
    pub population: Metric,
    /// `None` when the population is missing, zero or not numeric.
    pub percentage: Option<f64>,
    /// Outer `None`: no GDP source configured, so the column is absent.
    pub gdp: Option<Metric>,
    /// Outer `None`: no risk source configured, so the column is absent.
    pub population_at_risk: Option<Metric>,
}

/// Auxiliary tables for one run. Population is mandatory, the rest optional.
#[derive(Debug, Clone, Default)]
pub struct AuxiliaryTables {
    pub population: SourceTable,
    pub gdp: Option<SourceTable>,
    pub risk: Option<SourceTable>,
}

/// `count / population * 100`, rounded to two decimals.
pub fn attendance_percentage(count: u64, population: &Metric) -> Option<f64> {
    let total = population.as_f64()?;
    if total == 0.0 {
        return None;
    }
    round2(count as f64 / total * 100.0)
}

/// Two-decimal rounding through the decimal text, so exact ties go to the even
/// digit (`3.125` → `3.12`) instead of away from zero.
fn round2(value: f64) -> Option<f64> {
    format!("{:.2}", value).parse().ok()
}

/// Combine the counts with every auxiliary table, one row per counted municipality.
pub fn join(counts: &MunicipalityCounts, tables: &AuxiliaryTables) -> Vec<OutputRow> {
    let mut unmatched = 0usize;
    let rows: Vec<OutputRow> = counts
        .iter()
        .enumerate()
        .map(|(pos, (key, attended))| {
            let population = Metric::from_lookup(tables.population.get(key));
            match &population {
                Metric::NotAvailable => unmatched += 1,
                Metric::Reported(text) if population.as_f64().is_none() => {
                    warn!(municipality = %key, population = %text, "population is not numeric")
                }
                Metric::Reported(_) => {}
            }
            let percentage = attendance_percentage(attended, &population);

            OutputRow {
                id: pos + 1,
                municipality: key.clone(),
                attended,
                population,
                percentage,
                gdp: tables
                    .gdp
                    .as_ref()
                    .map(|table| Metric::from_lookup(table.get(key))),
                population_at_risk: tables
                    .risk
                    .as_ref()
                    .map(|table| Metric::from_lookup(table.get(key))),
            }
        })
        .collect();

    if unmatched > 0 {
        warn!(unmatched, "municipalities without population data");
    }
    debug!(rows = rows.len(), "joined municipalities");
    rows
}
