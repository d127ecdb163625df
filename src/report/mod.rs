//! Descriptive statistics over a joined table: the numbers behind the usual box plot,
//! top/bottom bar charts and correlation heatmap.

pub mod stats;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fs::File, io::Write, path::Path};
use tracing::info;

use crate::{
    join::{Metric, OutputRow},
    output::{read_output, OutputSchema, COL_ATTENDED, COL_GDP, COL_PERCENTAGE, COL_POPULATION},
};
pub use stats::{describe, pearson, rank_indices, Describe};

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMunicipality {
    pub municipality: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rankings {
    pub highest: Vec<RankedMunicipality>,
    pub lowest: Vec<RankedMunicipality>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `None` where a series is constant.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    /// Rows in the joined table.
    pub municipalities: usize,
    /// Rows left after dropping those without a percentage.
    pub analysed: usize,
    pub percentage: Option<Describe>,
    pub percentage_rankings: Rankings,
    pub gdp_thousands: Option<Describe>,
    pub gdp_rankings: Option<Rankings>,
    /// Only municipalities with a positive population at risk are ranked.
    pub risk_rankings: Option<Rankings>,
    pub correlation: CorrelationMatrix,
    pub gdp_vs_percentage: Option<f64>,
    pub gdp_vs_attended: Option<f64>,
    pub risk_vs_attended: Option<f64>,
}

/// Numeric value of an optional column; anything unparseable counts as zero.
fn coerce(metric: Option<&Metric>) -> f64 {
    metric.and_then(Metric::as_f64).unwrap_or(0.0)
}

fn rankings(names: &[&str], values: &[f64], top_n: usize) -> Rankings {
    let pick = |descending: bool| {
        rank_indices(values, top_n, descending)
            .into_iter()
            .map(|i| RankedMunicipality {
                municipality: names[i].to_string(),
                value: values[i],
            })
            .collect::<Vec<_>>()
    };
    Rankings {
        highest: pick(true),
        lowest: pick(false),
    }
}

fn correlation_matrix(series: &[(&str, &[f64])]) -> CorrelationMatrix {
    CorrelationMatrix {
        columns: series.iter().map(|(name, _)| name.to_string()).collect(),
        values: series
            .iter()
            .map(|(_, xs)| series.iter().map(|(_, ys)| pearson(xs, ys)).collect())
            .collect(),
    }
}

/// Compute the report for `rows`. Rows without a percentage are left out entirely;
/// in the rest, unavailable population, GDP and risk values count as zero.
pub fn build_report(rows: &[OutputRow], schema: OutputSchema, top_n: usize) -> Report {
    let kept: Vec<(&OutputRow, f64)> = rows
        .iter()
        .filter_map(|row| row.percentage.map(|pct| (row, pct)))
        .collect();

    let names: Vec<&str> = kept.iter().map(|(row, _)| row.municipality.as_str()).collect();
    let percentage: Vec<f64> = kept.iter().map(|(_, pct)| *pct).collect();
    let attended: Vec<f64> = kept.iter().map(|(row, _)| row.attended as f64).collect();
    let population: Vec<f64> = kept
        .iter()
        .map(|(row, _)| coerce(Some(&row.population)))
        .collect();
    let gdp: Vec<f64> = kept
        .iter()
        .map(|(row, _)| coerce(row.gdp.as_ref()))
        .collect();
    let risk: Vec<f64> = kept
        .iter()
        .map(|(row, _)| coerce(row.population_at_risk.as_ref()))
        .collect();

    let mut series: Vec<(&str, &[f64])> = vec![
        (COL_ATTENDED, attended.as_slice()),
        (COL_POPULATION, population.as_slice()),
        (COL_PERCENTAGE, percentage.as_slice()),
    ];
    if schema.gdp {
        series.push((COL_GDP, gdp.as_slice()));
    }

    let risk_rankings = schema.population_at_risk.then(|| {
        let (at_risk_names, at_risk): (Vec<&str>, Vec<f64>) = names
            .iter()
            .zip(&risk)
            .filter(|(_, value)| **value > 0.0)
            .map(|(name, value)| (*name, *value))
            .unzip();
        rankings(&at_risk_names, &at_risk, top_n)
    });
    let gdp_thousands: Vec<f64> = gdp.iter().map(|v| v / 1000.0).collect();

    Report {
        generated_at: Utc::now(),
        municipalities: rows.len(),
        analysed: kept.len(),
        percentage: describe(&percentage),
        percentage_rankings: rankings(&names, &percentage, top_n),
        gdp_thousands: schema.gdp.then(|| describe(&gdp_thousands)).flatten(),
        gdp_rankings: schema.gdp.then(|| rankings(&names, &gdp, top_n)),
        risk_rankings,
        correlation: correlation_matrix(&series),
        gdp_vs_percentage: schema.gdp.then(|| pearson(&gdp, &percentage)).flatten(),
        gdp_vs_attended: schema.gdp.then(|| pearson(&gdp, &attended)).flatten(),
        risk_vs_attended: schema
            .population_at_risk
            .then(|| pearson(&risk, &attended))
            .flatten(),
    }
}

/// Read the joined table at `input`, build the report and write it as JSON to `output`.
#[tracing::instrument(level = "info", skip(input, output), fields(input = %input.as_ref().display()))]
pub fn summarize_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    top_n: usize,
) -> Result<Report> {
    let output = output.as_ref();
    let (schema, rows) = read_output(&input)?;
    let report = build_report(&rows, schema, top_n);

    if let Some(pct) = &report.percentage {
        info!(
            mean = pct.mean,
            median = pct.median,
            mode = pct.mode,
            std_dev = ?pct.std_dev,
            "attendance percentage"
        );
    }
    if let Some(r) = report.gdp_vs_percentage {
        info!(correlation = r, "GDP vs attendance percentage");
    }

    let mut file =
        File::create(output).with_context(|| format!("creating {}", output.display()))?;
    serde_json::to_writer_pretty(&mut file, &report)
        .with_context(|| format!("serializing report to {}", output.display()))?;
    file.write_all(b"\n")?;
    info!(
        path = %output.display(),
        analysed = report.analysed,
        dropped = report.municipalities - report.analysed,
        "wrote report"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize::MunicipalityKey, output::write_output};
    use tempfile::tempdir;

    fn row(
        id: usize,
        name: &str,
        attended: u64,
        population: &str,
        percentage: Option<f64>,
        gdp: &str,
        risk: &str,
    ) -> OutputRow {
        OutputRow {
            id,
            municipality: MunicipalityKey::new(name).unwrap(),
            attended,
            population: Metric::parse(population),
            percentage,
            gdp: Some(Metric::parse(gdp)),
            population_at_risk: Some(Metric::parse(risk)),
        }
    }

    fn fixture() -> Vec<OutputRow> {
        vec![
            row(1, "Alfa", 10, "100", Some(10.0), "5000", "0"),
            row(2, "Bravo", 30, "100", Some(30.0), "15000", "40"),
            row(3, "Charlie", 5, "N/A", None, "99999", "7"),
            row(4, "Delta", 20, "100", Some(20.0), "N/A", "12"),
            row(5, "Echo", 20, "200", Some(10.0), "10000", "N/A"),
        ]
    }

    const FULL: OutputSchema = OutputSchema {
        gdp: true,
        population_at_risk: true,
    };

    #[test]
    fn test_build_report_drops_rows_without_percentage() {
        let report = build_report(&fixture(), FULL, 2);
        assert_eq!(report.municipalities, 5);
        assert_eq!(report.analysed, 4);

        let pct = report.percentage.unwrap();
        assert_eq!(pct.count, 4);
        assert_eq!(pct.mean, 17.5);
        assert_eq!(pct.median, 15.0);
        assert_eq!(pct.mode, 10.0);
        assert_eq!(pct.max, 30.0);
    }

    #[test]
    fn test_build_report_rankings() {
        let report = build_report(&fixture(), FULL, 2);

        let names = |ranked: &[RankedMunicipality]| -> Vec<String> {
            ranked.iter().map(|r| r.municipality.clone()).collect()
        };
        assert_eq!(names(&report.percentage_rankings.highest), ["Bravo", "Delta"]);
        assert_eq!(names(&report.percentage_rankings.lowest), ["Alfa", "Echo"]);

        // Delta's unavailable GDP counts as zero
        let gdp = report.gdp_rankings.unwrap();
        assert_eq!(names(&gdp.highest), ["Bravo", "Echo"]);
        assert_eq!(names(&gdp.lowest), ["Delta", "Alfa"]);
        assert_eq!(gdp.lowest[0].value, 0.0);

        // zero and unavailable risk are not ranked; Charlie was dropped earlier
        let risk = report.risk_rankings.unwrap();
        assert_eq!(names(&risk.highest), ["Bravo", "Delta"]);
        assert_eq!(names(&risk.lowest), ["Delta", "Bravo"]);

        assert_eq!(report.gdp_thousands.unwrap().max, 15.0);
    }

    #[test]
    fn test_build_report_correlations() {
        let report = build_report(&fixture(), FULL, 10);
        let matrix = &report.correlation;
        assert_eq!(
            matrix.columns,
            ["AttendedCount", "Population", "AttendancePercentage", "GDP"]
        );
        for (i, row) in matrix.values.iter().enumerate() {
            assert_eq!(row.len(), 4);
            let diagonal = row[i].unwrap();
            assert!((diagonal - 1.0).abs() < 1e-9);
        }
        assert_eq!(matrix.values[0][3], report.gdp_vs_attended);
        assert_eq!(matrix.values[2][3], report.gdp_vs_percentage);
        assert!(report.risk_vs_attended.is_some());
    }

    #[test]
    fn test_build_report_without_optional_columns() {
        let rows: Vec<OutputRow> = fixture()
            .into_iter()
            .map(|r| OutputRow {
                gdp: None,
                population_at_risk: None,
                ..r
            })
            .collect();
        let report = build_report(&rows, OutputSchema::default(), DEFAULT_TOP_N);
        assert_eq!(report.correlation.columns.len(), 3);
        assert!(report.gdp_rankings.is_none());
        assert!(report.risk_rankings.is_none());
        assert!(report.gdp_thousands.is_none());
        assert_eq!(report.percentage_rankings.highest.len(), 4);
    }

    #[test]
    fn test_summarize_file_writes_json() -> Result<()> {
        let dir = tempdir()?;
        let table = dir.path().join("joined.csv");
        let json = dir.path().join("report.json");
        write_output(&table, &fixture(), FULL)?;

        let report = summarize_file(&table, &json, 3)?;
        assert_eq!(report.analysed, 4);

        let value: serde_json::Value = serde_json::from_reader(File::open(&json)?)?;
        assert_eq!(value["analysed"], 4);
        assert_eq!(value["percentage"]["median"], 15.0);
        assert_eq!(value["percentage_rankings"]["highest"][0]["municipality"], "Bravo");
        Ok(())
    }
}
