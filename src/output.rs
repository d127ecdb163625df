use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::info;

use crate::{
    join::{Metric, OutputRow, NOT_AVAILABLE},
    normalize::MunicipalityKey,
};

pub const COL_ID: &str = "ID";
pub const COL_MUNICIPALITY: &str = "Municipality";
pub const COL_ATTENDED: &str = "AttendedCount";
pub const COL_POPULATION: &str = "Population";
pub const COL_PERCENTAGE: &str = "AttendancePercentage";
pub const COL_GDP: &str = "GDP";
pub const COL_AT_RISK: &str = "PopulationAtRisk";

/// Which optional columns follow the five fixed ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputSchema {
    pub gdp: bool,
    pub population_at_risk: bool,
}

impl OutputSchema {
    pub fn header(&self) -> Vec<&'static str> {
        let mut cols = vec![
            COL_ID,
            COL_MUNICIPALITY,
            COL_ATTENDED,
            COL_POPULATION,
            COL_PERCENTAGE,
        ];
        if self.gdp {
            cols.push(COL_GDP);
        }
        if self.population_at_risk {
            cols.push(COL_AT_RISK);
        }
        cols
    }

    /// Recognise a header row written by [`write_output`].
    fn from_header(headers: &StringRecord, path: &Path) -> Result<Self> {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        let schema = Self {
            gdp: names.contains(&COL_GDP),
            population_at_risk: names.contains(&COL_AT_RISK),
        };
        if names != schema.header() {
            bail!(
                "unexpected header in {}: {:?} (expected {:?})",
                path.display(),
                names,
                schema.header()
            );
        }
        Ok(schema)
    }
}

/// `15.0%`, `12.35%` or `N/A`. Whole numbers keep one decimal digit.
pub fn format_percentage(percentage: Option<f64>) -> String {
    match percentage {
        Some(value) if value.fract() == 0.0 => format!("{:.1}%", value),
        Some(value) => format!("{}%", value),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Inverse of [`format_percentage`]; a trailing `%` is optional.
pub fn parse_percentage(text: &str) -> Result<Option<f64>> {
    let text = text.trim();
    if text == NOT_AVAILABLE {
        return Ok(None);
    }
    let number = text.strip_suffix('%').unwrap_or(text).trim();
    number
        .parse::<f64>()
        .map(Some)
        .with_context(|| format!("invalid percentage `{}`", text))
}

fn row_record(row: &OutputRow, schema: OutputSchema) -> Vec<String> {
    let mut record = vec![
        row.id.to_string(),
        row.municipality.to_string(),
        row.attended.to_string(),
        row.population.as_str().to_string(),
        format_percentage(row.percentage),
    ];
    let optional = |metric: &Option<Metric>| {
        metric
            .as_ref()
            .map_or(NOT_AVAILABLE, Metric::as_str)
            .to_string()
    };
    if schema.gdp {
        record.push(optional(&row.gdp));
    }
    if schema.population_at_risk {
        record.push(optional(&row.population_at_risk));
    }
    record
}

/// Write `rows` to `path` with the header for `schema`.
///
/// The file is written next to `path` first and renamed over it once complete,
/// so a failed run never leaves a truncated table behind.
#[tracing::instrument(level = "info", skip(path, rows), fields(path = %path.as_ref().display(), rows = rows.len()))]
pub fn write_output<P: AsRef<Path>>(
    path: P,
    rows: &[OutputRow],
    schema: OutputSchema,
) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = tmp_path_for(path);
    let file = File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);

    writer
        .write_record(schema.header())
        .context("writing header row")?;
    for row in rows {
        writer
            .write_record(row_record(row, schema))
            .with_context(|| format!("writing row {} ({})", row.id, row.municipality))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", tmp_path.display()))?;
    drop(writer);

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} -> {}", tmp_path.display(), path.display()))?;
    info!("wrote joined table");
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.csv".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Read a table produced by [`write_output`].
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_output<P: AsRef<Path>>(path: P) -> Result<(OutputSchema, Vec<OutputRow>)> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header row of {}", path.display()))?
        .clone();
    let schema = OutputSchema::from_header(&headers, path)?;

    let mut rows = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), line))?;
        let row = parse_row(&record, schema)
            .with_context(|| format!("malformed row {} in {}", line + 1, path.display()))?;
        rows.push(row);
    }
    Ok((schema, rows))
}

fn parse_row(record: &StringRecord, schema: OutputSchema) -> Result<OutputRow> {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    let id = field(0)
        .parse::<usize>()
        .with_context(|| format!("invalid ID `{}`", field(0)))?;
    let Some(municipality) = MunicipalityKey::new(field(1)) else {
        bail!("empty municipality");
    };
    let attended = field(2)
        .parse::<u64>()
        .with_context(|| format!("invalid attended count `{}`", field(2)))?;

    let mut next = 5;
    let mut optional = |present: bool| {
        present.then(|| {
            let metric = Metric::parse(field(next));
            next += 1;
            metric
        })
    };
    let gdp = optional(schema.gdp);
    let population_at_risk = optional(schema.population_at_risk);

    Ok(OutputRow {
        id,
        municipality,
        attended,
        population: Metric::parse(field(3)),
        percentage: parse_percentage(field(4))?,
        gdp,
        population_at_risk,
    })
}
