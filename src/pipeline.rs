use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{info, warn};

use crate::{
    aggregate::count_by_municipality,
    config::PipelineConfig,
    join::{join, AuxiliaryTables, OutputRow},
    output::{write_output, OutputSchema},
    sources::{read_attendance, read_source_table},
};

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub schema: OutputSchema,
    pub rows: Vec<OutputRow>,
}

/// Load every configured source and build the joined rows, without writing them.
pub fn build_rows(config: &PipelineConfig) -> Result<RunSummary> {
    let records = read_attendance(
        &config.attendance.path,
        &config.attendance.municipality_column,
    )?;
    let counts = count_by_municipality(&records);
    if counts.is_empty() {
        warn!(
            path = %config.attendance.path.display(),
            "no attendance records with a municipality, output will be empty"
        );
    }

    let tables = AuxiliaryTables {
        population: read_source_table(&config.population).context("loading population")?,
        gdp: config
            .gdp
            .as_ref()
            .map(read_source_table)
            .transpose()
            .context("loading GDP")?,
        risk: config
            .risk
            .as_ref()
            .map(read_source_table)
            .transpose()
            .context("loading population at risk")?,
    };
    if tables.population.is_empty() {
        warn!(
            path = %config.population.path.display(),
            "population table is empty, every percentage will be N/A"
        );
    }
    let schema = OutputSchema {
        gdp: tables.gdp.is_some(),
        population_at_risk: tables.risk.is_some(),
    };

    Ok(RunSummary {
        records: records.len(),
        schema,
        rows: join(&counts, &tables),
    })
}

/// read → normalize → aggregate → join → write, as one pass.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let start = Instant::now();
    let summary = build_rows(config)?;
    write_output(&config.output, &summary.rows, summary.schema)?;
    info!(
        records = summary.records,
        municipalities = summary.rows.len(),
        output = %config.output.display(),
        elapsed = ?start.elapsed(),
        "join finished"
    );
    Ok(summary)
}
