use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use super::{cell, column_index, open_csv};

/// One row of the attendance file: a single person served, identified only by the
/// municipality as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub municipality: String,
}

impl RawRecord {
    pub fn new(municipality: impl Into<String>) -> Self {
        Self {
            municipality: municipality.into(),
        }
    }
}

/// Read every record of the attendance file, keeping only the `municipality_column`.
/// Rows where that cell is absent or blank are skipped.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_attendance<P: AsRef<Path>>(
    path: P,
    municipality_column: &str,
) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let mut rdr = open_csv(path)?;
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header row of {}", path.display()))?
        .clone();
    let idx = column_index(&headers, municipality_column, path)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), line))?;
        match cell(&record, idx) {
            Some(name) => records.push(RawRecord { municipality: name }),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "attendance rows without a municipality");
    }
    info!(records = records.len(), "loaded attendance records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_attendance_keeps_raw_names() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(
            tmp,
            "NOME,MUNICÍPIO,IDADE\n\
             Ana,  sao paulo ,31\n\
             Bia,Rio De Janeiro,40\n\
             Caio,,22\n\
             Davi\n\
             Eva,\"SAO PAULO\",19\n"
        )?;

        let records = read_attendance(tmp.path(), "MUNICÍPIO")?;
        assert_eq!(
            records,
            vec![
                RawRecord::new("sao paulo"),
                RawRecord::new("Rio De Janeiro"),
                RawRecord::new("SAO PAULO"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_read_attendance_missing_column_is_fatal() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "NOME,CIDADE\nAna,Recife")?;

        let err = read_attendance(tmp.path(), "MUNICÍPIO").unwrap_err();
        assert!(err.to_string().contains("column `MUNICÍPIO` not found"));
        Ok(())
    }

    #[test]
    fn test_read_attendance_missing_file_is_fatal() {
        assert!(read_attendance("/no/such/DADOS.txt", "MUNICÍPIO").is_err());
    }
}
