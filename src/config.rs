use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

pub const DEFAULT_MUNICIPALITY_COLUMN: &str = "MUNICÍPIO";

fn default_municipality_column() -> String {
    DEFAULT_MUNICIPALITY_COLUMN.to_string()
}

/// The per-record attendance file. Only the municipality column is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSource {
    pub path: PathBuf,
    #[serde(default = "default_municipality_column")]
    pub municipality_column: String,
}

/// A per-municipality file contributing a single value column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSource {
    pub path: PathBuf,
    #[serde(default = "default_municipality_column")]
    pub key_column: String,
    pub value_column: String,
    /// Placeholder that means "no data" in this source (matched after trimming).
    #[serde(default)]
    pub sentinel: Option<String>,
}

impl TableSource {
    pub fn new(path: impl Into<PathBuf>, key_column: &str, value_column: &str) -> Self {
        Self {
            path: path.into(),
            key_column: key_column.to_string(),
            value_column: value_column.to_string(),
            sentinel: None,
        }
    }

    pub fn with_sentinel(mut self, sentinel: &str) -> Self {
        self.sentinel = Some(sentinel.to_string());
        self
    }
}

/// Where every input lives and where the joined table goes.
///
/// ```yaml
/// attendance:
///   path: DADOS.txt
/// population:
///   path: OUTRO_DADOS_SEM_ASPAS.csv
///   value_column: TOTAL
/// risk:
///   path: risco.csv
///   value_column: POPULACAO_EXPOSTA
///   sentinel: "99999999"
/// output: pessoas_por_municipio.csv
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub attendance: AttendanceSource,
    pub population: TableSource,
    #[serde(default)]
    pub gdp: Option<TableSource>,
    #[serde(default)]
    pub risk: Option<TableSource>,
    pub output: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            attendance: AttendanceSource {
                path: PathBuf::from("DADOS.txt"),
                municipality_column: default_municipality_column(),
            },
            population: TableSource::new(
                "OUTRO_DADOS_SEM_ASPAS.csv",
                DEFAULT_MUNICIPALITY_COLUMN,
                "TOTAL",
            ),
            gdp: None,
            risk: None,
            output: PathBuf::from("pessoas_por_municipio.csv"),
        }
    }
}

impl PipelineConfig {
    /// Load a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening config file {}", path.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}
