mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;

use super::domain::{BenchmarkRow, MonthlyProductivity, Provider};

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: u64, reason: String },
}

impl ImportError {
    pub(crate) fn row(line: u64, reason: impl Into<String>) -> Self {
        Self::Row {
            line,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read import file: {}", err),
            ImportError::Csv(err) => write!(f, "invalid CSV data: {}", err),
            ImportError::Row { line, reason } => write!(f, "line {}: {}", line, reason),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads the provider roster export.
pub struct ProviderImporter;

impl ProviderImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Provider>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Provider>, ImportError> {
        parser::parse_providers(reader)
    }
}

/// Reads market survey benchmarks, one row per specialty.
pub struct BenchmarkImporter;

impl BenchmarkImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<BenchmarkRow>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<BenchmarkRow>, ImportError> {
        parser::parse_benchmarks(reader)
    }
}

/// Reads the wide monthly wRVU sheet (`jan` through `dec` columns). Blank cells are
/// months without reported data and produce no entry.
pub struct ProductivityImporter;

impl ProductivityImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<MonthlyProductivity>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<MonthlyProductivity>, ImportError> {
        parser::parse_productivity(reader)
    }
}
