//! Case file loader
//!
//! The first row is a header and is skipped without inspection. Every
//! following row needs at least three columns: id, input, expected.

use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CompareError, CompareResult};
use crate::models::TestCase;

/// Minimum number of columns in a data row
const MIN_COLUMNS: usize = 3;

/// Loader for comma-separated case files
#[derive(Clone, Debug)]
pub struct CaseLoader {
    delimiter: u8,
}

impl CaseLoader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Load all cases from a file
    pub fn load(&self, path: impl AsRef<Path>) -> CompareResult<Vec<TestCase>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CompareError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let cases = self.load_from_reader(file)?;
        info!("Loaded {} test cases from {}", cases.len(), path.display());
        Ok(cases)
    }

    /// Load all cases from any reader
    pub fn load_from_reader<R: Read>(&self, reader: R) -> CompareResult<Vec<TestCase>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let mut cases = Vec::new();

        for record in reader.records() {
            let record = record.map_err(|e| CompareError::Parse(e.to_string()))?;
            cases.push(Self::to_case(&record)?);
        }

        Ok(cases)
    }

    fn to_case(record: &StringRecord) -> CompareResult<TestCase> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() < MIN_COLUMNS {
            return Err(CompareError::Parse(format!(
                "line {line}: expected at least {MIN_COLUMNS} columns, found {}",
                record.len()
            )));
        }

        if record.len() > MIN_COLUMNS {
            debug!("line {}: ignoring {} extra columns", line, record.len() - MIN_COLUMNS);
        }

        Ok(TestCase::new(&record[0], &record[1], &record[2]))
    }
}

impl Default for CaseLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load cases from a comma-separated file
pub fn load_cases(path: impl AsRef<Path>) -> CompareResult<Vec<TestCase>> {
    CaseLoader::new().load(path)
}
