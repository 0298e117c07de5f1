//! Divergence report writer
//!
//! Layout:
//!
//! ```text
//! CALCTEST ID,TEST,DIFERENCES
//! <id>,,<diff text>          one row per divergent case
//! END,<elapsed>,,            summary row, four fields
//! ```

use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CompareError, CompareResult};

/// Header row of every report
const REPORT_HEADER: [&str; 3] = ["CALCTEST ID", "TEST", "DIFERENCES"];

/// First field of the summary row
const END_MARKER: &str = "END";

/// Tag written in the TEST column for cases that failed under keep-going
const ERROR_TAG: &str = "ERROR";

/// Derive the report path from the input path
///
/// A trailing `.csv` becomes `-out.csv`. Otherwise the first `.csv` is
/// replaced, and a path without `.csv` gets `-out.csv` appended.
pub fn derive_output_path(input: impl AsRef<Path>) -> PathBuf {
    let input = input.as_ref().to_string_lossy();

    let output = if let Some(stem) = input.strip_suffix(".csv") {
        format!("{stem}-out.csv")
    } else if input.contains(".csv") {
        input.replacen(".csv", "-out.csv", 1)
    } else {
        format!("{input}-out.csv")
    };

    PathBuf::from(output)
}

/// Report sink owned by the aggregator
pub struct ReportWriter<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

impl ReportWriter<File> {
    /// Create (or truncate) the report file
    pub fn create(path: impl AsRef<Path>) -> CompareResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| CompareError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Writing report to {}", path.display());
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        // The summary row has four fields against a three-field header
        let writer = WriterBuilder::new().flexible(true).from_writer(inner);
        Self { writer, rows: 0 }
    }

    /// Rows written so far, header included
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn write_header(&mut self) -> CompareResult<()> {
        self.write_record(&REPORT_HEADER)
    }

    pub fn write_divergence(&mut self, case_id: &str, diff_text: &str) -> CompareResult<()> {
        self.write_record(&[case_id, "", diff_text])
    }

    pub fn write_failure(&mut self, case_id: &str, message: &str) -> CompareResult<()> {
        self.write_record(&[case_id, ERROR_TAG, message])
    }

    pub fn write_summary(&mut self, elapsed: &str) -> CompareResult<()> {
        self.write_record(&[END_MARKER, elapsed, "", ""])
    }

    pub fn flush(&mut self) -> CompareResult<()> {
        self.writer.flush().map_err(|e| CompareError::Report(e.into()))
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> CompareResult<W> {
        self.flush()?;
        self.writer.into_inner().map_err(|e| {
            let err = std::io::Error::new(e.error().kind(), e.error().to_string());
            CompareError::Report(err.into())
        })
    }

    fn write_record(&mut self, record: &[&str]) -> CompareResult<()> {
        self.writer.write_record(record)?;
        self.rows += 1;
        Ok(())
    }
}
