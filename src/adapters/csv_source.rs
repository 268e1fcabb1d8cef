use crate::domain::ports::{RawCell, ReferenceRows};
use crate::utils::error::{PortageError, Result};
use std::path::{Path, PathBuf};

/// Reads one column of a CSV export of the transport-rate table.
///
/// Header handling is left to the caller: every line, the header included,
/// comes back as a row.
#[derive(Debug, Clone)]
pub struct CsvReferenceSource {
    source_id: String,
    path: PathBuf,
    column: usize,
    delimiter: u8,
}

impl CsvReferenceSource {
    pub fn new(source_id: impl Into<String>, path: impl AsRef<Path>, column: usize) -> Self {
        Self {
            source_id: source_id.into(),
            path: path.as_ref().to_path_buf(),
            column,
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> PortageError {
        PortageError::ReferenceDataUnavailable {
            source_id: self.source_id.clone(),
            reason: format!("{}: {}", self.path.display(), reason),
        }
    }
}

impl ReferenceRows for CsvReferenceSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn read_rows(&self) -> Result<Vec<RawCell>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_path(&self.path)
            .map_err(|e| self.unavailable(e))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| self.unavailable(e))?;
            let cell = match record.get(self.column) {
                Some(value) if !value.trim().is_empty() => RawCell::Text(value.to_string()),
                _ => RawCell::Empty,
            };
            rows.push(cell);
        }

        tracing::debug!(
            "Read {} rows from column {} of {}",
            rows.len(),
            self.column,
            self.path.display()
        );
        Ok(rows)
    }
}
