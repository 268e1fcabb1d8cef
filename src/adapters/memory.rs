use crate::domain::ports::{RawCell, ReferenceRows};
use crate::utils::error::Result;

/// Fixed reference rows held in memory. The first row is the header.
#[derive(Debug, Clone)]
pub struct InMemoryRows {
    source_id: String,
    rows: Vec<RawCell>,
}

impl InMemoryRows {
    pub fn new(source_id: impl Into<String>, rows: Vec<RawCell>) -> Self {
        Self {
            source_id: source_id.into(),
            rows,
        }
    }

    pub fn with_header<I, S>(source_id: impl Into<String>, header: &str, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = std::iter::once(RawCell::from(header))
            .chain(codes.into_iter().map(|code| RawCell::Text(code.into())))
            .collect();
        Self::new(source_id, rows)
    }
}

impl ReferenceRows for InMemoryRows {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn read_rows(&self) -> Result<Vec<RawCell>> {
        Ok(self.rows.clone())
    }
}
