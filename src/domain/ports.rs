use crate::utils::error::Result;
use std::fmt;

/// One cell of the reference dataset, as handed over by the reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl RawCell {
    /// String form of the cell, trimmed. `None` for empty cells.
    ///
    /// Whole numbers keep a trailing `.0`, the way spreadsheet readers render
    /// numeric cells; lookups tolerate that artifact.
    pub fn normalized(&self) -> Option<String> {
        let text = match self {
            RawCell::Empty => return None,
            RawCell::Text(value) => value.trim().to_string(),
            RawCell::Number(value) => render_number(*value),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCell::Empty => Ok(()),
            RawCell::Text(value) => f.write_str(value),
            RawCell::Number(value) => f.write_str(&render_number(*value)),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

/// Ordered rows of the commune reference dataset, header row first.
pub trait ReferenceRows: Send + Sync {
    /// Logical name of the dataset, used in logs and errors.
    fn source_id(&self) -> &str;

    fn read_rows(&self) -> Result<Vec<RawCell>>;
}

impl<T: ReferenceRows + ?Sized> ReferenceRows for std::sync::Arc<T> {
    fn source_id(&self) -> &str {
        (**self).source_id()
    }

    fn read_rows(&self) -> Result<Vec<RawCell>> {
        (**self).read_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_cells() {
        assert_eq!(RawCell::Empty.normalized(), None);
        assert_eq!(RawCell::from("  ").normalized(), None);
        assert_eq!(RawCell::from(" 75001 ").normalized(), Some("75001".to_string()));
        assert_eq!(RawCell::from(75056.0).normalized(), Some("75056.0".to_string()));
        assert_eq!(RawCell::from(12.5).normalized(), Some("12.5".to_string()));
    }
}
