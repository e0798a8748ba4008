use std::fmt;
use std::fmt::Formatter;

/// Failure of a whole ingestion call
///
/// Per-row parse failures are not represented here; they only drop the
/// affected row from the result.
#[derive(Debug)]
pub enum IngestionError {
    FileNotFound(String),
    MalformedHeader(String),
    EmptyAfterFiltering(String),
}

impl fmt::Display for IngestionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IngestionError::FileNotFound(e) => write!(f, "IngestionError::FileNotFound: {}", e),
            IngestionError::MalformedHeader(e) => write!(f, "IngestionError::MalformedHeader: {}", e),
            IngestionError::EmptyAfterFiltering(e) => write!(f, "IngestionError::EmptyAfterFiltering: {}", e),
        }
    }
}
