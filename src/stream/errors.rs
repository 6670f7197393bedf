// Error types for stream selection

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    /// Sorting filter expression could not be parsed
    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),
}
