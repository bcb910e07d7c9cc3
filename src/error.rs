use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovmergeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid source filter: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No coverage reports found")]
    NoReports,
}

impl CovmergeError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        CovmergeError::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CovmergeError>;
