//! Error types for ftk-io

use ftk_inp::ParseError;
use ftk_model::ModelError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IoError {
    pub(crate) fn at(line: usize, message: impl Into<String>) -> Self {
        IoError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<ParseError> for IoError {
    fn from(err: ParseError) -> Self {
        IoError::Parse {
            line: err.line,
            message: err.message,
        }
    }
}
