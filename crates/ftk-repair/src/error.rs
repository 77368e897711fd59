//! Error types for ftk-repair

use ftk_model::ModelError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepairError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepairError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("invalid options: {0}")]
    InvalidOptions(String),
}
