//! Error types for ftk-model

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("node {0} not found")]
    NodeNotFound(i32),

    #[error("element {0} not found")]
    ElementNotFound(i32),

    #[error("property {0} not found")]
    PropertyNotFound(i32),

    #[error("material {0} not found")]
    MaterialNotFound(i32),

    #[error("malformed element: {reason}")]
    MalformedElement { reason: String },

    #[error("malformed property: {reason}")]
    MalformedProperty { reason: String },

    #[error("malformed material: {reason}")]
    MalformedMaterial { reason: String },

    #[error("unknown property type '{0}'")]
    UnknownPropertyType(String),
}
