//! Error types for ntuple assembly

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NtupleError {
    #[error("Column misaligned in template '{template}': column '{column}' has {got} entries, expected {expected}")]
    ColumnMisaligned {
        template: String,
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("Schema mismatch for column '{column}': {detail}")]
    SchemaMismatch { column: String, detail: String },

    #[error("Committed row is missing registered column '{0}'")]
    MissingColumn(String),

    #[error("Committed row carries unregistered column '{0}'")]
    UnknownColumn(String),

    #[error("Schema already registered")]
    SchemaAlreadyRegistered,

    #[error("Commit before schema registration")]
    SchemaNotRegistered,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NtupleResult<T> = Result<T, NtupleError>;
