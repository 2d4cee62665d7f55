use crate::delta::DeltaError;
use std::io;
use thiserror::Error;

/// Errors raised while writing or reading replay records
#[derive(Debug, Error)]
pub enum SerializerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid magic bytes (expected b\"ARNA\")")]
    InvalidMagic,

    #[error("unsupported format version {found}")]
    UnsupportedVersion { found: u8 },

    #[error("unknown record tag {tag}")]
    UnknownRecordTag { tag: u8 },

    #[error("malformed record: {detail}")]
    MalformedRecord { detail: String },

    #[error("refusing to write an invalid round: {0}")]
    InvalidDelta(#[from] DeltaError),

    #[error("serializer has no output stream")]
    MissingOutput,

    #[error("serializer has no input stream")]
    MissingInput,
}
