use crate::{stage::sort::spill::SpillError, value::ValueKind};
use std::{io, path::PathBuf};
use thiserror::Error as ThisError;

///
/// Error
///
/// Runtime error surface for graph execution.
///
/// Errors are not recovered inside the engine: the first failure tears the
/// pipeline down and propagates to the caller of `run`. Records already
/// yielded to the caller stay consumed.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("input source not found: `{name}`")]
    SourceNotFound { name: String },

    #[error("record is missing field `{field}`")]
    MissingField { field: String },

    #[error("field `{field}` holds {found}, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: ValueKind,
    },

    #[error("parse failure: {message}")]
    Parse { message: String },

    #[error("{op} failed on {path}: {source}")]
    Io {
        path: PathBuf,
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Spill(#[from] SpillError),

    #[error("invariant violation: {message}")]
    Invariant { message: String },

    #[error("operator failure: {message}")]
    Operator { message: String },
}

impl Error {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn type_mismatch(field: impl Into<String>, expected: &'static str, found: ValueKind) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
            found,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            op,
            source,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    pub fn operator(message: impl Into<String>) -> Self {
        Self::Operator {
            message: message.into(),
        }
    }
}
