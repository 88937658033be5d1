//! Error taxonomy for container decoding and dataset encoding.
//!
//! Core modules return [`ConvertError`] directly; the CLI layer wraps it
//! with `anyhow` context. A failed numeric parse inside cell classification
//! is deliberately absent here: it is the text-fallback signal, not an
//! error.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// The selected entry has more than two dimensions.
    #[error("cannot handle arrays with more than two dimensions, received: {ndims}")]
    UnsupportedDimensionality { ndims: usize },

    /// The selected entry is not a numeric matrix, cell array, or char array.
    #[error("unhandled array type: {class}")]
    UnsupportedArrayKind { class: String },

    /// No entry matched the requested name (or the container was empty).
    #[error("failed to locate entry with name: '{name}'")]
    EntryNotFound { name: String },

    /// A cell under a numeric column could not be coerced to a number.
    #[error("column '{column}' is numeric but cell holds text '{value}'")]
    TypeMismatch { column: String, value: String },

    /// Refused to write a dataset with zero rows.
    #[error("no rows to save")]
    NoData,

    /// Batch and incremental calls were mixed on one loader/saver instance.
    #[error("incompatible mode: {reason}")]
    IncompatibleMode { reason: &'static str },

    /// The input source is missing or unreadable.
    #[error("source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    /// The container bytes are not a well-formed MAT-file.
    #[error("invalid container format: {reason}")]
    Format { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ConvertError {
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            reason: reason.into(),
        }
    }

    pub const fn incompatible_mode(reason: &'static str) -> Self {
        Self::IncompatibleMode { reason }
    }

    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = ConvertError::UnsupportedDimensionality { ndims: 3 };
        assert!(err.to_string().contains("more than two dimensions"));
        assert!(err.to_string().contains('3'));

        let err = ConvertError::entry_not_found("missing");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn io_errors_convert() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: ConvertError = io_err.into();
        assert!(matches!(err, ConvertError::Io(_)));
    }
}
