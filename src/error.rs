use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for the extraction pipeline.
///
/// Only `MalformedDocument` and input-side `Io` abort a whole run; everything
/// else is recorded per section and the run continues.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The input text cannot be parsed as HTML at all.
    #[error("input is not parseable as HTML: {0}")]
    MalformedDocument(String),

    /// A section heading, or the table following it, is absent.
    #[error("section '{0}' not found")]
    SectionNotFound(&'static str),

    /// A cell's text does not match the expected pattern.
    #[error("field {value:?} does not match expected {expected}")]
    FieldFormat {
        value: String,
        expected: &'static str,
    },

    /// Cannot read the input document or write/read an artifact.
    #[error("i/o failure on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A serialized artifact is not valid JSON of the expected shape.
    #[error("malformed artifact: {0}")]
    Artifact(#[from] serde_json::Error),
}

impl ExtractError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn field(value: impl Into<String>, expected: &'static str) -> Self {
        Self::FieldFormat {
            value: value.into(),
            expected,
        }
    }
}
