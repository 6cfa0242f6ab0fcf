//! JSON file boundary for documents and change requests.
//!
//! # Responsibility
//! - Read input documents from disk into JSON trees.
//! - Write the resulting document back as pretty-printed JSON.
//!
//! # Invariants
//! - A missing input path is reported before any parse attempt.
//! - Output uses 4-space indentation and ends with a newline.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod file;

pub use file::{read_document_value, render_document_value, write_document_value};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Input path does not exist.
    MissingInput {
        parameter: &'static str,
        path: PathBuf,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInput { parameter, path } => write!(
                f,
                "{parameter} input not found at `{}`; provide the path to the {parameter} file (e.g. {parameter}.json)",
                path.display()
            ),
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "invalid JSON in `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingInput { .. } => None,
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}
