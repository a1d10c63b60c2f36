use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a supported file could not yield a timestamp.
///
/// Missing metadata is not represented here: extractors return `Ok(None)` for
/// that case and the file is skipped.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "malformed DateTimeOriginal {value:?}{} in {}: {source}",
        offset.as_deref().map(|o| format!(" with offset {o:?}")).unwrap_or_default(),
        path.display()
    )]
    MalformedTimestamp {
        path: PathBuf,
        value: String,
        offset: Option<String>,
        #[source]
        source: chrono::ParseError,
    },
}

impl ExtractError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ExtractError::Io { path, .. } | ExtractError::MalformedTimestamp { path, .. } => path,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("date format is empty")]
    Empty,
    #[error("date format contains an unsupported specifier: {0}")]
    InvalidSpecifier(String),
}
