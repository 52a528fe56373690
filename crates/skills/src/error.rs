use std::path::{Path, PathBuf};

use {skillpack_common::FromMessage, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    /// The catalog root does not exist or is not a directory. Fatal for a run.
    #[error("catalog root not found: {}", path.display())]
    CatalogNotFound { path: PathBuf },

    #[error("invalid skill definition in {}: {reason}", path.display())]
    InvalidMetadata { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn catalog_not_found(path: &Path) -> Self {
        Self::CatalogNotFound {
            path: path.to_path_buf(),
        }
    }

    #[must_use]
    pub fn invalid_metadata(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

skillpack_common::impl_context!();
