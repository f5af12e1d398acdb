use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::level::CatalogError;

/// Failures of the terminal front-end. The selection core itself has none.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal: {0}")]
    Terminal(#[from] io::Error),
    #[error("level catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
    #[error("could not read {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("saving progress to {path} failed: {source}")]
    SaveProgress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("logging setup: {0}")]
    Logging(String),
}
