//! Errors that end a fetch

use mozdl_core::ResolveError;
use mozdl_core::io::download::DownloadError;
use mozdl_core::io::extract::ExtractError;
use mozdl_schema::BuildInfoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to resolve build: {0}")]
    Resolution(ResolveError),

    #[error("{0}")]
    UnknownFiletype(#[from] BuildInfoError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Failed to keep archive: {0}")]
    KeepArchive(#[source] std::io::Error),

    #[error("Failed to set up HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<ResolveError> for FetchError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnknownFiletype(e) => Self::UnknownFiletype(e),
            other => Self::Resolution(other),
        }
    }
}
