//! Shared fetch context.
//!
//! Groups the handles every pipeline stage needs so they are passed around
//! as one reference.

use mozdl_core::{IndexClient, IndexConfig, Reporter};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::ops::FetchError;

/// Groups common state used during a fetch.
#[derive(Clone)]
pub struct Context {
    pub client: reqwest::Client,
    pub index: IndexClient,
    pub reporter: Arc<dyn Reporter>,
    /// Where the archive is downloaded to; the system temp directory when unset
    pub download_dir: Option<PathBuf>,
    /// Keep the archive after a successful extraction
    pub keep_archive: bool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("index", self.index.config())
            .field("download_dir", &self.download_dir)
            .field("keep_archive", &self.keep_archive)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build a context with the shared HTTP client.
    pub fn new(config: IndexConfig, reporter: Arc<dyn Reporter>) -> Result<Self, FetchError> {
        let client = mozdl_core::http_client()?;
        Ok(Self {
            index: IndexClient::new(client.clone(), config),
            client,
            reporter,
            download_dir: None,
            keep_archive: false,
        })
    }

    pub fn with_download_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.download_dir = dir;
        self
    }

    pub fn with_keep_archive(mut self, keep: bool) -> Self {
        self.keep_archive = keep;
        self
    }
}
