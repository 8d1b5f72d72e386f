//! Streaming artifact download.
//!
//! The response body is written chunk by chunk into a temporary file while
//! SHA256 and byte counts are computed on the fly. The temporary file is
//! owned by [`DownloadedArchive`] and deleted when that value is dropped,
//! so a failed or abandoned download never leaves a partial archive behind.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tempfile::TempPath;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::Reporter;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated download: expected {expected} bytes, got {actual}")]
    Truncated { expected: u64, actual: u64 },
}

/// A fully downloaded archive in a temporary file.
///
/// Dropping this value deletes the file; call [`keep`](Self::keep) to
/// persist it instead.
#[derive(Debug)]
pub struct DownloadedArchive {
    path: TempPath,
    file_name: String,
    bytes: u64,
    sha256: String,
}

impl DownloadedArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name taken from the download URL (e.g. "target.tar.bz2").
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Hex-encoded SHA256 of the received body.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Persist the file and return its path.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the temporary file can no longer be persisted.
    pub fn keep(self) -> std::io::Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }
}

/// Request for a download operation
pub struct DownloadRequest<'a, R: Reporter + ?Sized> {
    pub client: &'a Client,
    pub url: &'a str,
    pub reporter: &'a R,
    pub dir: Option<&'a Path>,
}

impl<'a, R: Reporter + ?Sized> DownloadRequest<'a, R> {
    pub fn new(client: &'a Client, url: &'a str, reporter: &'a R) -> Self {
        Self {
            client,
            url,
            reporter,
            dir: None,
        }
    }

    /// Place the temporary file in `dir` instead of the system temp directory.
    pub fn in_dir(mut self, dir: &'a Path) -> Self {
        self.dir = Some(dir);
        self
    }

    /// Execute the download.
    ///
    /// # Errors
    ///
    /// Fails with [`DownloadError::Http`] on transport errors,
    /// [`DownloadError::Status`] on a non-success response,
    /// [`DownloadError::Io`] when the file cannot be written and
    /// [`DownloadError::Truncated`] when the body is shorter or longer than
    /// the announced `Content-Length`. Nothing is retried.
    pub async fn execute(self) -> Result<DownloadedArchive, DownloadError> {
        let response = self.client.get(self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: self.url.to_string(),
                status,
            });
        }

        let total_size = response.content_length();
        self.reporter.downloading(0, total_size);

        let dir = self.dir.map_or_else(std::env::temp_dir, Path::to_path_buf);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = filename_from_url(response.url().as_str())
            .or_else(|| filename_from_url(self.url))
            .unwrap_or("artifact")
            .to_string();
        let (file, path) = tempfile::Builder::new()
            .prefix("mozdl-")
            .suffix(&format!("-{file_name}"))
            .tempfile_in(&dir)?
            .into_parts();
        debug!(path = %path.display(), "streaming to temporary file");

        // `path` deletes the file on any early return below.
        let mut file = File::from_std(file);
        let mut stream = response.bytes_stream();
        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    // A body cut short surfaces as a transport error
                    if let Some(expected) = total_size {
                        if downloaded < expected {
                            debug!("body ended early: {e}");
                            return Err(DownloadError::Truncated {
                                expected,
                                actual: downloaded,
                            });
                        }
                    }
                    return Err(e.into());
                }
            };
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
            self.reporter.downloading(downloaded, total_size);
        }

        file.flush().await?;
        drop(file);

        if let Some(expected) = total_size {
            if expected != downloaded {
                return Err(DownloadError::Truncated {
                    expected,
                    actual: downloaded,
                });
            }
        }

        let sha256 = hex::encode(hasher.finalize());
        info!(bytes = downloaded, %sha256, "download complete");

        Ok(DownloadedArchive {
            path,
            file_name,
            bytes: downloaded,
            sha256,
        })
    }
}

/// Extract the filename from a URL, ignoring any query string.
///
/// # Example
///
/// ```
/// use mozdl_core::io::download::filename_from_url;
///
/// assert_eq!(filename_from_url("https://example.com/path/to/file.tar.gz"), Some("file.tar.gz"));
/// assert_eq!(filename_from_url("https://example.com/file.zip?sig=abc"), Some("file.zip"));
/// assert_eq!(filename_from_url(""), None);
/// ```
pub fn filename_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
