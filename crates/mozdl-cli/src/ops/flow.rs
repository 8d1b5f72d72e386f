//! Fetch Flow Typestate Pattern
//!
//! Models the fetch pipeline as a series of explicit state transitions:
//!
//! ```text
//! FetchPlan --[check_existing()]--> PendingFetch --[resolve()]--> ResolvedFetch
//!           \                                                          |
//!            `--> AlreadyPresent                                 [download()]
//!                                                                      v
//!                             FetchOutcome <--[extract()]-- DownloadedFetch
//! ```
//!
//! Each stage owns what the previous one produced, so an archive can only be
//! extracted after it was downloaded and nothing touches the network once the
//! destination is known to hold the product.
//!
//! # Usage
//!
//! ```ignore
//! use crate::ops::flow::{Existing, FetchPlan};
//!
//! let pending = match FetchPlan::new(&selectors).check_existing(&ctx).await? {
//!     Existing::Present { folder } => return Ok(FetchOutcome::AlreadyPresent { folder }),
//!     Existing::Missing(pending) => pending,
//! };
//! let outcome = pending.resolve(&ctx).await?.download(&ctx).await?.extract(&ctx).await?;
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use mozdl_core::io::download::{DownloadRequest, DownloadedArchive};
use mozdl_core::io::extract::{ExtractRequest, extract};
use mozdl_core::Reporter;
use mozdl_schema::{ArtifactReference, Product, Selectors, extraction_filetype};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::ops::{Context, FetchError};
use crate::ui::progress::format_size;

/// Pipeline stage, as shown to the user. A failure in any stage ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    CheckExisting,
    Resolving,
    Downloading,
    Extracting,
    Done,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CheckExisting => "Checking destination",
            Self::Resolving => "Resolving",
            Self::Downloading => "Downloading",
            Self::Extracting => "Extracting",
            Self::Done => "Done",
        };
        f.write_str(label)
    }
}

/// How a successful fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The destination already holds the product folder; nothing was fetched.
    AlreadyPresent { folder: PathBuf },
    /// A build was downloaded and unpacked.
    Installed {
        artifact: ArtifactReference,
        /// Number of entries written
        files: usize,
        /// Size of the downloaded archive
        bytes: u64,
        /// Hex SHA-256 of the downloaded archive
        sha256: String,
        /// Where the archive was kept, with `keep_archive`
        archive: Option<PathBuf>,
    },
}

/// State 1: selectors, nothing checked yet.
#[derive(Debug)]
pub struct FetchPlan<'a> {
    selectors: &'a Selectors,
}

/// Result of the destination check.
#[derive(Debug)]
pub enum Existing<'a> {
    Present { folder: PathBuf },
    Missing(PendingFetch<'a>),
}

/// State 2: the destination needs a build and the extraction filetype is known.
#[derive(Debug)]
pub struct PendingFetch<'a> {
    selectors: &'a Selectors,
    filetype: String,
}

/// State 3: the index named a concrete artifact.
#[derive(Debug)]
pub struct ResolvedFetch<'a> {
    selectors: &'a Selectors,
    filetype: String,
    artifact: ArtifactReference,
}

/// State 4: the archive is on disk.
///
/// Dropping this value deletes the archive.
#[derive(Debug)]
pub struct DownloadedFetch<'a> {
    selectors: &'a Selectors,
    filetype: String,
    artifact: ArtifactReference,
    archive: DownloadedArchive,
}

impl<'a> FetchPlan<'a> {
    pub fn new(selectors: &'a Selectors) -> Self {
        Self { selectors }
    }

    /// Look for the product folder in the destination.
    ///
    /// A destination that can't be listed counts as empty. When a fetch is
    /// needed the extraction filetype is settled here, so an unresolvable
    /// platform fails before any request is made.
    pub async fn check_existing(self, ctx: &Context) -> Result<Existing<'a>, FetchError> {
        ctx.reporter.phase(&FetchState::CheckExisting.to_string());

        if let Some(folder) =
            find_product_folder(&self.selectors.dest, &self.selectors.product, &*ctx.reporter)
                .await
        {
            return Ok(Existing::Present { folder });
        }

        let filetype = extraction_filetype(self.selectors)?;
        debug!(%filetype, "destination needs a build");
        Ok(Existing::Missing(PendingFetch {
            selectors: self.selectors,
            filetype,
        }))
    }
}

impl<'a> PendingFetch<'a> {
    /// Ask the build index for the latest matching artifact.
    pub async fn resolve(self, ctx: &Context) -> Result<ResolvedFetch<'a>, FetchError> {
        ctx.reporter.phase(&FetchState::Resolving.to_string());
        let artifact = ctx.index.resolve(self.selectors).await?;
        ctx.reporter.info(&format!("Found {}", artifact.name));

        Ok(ResolvedFetch {
            selectors: self.selectors,
            filetype: self.filetype,
            artifact,
        })
    }
}

impl<'a> ResolvedFetch<'a> {
    /// Stream the artifact into a temporary file.
    pub async fn download(self, ctx: &Context) -> Result<DownloadedFetch<'a>, FetchError> {
        ctx.reporter.phase(&FetchState::Downloading.to_string());

        let mut request =
            DownloadRequest::new(&ctx.client, &self.artifact.url, &*ctx.reporter);
        if let Some(dir) = ctx.download_dir.as_deref() {
            request = request.in_dir(dir);
        }
        let archive = request.execute().await?;

        Ok(DownloadedFetch {
            selectors: self.selectors,
            filetype: self.filetype,
            artifact: self.artifact,
            archive,
        })
    }
}

impl DownloadedFetch<'_> {
    pub fn archive_path(&self) -> &Path {
        self.archive.path()
    }

    /// Unpack into the destination, then drop or keep the archive.
    ///
    /// The archive is deleted when extraction fails, whatever `keep_archive` says.
    pub async fn extract(self, ctx: &Context) -> Result<FetchOutcome, FetchError> {
        ctx.reporter.phase(&FetchState::Extracting.to_string());

        let request = ExtractRequest {
            source: self.archive.path(),
            dest: &self.selectors.dest,
            product: &self.selectors.product,
            filetype: &self.filetype,
        };
        let files = extract(request, &*ctx.reporter).await?;
        let bytes = self.archive.bytes();
        let sha256 = self.archive.sha256().to_string();

        let archive = if ctx.keep_archive {
            let kept = self.archive.keep().map_err(FetchError::KeepArchive)?;
            info!(path = %kept.display(), "kept archive");
            Some(kept)
        } else {
            None
        };

        Ok(FetchOutcome::Installed {
            artifact: self.artifact,
            files: files.len(),
            bytes,
            sha256,
            archive,
        })
    }
}

/// Fetch the build named by `selectors` into its destination.
///
/// # Errors
///
/// The first failing stage ends the run; see [`FetchError`].
pub async fn run(selectors: &Selectors, ctx: &Context) -> Result<FetchOutcome, FetchError> {
    let span = info_span!(
        "fetch",
        product = %selectors.product,
        os = %selectors.os,
        branch = %selectors.branch
    );

    async {
        let mut state = FetchState::CheckExisting;
        let result = drive(selectors, ctx, &mut state).await;

        match &result {
            Ok(outcome) => ctx.reporter.done(&describe(outcome, selectors)),
            Err(e) => {
                debug!(%state, "fetch failed: {e}");
                ctx.reporter.failed(&format!("{state} failed"));
            }
        }
        result
    }
    .instrument(span)
    .await
}

async fn drive(
    selectors: &Selectors,
    ctx: &Context,
    state: &mut FetchState,
) -> Result<FetchOutcome, FetchError> {
    let pending = match FetchPlan::new(selectors).check_existing(ctx).await? {
        Existing::Present { folder } => {
            info!(folder = %folder.display(), "destination already populated");
            *state = FetchState::Done;
            return Ok(FetchOutcome::AlreadyPresent { folder });
        }
        Existing::Missing(pending) => pending,
    };

    *state = FetchState::Resolving;
    let resolved = pending.resolve(ctx).await?;

    *state = FetchState::Downloading;
    let downloaded = resolved.download(ctx).await?;
    debug!(path = %downloaded.archive_path().display(), "archive downloaded");

    *state = FetchState::Extracting;
    let outcome = downloaded.extract(ctx).await?;

    *state = FetchState::Done;
    Ok(outcome)
}

fn describe(outcome: &FetchOutcome, selectors: &Selectors) -> String {
    match outcome {
        FetchOutcome::AlreadyPresent { folder } => {
            format!("{} already present in {}", selectors.product, folder.display())
        }
        FetchOutcome::Installed {
            artifact,
            files,
            bytes,
            sha256,
            ..
        } => format!(
            "Unpacked {} ({}, sha256 {sha256}, {files} entries) into {}",
            artifact.file_name(),
            format_size(*bytes),
            selectors.dest.display()
        ),
    }
}

/// Path of the product's folder inside `dest`, if `dest` lists one.
///
/// Only existence is checked. Products without a folder never match, and
/// listing errors count as "not present" (`NotFound` silently, others with
/// a warning through `reporter`).
pub async fn find_product_folder(
    dest: &Path,
    product: &Product,
    reporter: &dyn Reporter,
) -> Option<PathBuf> {
    let folder = product.folder_name()?;

    let mut entries = match tokio::fs::read_dir(dest).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            unreadable_destination(dest, &e, reporter);
            return None;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                if entry.file_name().to_str() == Some(folder) {
                    return Some(entry.path());
                }
            }
            Ok(None) => return None,
            Err(e) => {
                unreadable_destination(dest, &e, reporter);
                return None;
            }
        }
    }
}

fn unreadable_destination(dest: &Path, err: &io::Error, reporter: &dyn Reporter) {
    warn!(dest = %dest.display(), "cannot list destination: {err}");
    reporter.warning(&format!(
        "Cannot list {} ({err}); fetching anyway",
        dest.display()
    ));
}
