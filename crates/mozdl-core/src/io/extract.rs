//! Archive extraction module
//!
//! Handles zip, tar.bz2, tar.gz and disk images. The format is a closed set
//! ([`ArchiveFormat`]); anything else is rejected before touching the
//! destination.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use mozdl_schema::{ArchiveFormat, Product};
use thiserror::Error;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::Reporter;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Information about an extracted file
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path relative to extraction root
    pub relative_path: PathBuf,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
    /// Whether this is an executable
    pub is_executable: bool,
}

/// Progress callback: entries written so far and the total, if known.
pub type Progress<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// What to unpack and where.
#[derive(Debug, Clone, Copy)]
pub struct ExtractRequest<'a> {
    pub source: &'a Path,
    pub dest: &'a Path,
    pub product: &'a Product,
    /// Filetype token, e.g. "zip", ".tar.bz2" or "bz2"
    pub filetype: &'a str,
}

/// Unpack an archive into `dest`, dispatching on the requested filetype.
///
/// The archive work runs on the blocking pool; progress is forwarded to
/// `reporter` from the calling task. Extracting twice simply overwrites.
///
/// # Errors
///
/// Returns [`ExtractError::UnsupportedFormat`] for an unknown filetype and
/// [`ExtractError::Archive`] / [`ExtractError::Io`] for corrupt archives or
/// filesystem failures.
pub async fn extract<R: Reporter + ?Sized>(
    req: ExtractRequest<'_>,
    reporter: &R,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let format = ArchiveFormat::from_filetype(req.filetype)
        .ok_or_else(|| ExtractError::UnsupportedFormat(req.filetype.to_string()))?;
    info!(%format, source = %req.source.display(), dest = %req.dest.display(), "extracting");

    let source = req.source.to_path_buf();
    let dest = req.dest.to_path_buf();
    let folder = req.product.folder_name();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<(u64, Option<u64>)>();
    let handle = tokio::task::spawn_blocking(move || {
        let progress = move |current: u64, total: Option<u64>| {
            let _ = tx.send((current, total));
        };
        unpack(format, &source, &dest, folder, &progress)
    });

    while let Some((current, total)) = rx.recv().await {
        reporter.extracting(current, total);
    }

    let files = handle.await.map_err(io::Error::other)??;
    debug!(count = files.len(), "extraction complete");
    Ok(files)
}

/// Unpack `source` into `dest` with the strategy for `format`.
///
/// `folder` is the product's folder name; only disk images use it, since
/// their volumes do not carry the product folder themselves.
///
/// # Errors
///
/// See [`extract`].
pub fn unpack(
    format: ArchiveFormat,
    source: &Path,
    dest: &Path,
    folder: Option<&str>,
    progress: Progress<'_>,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    match format {
        ArchiveFormat::Zip => extract_zip(source, dest, progress),
        ArchiveFormat::TarBz2 => extract_tar_bz2(source, dest, progress),
        ArchiveFormat::TarGz => extract_tar_gz(source, dest, progress),
        ArchiveFormat::Dmg => crate::io::dmg::extract_dmg(source, dest, folder, progress),
    }
}

/// Extract a tar.bz2 archive to a destination directory
pub fn extract_tar_bz2(
    archive_path: &Path,
    dest_dir: &Path,
    progress: Progress<'_>,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let bz_decoder = bzip2::read::BzDecoder::new(reader);

    extract_tar(bz_decoder, dest_dir, progress)
}

/// Extract a tar.gz archive to a destination directory
pub fn extract_tar_gz(
    archive_path: &Path,
    dest_dir: &Path,
    progress: Progress<'_>,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let gz_decoder = flate2::read::GzDecoder::new(reader);

    extract_tar(gz_decoder, dest_dir, progress)
}

/// Extract a tar archive from a reader
fn extract_tar<R: Read>(
    reader: R,
    dest_dir: &Path,
    progress: Progress<'_>,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    let mut extracted_files = Vec::new();
    let mut written: u64 = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative_path = entry.path()?.into_owned();
        let is_dir = entry.header().entry_type().is_dir();

        // unpack_in refuses entries that would land outside dest_dir
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                relative_path.display()
            )));
        }

        written += 1;
        progress(written, None);

        if is_dir {
            continue;
        }

        // Check if executable (Unix mode has execute bit)
        let is_executable = entry
            .header()
            .mode()
            .map(|m| m & 0o111 != 0)
            .unwrap_or(false);

        extracted_files.push(ExtractedFile {
            absolute_path: dest_dir.join(&relative_path),
            relative_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}

/// Extract a zip archive
pub fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
    progress: Progress<'_>,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted_files = Vec::new();
    let total = archive.len() as u64;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        progress(i as u64 + 1, Some(total));

        let relative_path = match file.enclosed_name() {
            Some(path) => path.to_owned(),
            None => {
                return Err(ExtractError::Archive(format!(
                    "Invalid path in archive: {}",
                    file.name()
                )));
            }
        };

        if file.is_dir() {
            fs::create_dir_all(dest_dir.join(&relative_path))?;
            continue;
        }

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        let is_executable = if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
            mode & 0o111 != 0
        } else {
            false
        };
        #[cfg(not(unix))]
        let is_executable = false;

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}
