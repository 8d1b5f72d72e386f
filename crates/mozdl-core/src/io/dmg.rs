//! DMG handling via hdiutil, with a 7z fallback where hdiutil is missing

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::{debug, warn};

use super::extract::{ExtractError, ExtractedFile, Progress};

/// Represents a mounted DMG. Dropping this struct will detach the volume.
#[derive(Debug)]
pub struct MountPoint {
    pub path: PathBuf,
    _dir: TempDir,
}

impl Drop for MountPoint {
    fn drop(&mut self) {
        if let Err(e) = detach(&self.path) {
            warn!(mount = %self.path.display(), "{e}");
        }
    }
}

/// Attach a DMG file read-only on a private mount point
pub fn attach(dmg_path: &Path) -> Result<MountPoint, ExtractError> {
    if !dmg_path.exists() {
        return Err(ExtractError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("disk image not found: {}", dmg_path.display()),
        )));
    }

    let dir = tempfile::Builder::new().prefix("mozdl-mnt-").tempdir()?;
    let output = Command::new("hdiutil")
        .arg("attach")
        .arg("-nobrowse")
        .arg("-readonly")
        .arg("-noautoopen")
        .arg("-mountpoint")
        .arg(dir.path())
        .arg(dmg_path)
        .output()?;

    if !output.status.success() {
        return Err(ExtractError::Archive(format!(
            "hdiutil attach failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    debug!(mount = %dir.path().display(), "attached disk image");
    Ok(MountPoint {
        path: dir.path().to_path_buf(),
        _dir: dir,
    })
}

/// Detach a volume
pub fn detach(mount_point: &Path) -> Result<(), ExtractError> {
    // The volume can stay busy for a moment after the copy finishes
    for _ in 0..3 {
        let status = Command::new("hdiutil")
            .arg("detach")
            .arg(mount_point)
            .arg("-force")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        if status.is_ok_and(|s| s.success()) {
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_millis(500));
    }

    Err(ExtractError::Archive(format!(
        "Failed to detach {}",
        mount_point.display()
    )))
}

/// Expand a DMG with 7-Zip into `out_dir`, for hosts without hdiutil.
pub fn expand_with_7z(sevenz: &Path, dmg_path: &Path, out_dir: &Path) -> Result<(), ExtractError> {
    let mut out_arg = std::ffi::OsString::from("-o");
    out_arg.push(out_dir);

    let output = Command::new(sevenz)
        .arg("x")
        .arg("-y")
        .arg(out_arg)
        .arg(dmg_path)
        .stdout(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(ExtractError::Archive(format!(
            "7z extraction failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// Unpack a disk image into `dest/<folder>` (or `dest` without a folder).
///
/// The image is mounted with hdiutil when available; otherwise it is
/// expanded with 7z into a scratch directory.
pub fn extract_dmg(
    dmg_path: &Path,
    dest: &Path,
    folder: Option<&str>,
    progress: Progress<'_>,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let target = folder.map_or_else(|| dest.to_path_buf(), |f| dest.join(f));

    if which::which("hdiutil").is_ok() {
        let mount = attach(dmg_path)?;
        return copy_volume(&mount.path, dest, &target, progress);
    }

    let sevenz = which::which("7z")
        .or_else(|_| which::which("7zz"))
        .map_err(|_| {
            ExtractError::Archive(
                "No disk image tool found (need hdiutil or 7z on PATH)".to_string(),
            )
        })?;
    let scratch = tempfile::Builder::new().prefix("mozdl-dmg-").tempdir()?;
    expand_with_7z(&sevenz, dmg_path, scratch.path())?;
    copy_volume(scratch.path(), dest, &target, progress)
}

/// Copy the useful contents of a volume into `target`.
///
/// Application bundles are copied when the volume has any; otherwise every
/// visible top-level entry is. Symlinks (such as the `Applications` alias)
/// are skipped.
fn copy_volume(
    volume: &Path,
    dest: &Path,
    target: &Path,
    progress: Progress<'_>,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let mut sources = find_app_bundles(volume);
    if sources.is_empty() {
        sources = visible_entries(volume)?;
    }
    if sources.is_empty() {
        return Err(ExtractError::Archive(format!(
            "Disk image volume is empty: {}",
            volume.display()
        )));
    }

    fs::create_dir_all(target)?;
    let total = sources.len() as u64;
    let mut extracted_files = Vec::new();

    for (i, source) in sources.iter().enumerate() {
        let Some(name) = source.file_name() else {
            continue;
        };
        let absolute_path = target.join(name);

        if source.is_dir() {
            if absolute_path.exists() {
                fs::remove_dir_all(&absolute_path)?;
            }
            fs_extra::dir::copy(
                source,
                target,
                &fs_extra::dir::CopyOptions::new().overwrite(true),
            )
            .map_err(|e| ExtractError::Archive(format!("Copy failed: {e}")))?;
        } else {
            fs::copy(source, &absolute_path)?;
        }
        progress(i as u64 + 1, Some(total));

        extracted_files.push(ExtractedFile {
            relative_path: absolute_path
                .strip_prefix(dest)
                .map_or_else(|_| absolute_path.clone(), Path::to_path_buf),
            is_executable: false,
            absolute_path,
        });
    }

    Ok(extracted_files)
}

/// `.app` bundles up to three levels below `root`, hidden entries skipped.
fn find_app_bundles(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut walker = walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(3)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else { continue };
        if entry.file_name().to_string_lossy().starts_with('.') {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }
        if entry.file_type().is_dir() && entry.path().extension().is_some_and(|e| e == "app") {
            found.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    found
}

fn visible_entries(root: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if entry.file_type()?.is_symlink() {
            continue;
        }
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}
