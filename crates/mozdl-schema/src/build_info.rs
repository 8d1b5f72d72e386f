//! Archive filetype lookup for build platforms.
//!
//! Platform identifiers vary in their suffixes (`mac64`, `macosx64`,
//! `win32`, `win64-aarch64`, ...), so the table matches on substrings and
//! the first matching rule wins.

use crate::{ArchiveFormat, OsId, Product, Selectors};

/// Errors from the build-info lookup.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildInfoError {
    /// No rule matched the platform identifier.
    #[error("Unknown archive filetype for os '{os}' (product {product}); pass --os or --file-suffix")]
    UnknownFiletype {
        /// The platform identifier that failed to match.
        os: String,
        /// The product being looked up.
        product: String,
    },
}

/// Ordered `(pattern, format)` rules. Anything recognised that matches none
/// of them is a Linux-style build.
const FILETYPE_RULES: &[(&str, ArchiveFormat)] = &[
    ("win", ArchiveFormat::Zip),
    ("mac", ArchiveFormat::Dmg),
    ("osx", ArchiveFormat::Dmg),
];

const FALLBACK_FORMAT: ArchiveFormat = ArchiveFormat::TarBz2;

/// Archive format published for `product` builds on `os`.
///
/// # Errors
///
/// Returns [`BuildInfoError::UnknownFiletype`] when `os` is empty or the
/// [`OsId::UNKNOWN`] sentinel.
pub fn archive_filetype(os: &OsId, product: &Product) -> Result<ArchiveFormat, BuildInfoError> {
    if os.is_unknown() {
        return Err(BuildInfoError::UnknownFiletype {
            os: os.to_string(),
            product: product.to_string(),
        });
    }

    let id = os.as_str().to_lowercase();
    let format = FILETYPE_RULES
        .iter()
        .find(|(pattern, _)| id.contains(pattern))
        .map_or(FALLBACK_FORMAT, |(_, format)| *format);

    Ok(format)
}

/// Filetype handed to the extractor.
///
/// An explicit `file_suffix` wins and contributes its last dot-delimited
/// segment verbatim (`.tar.bz2` → `bz2`). Otherwise this is the extension of
/// [`archive_filetype`] (`.tar.bz2`).
///
/// # Errors
///
/// Propagates [`BuildInfoError`] when no suffix is given and the platform
/// lookup fails.
pub fn extraction_filetype(selectors: &Selectors) -> Result<String, BuildInfoError> {
    if let Some(suffix) = &selectors.file_suffix {
        let last = suffix.rsplit('.').next().unwrap_or(suffix);
        return Ok(last.to_string());
    }
    archive_filetype(&selectors.os, &selectors.product).map(|f| f.extension().to_string())
}

/// Suffix an artifact name must end with to be picked from the index.
///
/// # Errors
///
/// Propagates [`BuildInfoError`] when no suffix is given and the platform
/// lookup fails.
pub fn expected_suffix(selectors: &Selectors) -> Result<String, BuildInfoError> {
    match &selectors.file_suffix {
        Some(suffix) => Ok(suffix.clone()),
        None => archive_filetype(&selectors.os, &selectors.product)
            .map(|f| f.extension().to_string()),
    }
}
