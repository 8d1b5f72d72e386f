//! Archive formats a build can be published in.

use serde::{Deserialize, Serialize};

/// Archive format of a downloadable build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// Zip archive (`.zip`), used for Windows builds.
    Zip,
    /// Bzip2-compressed tar archive (`.tar.bz2`), used for Linux builds.
    #[serde(rename = "tar.bz2")]
    TarBz2,
    /// Gzip-compressed tar archive (`.tar.gz`).
    #[serde(rename = "tar.gz")]
    TarGz,
    /// macOS disk image (`.dmg`).
    Dmg,
}

impl ArchiveFormat {
    /// Canonical file extension, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::TarBz2 => ".tar.bz2",
            Self::TarGz => ".tar.gz",
            Self::Dmg => ".dmg",
        }
    }

    /// Parse a filetype token such as `zip`, `.tar.bz2` or `bz2`.
    ///
    /// Leading dots and case are ignored. Returns `None` for anything that
    /// has no unpacking strategy.
    pub fn from_filetype(filetype: &str) -> Option<Self> {
        let token = filetype.trim().trim_start_matches('.').to_lowercase();
        match token.as_str() {
            "zip" => Some(Self::Zip),
            "tar.bz2" | "bz2" | "tbz" | "tbz2" => Some(Self::TarBz2),
            "tar.gz" | "gz" | "tgz" => Some(Self::TarGz),
            "dmg" => Some(Self::Dmg),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension().trim_start_matches('.'))
    }
}
