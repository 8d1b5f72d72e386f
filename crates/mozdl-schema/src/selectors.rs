//! What to fetch and where to put it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{OsId, Product};

/// What to fetch and where to put it.
///
/// Built once from command-line input and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    /// Product to fetch (e.g. "firefox")
    pub product: Product,

    /// Build platform (e.g. "linux-x86_64")
    pub os: OsId,

    /// Source branch (e.g. "mozilla-central")
    pub branch: String,

    /// Explicit archive suffix (e.g. ".zip"), overriding the platform default
    pub file_suffix: Option<String>,

    /// Directory the build is unpacked into
    pub dest: PathBuf,
}

impl Selectors {
    /// Selectors for `product` on `os` from the default branch, with no suffix override.
    pub fn new(product: Product, os: OsId, dest: impl Into<PathBuf>) -> Self {
        Self {
            product,
            os,
            branch: crate::DEFAULT_BRANCH.to_string(),
            file_suffix: None,
            dest: dest.into(),
        }
    }

    /// Use a different branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Override the archive suffix.
    pub fn with_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = Some(suffix.into());
        self
    }
}
