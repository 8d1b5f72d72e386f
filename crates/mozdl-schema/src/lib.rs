//! Shared types for mozdl.
//!
//! Everything in this crate is pure: platform identifiers, product names,
//! archive formats and the lookup tables that connect them. Side effects
//! (network, filesystem) live in `mozdl-core`.

pub mod artifact;
pub mod build_info;
pub mod format;
pub mod os;
pub mod product;
pub mod selectors;

// Re-exports
pub use artifact::ArtifactReference;
pub use build_info::{BuildInfoError, archive_filetype, expected_suffix, extraction_filetype};
pub use format::ArchiveFormat;
pub use os::OsId;
pub use product::Product;
pub use selectors::Selectors;

/// Branch fetched when none is given on the command line.
pub const DEFAULT_BRANCH: &str = "mozilla-central";
