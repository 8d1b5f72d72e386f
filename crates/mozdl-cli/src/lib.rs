//! mozdl - fetch the latest gecko build for a product and platform
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! # Overview
//!
//! `mozdl` looks up the most recent build of a product (b2g-desktop, firefox,
//! mulet, ...) for a platform in the Taskcluster build index, streams the
//! archive to disk and unpacks it into a destination directory. If the
//! destination already holds the product's folder nothing is fetched.
//!
//! # Architecture
//!
//! - **Typestate Pattern**: the fetch runs as `FetchPlan` → `PendingFetch` →
//!   `ResolvedFetch` → `DownloadedFetch`, so an archive can't be extracted
//!   before it was downloaded.
//! - **Injected Reporter**: progress goes through the [`Reporter`] carried in
//!   [`ops::Context`]; `--quiet` swaps in a no-op reporter.

pub mod ops;
pub mod ui;

pub use mozdl_core::{NullReporter, Reporter};

use clap::Parser;
use mozdl_core::index::{DEFAULT_NAMESPACE_PREFIX, DEFAULT_ROOT_URL};
use mozdl_core::IndexConfig;
use mozdl_schema::{DEFAULT_BRANCH, OsId, Product, Selectors};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mozdl")]
#[command(
    author,
    version = env!("MOZDL_VERSION"),
    about = "Download and unpack the latest gecko build"
)]
pub struct Cli {
    /// Product to fetch (b2g-desktop, firefox, mulet, ...)
    #[arg(long, default_value = "b2g-desktop")]
    pub product: Product,

    /// Build platform (linux-x86_64, linux-i686, mac64, win64, win32); detected when omitted
    #[arg(long, value_name = "OSID")]
    pub os: Option<OsId>,

    /// Source branch
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Log verbosity: 0 warnings, 1 info, 2 debug, 3 and up trace
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub debug: u8,

    /// Archive suffix to look for (e.g. ".zip"); its last dot segment picks the extractor
    #[arg(long, value_name = "EXT")]
    pub file_suffix: Option<String>,

    /// Root URL of the Taskcluster deployment
    #[arg(long, env = "MOZDL_INDEX_URL", default_value = DEFAULT_ROOT_URL)]
    pub index_url: String,

    /// Index namespace prefix
    #[arg(long, env = "MOZDL_NAMESPACE_PREFIX", default_value = DEFAULT_NAMESPACE_PREFIX)]
    pub namespace_prefix: String,

    /// Directory for the downloaded archive (system temp directory by default)
    #[arg(long, env = "MOZDL_DOWNLOAD_DIR", value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Keep the downloaded archive after unpacking
    #[arg(long, env = "MOZDL_KEEP_ARCHIVE")]
    pub keep_archive: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory the build is unpacked into
    pub dest: PathBuf,
}

impl Cli {
    /// Selectors for this invocation, detecting the OS when `--os` was not given.
    pub fn selectors(&self) -> Selectors {
        let os = self.os.clone().unwrap_or_else(OsId::detect);
        let selectors = Selectors::new(self.product.clone(), os, self.dest.clone())
            .with_branch(self.branch.clone());
        match &self.file_suffix {
            Some(suffix) => selectors.with_file_suffix(suffix.clone()),
            None => selectors,
        }
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            root_url: self.index_url.clone(),
            namespace_prefix: self.namespace_prefix.clone(),
        }
    }

    /// Default tracing filter for `--debug N`, used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> String {
        let level = match self.debug {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        format!("mozdl_core={level},mozdl_cli={level},warn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mozdl", "out"]).unwrap();
        assert_eq!(cli.product, Product::B2gDesktop);
        assert_eq!(cli.branch, "mozilla-central");
        assert_eq!(cli.debug, 0);
        assert!(cli.file_suffix.is_none());

        let selectors = cli.selectors();
        assert_eq!(selectors.os, OsId::detect());
        assert_eq!(selectors.dest, PathBuf::from("out"));
    }

    #[test]
    fn test_selectors_from_flags() {
        let cli = Cli::try_parse_from([
            "mozdl",
            "--product",
            "firefox",
            "--os",
            "mac64",
            "--branch",
            "mozilla-beta",
            "--file-suffix",
            ".zip",
            "/tmp/dest",
        ])
        .unwrap();

        let selectors = cli.selectors();
        assert_eq!(selectors.product, Product::Firefox);
        assert_eq!(selectors.os.as_str(), "mac64");
        assert_eq!(selectors.branch, "mozilla-beta");
        assert_eq!(selectors.file_suffix.as_deref(), Some(".zip"));
    }

    #[test]
    fn test_unknown_product_is_kept_verbatim() {
        let cli = Cli::try_parse_from(["mozdl", "--product", "thunderbird", "out"]).unwrap();
        assert_eq!(cli.product.as_str(), "thunderbird");
    }

    #[test]
    fn test_dest_is_required() {
        let err = Cli::try_parse_from(["mozdl"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_log_filter_levels() {
        let parse = |n: &str| Cli::try_parse_from(["mozdl", "--debug", n, "out"]).unwrap();
        assert_eq!(parse("0").log_filter(), "mozdl_core=warn,mozdl_cli=warn,warn");
        assert_eq!(parse("2").log_filter(), "mozdl_core=debug,mozdl_cli=debug,warn");
        assert_eq!(parse("7").log_filter(), "mozdl_core=trace,mozdl_cli=trace,warn");
    }

    #[test]
    fn test_index_config_from_flags() {
        let cli = Cli::try_parse_from([
            "mozdl",
            "--index-url",
            "http://localhost:1234",
            "--namespace-prefix",
            "gecko.v3",
            "out",
        ])
        .unwrap();
        let config = cli.index_config();
        assert_eq!(config.root_url, "http://localhost:1234");
        assert_eq!(config.namespace_prefix, "gecko.v3");
    }
}
