//! mozdl - gecko build downloader CLI

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use mozdl_cli::ops::{self, Context, FetchOutcome};
use mozdl_cli::ui::ConsoleReporter;
use mozdl_cli::{Cli, NullReporter, Reporter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli) {
        eprintln!("{} {e:#}", "error:".red().bold());
        return ExitCode::FAILURE;
    }

    let reporter: Arc<dyn Reporter> = if cli.quiet {
        Arc::new(NullReporter)
    } else {
        Arc::new(ConsoleReporter::new())
    };

    let ctx = match Context::new(cli.index_config(), reporter) {
        Ok(ctx) => ctx
            .with_download_dir(cli.download_dir.clone())
            .with_keep_archive(cli.keep_archive),
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let selectors = cli.selectors();
    match ops::run(&selectors, &ctx).await {
        Ok(FetchOutcome::Installed {
            archive: Some(path),
            ..
        }) => {
            // Printed even with --quiet so scripts can pick the archive up
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `--debug`.
fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(cli.log_filter())?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.debug >= 2)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}
