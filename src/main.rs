// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging
// 3. Hook Ctrl-C up to the crawl's cancel handle
// 4. Run the crawl and write the outcome in the chosen format
// 5. Exit with proper code (0 = all pages OK, 1 = failed pages or
//    interrupted, 2 = error)
// =============================================================================

use std::fs::File;
use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;

use link_mapper::cli::Cli;
use link_mapper::output::write_outcome;
use link_mapper::{logging, run_crawl, CancelHandle, CrawlConfig, HttpConfig};

// The #[tokio::main] attribute transforms our async main into a real main function
// It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every page loaded
//   Ok(1) = some pages failed, or the crawl was interrupted
//   Err = the crawl couldn't run at all
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = CrawlConfig::from(&cli);
    let http = HttpConfig::from(&cli);

    let cancel = CancelHandle::new();
    watch_ctrl_c(cancel.clone());

    eprintln!("🔍 Mapping website: {}", cli.url);

    let outcome = run_crawl(&cli.url, config, &http, cancel).await?;

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            write_outcome(&outcome, cli.format, BufWriter::new(file))?;
            eprintln!("💾 Wrote {} page(s) to {}", outcome.results.len(), path.display());
        }
        None => write_outcome(&outcome, cli.format, io::stdout().lock())?,
    }

    if outcome.cancelled || outcome.stats.failed > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// The first Ctrl-C starts a graceful stop. Finished pages are still written
// out once the workers have wound down.
fn watch_ctrl_c(cancel: CancelHandle) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("\n🛑 Interrupted, finishing up...");
                cancel.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "could not listen for Ctrl-C"),
        }
    });
}
