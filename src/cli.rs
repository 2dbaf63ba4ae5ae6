// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Every field here ends up in CrawlConfig or HttpConfig (see config.rs),
// except the output options which main.rs uses directly.
// =============================================================================

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "link-mapper",
    version,
    about = "Map every reachable page of a website",
    long_about = "link-mapper starts from one URL and follows links until it has found every \
                  page it can reach, within the depth and domain limits you set. \
                  Press Ctrl-C at any time to stop and keep what has been found so far."
)]
pub struct Cli {
    /// URL to start crawling from (e.g., https://example.com)
    pub url: String,

    /// Maximum link depth from the start page (0 or negative = unlimited)
    ///
    /// Depth 0 = just the start page
    /// Depth 1 = start page + the pages it links to
    /// etc.
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    pub max_depth: i64,

    /// Only follow links on the start URL's host
    ///
    /// Pass --same-domain false to follow external links too.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub same_domain: bool,

    /// Number of concurrent workers (0 or negative = 10)
    #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
    pub workers: i64,

    /// Maximum requests per second across all workers (0 or negative = unlimited)
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rate_limit: f64,

    /// Show a live progress line and a summary on stderr
    #[arg(long)]
    pub progress: bool,

    /// How often the progress line is refreshed, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub progress_interval_ms: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Skip pages that robots.txt disallows for our user agent
    #[arg(long)]
    pub respect_robots: bool,

    /// Log every page, not just failures
    #[arg(short, long)]
    pub verbose: bool,
}
