// src/lib.rs
// =============================================================================
// link-mapper as a library.
//
// main.rs is a thin wrapper around this crate: parse arguments, run the
// crawl, print the outcome. Keeping the engine here means it can be reused
// (and tested) without going through the command line.
//
// Modules:
// - cli: command-line definitions
// - config: crawl and HTTP settings
// - crawl: the concurrent crawl engine
// - error: fatal and per-page error types
// - fetch: the Fetcher trait, the reqwest fetcher, robots.txt
// - links: link extraction, URL normalization, same-domain check
// - logging: tracing subscriber setup
// - output: text / JSON / CSV / XML writers
// =============================================================================

pub mod cli;
pub mod config;
pub mod crawl;
pub mod error;
pub mod fetch;
pub mod links;
pub mod logging;
pub mod output;

pub use config::{CrawlConfig, HttpConfig};
pub use crawl::{run_crawl, CancelHandle, CrawlOutcome, CrawlResult, CrawlStats, Crawler, EnginePhase};
pub use error::{CrawlError, FetchError};
