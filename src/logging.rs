// src/logging.rs
// =============================================================================
// Logging setup.
//
// We log with the `tracing` macros everywhere (info!, warn!, debug!...) and
// install one subscriber here that prints them to stderr. stdout is kept
// clean for the crawl output, so `link-mapper ... --format json > map.json`
// works.
//
// Filtering:
// - RUST_LOG wins when set (e.g. RUST_LOG=link_mapper=trace,reqwest=debug)
// - otherwise info for our crate, or debug with --verbose
// =============================================================================

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default_level = if verbose { "link_mapper=debug" } else { "link_mapper=info" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // try_init fails only if a subscriber is already installed, which is fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
