// src/links/mod.rs
// =============================================================================
// Everything the crawler needs to know about URLs and links.
//
// Submodules:
// - extract: pulls <a href> links out of HTML pages
// - normalize: canonical URL form and the same-domain check
// =============================================================================

mod extract;
mod normalize;

pub use extract::extract_links;
pub use normalize::{is_same_domain, normalize};
