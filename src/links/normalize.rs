// src/links/normalize.rs
// =============================================================================
// URL normalization and the same-domain check.
//
// The visited set compares URLs as strings, so two spellings of the same
// page ("https://Example.com/docs/" and "https://example.com/docs#intro")
// must collapse to one canonical form before they reach it.
//
// Canonical form:
// - only http/https
// - fragment removed
// - host lowercased and default port dropped (the url crate does both)
// - trailing slash removed from every path except the root "/"
// - query string kept as-is
// =============================================================================

use url::Url;

/// Returns the canonical form of `url`, or None if it is not a crawlable
/// absolute http(s) URL.
pub fn normalize(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    normalize_parsed(parsed)
}

pub(crate) fn normalize_parsed(mut url: Url) -> Option<String> {
    if !is_http(&url) || url.host_str().is_none() {
        return None;
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        url.set_path(&trimmed);
    }

    Some(url.to_string())
}

/// Host-only comparison: scheme and port are ignored, case does not matter,
/// and subdomains count as different hosts.
pub fn is_same_domain(base_url: &str, candidate_url: &str) -> bool {
    let (Ok(base), Ok(candidate)) = (Url::parse(base_url), Url::parse(candidate_url)) else {
        return false;
    };
    match (base.host_str(), candidate.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

pub(crate) fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}
