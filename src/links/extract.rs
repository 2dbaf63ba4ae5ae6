// src/links/extract.rs
// =============================================================================
// This module extracts crawlable links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Every link that comes out of here is:
// - absolute (relative hrefs are resolved against the page, or <base href>)
// - http or https
// - normalized (see normalize.rs), so the visited set can compare strings
// - unique within the page, in the order it first appeared
// =============================================================================

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use super::normalize::{is_same_domain, normalize_parsed};

/// Extracts all crawlable links from `html`.
///
/// Parameters:
///   base_url: the URL the page was fetched from
///   html: the page body
///   domain_scoped: keep only links on the same host as `base_url`
pub fn extract_links(base_url: &str, html: &str, domain_scoped: bool) -> Vec<String> {
    let mut links = Vec::new();

    let page = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(url = %base_url, error = %e, "cannot extract links: invalid base URL");
            return links;
        }
    };

    let document = Html::parse_document(html);

    // These selectors are constants and known to be valid
    let anchor_selector = Selector::parse("a[href]").unwrap();
    let base_selector = Selector::parse("base[href]").unwrap();

    // <base href="..."> changes what relative links resolve against
    let base = document
        .select(&base_selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page.join(href.trim()).ok())
        .unwrap_or_else(|| page.clone());

    let mut seen = HashSet::new();

    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(link) = resolve_link(&base, href) else {
            continue;
        };

        if domain_scoped && !is_same_domain(base_url, &link) {
            continue;
        }

        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

// Resolves an href against the base and normalizes it
//
// Returns None for:
// - fragment-only links (#section)
// - mailto:, tel:, javascript:, data: links
// - anything that doesn't end up as an http(s) URL
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["mailto:", "tel:", "javascript:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let url = base.join(href).ok()?;
    normalize_parsed(url)
}
