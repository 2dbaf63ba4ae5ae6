// src/output.rs
// =============================================================================
// Writes the crawl outcome in the format the user asked for.
//
// Formats:
// - text: human-readable table plus a summary (the default)
// - json: { "stats": ..., "results": [...] }, pretty printed
// - csv: one row per page
// - xml: a sitemaps.org sitemap of every page that loaded successfully
//
// Everything goes to a generic writer so main.rs can point it at stdout or
// a file, and tests can point it at a Vec<u8>.
// =============================================================================

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;

use crate::crawl::{CrawlOutcome, CrawlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
    Xml,
}

pub fn write_outcome<W: Write>(outcome: &CrawlOutcome, format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Text => write_table(outcome, &mut out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, outcome)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_csv(&outcome.results, &mut out)?,
        OutputFormat::Xml => write_sitemap(&outcome.results, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

// Prints results as a human-readable table
fn write_table<W: Write>(outcome: &CrawlOutcome, out: &mut W) -> Result<()> {
    writeln!(out, "{:<60} {:<6} {:<8} {:<6} {}", "URL", "DEPTH", "STATUS", "LINKS", "MESSAGE")?;
    writeln!(out, "{}", "=".repeat(100))?;

    for result in &outcome.results {
        // Truncate URL if too long for display
        let url_display = if result.url.chars().count() > 57 {
            format!("{}...", result.url.chars().take(57).collect::<String>())
        } else {
            result.url.clone()
        };

        let status = if result.status_code == 0 {
            "-".to_string()
        } else {
            result.status_code.to_string()
        };

        let message = match &result.error {
            Some(e) => format!("❌ {}", e),
            None => "✅ OK".to_string(),
        };

        writeln!(
            out,
            "{:<60} {:<6} {:<8} {:<6} {}",
            url_display,
            result.depth,
            status,
            result.links.len(),
            message
        )?;
    }

    let stats = &outcome.stats;
    writeln!(out)?;
    writeln!(out, "📊 Summary:")?;
    writeln!(out, "   🔎 Discovered: {}", stats.total_discovered)?;
    writeln!(out, "   ✅ OK: {}", stats.crawled_ok)?;
    writeln!(out, "   ❌ Failed: {}", stats.failed)?;
    writeln!(out, "   ⏭️  Skipped: {}", stats.skipped)?;
    writeln!(out, "   📏 Max depth: {}", stats.max_depth_reached)?;
    writeln!(out, "   ⏱️  Elapsed: {:.2}s", stats.total_elapsed.as_secs_f64())?;
    if outcome.cancelled {
        writeln!(out, "   🛑 Crawl was interrupted, results are partial")?;
    }
    Ok(())
}

fn write_csv<W: Write>(results: &[CrawlResult], out: &mut W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "url",
        "depth",
        "status_code",
        "links",
        "response_time_ms",
        "fetched_at",
        "error",
    ])?;

    for result in results {
        writer.write_record([
            result.url.clone(),
            result.depth.to_string(),
            result.status_code.to_string(),
            result.links.len().to_string(),
            result.response_time.as_millis().to_string(),
            result.fetched_at.to_rfc3339(),
            result.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_sitemap<W: Write>(results: &[CrawlResult], out: &mut W) -> Result<()> {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#)?;

    for result in results.iter().filter(|r| r.is_ok()) {
        writeln!(out, "  <url>")?;
        writeln!(out, "    <loc>{}</loc>", escape_xml(&result.url))?;
        writeln!(out, "    <lastmod>{}</lastmod>", result.fetched_at.format("%Y-%m-%d"))?;
        writeln!(out, "  </url>")?;
    }

    writeln!(out, "</urlset>")?;
    Ok(())
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
