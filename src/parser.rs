use chrono::{DateTime, Utc};
use feed_rs::parser;
use tracing::debug;

use crate::types::{DigestError, Result};

/// One feed entry before it is bound to a source. The collector turns
/// these into items by attaching category, source identity, and the
/// capture timestamp.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Parses RSS/Atom bytes into entries, newest-first order as given by
/// the feed. Entries without a usable title are dropped; entries
/// without a link are kept with an empty URL.
pub fn parse_feed(content: &str) -> Result<Vec<ParsedEntry>> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| DigestError::Parse(format!("Failed to parse feed: {e}")))?;

    let mut entries = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let title = match entry.title {
            Some(t) if !t.content.trim().is_empty() => t.content,
            _ => {
                debug!("Skipping entry without title: {}", entry.id);
                continue;
            }
        };
        let url = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();
        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));
        entries.push(ParsedEntry {
            title,
            url,
            published_at,
        });
    }
    Ok(entries)
}
