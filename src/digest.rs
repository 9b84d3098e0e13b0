use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use serde_json::json;

use crate::types::{Category, DigestError, Item, Result};

const TEMPLATE: &str = include_str!("../templates/digest.hbs");

/// Chat messages cap each category at this many entries; the HTML page
/// carries everything.
const CHAT_ITEMS_PER_CATEGORY: usize = 12;

/// Groups the flat ordered sequence for rendering: canonical category
/// order, empty categories omitted, overall order preserved within
/// each group.
pub fn group_by_category(items: &[Item]) -> Vec<(Category, Vec<&Item>)> {
    let mut grouped = Vec::new();
    for category in Category::ALL {
        let group: Vec<&Item> = items.iter().filter(|i| i.category == category).collect();
        if !group.is_empty() {
            grouped.push((category, group));
        }
    }
    grouped
}

/// Renders the ordered item sequence into the two delivery formats.
pub struct DigestRenderer {
    handlebars: Handlebars<'static>,
}

impl DigestRenderer {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string("digest", TEMPLATE)
            .map_err(|e| DigestError::Template(e.to_string()))?;
        Ok(Self { handlebars })
    }

    /// HTML page for the static transport.
    pub fn render_html(&self, items: &[Item], date: DateTime<Utc>) -> Result<String> {
        let sections: Vec<serde_json::Value> = group_by_category(items)
            .iter()
            .map(|(category, group)| {
                json!({
                    "name": category.display_name(),
                    "slug": category.key(),
                    "items": group.iter().map(|item| json!({
                        "title": item.title,
                        "url": item.display_url(),
                        "source": item.source_name,
                        "age": item.published_at.map(|t| relative_age(date, t)),
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();

        let data = json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "generated_at": date.format("%Y-%m-%d %H:%M UTC").to_string(),
            "total": items.len(),
            "sections": sections,
        });
        self.handlebars
            .render("digest", &data)
            .map_err(|e| DigestError::Template(e.to_string()))
    }

    /// Plain-text message for the chat transport. Categories cap at
    /// [`CHAT_ITEMS_PER_CATEGORY`] entries.
    pub fn render_chat_text(&self, items: &[Item], date: DateTime<Utc>) -> String {
        let mut lines = vec![format!("Daily Digest {}", date.format("%Y-%m-%d"))];
        for (category, group) in group_by_category(items) {
            lines.push(format!("\n*{}*", category.display_name()));
            for item in group.iter().take(CHAT_ITEMS_PER_CATEGORY) {
                let mut line = format!("- {}", item.title);
                if let Some(url) = item.display_url() {
                    line.push_str("\n  ");
                    line.push_str(url);
                }
                lines.push(line);
            }
        }
        lines.join("\n")
    }
}

fn relative_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 24 * 60 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (24 * 60))
    }
}
