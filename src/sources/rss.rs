use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::fetcher::{FetchConfig, Fetcher};
use crate::parser::parse_feed;
use crate::traits::Collector;
use crate::types::{Item, Result, SourceConfig};

/// Feed-based collector, the default source type. One instance serves
/// every feed source; endpoint, limit, and identity all come from the
/// per-source configuration.
pub struct RssCollector {
    fetcher: Fetcher,
}

impl RssCollector {
    pub fn new(fetch_config: FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(fetch_config)?,
        })
    }
}

#[async_trait]
impl Collector for RssCollector {
    fn type_tag(&self) -> &'static str {
        "rss"
    }

    async fn collect(&self, config: &SourceConfig) -> Result<Vec<Item>> {
        info!("Pulling feed {} ({})", config.id, config.url);
        let body = self.fetcher.fetch_text(&config.url).await?;
        let entries = parse_feed(&body)?;

        let fetched_at = Utc::now();
        let items: Vec<Item> = entries
            .into_iter()
            .take(config.limit)
            .map(|entry| Item {
                category: config.category,
                title: entry.title,
                url: entry.url,
                published_at: entry.published_at,
                fetched_at,
                source_id: config.id.clone(),
                source_name: config.name.clone(),
            })
            .collect();

        info!("Collected {} items from {}", items.len(), config.id);
        Ok(items)
    }
}
