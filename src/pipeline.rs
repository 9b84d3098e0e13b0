use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info};

use crate::aggregator::Aggregator;
use crate::config::{load_source_list, Settings};
use crate::digest::DigestRenderer;
use crate::fetcher::FetchConfig;
use crate::notify::TelegramNotifier;
use crate::publish::store_latest;
use crate::registry::CollectorRegistry;
use crate::types::Result;

/// One gather-render-deliver cycle, shared by the one-shot command and
/// the scheduler.
pub struct Pipeline {
    settings: Settings,
    aggregator: Aggregator,
    renderer: DigestRenderer,
    notifier: Option<TelegramNotifier>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub item_count: usize,
    pub page_path: PathBuf,
    pub notified: bool,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self> {
        let registry = CollectorRegistry::with_builtins(&settings, FetchConfig::default())?;
        Self::with_registry(settings, registry)
    }

    /// Pipeline over a caller-supplied registry; tests use this to
    /// substitute collectors.
    pub fn with_registry(settings: Settings, registry: CollectorRegistry) -> Result<Self> {
        let notifier = match (&settings.telegram_bot_token, &settings.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                Some(TelegramNotifier::new(token.clone(), chat_id.clone()))
            }
            _ => None,
        };
        Ok(Self {
            aggregator: Aggregator::new(registry),
            renderer: DigestRenderer::new()?,
            notifier,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs the full cycle: load the source list, gather, render,
    /// publish the static page, and push to chat when `notify` is set
    /// and credentials are configured. The source list is re-read on
    /// every run. Source failures degrade the digest; an unreadable
    /// source list or a delivery failure is an error.
    pub async fn run(&self, notify: bool) -> Result<RunSummary> {
        let now = Utc::now();
        let list = load_source_list(&self.settings.sources_path)?;
        let items = self.aggregator.gather(&list).await;

        let html = self.renderer.render_html(&items, now)?;
        let page_path = store_latest(&self.settings.output_dir, &html)?;

        let mut notified = false;
        if notify {
            match &self.notifier {
                Some(notifier) => {
                    let text = self.renderer.render_chat_text(&items, now);
                    notifier.send(&text).await?;
                    notified = true;
                }
                None => debug!("Telegram not configured, skipping chat push"),
            }
        }

        let summary = RunSummary {
            item_count: items.len(),
            page_path,
            notified,
        };
        info!(
            "Digest run complete: {} items, page at {}",
            summary.item_count,
            summary.page_path.display()
        );
        Ok(summary)
    }
}
