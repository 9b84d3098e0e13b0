use std::cmp::Reverse;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::{resolve_sources, SourceList};
use crate::registry::CollectorRegistry;
use crate::types::{Item, SourceConfig};

/// Fans out to every enabled source concurrently and merges the
/// results into one deterministically ordered sequence.
pub struct Aggregator {
    registry: CollectorRegistry,
}

impl Aggregator {
    pub fn new(registry: CollectorRegistry) -> Self {
        Self { registry }
    }

    /// Runs every enabled source through its collector and returns the
    /// merged, sorted sequence. A failing source contributes nothing;
    /// it never aborts the run.
    pub async fn gather(&self, list: &SourceList) -> Vec<Item> {
        let configs = resolve_sources(list);
        self.gather_configs(&configs).await
    }

    /// [`Aggregator::gather`] for an already-flattened source list.
    pub async fn gather_configs(&self, configs: &[SourceConfig]) -> Vec<Item> {
        let mut tasks = Vec::new();
        for config in configs {
            let Some(collector) = self.registry.lookup(&config.type_tag) else {
                warn!(
                    "No collector registered for type {:?}, skipping {}",
                    config.type_tag, config.id
                );
                continue;
            };
            tasks.push(async move {
                let result = collector.fetch(config).await;
                (config, result)
            });
        }

        info!("Dispatching {} sources", tasks.len());
        let outcomes = join_all(tasks).await;

        let dispatched = outcomes.len();
        let mut failed = 0usize;
        let mut items = Vec::new();
        for (config, result) in outcomes {
            if let Some(failure) = &result.failure {
                failed += 1;
                warn!("Source {} failed: {}", config.id, failure);
            }
            items.extend(result.items);
        }

        sort_items(&mut items);
        info!(
            "Gathered {} items from {} sources ({} failed)",
            items.len(),
            dispatched,
            failed
        );
        items
    }
}

/// Total order for the merged sequence: timestamped items first, newest
/// first, then untimestamped items by capture time, newest first.
/// Stable, so equal keys keep concatenation order.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by_key(|item| {
        (
            item.published_at.is_none(),
            Reverse(item.published_at.unwrap_or(item.fetched_at)),
        )
    });
}
