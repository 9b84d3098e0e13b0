use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Settings;
use crate::fetcher::FetchConfig;
use crate::sources::{RssCollector, TheInformationCollector};
use crate::traits::Collector;
use crate::types::Result;

/// Maps a source `type` tag to the collector responsible for it.
/// Registration happens once at startup; lookups are read-only after
/// that. A new source type needs one collector impl plus one
/// `register` call here.
pub struct CollectorRegistry {
    collectors: HashMap<String, Arc<dyn Collector>>,
}

impl CollectorRegistry {
    pub fn empty() -> Self {
        Self {
            collectors: HashMap::new(),
        }
    }

    /// Registry with the built-in collectors, sharing one HTTP policy.
    /// Credentials for the authenticated collector come from `settings`
    /// here, at construction, not at fetch time.
    pub fn with_builtins(settings: &Settings, fetch: FetchConfig) -> Result<Self> {
        let mut registry = Self::empty();
        registry.register(Arc::new(RssCollector::new(fetch.clone())?));
        registry.register(Arc::new(TheInformationCollector::new(
            fetch,
            settings.theinformation_email.clone(),
            settings.theinformation_password.clone(),
        )?));
        Ok(registry)
    }

    /// Registers `collector` under its type tag, replacing any earlier
    /// registration for the same tag.
    pub fn register(&mut self, collector: Arc<dyn Collector>) {
        self.collectors
            .insert(collector.type_tag().to_string(), collector);
    }

    pub fn lookup(&self, type_tag: &str) -> Option<Arc<dyn Collector>> {
        self.collectors.get(type_tag).cloned()
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Item, SourceConfig};
    use async_trait::async_trait;

    struct Dummy(&'static str);

    #[async_trait]
    impl Collector for Dummy {
        fn type_tag(&self) -> &'static str {
            self.0
        }

        async fn collect(&self, _config: &SourceConfig) -> Result<Vec<Item>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn register_and_lookup_by_tag() {
        let mut registry = CollectorRegistry::empty();
        registry.register(Arc::new(Dummy("a")));
        registry.register(Arc::new(Dummy("b")));
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("a").is_some());
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn registering_same_tag_replaces() {
        let mut registry = CollectorRegistry::empty();
        registry.register(Arc::new(Dummy("a")));
        registry.register(Arc::new(Dummy("a")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn builtins_cover_both_source_types() {
        let registry =
            CollectorRegistry::with_builtins(&Settings::default(), FetchConfig::default())
                .unwrap();
        assert!(registry.lookup("rss").is_some());
        assert!(registry.lookup("the_information").is_some());
    }
}
