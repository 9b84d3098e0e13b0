use std::time::Duration;

use async_trait::async_trait;

use crate::types::{
    CollectFailure, CollectResult, DigestError, FailureKind, Item, Result, SourceConfig,
};

/// Default upper bound on one collector invocation, over and above the
/// HTTP client's own request timeout.
pub const FETCH_DEADLINE: Duration = Duration::from_secs(60);

/// Trait for collecting items from one kind of source (RSS feeds,
/// authenticated scrapes, etc.). Implementations are stateless across
/// invocations; everything source-specific arrives in the
/// `SourceConfig`.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Tag matched against a source entry's `type` field.
    fn type_tag(&self) -> &'static str;

    /// Pull items for one resolved source. May fail; callers go through
    /// [`Collector::fetch`], which turns the failure into data.
    async fn collect(&self, config: &SourceConfig) -> Result<Vec<Item>>;

    fn fetch_deadline(&self) -> Duration {
        FETCH_DEADLINE
    }

    /// Runs `collect` under [`Collector::fetch_deadline`] and reduces
    /// every outcome, including a hung fetch, to a `CollectResult`.
    /// Never propagates an error.
    async fn fetch(&self, config: &SourceConfig) -> CollectResult {
        match tokio::time::timeout(self.fetch_deadline(), self.collect(config)).await {
            Ok(Ok(items)) => CollectResult::ok(items),
            Ok(Err(e)) => CollectResult::failed(CollectFailure::new(classify(&e), e.to_string())),
            Err(_) => CollectResult::failed(CollectFailure::new(
                FailureKind::Timeout,
                format!("no result within {:?}", self.fetch_deadline()),
            )),
        }
    }
}

fn classify(e: &DigestError) -> FailureKind {
    match e {
        DigestError::Http(e) if e.is_timeout() => FailureKind::Timeout,
        DigestError::Auth(_) => FailureKind::Auth,
        DigestError::Parse(_) => FailureKind::Parse,
        _ => FailureKind::Network,
    }
}
