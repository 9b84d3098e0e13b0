pub mod aggregator;
pub mod config;
pub mod digest;
pub mod fetcher;
pub mod notify;
pub mod parser;
pub mod pipeline;
pub mod publish;
pub mod registry;
pub mod scheduler;
pub mod sources;
pub mod traits;
pub mod types;

pub use aggregator::Aggregator;
pub use config::{load_source_list, resolve_sources, Settings, SourceList};
pub use digest::DigestRenderer;
pub use fetcher::{FetchConfig, Fetcher};
pub use notify::TelegramNotifier;
pub use pipeline::{Pipeline, RunSummary};
pub use registry::CollectorRegistry;
pub use scheduler::Scheduler;
pub use traits::Collector;
pub use types::*;
