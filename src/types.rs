use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Digest categories. The set is closed; renderers emit them in the
/// order of [`Category::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tech,
    Ai,
    UsStocks,
    Crypto,
    Politics,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Tech,
        Category::Ai,
        Category::UsStocks,
        Category::Crypto,
        Category::Politics,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Tech => "Tech News",
            Category::Ai => "AI Products",
            Category::UsStocks => "US Stocks",
            Category::Crypto => "Crypto",
            Category::Politics => "Politics",
        }
    }

    /// The key used for this category in the source list file.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Tech => "tech",
            Category::Ai => "ai",
            Category::UsStocks => "us_stocks",
            Category::Crypto => "crypto",
            Category::Politics => "politics",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One piece of content, normalized across source types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub category: Category,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub source_id: String,
    pub source_name: String,
}

impl Item {
    /// URL suitable for rendering, or `None` when the source gave none.
    pub fn display_url(&self) -> Option<&str> {
        if self.url.is_empty() {
            None
        } else {
            Some(&self.url)
        }
    }
}

/// Fully-resolved configuration for one source, built fresh each run.
/// Everything a collector needs at fetch time lives here; collectors do
/// not read global configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub category: Category,
    pub id: String,
    pub name: String,
    pub type_tag: String,
    pub url: String,
    pub limit: usize,
    /// Type-specific keys from the source entry, passed through untouched.
    pub extras: HashMap<String, serde_json::Value>,
}

impl SourceConfig {
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extras.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Network,
    Parse,
    Auth,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::Parse => "parse",
            FailureKind::Auth => "auth",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct CollectFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CollectFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CollectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of one collector invocation. Items and failure are
/// independent: an empty item list with a failure set is valid, and so
/// is a partial item list alongside a failure.
#[derive(Debug, Clone)]
pub struct CollectResult {
    pub items: Vec<Item>,
    pub failure: Option<CollectFailure>,
}

impl CollectResult {
    pub fn ok(items: Vec<Item>) -> Self {
        Self {
            items,
            failure: None,
        }
    }

    pub fn failed(failure: CollectFailure) -> Self {
        Self {
            items: Vec::new(),
            failure: Some(failure),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Source list parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;
