use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{Category, DigestError, Result, SourceConfig};

/// Process settings bound from the environment (`.env` honored when
/// present). Everything has a default; only malformed or out-of-range
/// values fail.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Local wall-clock hour the daily digest fires at.
    pub digest_hour: u32,
    pub digest_minute: u32,
    /// Offset defining that local wall clock, in whole hours east of UTC.
    pub utc_offset_hours: i32,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub theinformation_email: Option<String>,
    pub theinformation_password: Option<String>,
    pub sources_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            digest_hour: 10,
            digest_minute: 0,
            utc_offset_hours: 8,
            telegram_bot_token: None,
            telegram_chat_id: None,
            theinformation_email: None,
            theinformation_password: None,
            sources_path: PathBuf::from("config/sources.toml"),
            output_dir: PathBuf::from("public"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let defaults = Settings::default();
        let settings = Settings {
            digest_hour: env_parse("DIGEST_HOUR", defaults.digest_hour)?,
            digest_minute: env_parse("DIGEST_MINUTE", defaults.digest_minute)?,
            utc_offset_hours: env_parse("DIGEST_UTC_OFFSET_HOURS", defaults.utc_offset_hours)?,
            telegram_bot_token: env_opt("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: env_opt("TELEGRAM_CHAT_ID"),
            theinformation_email: env_opt("THEINFORMATION_EMAIL"),
            theinformation_password: env_opt("THEINFORMATION_PASSWORD"),
            sources_path: env_path("SOURCES_PATH", defaults.sources_path),
            output_dir: env_path("OUTPUT_DIR", defaults.output_dir),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn telegram_configured(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }

    fn validate(&self) -> Result<()> {
        if self.digest_hour > 23 {
            return Err(DigestError::Config(format!(
                "DIGEST_HOUR out of range (0-23): {}",
                self.digest_hour
            )));
        }
        if self.digest_minute > 59 {
            return Err(DigestError::Config(format!(
                "DIGEST_MINUTE out of range (0-59): {}",
                self.digest_minute
            )));
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(DigestError::Config(format!(
                "DIGEST_UTC_OFFSET_HOURS out of range (-12 to 14): {}",
                self.utc_offset_hours
            )));
        }
        Ok(())
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| DigestError::Config(format!("invalid {key} value {raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// On-disk shape of the declarative source list. Category keys are the
/// closed category set; an unrecognized key is a load error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceList {
    #[serde(default)]
    pub categories: HashMap<Category, CategoryEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryEntry {
    /// Label carried in the file for readability; rendering uses the
    /// canonical category names.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub type_tag: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Any further keys on the entry, kept for the matching collector.
    #[serde(flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}

impl SourceEntry {
    /// Binds this entry to the category it was listed under.
    pub fn to_config(&self, category: Category) -> SourceConfig {
        SourceConfig {
            category,
            id: self.id.clone(),
            name: self.name.clone(),
            type_tag: self.type_tag.clone(),
            url: self.url.clone(),
            limit: self.limit,
            extras: self.extras.clone(),
        }
    }
}

fn default_id() -> String {
    "unknown".to_string()
}

fn default_name() -> String {
    "Unknown".to_string()
}

fn default_type() -> String {
    "rss".to_string()
}

fn default_limit() -> usize {
    15
}

fn default_enabled() -> bool {
    true
}

pub fn load_source_list(path: &Path) -> Result<SourceList> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        DigestError::Config(format!("cannot read source list {}: {e}", path.display()))
    })?;
    let list: SourceList = toml::from_str(&raw)?;
    Ok(list)
}

/// Flattens the categorized list into per-source configurations, one per
/// enabled entry. Output order is canonical category order, then file
/// order within each category.
pub fn resolve_sources(list: &SourceList) -> Vec<SourceConfig> {
    let mut out = Vec::new();
    for category in Category::ALL {
        let Some(entry) = list.categories.get(&category) else {
            continue;
        };
        for src in &entry.sources {
            if !src.enabled {
                continue;
            }
            out.push(src.to_config(category));
        }
    }
    out
}
