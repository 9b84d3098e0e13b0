use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::fetcher::FetchConfig;
use crate::traits::Collector;
use crate::types::{DigestError, Item, Result, SourceConfig};

const LOGIN_URL: &str = "https://www.theinformation.com/login";

/// Collector for The Information's subscriber pages. Establishes a
/// session with credentials injected at construction (overridable per
/// source through `email`/`password` extras), then scrapes article
/// links from the configured page.
pub struct TheInformationCollector {
    client: reqwest::Client,
    email: Option<String>,
    password: Option<String>,
}

impl TheInformationCollector {
    pub fn new(
        fetch_config: FetchConfig,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        // Session cookies from the login must survive into the page GET.
        let client = reqwest::Client::builder()
            .user_agent(&fetch_config.user_agent)
            .timeout(Duration::from_secs(fetch_config.timeout_seconds))
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            email,
            password,
        })
    }

    fn credentials<'a>(&'a self, config: &'a SourceConfig) -> Result<(&'a str, &'a str)> {
        let email = config.extra_str("email").or(self.email.as_deref());
        let password = config.extra_str("password").or(self.password.as_deref());
        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(DigestError::Auth(
                "no credentials for The Information (set THEINFORMATION_EMAIL/PASSWORD)".into(),
            )),
        }
    }

    async fn login(&self, login_url: &str, email: &str, password: &str) -> Result<()> {
        debug!("Logging in via {}", login_url);
        let response = self
            .client
            .post(login_url)
            .form(&[("email", email), ("password", password)])
            .send()
            .await?;
        let status = response.status();
        if status.is_client_error() {
            return Err(DigestError::Auth(format!(
                "login rejected with HTTP {status}"
            )));
        }
        response.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Collector for TheInformationCollector {
    fn type_tag(&self) -> &'static str {
        "the_information"
    }

    async fn collect(&self, config: &SourceConfig) -> Result<Vec<Item>> {
        let (email, password) = self.credentials(config)?;
        let login_url = config.extra_str("login_url").unwrap_or(LOGIN_URL);
        self.login(login_url, email, password).await?;

        info!("Scraping {} ({})", config.id, config.url);
        let response = self
            .client
            .get(&config.url)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let base = Url::parse(&config.url)?;
        let articles = extract_articles(&body, &base);

        let fetched_at = Utc::now();
        let items: Vec<Item> = articles
            .into_iter()
            .take(config.limit)
            .map(|article| Item {
                category: config.category,
                title: article.title,
                url: article.url,
                published_at: article.published_at,
                fetched_at,
                source_id: config.id.clone(),
                source_name: config.name.clone(),
            })
            .collect();

        info!("Collected {} items from {}", items.len(), config.id);
        Ok(items)
    }
}

struct ScrapedArticle {
    title: String,
    url: String,
    published_at: Option<DateTime<Utc>>,
}

/// Pulls article headlines out of a listing page. Prefers `<article>`
/// blocks (first non-empty anchor as the headline, optional
/// `<time datetime>` as the timestamp), falling back to bare article
/// links when the page has no such blocks. Hrefs resolve against the
/// page URL; repeated links to the same article collapse to the first.
fn extract_articles(body: &str, base: &Url) -> Vec<ScrapedArticle> {
    let doc = Html::parse_document(body);
    let article_sel = Selector::parse("article").unwrap();
    let anchor_sel = Selector::parse("a[href]").unwrap();
    let time_sel = Selector::parse("time[datetime]").unwrap();
    let bare_sel = Selector::parse("a[href*=\"/articles/\"], a[href*=\"/briefings/\"]").unwrap();

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for article in doc.select(&article_sel) {
        let Some((title, url)) = article
            .select(&anchor_sel)
            .find_map(|a| anchor_parts(a, base))
        else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        let published_at = article
            .select(&time_sel)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .and_then(parse_datetime);
        out.push(ScrapedArticle {
            title,
            url,
            published_at,
        });
    }

    if out.is_empty() {
        for anchor in doc.select(&bare_sel) {
            let Some((title, url)) = anchor_parts(anchor, base) else {
                continue;
            };
            if !seen.insert(url.clone()) {
                continue;
            }
            out.push(ScrapedArticle {
                title,
                url,
                published_at: None,
            });
        }
    }

    out
}

fn anchor_parts(anchor: scraper::ElementRef<'_>, base: &Url) -> Option<(String, String)> {
    let title = anchor.text().collect::<String>().trim().to_string();
    if title.is_empty() {
        return None;
    }
    let href = anchor.value().attr("href")?;
    let url = base.join(href).ok()?;
    if url == *base {
        return None;
    }
    Some((title, url.to_string()))
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
