use std::time::Duration;

use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use tracing::{debug, error, warn};

use crate::types::Result;

/// HTTP policy shared by everything that talks to the network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; daily-digest/0.1)".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 5,
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    /// Builds a reqwest client with this policy applied. Collectors that
    /// need their own session (cookies) start from here too.
    pub fn build_client(&self) -> Result<Client> {
        let client = Client::builder()
            .user_agent(&self.user_agent)
            .timeout(Duration::from_secs(self.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .build()?;
        Ok(client)
    }
}

/// Shared GET-with-retry helper used by the feed collectors and the
/// source check tool.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Fetches `url` and returns the response body, retrying transient
    /// failures with exponential backoff. Non-2xx statuses count as
    /// failures.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds.max(1) * 8),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match self.try_fetch(url).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        error!("Giving up on {} after {} attempts: {}", url, attempt, e);
                        return Err(e);
                    }
                    let Some(delay) = backoff.next_backoff() else {
                        return Err(e);
                    };
                    warn!(
                        "Attempt {} failed for {} ({}), retrying in {:?}",
                        attempt, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> FetchConfig {
        FetchConfig {
            max_retries: 1,
            retry_delay_seconds: 0,
            timeout_seconds: 5,
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn fetch_text_returns_body() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/feed.xml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<rss/>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(test_config()).unwrap();
        let body = fetcher
            .fetch_text(&format!("{}/feed.xml", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<rss/>");
    }

    #[tokio::test]
    async fn fetch_text_fails_on_server_error() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(test_config()).unwrap();
        let err = fetcher.fetch_text(&server.uri()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn fetch_text_retries_after_failure() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(test_config()).unwrap();
        let body = fetcher.fetch_text(&server.uri()).await.unwrap();
        assert_eq!(body, "ok");
    }
}
