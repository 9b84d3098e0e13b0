use std::collections::HashMap;
use std::sync::Once;

use tracing::info;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use daily_digest::{
    Aggregator, Category, CollectorRegistry, FailureKind, FetchConfig, Settings, SourceConfig,
    SourceList,
};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

/// Retry-free policy so failure tests return promptly.
fn quick_fetch() -> FetchConfig {
    FetchConfig {
        max_retries: 0,
        retry_delay_seconds: 0,
        ..FetchConfig::default()
    }
}

fn source_config(category: Category, id: &str, type_tag: &str, url: String) -> SourceConfig {
    SourceConfig {
        category,
        id: id.to_string(),
        name: id.to_uppercase(),
        type_tag: type_tag.to_string(),
        url,
        limit: 15,
        extras: HashMap::new(),
    }
}

const TECH_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Tech Wire</title>
    <link>https://tech.example</link>
    <item>
      <title>Compiler speeds up 30 percent</title>
      <link>https://tech.example/compiler</link>
      <pubDate>Mon, 20 May 2024 10:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>
"#;

const CRYPTO_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Chain Watch</title>
    <link>https://chain.example</link>
    <item>
      <title>Exchange lists new token</title>
      <link>https://chain.example/listing</link>
      <pubDate>Mon, 20 May 2024 11:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Mining difficulty adjusts</title>
      <link>https://chain.example/difficulty</link>
      <pubDate>Mon, 20 May 2024 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>
"#;

const LISTING_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <article>
      <a href="/articles/ai-chip-deal">Chipmaker signs AI cloud deal</a>
      <time datetime="2024-05-20T08:30:00Z">May 20</time>
    </article>
    <article>
      <a href="/articles/startup-raise">Stealth startup raises Series B</a>
    </article>
  </body>
</html>
"#;

#[tokio::test]
async fn test_rss_collector_through_registry() {
    init_tracing();
    info!("Testing the rss collector against a mock endpoint");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TECH_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let registry = CollectorRegistry::with_builtins(&Settings::default(), quick_fetch()).unwrap();
    let collector = registry.lookup("rss").expect("rss collector registered");

    let config = source_config(
        Category::Tech,
        "tech-wire",
        "rss",
        format!("{}/feed.xml", server.uri()),
    );
    let result = collector.fetch(&config).await;

    assert!(result.failure.is_none());
    assert_eq!(result.items.len(), 1);
    let item = &result.items[0];
    assert_eq!(item.title, "Compiler speeds up 30 percent");
    assert_eq!(item.url, "https://tech.example/compiler");
    assert_eq!(item.category, Category::Tech);
    assert_eq!(item.source_id, "tech-wire");
    assert!(item.published_at.is_some());
}

#[tokio::test]
async fn test_unreachable_feed_reports_failure() {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = CollectorRegistry::with_builtins(&Settings::default(), quick_fetch()).unwrap();
    let collector = registry.lookup("rss").unwrap();

    let config = source_config(
        Category::Crypto,
        "down-feed",
        "rss",
        format!("{}/feed.xml", server.uri()),
    );
    let result = collector.fetch(&config).await;

    assert!(result.is_failed());
    assert!(result.items.is_empty());
    let failure = result.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Network);
}

#[tokio::test]
async fn test_the_information_collector_through_registry() {
    init_tracing();
    info!("Testing the authenticated scrape collector end-to-end");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("email=reader%40example.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tech"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = Settings::default();
    settings.theinformation_email = Some("reader@example.com".to_string());
    settings.theinformation_password = Some("hunter2".to_string());

    let registry = CollectorRegistry::with_builtins(&settings, quick_fetch()).unwrap();
    let collector = registry
        .lookup("the_information")
        .expect("scrape collector registered");

    let mut config = source_config(
        Category::Ai,
        "the-information",
        "the_information",
        format!("{}/tech", server.uri()),
    );
    config.extras.insert(
        "login_url".to_string(),
        serde_json::json!(format!("{}/login", server.uri())),
    );

    let result = collector.fetch(&config).await;

    assert!(result.failure.is_none());
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].title, "Chipmaker signs AI cloud deal");
    assert!(result.items[0].url.ends_with("/articles/ai-chip-deal"));
    assert!(result.items[0].published_at.is_some());
    assert!(result.items[1].published_at.is_none());
    assert_eq!(result.items[0].category, Category::Ai);
}

#[tokio::test]
async fn test_missing_credentials_fail_without_a_request() {
    init_tracing();

    // No mounts: any request against the server would 404 and the
    // expectations below would still catch an unexpected login.
    let server = MockServer::start().await;

    let registry = CollectorRegistry::with_builtins(&Settings::default(), quick_fetch()).unwrap();
    let collector = registry.lookup("the_information").unwrap();

    let config = source_config(
        Category::Ai,
        "the-information",
        "the_information",
        format!("{}/tech", server.uri()),
    );
    let result = collector.fetch(&config).await;

    assert!(result.is_failed());
    let failure = result.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Auth);
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_aggregator_fans_out_over_http() {
    init_tracing();
    info!("Fanning out to two mock feeds through the full registry");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tech.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TECH_FEED))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/crypto.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CRYPTO_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let list: SourceList = toml::from_str(&format!(
        r#"
        [[categories.tech.sources]]
        id = "tech-wire"
        name = "Tech Wire"
        url = "{base}/tech.xml"

        [[categories.crypto.sources]]
        id = "chain-watch"
        name = "Chain Watch"
        url = "{base}/crypto.xml"
        "#,
        base = server.uri()
    ))
    .unwrap();

    let registry = CollectorRegistry::with_builtins(&Settings::default(), quick_fetch()).unwrap();
    let items = Aggregator::new(registry).gather(&list).await;

    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        [
            "Exchange lists new token",
            "Compiler speeds up 30 percent",
            "Mining difficulty adjusts"
        ]
    );
    assert_eq!(items[0].category, Category::Crypto);
    assert_eq!(items[1].category, Category::Tech);
    assert_eq!(items[1].source_name, "Tech Wire");
}
