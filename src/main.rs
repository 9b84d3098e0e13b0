use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use daily_digest::{
    load_source_list, Category, CollectorRegistry, FetchConfig, Pipeline, Scheduler, Settings,
};

#[derive(Parser)]
#[command(name = "daily-digest")]
#[command(about = "Gather news from configured sources and publish a daily digest", long_about = None)]
struct Cli {
    /// Path to the source list (overrides SOURCES_PATH).
    #[arg(long, global = true)]
    sources: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and publish the digest once, then exit.
    Once {
        /// Also push the digest text to the configured Telegram chat.
        #[arg(long)]
        notify: bool,
    },
    /// Run the daily scheduler until interrupted.
    Run,
    /// Probe every configured source and report which ones respond.
    Check,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("daily_digest=info,warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut settings = Settings::from_env()?;
    if let Some(path) = cli.sources {
        settings.sources_path = path;
    }

    match cli.command {
        Command::Once { notify } => run_once(settings, notify).await,
        Command::Run => run_scheduler(settings).await,
        Command::Check => check_sources(settings).await,
    }
}

async fn run_once(settings: Settings, notify: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(settings)?;
    let summary = pipeline.run(notify).await?;
    println!(
        "Digest written to {} ({} items{})",
        summary.page_path.display(),
        summary.item_count,
        if summary.notified {
            ", pushed to Telegram"
        } else {
            ""
        }
    );
    Ok(())
}

async fn run_scheduler(settings: Settings) -> anyhow::Result<()> {
    let pipeline = Arc::new(Pipeline::new(settings)?);
    let mut scheduler = Scheduler::new(pipeline.clone(), pipeline.settings())?;
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");
    scheduler.stop();
    Ok(())
}

/// Probes every source in the list and reports per-source health.
/// Disabled entries, entries without a URL, and entries whose type has
/// no registered collector are listed but not probed. A source that
/// responds with zero items counts as failed.
async fn check_sources(settings: Settings) -> anyhow::Result<()> {
    let list = load_source_list(&settings.sources_path)?;
    let registry = CollectorRegistry::with_builtins(&settings, FetchConfig::default())?;

    println!("{}", "=".repeat(60));
    println!("Source check: {}", settings.sources_path.display());
    println!("{}", "=".repeat(60));

    let mut probed = 0usize;
    let mut passed = 0usize;
    let mut failures: Vec<(String, String)> = Vec::new();

    for category in Category::ALL {
        let Some(entry) = list.categories.get(&category) else {
            continue;
        };
        if entry.sources.is_empty() {
            continue;
        }
        println!();
        println!("{}", category.display_name());
        println!("{}", "-".repeat(40));

        for src in &entry.sources {
            if !src.enabled {
                println!("  {} (disabled)", src.name);
                continue;
            }
            let Some(collector) = registry.lookup(&src.type_tag) else {
                println!(
                    "  {} (no collector for type {:?}, skipped)",
                    src.name, src.type_tag
                );
                continue;
            };
            if src.url.is_empty() {
                println!("  {} (no url)", src.name);
                continue;
            }

            probed += 1;
            let result = collector.fetch(&src.to_config(category)).await;
            match result.failure {
                Some(failure) => {
                    println!("  {} FAILED: {}", src.name, failure);
                    failures.push((src.name.clone(), failure.to_string()));
                }
                None if result.items.is_empty() => {
                    println!("  {} FAILED: no items", src.name);
                    failures.push((src.name.clone(), "no items".to_string()));
                }
                None => {
                    passed += 1;
                    println!("  {} ok, {} items", src.name, result.items.len());
                    for (i, item) in result.items.iter().take(3).enumerate() {
                        let title: String = item.title.chars().take(60).collect();
                        println!("      {}. {}", i + 1, title);
                    }
                }
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60));
    println!("{passed}/{probed} sources responded");
    println!("{}", "=".repeat(60));

    if !failures.is_empty() {
        println!();
        println!("Failed sources:");
        for (name, msg) in &failures {
            println!("  - {name}: {msg}");
        }
        anyhow::bail!("{} source(s) failed", failures.len());
    }
    Ok(())
}
