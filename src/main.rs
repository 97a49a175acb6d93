use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use article_cache::{ArticleDetail, ArticleDetailCache, ArticleSource, CacheConfig, FileStorage};

#[derive(Parser)]
#[command(name = "article-cache")]
#[command(about = "Article detail cache with a durable recently-viewed history", long_about = None)]
struct Cli {
    /// Data directory for persisted cache state
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an article from a JSON file (read through the cache, write on miss)
    Open {
        /// Path to an article detail JSON document
        file: PathBuf,
    },

    /// List recently viewed articles
    Recent,

    /// Simulate a browsing session and print cache metrics
    Simulate {
        /// Distinct articles to open
        #[arg(short, long, default_value = "15")]
        articles: usize,

        /// Revisits spread across the opened articles
        #[arg(short, long, default_value = "30")]
        revisits: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let cache = create_cache(&cli.data_dir)?;
    cache.restore_from_durable_storage().await;

    match cli.command {
        Commands::Open { ref file } => {
            let detail = load_article(file)?;
            let uri = detail.uri.clone();

            match cache.read(&uri).await {
                Some(cached) => println!("Cache hit: {}", cached.title),
                None => {
                    println!("Cache miss: {}", detail.title);
                    cache.write(&uri, detail).await;
                }
            }

            println!("Recently viewed: {}", cache.recently_viewed().await.len());
        }

        Commands::Recent => {
            let recent = cache.recently_viewed().await;
            if recent.is_empty() {
                println!("No recently viewed articles. Run 'article-cache open <file>' first.");
            } else {
                println!("Recently Viewed:");
                println!("{}", "=".repeat(70));
                for (i, article) in recent.iter().enumerate() {
                    println!(
                        "{:>2}. {}  [{}]  {}",
                        i + 1,
                        article.title,
                        article.source.title,
                        article.uri
                    );
                }
            }
        }

        Commands::Simulate { articles, revisits } => {
            simulate(&cache, articles, revisits).await;

            let stats = cache.stats().await;
            let store = cache.store_stats().await;

            println!("Simulation: {} articles, {} revisits", articles, revisits);
            println!("{}", "=".repeat(70));
            println!("{}", stats);
            println!("Recent avg latency: {:.4} ms", stats.recent_avg_latency_ms);
            println!("Store: {}", store);
        }
    }

    let failed = cache.failed_persists();
    cache.shutdown().await?;
    if failed > 0 {
        eprintln!("Warning: {} writes to {:?} failed", failed, cli.data_dir);
    }

    Ok(())
}

fn create_cache(data_dir: &Path) -> Result<ArticleDetailCache> {
    let config = CacheConfig::from_env();
    let storage = Arc::new(FileStorage::new(data_dir));
    ArticleDetailCache::new(config, storage).context("Failed to create article cache")
}

fn load_article(path: &Path) -> Result<ArticleDetail> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read article file {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid article JSON in {:?}", path))
}

/// Open each article once, then walk back through them newest first
async fn simulate(cache: &ArticleDetailCache, articles: usize, revisits: usize) {
    let uris: Vec<String> = (0..articles)
        .map(|i| format!("sim://article/{}", i))
        .collect();

    for uri in &uris {
        open(cache, uri).await;
    }

    if uris.is_empty() {
        return;
    }
    for i in 0..revisits {
        let uri = &uris[uris.len() - 1 - (i % uris.len())];
        open(cache, uri).await;
    }
}

async fn open(cache: &ArticleDetailCache, uri: &str) {
    if cache.read(uri).await.is_none() {
        cache.write(uri, synthetic_article(uri)).await;
    }
}

fn synthetic_article(uri: &str) -> ArticleDetail {
    ArticleDetail {
        uri: uri.to_string(),
        title: format!("Simulated article {}", uri),
        body: "Lorem ipsum dolor sit amet. ".repeat(40),
        image: format!("https://images.example.com/{}.jpg", uri.len()),
        url: format!("https://news.example.com/{}", uri),
        date_time: chrono::Utc::now().to_rfc3339(),
        source: ArticleSource {
            title: "Simulation Wire".to_string(),
        },
    }
}
