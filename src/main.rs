//! Order Cache Service
//!
//! Serves order records over HTTP from a bounded in-memory cache backed by a
//! persistent store, optionally ingesting new orders from a JSON-lines feed.
//!
//! # Lifecycle
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────────────┐   ┌────────────┐
//! │  store   │──▶│ cache + svc   │──▶│ restore_cache    │──▶│ HTTP +     │
//! │ (file or │   │               │   │ (warm from store)│   │ consumer   │
//! │  memory) │   │               │   │                  │   │            │
//! └──────────┘   └───────────────┘   └──────────────────┘   └────────────┘
//!                                                  ctrl-c ──▶ cancel ──▶ close cache
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ordercache::adapters::{FileOrderRepository, InMemoryOrderRepository};
use ordercache::cache::{CacheConfig, MemoryCache};
use ordercache::domain::OrderRepository;
use ordercache::http::{HttpConfig, HttpServer};
use ordercache::ingest::{Consumer, JsonLinesSource, OrderMessageHandler};
use ordercache::usecase::OrderService;
use ordercache::{Error, Result};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Order Cache - cache-aside read service for order records
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP bind address
    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    http_addr: String,

    /// Directory for the file-backed store (in-memory store when unset)
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Maximum number of cached orders
    #[arg(long, env = "CACHE_MAX_SIZE", default_value = "1000")]
    cache_max_size: usize,

    /// Cache entry lifetime in seconds
    #[arg(long, env = "CACHE_TTL_SECONDS", default_value = "86400")]
    cache_ttl_seconds: u64,

    /// Expired-entry sweep interval in seconds
    #[arg(long, env = "CACHE_CLEANUP_INTERVAL_SECONDS", default_value = "300")]
    cache_cleanup_interval_seconds: u64,

    /// JSON-lines file of order messages to ingest at startup
    #[arg(long, env = "INGEST_FILE")]
    ingest_file: Option<PathBuf>,

    /// Seconds a client may take to send request headers
    #[arg(long, env = "HTTP_HEADER_READ_TIMEOUT_SECONDS", default_value = "10")]
    http_header_read_timeout_seconds: u64,

    /// Seconds a request may take before it is answered with 504
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT_SECONDS", default_value = "30")]
    http_request_timeout_seconds: u64,

    /// Seconds to wait for open connections and background tasks on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECONDS", default_value = "10")]
    shutdown_timeout_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_size: self.cache_max_size,
            ttl: Duration::from_secs(self.cache_ttl_seconds),
            cleanup_interval: Duration::from_secs(self.cache_cleanup_interval_seconds),
        }
    }

    fn http_config(&self) -> HttpConfig {
        HttpConfig {
            header_read_timeout: Duration::from_secs(self.http_header_read_timeout_seconds),
            request_timeout: Duration::from_secs(self.http_request_timeout_seconds),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_seconds),
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting Order Cache");
    info!("  HTTP address: {}", args.http_addr);
    info!("  Cache max size: {}", args.cache_max_size);
    info!("  Cache TTL: {}s", args.cache_ttl_seconds);
    info!(
        "  Cache cleanup interval: {}s",
        args.cache_cleanup_interval_seconds
    );

    let repo: Arc<dyn OrderRepository> = match &args.data_dir {
        Some(dir) => {
            info!("  Store: file ({})", dir.display());
            Arc::new(FileOrderRepository::open(dir).await?)
        }
        None => {
            info!("  Store: in-memory");
            Arc::new(InMemoryOrderRepository::new())
        }
    };

    let cache = Arc::new(MemoryCache::with_config(args.cache_config())?);
    let service = OrderService::new(repo, cache.clone());
    let cancel = CancellationToken::new();

    match service.restore_cache(&cancel).await {
        Ok(count) => info!(count, "Cache warmed from store"),
        Err(e) => warn!(error = %e, "Failed to restore cache, starting cold"),
    }

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    let server =
        HttpServer::bind_with_config(&args.http_addr, service.clone(), args.http_config()).await?;
    let server_cancel = cancel.clone();
    tasks.push(tokio::spawn(async move {
        if let Err(e) = server.serve(server_cancel).await {
            error!("HTTP server error: {}", e);
        }
    }));

    if let Some(path) = &args.ingest_file {
        let source = JsonLinesSource::open(path).await?;
        let consumer = Consumer::new(source, OrderMessageHandler::new(service.clone()));
        let consumer_cancel = cancel.clone();
        info!("Ingesting orders from {}", path.display());
        tasks.push(tokio::spawn(async move {
            if let Err(e) = consumer.run(consumer_cancel).await {
                error!("Order consumer error: {}", e);
            }
        }));
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::Internal(format!("Failed to listen for shutdown signal: {}", e)))?;
    info!("Shutdown signal received");
    cancel.cancel();

    // The server drains within the shutdown timeout, then cancels what is left
    let timeout = Duration::from_secs(args.shutdown_timeout_seconds) + Duration::from_secs(1);
    if tokio::time::timeout(timeout, join_all(tasks)).await.is_err() {
        warn!("Background tasks did not stop within {:?}", timeout);
    }

    cache.close();
    info!("Order Cache shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    if let Ok(directive) = "hyper=warn".parse() {
        filter = filter.add_directive(directive);
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
