mod admin;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ingestd_core::{
    load_config, validate_config, BucketDelivery, Converter, DeliveryBackend, FsDelivery,
    HttpObjectStore, JobPipeline, ObjectStore, QueueClient, SqsQueueClient, ToolConverter,
    WorkerPool,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("===> ingestd starting up (version: {}) <===", VERSION);

    // Determine config path
    let config_path = std::env::var("INGESTD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration; any violation is fatal before a worker starts
    validate_config(&config).context("Configuration validation failed")?;
    config.log_summary();

    // Compute config hash for log correlation across restarts
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded (hash: {})", &config_hash[..16]);

    // Scratch directory must exist before the first download
    tokio::fs::create_dir_all(&config.pipeline.scratch_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create scratch directory {:?}",
                config.pipeline.scratch_dir
            )
        })?;

    // Construct collaborator clients; they are plain objects handed down by
    // reference, never ambient globals
    let queue: Arc<dyn QueueClient> = Arc::new(
        SqsQueueClient::new(config.queue.clone()).context("Failed to create queue client")?,
    );
    info!("Queue client initialized ({})", queue.name());

    let store: Arc<dyn ObjectStore> = Arc::new(
        HttpObjectStore::new(config.storage.clone()).context("Failed to create storage client")?,
    );
    info!("Storage client initialized ({})", store.name());

    // Compile name rules once; workers share them read-only
    let rules = Arc::new(config.rule_set().context("Failed to compile name rules")?);
    info!("Compiled {} name rules", rules.len());

    let converter = ToolConverter::new(config.convert.clone());
    converter
        .validate()
        .await
        .context("Converter validation failed")?;
    let converter: Arc<dyn Converter> = Arc::new(converter);

    let delivery: Arc<dyn DeliveryBackend> = match (&config.output.root, &config.output.bucket) {
        (Some(root), _) => {
            info!("Delivering to filesystem root {}", root.display());
            Arc::new(FsDelivery::new(root.clone(), config.output.fail_on_overwrite))
        }
        (_, Some(bucket)) => {
            info!("Delivering to bucket {}", bucket);
            Arc::new(BucketDelivery::new(
                Arc::clone(&store),
                bucket.clone(),
                config.output.fail_on_overwrite,
            ))
        }
        _ => bail!("no output target configured"),
    };
    delivery
        .validate()
        .await
        .context("Delivery backend validation failed")?;

    let pipeline = Arc::new(JobPipeline::new(
        config.pipeline.clone(),
        rules,
        converter,
        delivery,
        Arc::clone(&store),
        Arc::clone(&queue),
    ));

    let pool = Arc::new(WorkerPool::new(
        config.pipeline.clone(),
        pipeline,
        Arc::clone(&queue),
    ));

    // Admin endpoint (health + metrics)
    let admin_addr = SocketAddr::new(config.admin.host, config.admin.port);
    let listener = tokio::net::TcpListener::bind(admin_addr)
        .await
        .with_context(|| format!("Failed to bind admin endpoint to {}", admin_addr))?;
    info!("Admin endpoint listening on {}", admin_addr);
    let admin_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, admin::router()).await {
            error!("Admin endpoint error: {}", e);
        }
    });

    // Run the pool until a shutdown signal arrives
    let pool_task = tokio::spawn({
        let pool = Arc::clone(&pool);
        async move { pool.run().await }
    });

    shutdown_signal().await;
    info!("Shutdown signal received, draining workers...");
    pool.shutdown();
    pool_task.await.context("Worker pool task failed")?;

    admin_task.abort();
    info!("Shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
