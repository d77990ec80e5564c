//! Murmur — live meeting transcript ingestion daemon.
//! Entry point for the daemon binary.
//!
//! Polls the bot API for one meeting's transcript and upserts each
//! utterance into the vector store exactly once. Stops on Ctrl-C (draining
//! the in-flight cycle), a finalized transcript, or an auth rejection; the
//! exit code is non-zero only when a fatal error occurred.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use murmur_ingestion::pipeline::{IngestionPipeline, PipelineConfig};
use murmur_ingestion::sources::mock::MockTranscriptSource;
use murmur_ingestion::sources::remote::BotApiClient;
use murmur_ingestion::sources::TranscriptSource;
use murmur_store::embedding::StubEmbedder;
use murmur_store::memory::MemoryStore;
use murmur_store::qdrant::QdrantStore;
use murmur_store::UtteranceStore;

use config::SourceMode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,murmur_ingestion=debug,murmur_store=debug")),
        )
        .init();

    info!("Murmur ingestion daemon starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    let meeting_id = config.meeting_id()?;

    let source: Arc<dyn TranscriptSource> = match config.api.mode {
        SourceMode::Mock => {
            info!("Using mock transcript source");
            Arc::new(MockTranscriptSource::new())
        }
        SourceMode::Live => {
            let api_key = SecretString::from(
                config
                    .api
                    .api_key
                    .clone()
                    .context("api.api_key is required in live mode")?,
            );
            Arc::new(BotApiClient::new(api_key, Some(config.api.base_url.clone()))?)
        }
    };

    let store: Arc<dyn UtteranceStore> = match config.api.mode {
        SourceMode::Mock => {
            info!("Using in-memory store (mock mode)");
            Arc::new(MemoryStore::new())
        }
        SourceMode::Live => {
            let embedder = Arc::new(StubEmbedder::new(config.store.embedding_dim));
            let store = QdrantStore::connect(
                &config.store.host,
                config.store.port,
                &config.store.collection,
                embedder,
            )
            .await
            .context("vector store bootstrap")?;
            info!(
                host = %config.store.host,
                port = config.store.port,
                "Vector store ready"
            );
            Arc::new(store)
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            // Keep the sender alive so the pipeline doesn't read a dropped
            // channel as shutdown.
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, draining current cycle");
        let _ = shutdown_tx.send(true);
    });

    let pipeline = IngestionPipeline::new(
        source,
        store,
        PipelineConfig {
            meeting_id: meeting_id.clone(),
            poll_interval: Duration::from_secs_f64(config.pipeline.poll_interval_secs),
            max_cycles: None,
        },
    );
    // Downstream processing (decision-moment detection) registers here:
    // .with_observer(Box::new(|utterance| { ... }))

    info!(
        meeting_id = %meeting_id,
        mode = ?config.api.mode,
        poll_interval_secs = config.pipeline.poll_interval_secs,
        "Ingestion configured"
    );

    let stats = pipeline.run(shutdown_rx).await.context("ingestion pipeline")?;
    info!(
        polls = stats.polls,
        ingested = stats.ingested,
        duplicates_skipped = stats.duplicates_skipped,
        errors = stats.errors,
        "Shutdown complete"
    );
    Ok(())
}
