//! Casino transaction service
//!
//! Consumes bet/win events from Kafka, stores them idempotently and serves
//! them over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

use casino_transactions::api::{self, AppState};
use casino_transactions::consumer::{KafkaMessageSource, MessageConsumer};
use casino_transactions::logging::{self, AsyncLogger, TracingSink};
use casino_transactions::processor::TransactionProcessor;
use casino_transactions::query::QueryService;
use casino_transactions::store::{InMemoryTransactionStore, PgTransactionStore, TransactionStore};
use casino_transactions::{db, Config, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    logging::init_tracing();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let (logger, logger_guard) = AsyncLogger::start(&config.app_name, config.log_queue_capacity);
    logger.register(Arc::new(TracingSink));

    tracing::info!(environment = %config.environment, "Starting casino transaction service");

    let (store, pool) = match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config.database_url.as_deref().context("DATABASE_URL is required")?;
            tracing::info!("Connecting to database...");
            let pool = db::connect(url, config.database_max_connections).await?;
            db::verify_connection(&pool).await?;
            db::ensure_schema(&pool).await?;
            if !db::check_schema(&pool).await? {
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }
            tracing::info!("Database connected successfully");
            let store: Arc<dyn TransactionStore> = Arc::new(PgTransactionStore::new(pool.clone()));
            (store, Some(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; transactions are lost on exit");
            let store: Arc<dyn TransactionStore> = Arc::new(InMemoryTransactionStore::new());
            (store, None)
        }
    };

    let processor = TransactionProcessor::new(store.clone());
    let queries = QueryService::new(store);

    // Broker consumer
    let source = KafkaMessageSource::connect(
        &config.kafka_brokers,
        &config.kafka_group_id,
        &config.kafka_topic,
    )?;
    let consumer = Arc::new(
        MessageConsumer::new(Arc::new(source), processor.clone(), logger.clone())
            .with_retry_policy(config.retry_policy()),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_handle = consumer.clone().start(shutdown_rx);

    // HTTP server
    let app = api::build_app(
        AppState {
            processor,
            queries,
            logger: logger.clone(),
        },
        config.request_timeout(),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    logger
        .info(format!("Server starting on {}", addr), vec![])
        .await;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Cleanup, in reverse order of startup
    tracing::info!("Server shutting down...");
    shutdown_tx.send_replace(true);
    if let Err(e) = consumer_handle.await {
        tracing::error!(error = %e, "Consumer task failed");
    }
    if let Err(e) = consumer.close() {
        tracing::error!(error = %e, "Kafka consumer close error");
    }
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }
    logger.info("Shutdown complete", vec![]).await;
    logger_guard.shutdown().await;

    served?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
