//! Common test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use sqlx::PgPool;

use casino_transactions::api::{self, AppState};
use casino_transactions::logging::{AsyncLogger, LogEntry, LogSink, LoggerGuard};
use casino_transactions::processor::TransactionProcessor;
use casino_transactions::query::QueryService;
use casino_transactions::store::{InMemoryTransactionStore, TransactionStore};

/// Sink keeping every entry for later assertions
#[derive(Default)]
pub struct CapturingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl CapturingSink {
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl LogSink for CapturingSink {
    fn write(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Router over an in-memory store, plus handles for assertions
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryTransactionStore>,
    pub logs: Arc<CapturingSink>,
    pub guard: LoggerGuard,
}

impl TestApp {
    /// Stop the logger, flushing queued entries into `logs`
    pub async fn flush_logs(self) -> Arc<CapturingSink> {
        self.guard.shutdown().await;
        self.logs
    }
}

pub fn test_app() -> TestApp {
    let store = Arc::new(InMemoryTransactionStore::new());
    let (router, logs, guard) = app_over(store.clone());
    TestApp {
        router,
        store,
        logs,
        guard,
    }
}

/// Build the full application over any store
pub fn app_over(store: Arc<dyn TransactionStore>) -> (Router, Arc<CapturingSink>, LoggerGuard) {
    let (logger, guard) = AsyncLogger::start("test-app", 64);
    let logs = Arc::new(CapturingSink::default());
    logger.register(logs.clone());

    let state = AppState {
        processor: TransactionProcessor::new(store.clone()),
        queries: QueryService::new(store),
        logger,
    };

    (api::build_app(state, Duration::from_secs(5)), logs, guard)
}

/// Setup test database when DATABASE_URL is set. Returns `None` otherwise.
///
/// Tests share the table, so each one must use its own ids and users.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = casino_transactions::db::connect(&database_url, 5)
        .await
        .expect("Failed to connect to DB");

    casino_transactions::db::ensure_schema(&pool)
        .await
        .expect("Failed to ensure schema");

    Some(pool)
}

/// Unique id with a readable prefix
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}
