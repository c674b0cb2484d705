//! Asynchronous application logger
//!
//! Components enqueue entries on a bounded channel and carry on; a single
//! background task drains the channel and hands each entry to every
//! registered [`LogSink`]. A full queue makes the caller wait rather than
//! dropping the entry.

mod telemetry;

pub use telemetry::init_tracing;

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Key/value context attached to an entry
pub type LogFields = Vec<(&'static str, String)>;

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

// =========================================================================
// Entries & Sinks
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// One queued log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub fields: LogFields,
    pub app_name: Arc<str>,
    pub logged_at: DateTime<Utc>,
}

impl LogEntry {
    /// Look up a field by key
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Destination for drained entries. Called from the drain task only.
pub trait LogSink: Send + Sync {
    fn write(&self, entry: &LogEntry);
}

/// Keys recorded as individual `tracing` fields; anything else is folded
/// into `extra`.
const STRUCTURED_KEYS: [&str; 8] = [
    "id",
    "user_id",
    "transaction_type",
    "amount",
    "request_id",
    "status",
    "attempt",
    "error",
];

/// Forwards entries to the process-wide `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, entry: &LogEntry) {
        let extra = entry
            .fields
            .iter()
            .filter(|(k, _)| !STRUCTURED_KEYS.contains(k))
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        macro_rules! emit {
            ($level:ident) => {
                tracing::$level!(
                    app = %entry.app_name,
                    id = entry.field("id"),
                    user_id = entry.field("user_id"),
                    transaction_type = entry.field("transaction_type"),
                    amount = entry.field("amount"),
                    request_id = entry.field("request_id"),
                    status = entry.field("status"),
                    attempt = entry.field("attempt"),
                    error = entry.field("error"),
                    extra = %extra,
                    "{}",
                    entry.message
                )
            };
        }

        match entry.level {
            LogLevel::Info => emit!(info),
            LogLevel::Warn => emit!(warn),
            LogLevel::Error => emit!(error),
        }
    }
}

// =========================================================================
// Logger
// =========================================================================

type Sinks = Arc<RwLock<Vec<Arc<dyn LogSink>>>>;

/// Cloneable handle onto the log queue
#[derive(Clone)]
pub struct AsyncLogger {
    app_name: Arc<str>,
    tx: mpsc::Sender<LogEntry>,
    sinks: Sinks,
}

/// Owns the drain task. Dropping the guard also closes the queue, but
/// without waiting for the flush; keep it alive for the process lifetime.
pub struct LoggerGuard {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl AsyncLogger {
    /// Create the queue and spawn its drain task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(app_name: impl Into<String>, capacity: usize) -> (Self, LoggerGuard) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let sinks: Sinks = Arc::new(RwLock::new(Vec::new()));

        let handle = tokio::spawn(drain(rx, shutdown_rx, sinks.clone()));

        let logger = Self {
            app_name: Arc::from(app_name.into()),
            tx,
            sinks,
        };

        (logger, LoggerGuard { shutdown_tx, handle })
    }

    /// Add a sink. Entries drained after this call reach it.
    pub fn register(&self, sink: Arc<dyn LogSink>) {
        match self.sinks.write() {
            Ok(mut sinks) => sinks.push(sink),
            Err(poisoned) => poisoned.into_inner().push(sink),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub async fn info(&self, message: impl Into<String>, fields: LogFields) {
        self.log(LogLevel::Info, message.into(), fields).await
    }

    pub async fn warn(&self, message: impl Into<String>, fields: LogFields) {
        self.log(LogLevel::Warn, message.into(), fields).await
    }

    pub async fn error(&self, message: impl Into<String>, fields: LogFields) {
        self.log(LogLevel::Error, message.into(), fields).await
    }

    /// Enqueue an entry, waiting for capacity when the queue is full.
    /// Entries sent after shutdown are discarded.
    pub async fn log(&self, level: LogLevel, message: String, fields: LogFields) {
        let entry = LogEntry {
            level,
            message,
            fields,
            app_name: self.app_name.clone(),
            logged_at: Utc::now(),
        };

        if self.tx.send(entry).await.is_err() {
            tracing::trace!("log queue closed, entry discarded");
        }
    }
}

impl LoggerGuard {
    /// Close the queue, flush what is already in it and stop the drain task.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "log drain task failed");
        }
    }
}

async fn drain(
    mut rx: mpsc::Receiver<LogEntry>,
    mut shutdown_rx: oneshot::Receiver<()>,
    sinks: Sinks,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            entry = rx.recv() => match entry {
                Some(entry) => dispatch(&sinks, &entry),
                None => return,
            },
        }
    }

    rx.close();
    while let Some(entry) = rx.recv().await {
        dispatch(&sinks, &entry);
    }
}

fn dispatch(sinks: &Sinks, entry: &LogEntry) {
    let sinks = match sinks.read() {
        Ok(sinks) => sinks,
        Err(poisoned) => poisoned.into_inner(),
    };
    for sink in sinks.iter() {
        sink.write(entry);
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CollectingSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    impl CollectingSink {
        fn messages(&self) -> Vec<String> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.message.clone())
                .collect()
        }
    }

    impl LogSink for CollectingSink {
        fn write(&self, entry: &LogEntry) {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }

    #[tokio::test]
    async fn test_entries_reach_every_sink_in_order() {
        let (logger, guard) = AsyncLogger::start("test-app", 4);
        let first = Arc::new(CollectingSink::default());
        let second = Arc::new(CollectingSink::default());
        logger.register(first.clone());
        logger.register(second.clone());

        logger.info("one", vec![("id", "t1".to_string())]).await;
        logger.error("two", vec![]).await;
        guard.shutdown().await;

        assert_eq!(first.messages(), vec!["one", "two"]);
        assert_eq!(second.messages(), vec!["one", "two"]);

        let entries = first.entries.lock().unwrap();
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[0].field("id"), Some("t1"));
        assert_eq!(&*entries[0].app_name, "test-app");
        assert_eq!(entries[1].level, LogLevel::Error);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_queued_entries() {
        let (logger, guard) = AsyncLogger::start("test-app", 64);
        let sink = Arc::new(CollectingSink::default());
        logger.register(sink.clone());

        for i in 0..50 {
            logger.info(format!("entry {}", i), vec![]).await;
        }
        guard.shutdown().await;

        assert_eq!(sink.messages().len(), 50);
    }

    #[tokio::test]
    async fn test_log_after_shutdown_is_discarded() {
        let (logger, guard) = AsyncLogger::start("test-app", 2);
        let sink = Arc::new(CollectingSink::default());
        logger.register(sink.clone());
        guard.shutdown().await;

        logger.warn("late", vec![]).await;

        assert!(sink.messages().is_empty());
    }

    /// Blocks inside `write` until released, so the queue can fill up.
    struct GateSink {
        gate: Mutex<Option<std::sync::mpsc::Receiver<()>>>,
        written: Mutex<usize>,
    }

    impl LogSink for GateSink {
        fn write(&self, _entry: &LogEntry) {
            if let Some(rx) = self.gate.lock().unwrap().take() {
                let _ = rx.recv();
            }
            *self.written.lock().unwrap() += 1;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_queue_applies_backpressure() {
        let (release, gate) = std::sync::mpsc::channel();
        let sink = Arc::new(GateSink {
            gate: Mutex::new(Some(gate)),
            written: Mutex::new(0),
        });
        let (logger, guard) = AsyncLogger::start("test-app", 1);
        logger.register(sink.clone());

        // First entry is taken by the drain task and parks in the sink,
        // the second fills the queue.
        logger.info("a", vec![]).await;
        logger.info("b", vec![]).await;

        let blocked = logger.clone();
        let mut pending = tokio::spawn(async move { blocked.info("c", vec![]).await });

        let waited = tokio::time::timeout(Duration::from_millis(100), &mut pending).await;
        assert!(waited.is_err(), "send should wait while the queue is full");

        release.send(()).unwrap();
        pending.await.unwrap();
        guard.shutdown().await;

        assert_eq!(*sink.written.lock().unwrap(), 3);
    }

    /// Writer handing formatted output back to the test
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_sink_records_fields_individually() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();

        let entry = LogEntry {
            level: LogLevel::Warn,
            message: "Failed to decode message".to_string(),
            fields: vec![
                ("id", "t1".to_string()),
                ("user_id", "u1".to_string()),
                ("transaction_type", "bet".to_string()),
                ("partition", "2".to_string()),
            ],
            app_name: Arc::from("test-app"),
            logged_at: Utc::now(),
        };
        tracing::subscriber::with_default(subscriber, || TracingSink.write(&entry));

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let line: serde_json::Value = serde_json::from_str(output.lines().next().unwrap()).unwrap();
        let fields = &line["fields"];
        assert_eq!(fields["message"], "Failed to decode message");
        assert_eq!(fields["id"], "t1");
        assert_eq!(fields["user_id"], "u1");
        assert_eq!(fields["transaction_type"], "bet");
        assert_eq!(fields["extra"], "partition=2");
        assert!(fields.get("error").is_none());
    }
}
