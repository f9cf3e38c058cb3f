use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::config::{DiagConfig, Mode};
use crate::console;
use crate::entry::{Detail, LogEntry, Severity};
use crate::sink::{HttpSink, LogSink};

/// Bounded, in-memory log buffer with best-effort remote forwarding.
///
/// - Appends are synchronous. When the buffer is full the oldest entry is
///   evicted, so `len() <= capacity()` always holds.
/// - Forwarding runs on a detached tokio task and its failures are dropped.
///   Without a tokio runtime on the calling thread, forwarding is skipped.
/// - Readers only ever get copies of the buffer.
pub struct LogStore {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    mode: Mode,
    sink: Option<Arc<dyn LogSink>>,
}

impl LogStore {
    pub fn new(capacity: usize, mode: Mode) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            mode,
            sink: None,
        }
    }

    /// Attach the remote sink used in production mode.
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build from configuration, with an [`HttpSink`] when a sink URL resolves.
    pub fn from_config(config: &DiagConfig) -> Self {
        let store = Self::new(config.capacity, config.mode);
        match config.resolve_sink_url() {
            Some(url) => store.with_sink(Arc::new(HttpSink::new(url))),
            None => store,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn debug(&self, message: impl Into<String>, data: Option<Value>) {
        self.append(LogEntry::new(Severity::Debug, message, data));
    }

    pub fn info(&self, message: impl Into<String>, data: Option<Value>) {
        self.append(LogEntry::new(Severity::Info, message, data));
    }

    pub fn warn(&self, message: impl Into<String>, data: Option<Value>) {
        self.append(LogEntry::new(Severity::Warn, message, data));
    }

    /// Log an error. A [`Fault`](crate::Fault) detail also records its stack.
    pub fn error(&self, message: impl Into<String>, detail: impl Into<Detail>) {
        let (data, stack) = detail.into().into_parts();
        self.append(LogEntry::new(Severity::Error, message, data).with_stack(stack));
    }

    /// Append a pre-built entry: buffer, mirror, forward.
    pub fn append(&self, entry: LogEntry) {
        {
            let mut entries = self.entries.lock();
            entries.push_back(entry.clone());
            while entries.len() > self.capacity {
                entries.pop_front();
            }
        }
        if self.mode.mirrors(entry.level) {
            console::mirror(&entry);
        }
        self.forward(entry);
    }

    /// Copy of the buffer, oldest first.
    pub fn get_logs(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear_logs(&self) {
        self.entries.lock().clear();
    }

    /// Pretty-printed JSON array of the buffer, for a diagnostics download.
    pub fn export_logs(&self) -> String {
        let logs = self.get_logs();
        // A Vec of plain structs with string keys cannot fail to serialize.
        serde_json::to_string_pretty(&logs).unwrap_or_else(|_| "[]".to_string())
    }

    fn forward(&self, entry: LogEntry) {
        if !self.mode.forwards() {
            return;
        }
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        handle.spawn(async move {
            // Best-effort: failures are neither retried nor reported.
            let _ = sink.send(&entry).await;
        });
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::from_config(&DiagConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Fault;
    use crate::error::SinkError;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct ChannelSink {
        tx: mpsc::UnboundedSender<LogEntry>,
    }

    #[async_trait]
    impl LogSink for ChannelSink {
        async fn send(&self, entry: &LogEntry) -> Result<(), SinkError> {
            let _ = self.tx.send(entry.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl LogSink for FailingSink {
        async fn send(&self, _entry: &LogEntry) -> Result<(), SinkError> {
            Err(SinkError::Rejected("503".into()))
        }
    }

    fn channel_store(mode: Mode) -> (LogStore, mpsc::UnboundedReceiver<LogEntry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = LogStore::new(100, mode).with_sink(Arc::new(ChannelSink { tx }));
        (store, rx)
    }

    // ========================================================================
    // Buffer bounds
    // ========================================================================

    #[test]
    fn append_in_order() {
        let store = LogStore::new(10, Mode::Development);
        store.debug("a", None);
        store.info("b", None);
        store.warn("c", None);

        let messages: Vec<_> = store.get_logs().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[test]
    fn overflow_keeps_last_capacity_entries_in_order() {
        let capacity = 100;
        let store = LogStore::new(capacity, Mode::Development);
        for i in 0..capacity + 7 {
            store.info(format!("entry {}", i), None);
            assert!(store.len() <= capacity);
        }

        let logs = store.get_logs();
        assert_eq!(logs.len(), capacity);
        for (offset, entry) in logs.iter().enumerate() {
            assert_eq!(entry.message, format!("entry {}", offset + 7));
        }
    }

    #[test]
    fn capacity_one_keeps_newest() {
        let store = LogStore::new(1, Mode::Development);
        store.info("old", None);
        store.info("new", None);
        assert_eq!(store.get_logs()[0].message, "new");
    }

    #[test]
    fn capacity_zero_retains_nothing() {
        let store = LogStore::new(0, Mode::Development);
        store.info("x", None);
        assert!(store.is_empty());
    }

    // ========================================================================
    // Snapshots and export
    // ========================================================================

    #[test]
    fn snapshots_are_equal_and_independent() {
        let store = LogStore::new(10, Mode::Development);
        store.info("one", Some(serde_json::json!({"n": 1})));
        store.warn("two", None);

        let mut first = store.get_logs();
        let second = store.get_logs();
        assert_eq!(first, second);

        first.clear();
        first.push(LogEntry::new(Severity::Error, "injected", None));
        assert_eq!(store.get_logs(), second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn clear_then_export_is_empty_array() {
        let store = LogStore::new(10, Mode::Development);
        store.info("x", None);
        store.clear_logs();

        let exported = store.export_logs();
        let parsed: Vec<LogEntry> = serde_json::from_str(&exported).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(exported, "[]");
    }

    #[test]
    fn export_is_pretty_json() {
        let store = LogStore::new(10, Mode::Development);
        store.info("hello", Some(serde_json::json!({"userId": "u1"})));

        let exported = store.export_logs();
        assert!(exported.contains("\n  {"));
        let parsed: Vec<LogEntry> = serde_json::from_str(&exported).unwrap();
        assert_eq!(parsed[0].message, "hello");
        assert_eq!(parsed[0].data.as_ref().unwrap()["userId"], "u1");
    }

    // ========================================================================
    // Error details
    // ========================================================================

    #[test]
    fn error_with_fault_records_stack() {
        let store = LogStore::new(10, Mode::Development);
        let fault = Fault::new("Sign out failed upstream").with_stack("at sign_out");
        store.error("Sign out failed", &fault);

        let entry = &store.get_logs()[0];
        assert_eq!(entry.level, Severity::Error);
        assert_eq!(entry.stack.as_deref(), Some("at sign_out"));
        assert_eq!(entry.data.as_ref().unwrap()["message"], "Sign out failed upstream");
    }

    #[test]
    fn error_with_plain_data_has_no_stack() {
        let store = LogStore::new(10, Mode::Development);
        store.error("odd", serde_json::json!({"code": 7}));
        store.error("bare", Detail::None);

        let logs = store.get_logs();
        assert!(logs[0].stack.is_none());
        assert_eq!(logs[0].data.as_ref().unwrap()["code"], 7);
        assert!(logs[1].data.is_none());
    }

    // ========================================================================
    // Forwarding
    // ========================================================================

    #[tokio::test]
    async fn production_forwards_every_entry() {
        let (store, mut rx) = channel_store(Mode::Production);
        store.debug("d", None);
        store.error("e", Detail::None);

        assert_eq!(rx.recv().await.unwrap().message, "d");
        assert_eq!(rx.recv().await.unwrap().message, "e");
    }

    #[tokio::test]
    async fn development_never_forwards() {
        let (store, mut rx) = channel_store(Mode::Development);
        store.info("local only", None);
        drop(store);

        // The sender lives in the dropped store; no entry was ever sent.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn forwarding_failure_is_swallowed() {
        let store = LogStore::new(10, Mode::Production).with_sink(Arc::new(FailingSink));
        store.error("still buffered", Detail::None);
        tokio::task::yield_now().await;

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn no_runtime_skips_forwarding() {
        let (store, _rx) = channel_store(Mode::Production);
        store.info("buffered without runtime", None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn from_config_without_base_has_no_sink() {
        let store = LogStore::from_config(&DiagConfig::default());
        assert!(store.sink.is_none());
        assert_eq!(store.capacity(), 100);
    }
}
