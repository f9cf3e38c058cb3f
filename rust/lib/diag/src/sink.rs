use async_trait::async_trait;

use crate::entry::LogEntry;
use crate::error::SinkError;

/// Remote destination for log entries. One call per entry.
#[async_trait]
pub trait LogSink: Send + Sync + 'static {
    async fn send(&self, entry: &LogEntry) -> Result<(), SinkError>;
}

/// POSTs each entry as JSON to a fixed URL.
///
/// No response contract: any status the server returns is accepted.
pub struct HttpSink {
    http: reqwest::Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn send(&self, entry: &LogEntry) -> Result<(), SinkError> {
        self.http.post(&self.url).json(entry).send().await?;
        Ok(())
    }
}
