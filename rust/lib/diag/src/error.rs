use thiserror::Error;

/// Failure while forwarding an entry to the remote sink.
///
/// Never reaches a `LogStore` caller: forwarding drops these.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("sink rejected entry: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid mode: {0} (expected \"development\" or \"production\")")]
    InvalidMode(String),
}
