//! Error taxonomy for a crawl run.
//!
//! Only a handful of these abort the run: authentication failure, a browser
//! session failure, interruption, and (under [`LedgerPolicy::Abort`]) a
//! corrupt ledger line. Per-article problems are never errors; they are
//! rejections reported by the [`gate`](crate::gate) and counted in the
//! keyword report.
//!
//! [`LedgerPolicy::Abort`]: crate::config::LedgerPolicy::Abort

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrawlError>;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger line {line} is not a valid entry: {source}")]
    CorruptLedgerEntry {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("authentication failed: still on {url} after submitting credentials")]
    AuthenticationFailed { url: String },

    #[error("browser session error: {0}")]
    Browser(String),

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("crawl interrupted before completion")]
    Interrupted,
}

impl From<chromiumoxide::error::CdpError> for CrawlError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        CrawlError::Browser(err.to_string())
    }
}

impl From<serde_yaml::Error> for CrawlError {
    fn from(err: serde_yaml::Error) -> Self {
        CrawlError::Config(err.to_string())
    }
}
