use thiserror::Error;

/// Call-level failures. Per-host and per-probe failures never show up
/// here; they are counted as loss.
#[derive(Debug, Error)]
pub enum PingError {
    /// The shared transport context could not be created.
    #[error("init {transport} pinger error: {source}")]
    Setup {
        transport: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] tokio::sync::AcquireError),

    #[error("config error: {0}")]
    Config(String),

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config format error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PingError {
    pub fn setup(
        transport: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PingError::Setup {
            transport,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PingError>;
