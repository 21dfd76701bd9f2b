use std::time::Duration;
use serde::{Serialize, Serializer};

/// Per-host summary of a probing run.
///
/// Latency fields are zero when no probe to the host ever succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PingStat {
    pub host: String,
    pub sent: usize,
    pub loss_rate: f64,
    #[serde(rename = "mean_ms", serialize_with = "as_millis")]
    pub mean: Duration,
    #[serde(rename = "last_ms", serialize_with = "as_millis")]
    pub last: Duration,
    #[serde(rename = "best_ms", serialize_with = "as_millis")]
    pub best: Duration,
    #[serde(rename = "worst_ms", serialize_with = "as_millis")]
    pub worst: Duration,
}

impl PingStat {
    /// Zero-valued record for a host that produced no statistics.
    pub fn empty(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn is_unreachable(&self) -> bool {
        self.sent > 0 && self.loss_rate >= 1.0
    }
}

fn as_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_nanos() as f64 / 1_000_000.0)
}
