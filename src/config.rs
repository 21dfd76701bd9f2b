use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PingError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_ROUND_COUNT: usize = 10;
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_HISTORY_SIZE: usize = 50;
pub const DEFAULT_JITTER: Duration = Duration::from_millis(200);
pub const DEFAULT_DEADLINE_GRACE: Duration = Duration::from_secs(1);
pub const DEFAULT_PAYLOAD_SIZE: u16 = 56;
pub const DEFAULT_RESOLVER_TIMEOUT: Duration = Duration::from_millis(1500);

pub type IntervalFn = Arc<dyn Fn() -> Duration + Send + Sync>;

/// Delay inserted between two rounds.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interval {
    Fixed {
        #[serde(rename = "delay_ms", with = "millis")]
        delay: Duration,
    },
    /// Uniformly random in `[0, max)`, millisecond resolution.
    Jitter {
        #[serde(rename = "max_ms", with = "millis")]
        max: Duration,
    },
    #[serde(skip)]
    Custom(IntervalFn),
}

impl Interval {
    pub fn custom(f: impl Fn() -> Duration + Send + Sync + 'static) -> Self {
        Interval::Custom(Arc::new(f))
    }

    pub fn next(&self) -> Duration {
        match self {
            Interval::Fixed { delay } => *delay,
            Interval::Jitter { max } => {
                let max_ms = max.as_millis() as u64;
                if max_ms == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
            }
            Interval::Custom(f) => f(),
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Jitter { max: DEFAULT_JITTER }
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Fixed { delay } => f.debug_struct("Fixed").field("delay", delay).finish(),
            Interval::Jitter { max } => f.debug_struct("Jitter").field("max", max).finish(),
            Interval::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options shared by every transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PingOptions {
    /// Per-probe deadline.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
    pub round_count: usize,
    pub max_concurrency: usize,
    pub interval: Interval,
    /// Number of recent successful samples kept per host.
    pub history_size: usize,
    /// Extra time granted to a probe past `timeout` before the scheduler
    /// gives up on it and records a loss.
    #[serde(rename = "deadline_grace_ms", with = "millis")]
    pub deadline_grace: Duration,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            round_count: DEFAULT_ROUND_COUNT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            interval: Interval::default(),
            history_size: DEFAULT_HISTORY_SIZE,
            deadline_grace: DEFAULT_DEADLINE_GRACE,
        }
    }
}

impl PingOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_round_count(mut self, round_count: usize) -> Self {
        self.round_count = round_count;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_history_size(mut self, history_size: usize) -> Self {
        self.history_size = history_size;
        self
    }

    pub fn with_deadline_grace(mut self, grace: Duration) -> Self {
        self.deadline_grace = grace;
        self
    }

    /// Hard upper bound on a single probe invocation.
    pub fn probe_deadline(&self) -> Duration {
        self.timeout.saturating_add(self.deadline_grace)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(PingError::InvalidOptions("max_concurrency must be at least 1".into()));
        }
        if self.history_size == 0 {
            return Err(PingError::InvalidOptions("history_size must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(PingError::InvalidOptions("timeout must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IcmpOptions {
    /// Local IPv4 address the raw socket binds to.
    pub bind: Ipv4Addr,
    pub payload_size: u16,
    #[serde(rename = "resolver_timeout_ms", with = "millis")]
    pub resolver_timeout: Duration,
}

impl Default for IcmpOptions {
    fn default() -> Self {
        Self {
            bind: Ipv4Addr::UNSPECIFIED,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            resolver_timeout: DEFAULT_RESOLVER_TIMEOUT,
        }
    }
}

impl IcmpOptions {
    pub fn bind_addr(&self) -> IpAddr {
        IpAddr::V4(self.bind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpOptions {
    pub method: String,
    pub body: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            body: None,
            headers: BTreeMap::new(),
        }
    }
}

impl HttpOptions {
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Persisted configuration for the command line tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ping: PingOptions,
    pub icmp: IcmpOptions,
    pub http: HttpOptions,
}

impl AppConfig {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PingError::Config("could not find config directory".into()))?
            .join("multiping");

        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("config.json"))
    }

    /// Loads the user's configuration, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        let path = match Self::get_config_path() {
            Ok(path) => path,
            Err(e) => {
                log::warn!("failed to get config path: {e}");
                return Self::default();
            }
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("failed to load config {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::get_config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

mod millis {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
