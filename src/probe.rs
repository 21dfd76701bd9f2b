use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{HttpOptions, IcmpOptions};
use crate::destination::Destination;
use crate::history::Outcome;

/// A transport able to perform one latency measurement.
///
/// Implementations hold whatever shared context their transport needs
/// (socket handle, pooled client) and must be safe to use from many
/// probes at once. Transport-level failures are reported as
/// [`Outcome::Failure`], never as a panic or an error value.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn measure(&self, dest: &Destination) -> Outcome;
}

/// Performs one attempt against `dest` and records it in its history.
///
/// `deadline` bounds the whole attempt; a probe that overruns it is
/// counted as lost.
pub async fn probe_once<P: Probe + ?Sized>(probe: &P, dest: &Destination, deadline: Duration) -> Outcome {
    let outcome = match tokio::time::timeout(deadline, probe.measure(dest)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            log::warn!(
                "{} probe to {} exceeded the {:?} deadline",
                probe.name(),
                dest.host(),
                deadline
            );
            Outcome::Failure
        }
    };
    dest.record(outcome);
    outcome
}

/// Transport selected for a probing run, with its specific options.
#[derive(Debug, Clone)]
pub enum Transport {
    Icmp(IcmpOptions),
    Tcp,
    Http(HttpOptions),
}

impl Transport {
    pub fn name(&self) -> &'static str {
        match self {
            Transport::Icmp(_) => "icmp",
            Transport::Tcp => "tcp",
            Transport::Http(_) => "http",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
