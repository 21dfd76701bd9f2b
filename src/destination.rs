use std::net::IpAddr;

use crate::history::{History, Outcome};
use crate::ping::PingStat;

/// A probing target: the caller's host string plus the statistics
/// accumulated for it.
#[derive(Debug)]
pub struct Destination {
    host: String,
    addresses: Vec<IpAddr>,
    history: History,
}

impl Destination {
    /// Target dialled by name (TCP, HTTP).
    pub fn new(host: impl Into<String>, history_size: usize) -> Self {
        Self {
            host: host.into(),
            addresses: Vec::new(),
            history: History::new(history_size),
        }
    }

    /// Target with pre-resolved addresses (ICMP).
    pub fn with_addresses(host: impl Into<String>, addresses: Vec<IpAddr>, history_size: usize) -> Self {
        Self {
            host: host.into(),
            addresses,
            history: History::new(history_size),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    /// Address to use for the next attempt. Multi-address hosts rotate
    /// through their addresses, one attempt each.
    pub fn next_address(&self) -> Option<IpAddr> {
        if self.addresses.is_empty() {
            return None;
        }
        let attempt = self.history.attempts();
        Some(self.addresses[attempt % self.addresses.len()])
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn record(&self, outcome: Outcome) {
        self.history.record(outcome);
    }

    pub fn snapshot(&self) -> PingStat {
        self.history.snapshot().with_host(self.host.as_str())
    }
}
