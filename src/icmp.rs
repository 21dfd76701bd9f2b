use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};

use crate::config::{IcmpOptions, PingOptions};
use crate::destination::Destination;
use crate::error::{PingError, Result};
use crate::history::Outcome;
use crate::probe::Probe;
use crate::resolver;

/// ICMP echo probe over a raw socket shared by every destination.
pub struct IcmpProbe {
    client: Client,
    timeout: Duration,
    payload: Vec<u8>,
}

impl IcmpProbe {
    /// Opens the raw socket. Fails when the process lacks the privilege
    /// to do so.
    pub fn new(opts: &PingOptions, icmp: &IcmpOptions) -> Result<Self> {
        let config = Config::builder()
            .kind(ICMP::V4)
            .bind(SocketAddr::new(icmp.bind_addr(), 0))
            .build();
        let client = Client::new(&config).map_err(|e| PingError::setup("icmp", e))?;

        Ok(Self {
            client,
            timeout: opts.timeout,
            payload: vec![0; icmp.payload_size as usize],
        })
    }
}

#[async_trait]
impl Probe for IcmpProbe {
    fn name(&self) -> &'static str {
        "icmp"
    }

    async fn measure(&self, dest: &Destination) -> Outcome {
        let Some(addr) = dest.next_address() else {
            log::error!("icmp probe to {} has no resolved address", dest.host());
            return Outcome::Failure;
        };

        let seq = PingSequence(dest.history().attempts() as u16);
        let mut pinger = self.client.pinger(addr, PingIdentifier(rand::random())).await;
        pinger.timeout(self.timeout);

        match pinger.ping(seq, &self.payload).await {
            Ok((_, rtt)) => {
                log::debug!("ping host[{}] ({addr}) rtt {rtt:?}", dest.host());
                Outcome::Success(rtt)
            }
            Err(e) => {
                log::warn!("ping host[{}] ({addr}) error: {e}", dest.host());
                Outcome::Failure
            }
        }
    }
}

/// Builds one destination per unique host with all of its IPv4
/// addresses. Hosts that fail to resolve are skipped.
pub async fn resolve_destinations(hosts: &[&str], icmp: &IcmpOptions, history_size: usize) -> Vec<Destination> {
    let mut dests = Vec::with_capacity(hosts.len());
    for host in hosts {
        match resolver::resolve_v4(host, icmp.resolver_timeout).await {
            Ok(addrs) => {
                log::debug!("resolved {host} to {addrs:?}");
                dests.push(Destination::with_addresses(*host, addrs, history_size));
            }
            Err(e) => log::warn!("resolve address of {host} error: {e}"),
        }
    }
    dests
}
