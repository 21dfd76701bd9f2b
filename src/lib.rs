//! Latency and packet-loss measurement for many hosts at once.
//!
//! A run probes every host `round_count` times over ICMP echo, TCP connect
//! or HTTP request, with a bounded number of probes in flight, and returns
//! one [`PingStat`] per input host in input order.
//!
//! ```no_run
//! use multiping::{PingOptions, tcp_ping};
//!
//! # async fn run() -> multiping::Result<()> {
//! let stats = tcp_ping(&PingOptions::default(), &["example.com:443"]).await?;
//! println!("{:.0}% loss", stats[0].loss_rate * 100.0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod destination;
pub mod error;
pub mod history;
pub mod http;
pub mod icmp;
pub mod ping;
pub mod probe;
pub mod report;
pub mod resolver;
pub mod scheduler;
pub mod tcp;

use std::collections::HashSet;
use std::sync::Arc;

pub use config::{AppConfig, HttpOptions, IcmpOptions, Interval, PingOptions};
pub use destination::Destination;
pub use error::{PingError, Result};
pub use history::{History, Outcome};
pub use ping::PingStat;
pub use probe::{Probe, Transport};
pub use report::{PingReport, sort_stats};
pub use scheduler::{Scheduler, StatTable};

use crate::http::HttpProbe;
use crate::icmp::IcmpProbe;
use crate::tcp::TcpProbe;

/// Probes `hosts` over `transport` and returns their statistics in input
/// order.
///
/// Only a failure to set up the transport (or invalid options) is an
/// error. Unresolvable or unreachable hosts are reported as records with
/// zero samples or full loss.
pub async fn ping<S: AsRef<str>>(transport: &Transport, opts: &PingOptions, hosts: &[S]) -> Result<Vec<PingStat>> {
    opts.validate()?;
    let unique = unique_hosts(hosts);
    log::info!("{transport} ping of {} hosts, {} rounds", unique.len(), opts.round_count);

    let table = match transport {
        Transport::Icmp(icmp) => {
            let probe = IcmpProbe::new(opts, icmp)?;
            let dests = icmp::resolve_destinations(&unique, icmp, opts.history_size).await;
            Scheduler::new(opts).run(Arc::new(probe), dests).await?
        }
        Transport::Tcp => {
            let dests = named_destinations(&unique, opts.history_size);
            Scheduler::new(opts).run(Arc::new(TcpProbe::new(opts)), dests).await?
        }
        Transport::Http(http) => {
            let probe = HttpProbe::new(opts, http)?;
            let dests = named_destinations(&unique, opts.history_size);
            Scheduler::new(opts).run(Arc::new(probe), dests).await?
        }
    };

    log::info!("{transport} ping finished, {} hosts with statistics", table.len());
    Ok(sort_stats(&table, hosts))
}

/// ICMP echo against every IPv4 address of each host.
pub async fn icmp_ping<S: AsRef<str>>(opts: &PingOptions, icmp: &IcmpOptions, hosts: &[S]) -> Result<Vec<PingStat>> {
    ping(&Transport::Icmp(icmp.clone()), opts, hosts).await
}

/// TCP connect to each `host:port`.
pub async fn tcp_ping<S: AsRef<str>>(opts: &PingOptions, hosts: &[S]) -> Result<Vec<PingStat>> {
    ping(&Transport::Tcp, opts, hosts).await
}

/// One HTTP request per round to each URL.
pub async fn http_ping<S: AsRef<str>>(opts: &PingOptions, http: &HttpOptions, hosts: &[S]) -> Result<Vec<PingStat>> {
    ping(&Transport::Http(http.clone()), opts, hosts).await
}

fn unique_hosts<S: AsRef<str>>(hosts: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    hosts
        .iter()
        .map(AsRef::as_ref)
        .filter(|host| seen.insert(*host))
        .collect()
}

fn named_destinations(hosts: &[&str], history_size: usize) -> Vec<Destination> {
    hosts
        .iter()
        .map(|host| Destination::new(*host, history_size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn quick() -> PingOptions {
        PingOptions::default()
            .with_round_count(2)
            .with_timeout(Duration::from_millis(500))
            .with_interval(Interval::Fixed { delay: Duration::from_millis(1) })
    }

    async fn listening_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });
        addr.to_string()
    }

    async fn closed_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    }

    #[test]
    fn dedupes_hosts_in_order() {
        assert_eq!(unique_hosts(&["b", "a", "b", "c", "a"]), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn tcp_ping_reports_every_input_host() {
        let up = listening_port().await;
        let down = closed_port().await;
        let hosts = vec![up.clone(), down.clone(), up.clone()];

        let stats = tcp_ping(&quick(), &hosts).await.unwrap();

        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].host, up);
        assert_eq!(stats[0].sent, 2);
        assert_eq!(stats[0].loss_rate, 0.0);
        assert!(stats[0].worst >= stats[0].best);
        assert_eq!(stats[1].host, down);
        assert_eq!(stats[1].sent, 2);
        assert_eq!(stats[1].loss_rate, 1.0);
        assert_eq!(stats[1].mean, Duration::ZERO);
        assert_eq!(stats[2], stats[0]);
    }

    #[tokio::test]
    async fn invalid_options_abort_before_probing() {
        let err = tcp_ping(&quick().with_max_concurrency(0), &["127.0.0.1:1"])
            .await
            .unwrap_err();
        assert!(matches!(err, PingError::InvalidOptions(_)));

        let http = HttpOptions::default().with_method("NOT A METHOD");
        let err = http_ping(&quick(), &http, &["http://127.0.0.1/"]).await.unwrap_err();
        assert!(matches!(err, PingError::InvalidOptions(_)));
    }

    #[tokio::test]
    async fn icmp_setup_failure_or_ordered_output() {
        let opts = quick().with_round_count(1);
        let hosts = ["127.0.0.1", "::1"];
        match icmp_ping(&opts, &IcmpOptions::default(), &hosts).await {
            Ok(stats) => {
                assert_eq!(stats.len(), 2);
                assert_eq!(stats[0].host, "127.0.0.1");
                assert_eq!(stats[0].sent, 1);
                assert_eq!(stats[1], PingStat::empty("::1"));
            }
            // raw sockets need privileges the test runner may not have
            Err(e) => assert!(matches!(e, PingError::Setup { .. }), "unexpected error {e}"),
        }
    }

    #[tokio::test]
    async fn empty_host_list() {
        let stats = tcp_ping::<&str>(&quick(), &[]).await.unwrap();
        assert!(stats.is_empty());
    }
}
