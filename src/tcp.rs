use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::PingOptions;
use crate::destination::Destination;
use crate::history::Outcome;
use crate::probe::Probe;

/// Measures how long a TCP connect and close to `host:port` take. The
/// host string is dialled directly, resolution included. A failed close
/// counts as a loss.
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(opts: &PingOptions) -> Self {
        Self { timeout: opts.timeout }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn measure(&self, dest: &Destination) -> Outcome {
        let start = Instant::now();
        let mut stream = match timeout(self.timeout, TcpStream::connect(dest.host())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                log::warn!("ping host({}) error: {e}", dest.host());
                return Outcome::Failure;
            }
            Err(_) => {
                log::warn!("ping host({}) timed out after {:?}", dest.host(), self.timeout);
                return Outcome::Failure;
            }
        };

        if let Err(e) = stream.shutdown().await {
            log::warn!("close tcp connection({}) error: {e}", dest.host());
            return Outcome::Failure;
        }
        let rtt = start.elapsed();
        log::debug!("tcp connect to {} took {rtt:?}", dest.host());
        Outcome::Success(rtt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn open_port_is_a_success() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let probe = TcpProbe::new(&PingOptions::default());
        let dest = Destination::new(addr.to_string(), 4);
        assert!(probe.measure(&dest).await.is_success());
    }

    #[tokio::test]
    async fn sample_covers_connect_and_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let probe = TcpProbe::new(&PingOptions::default());
        let dest = Destination::new(addr.to_string(), 4);
        let start = Instant::now();
        let Outcome::Success(rtt) = probe.measure(&dest).await else {
            panic!("connect to {addr} failed");
        };
        assert!(rtt > Duration::ZERO);
        assert!(rtt <= start.elapsed());
    }

    #[tokio::test]
    async fn closed_port_is_a_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = TcpProbe::new(&PingOptions::default().with_timeout(Duration::from_millis(500)));
        let dest = Destination::new(addr.to_string(), 4);
        assert_eq!(probe.measure(&dest).await, Outcome::Failure);
    }

    #[tokio::test]
    async fn missing_port_is_a_failure() {
        let probe = TcpProbe::new(&PingOptions::default());
        let dest = Destination::new("127.0.0.1", 4);
        assert_eq!(probe.measure(&dest).await, Outcome::Failure);
    }
}
