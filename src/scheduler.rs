//! Round scheduler.
//!
//! Every round probes each destination once with at most
//! `max_concurrency` probes in flight. A round only starts after every
//! probe of the previous round has finished, which keeps a single writer
//! per [`History`](crate::history::History) at any time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{Interval, PingOptions};
use crate::destination::Destination;
use crate::error::Result;
use crate::ping::PingStat;
use crate::probe::{Probe, probe_once};

pub type StatTable = HashMap<String, PingStat>;

#[derive(Debug, Clone)]
pub struct Scheduler {
    round_count: usize,
    max_concurrency: usize,
    interval: Interval,
    probe_deadline: Duration,
}

impl Scheduler {
    pub fn new(opts: &PingOptions) -> Self {
        Self {
            round_count: opts.round_count,
            max_concurrency: opts.max_concurrency.clamp(1, Semaphore::MAX_PERMITS),
            interval: opts.interval.clone(),
            probe_deadline: opts.probe_deadline(),
        }
    }

    /// Runs all rounds against `destinations` and returns the latest
    /// statistics of each one, keyed by host.
    pub async fn run<P: Probe>(&self, probe: Arc<P>, destinations: Vec<Destination>) -> Result<StatTable> {
        let destinations: Vec<Arc<Destination>> = destinations.into_iter().map(Arc::new).collect();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let table = Arc::new(Mutex::new(StatTable::with_capacity(destinations.len())));

        for round in 0..self.round_count {
            if round > 0 {
                let delay = self.interval.next();
                log::debug!("sleeping {delay:?} before round {}", round + 1);
                tokio::time::sleep(delay).await;
            }
            log::debug!(
                "{} round {}/{} over {} destinations",
                probe.name(),
                round + 1,
                self.round_count,
                destinations.len()
            );

            let mut tasks = JoinSet::new();
            for dest in &destinations {
                let permit = semaphore.clone().acquire_owned().await?;
                let probe = probe.clone();
                let dest = dest.clone();
                let table = table.clone();
                let deadline = self.probe_deadline;

                tasks.spawn(async move {
                    probe_once(probe.as_ref(), &dest, deadline).await;
                    let stat = dest.snapshot();
                    lock(&table).insert(stat.host.clone(), stat);
                    drop(permit);
                });
            }

            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    log::error!("probe task failed: {e}");
                }
            }
        }

        let stats = std::mem::take(&mut *lock(&table));
        Ok(stats)
    }
}

fn lock(table: &Mutex<StatTable>) -> std::sync::MutexGuard<'_, StatTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
