use std::sync::Mutex;
use std::time::Duration;

use crate::ping::PingStat;

/// Result of a single probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success(Duration),
    Failure,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

#[derive(Debug)]
struct Ledger {
    received: usize,
    lost: usize,
    // ring, next write index = received % len
    results: Vec<Duration>,
}

/// Fixed-capacity ledger of recent successful round-trip times plus
/// running success/failure counters.
///
/// Only successes take a slot in the ring. Once more than `capacity`
/// successes have been recorded the oldest samples are overwritten, so
/// aggregates always describe the most recent window.
#[derive(Debug)]
pub struct History {
    inner: Mutex<Ledger>,
}

impl History {
    /// Creates an empty ledger. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Ledger {
                received: 0,
                lost: 0,
                results: vec![Duration::ZERO; capacity.max(1)],
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().results.len()
    }

    pub fn record(&self, outcome: Outcome) {
        let mut ledger = self.lock();
        match outcome {
            Outcome::Success(rtt) => {
                let slot = ledger.received % ledger.results.len();
                ledger.results[slot] = rtt;
                ledger.received += 1;
            }
            Outcome::Failure => ledger.lost += 1,
        }
    }

    /// Total attempts recorded so far.
    pub fn attempts(&self) -> usize {
        let ledger = self.lock();
        ledger.received + ledger.lost
    }

    /// Computes the statistics for the current window. The returned record
    /// has an empty `host`; callers fill it in.
    pub fn snapshot(&self) -> PingStat {
        let ledger = self.lock();
        let mut stat = PingStat::default();

        if ledger.received == 0 {
            stat.sent = ledger.lost;
            if ledger.lost > 0 {
                stat.loss_rate = 1.0;
            }
            return stat;
        }

        let capacity = ledger.results.len();
        let window = &ledger.results[..ledger.received.min(capacity)];

        stat.sent = ledger.received + ledger.lost;
        stat.last = ledger.results[(ledger.received - 1) % capacity];
        stat.loss_rate = ledger.lost as f64 / stat.sent as f64;
        stat.best = window[0];
        stat.worst = window[0];

        let mut total: u128 = 0;
        for &rtt in window {
            stat.best = stat.best.min(rtt);
            stat.worst = stat.worst.max(rtt);
            total += rtt.as_nanos();
        }
        stat.mean = Duration::from_nanos((total as f64 / window.len() as f64) as u64);

        stat
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Ledger> {
        // A panic while holding the lock cannot leave the counters half
        // updated, so a poisoned ledger is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
