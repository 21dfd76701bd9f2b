use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ping::PingStat;
use crate::scheduler::StatTable;

/// Projects `table` onto the caller's host order.
///
/// The result always has one entry per element of `hosts`, duplicates
/// included. Hosts missing from the table get a zero-valued record.
pub fn sort_stats<S: AsRef<str>>(table: &StatTable, hosts: &[S]) -> Vec<PingStat> {
    hosts
        .iter()
        .map(|host| {
            let host = host.as_ref();
            table.get(host).cloned().unwrap_or_else(|| PingStat::empty(host))
        })
        .collect()
}

/// Ordered statistics of one run, stamped with its completion time.
#[derive(Debug, Clone, Serialize)]
pub struct PingReport {
    pub transport: String,
    pub finished_at: DateTime<Utc>,
    pub stats: Vec<PingStat>,
}

impl PingReport {
    pub fn new(transport: impl Into<String>, stats: Vec<PingStat>) -> Self {
        Self {
            transport: transport.into(),
            finished_at: Utc::now(),
            stats,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl fmt::Display for PingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.stats.iter().map(|s| s.host.len()).max().unwrap_or(4).max(4);
        writeln!(
            f,
            "{:<width$} {:>5} {:>6} {:>9} {:>9} {:>9} {:>9}",
            "HOST", "SENT", "LOSS", "MEAN", "BEST", "WORST", "LAST"
        )?;
        for stat in &self.stats {
            writeln!(
                f,
                "{:<width$} {:>5} {:>5.1}% {:>7.2}ms {:>7.2}ms {:>7.2}ms {:>7.2}ms",
                stat.host,
                stat.sent,
                stat.loss_rate * 100.0,
                ms(stat.mean),
                ms(stat.best),
                ms(stat.worst),
                ms(stat.last),
            )?;
        }
        Ok(())
    }
}
