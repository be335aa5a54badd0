//! Delivery statistics for a simulator run.

use crate::reporter::{Ack, ReportError};
use chrono::{DateTime, Local};
use serde::Serialize;

/// Counters for the current run.
#[derive(Debug, Clone)]
pub struct DeliveryStats {
    /// Readings produced
    readings: u64,
    /// Readings acknowledged with HTTP 200
    delivered: u64,
    /// Readings answered with another status
    rejected: u64,
    /// Readings that never reached the endpoint
    transport_failures: u64,
    /// Run start time
    started_at: DateTime<Local>,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self {
            readings: 0,
            delivered: 0,
            rejected: 0,
            transport_failures: 0,
            started_at: Local::now(),
        }
    }

    /// Record the outcome of one cycle.
    pub fn record(&mut self, outcome: &Result<Ack, ReportError>) {
        self.readings += 1;
        match outcome {
            Ok(_) => self.delivered += 1,
            Err(ReportError::Rejected { .. }) => self.rejected += 1,
            Err(_) => self.transport_failures += 1,
        }
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            readings: self.readings,
            delivered: self.delivered,
            rejected: self.rejected,
            transport_failures: self.transport_failures,
            run_duration_secs: (Local::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Readings generated: {}\n\
             - Delivered: {}\n\
             - Rejected by endpoint: {}\n\
             - Network failures: {}\n\
             - Run duration: {} seconds",
            stats.readings,
            stats.delivered,
            stats.rejected,
            stats.transport_failures,
            stats.run_duration_secs
        )
    }
}

impl Default for DeliveryStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub readings: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub transport_failures: u64,
    pub run_duration_secs: u64,
}
