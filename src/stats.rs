use serde::Serialize;
use std::sync::Mutex;

use crate::models::RiskLevel;

/// Point-in-time copy of the running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_packets: u64,
    pub safe: u64,
    pub suspicious: u64,
    pub critical: u64,
}

impl StatsSnapshot {
    pub fn count_for(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Safe => self.safe,
            RiskLevel::Suspicious => self.suspicious,
            RiskLevel::Critical => self.critical,
        }
    }

    pub fn level_sum(&self) -> u64 {
        self.safe + self.suspicious + self.critical
    }
}

/// Running aggregate over classified events. All counters live under one
/// lock, so a snapshot can never observe the total advanced without the
/// matching per-level count.
#[derive(Debug, Default)]
pub struct TrafficStats {
    counts: Mutex<StatsSnapshot>,
}

impl TrafficStats {
    pub fn new() -> Self {
        TrafficStats::default()
    }

    pub fn apply(&self, level: RiskLevel) {
        let mut counts = self.counts.lock().unwrap();
        counts.total_packets += 1;
        match level {
            RiskLevel::Safe => counts.safe += 1,
            RiskLevel::Suspicious => counts.suspicious += 1,
            RiskLevel::Critical => counts.critical += 1,
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.counts.lock().unwrap()
    }

    pub fn reset(&self) {
        *self.counts.lock().unwrap() = StatsSnapshot::default();
    }
}
