use crossbeam_channel::{unbounded, Receiver};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::generator;
use crate::models::ClassifiedEvent;
use crate::rules::RuleSet;
use crate::sink::DisplaySink;
use crate::stats::{StatsSnapshot, TrafficStats};

pub const DEFAULT_EVENT_INTERVAL: Duration = Duration::from_millis(800);
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_millis(600);
const DEFAULT_LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub event_interval: Duration,
    pub snapshot_interval: Duration,
    pub log_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            event_interval: DEFAULT_EVENT_INTERVAL,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

/// One monitoring session controller: owns the state machine, the worker's
/// run flag and the aggregates. The host creates one per session.
pub struct Monitor {
    shared: Arc<Shared>,
}

struct Shared {
    config: MonitorConfig,
    lifecycle: Mutex<Lifecycle>,
    stats: TrafficStats,
    recent: Mutex<VecDeque<ClassifiedEvent>>,
    sink: Box<dyn DisplaySink>,
    rules: RuleSet,
}

struct Lifecycle {
    state: MonitorState,
    running: Option<Arc<AtomicBool>>,
    // Bumped on every start; delivery discards events from earlier epochs.
    epoch: u64,
}

impl Lifecycle {
    fn halt_worker(&mut self) {
        if let Some(flag) = self.running.take() {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

impl Monitor {
    pub fn new(config: MonitorConfig, rules: RuleSet, sink: Box<dyn DisplaySink>) -> Monitor {
        Monitor {
            shared: Arc::new(Shared {
                config,
                lifecycle: Mutex::new(Lifecycle {
                    state: MonitorState::Idle,
                    running: None,
                    epoch: 0,
                }),
                stats: TrafficStats::new(),
                recent: Mutex::new(VecDeque::new()),
                sink,
                rules,
            }),
        }
    }

    /// Idle or Paused to Running. A second call while Running is a no-op:
    /// exactly one generator is active per session.
    pub fn start(&self) {
        {
            let mut lifecycle = self.shared.lifecycle.lock().unwrap();
            if lifecycle.state == MonitorState::Running {
                return;
            }
            let running = Arc::new(AtomicBool::new(true));
            let (tx, rx) = unbounded();
            let _ = generator::spawn(
                Arc::clone(&running),
                self.shared.config.event_interval,
                tx,
            );
            lifecycle.epoch += 1;
            let epoch = lifecycle.epoch;
            let shared = Arc::clone(&self.shared);
            let _ = thread::spawn(move || deliver(shared, rx, epoch));
            lifecycle.running = Some(running);
            lifecycle.state = MonitorState::Running;
        }
        tracing::info!("monitoring started");
        self.shared.sink.on_state_changed(MonitorState::Running);
    }

    /// Running to Paused. Signals the worker and returns immediately; the
    /// worker quits within one interval. Stats are kept.
    pub fn stop(&self) {
        {
            let mut lifecycle = self.shared.lifecycle.lock().unwrap();
            if lifecycle.state != MonitorState::Running {
                return;
            }
            lifecycle.halt_worker();
            lifecycle.state = MonitorState::Paused;
        }
        tracing::info!("monitoring paused");
        self.shared.sink.on_state_changed(MonitorState::Paused);
    }

    /// Any state to Idle: halts the worker, zeroes the stats and clears the
    /// retained log. The counters are cleared under the lifecycle lock, so
    /// an in-flight event can never land after the wipe.
    pub fn reset(&self) {
        {
            let mut lifecycle = self.shared.lifecycle.lock().unwrap();
            lifecycle.halt_worker();
            lifecycle.state = MonitorState::Idle;
            self.shared.stats.reset();
            self.shared.recent.lock().unwrap().clear();
        }
        tracing::info!("monitor reset");
        self.shared.sink.on_state_changed(MonitorState::Idle);
    }

    pub fn state(&self) -> MonitorState {
        self.shared.lifecycle.lock().unwrap().state
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Most recent classified events, oldest first, capped at the
    /// configured capacity.
    pub fn recent_events(&self) -> Vec<ClassifiedEvent> {
        self.shared.recent.lock().unwrap().iter().cloned().collect()
    }

    /// Block rules loaded by the host. The scorer does not consult them
    /// yet; they are exposed read-only.
    pub fn rules(&self) -> &RuleSet {
        &self.shared.rules
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    /// Hands the sink a snapshot. The host calls this on its own cadence,
    /// independent of event production.
    pub fn publish_stats(&self) {
        let snapshot = self.shared.stats.snapshot();
        self.shared.sink.on_stats_snapshot(&snapshot);
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Ok(mut lifecycle) = self.shared.lifecycle.lock() {
            lifecycle.halt_worker();
        }
    }
}

// Drains one session's channel in production order. Counting and the sink
// call stay in FIFO order because a session has exactly one delivery thread.
// The gate runs under the lifecycle lock: an event from a halted worker or
// an earlier epoch is dropped, never counted.
fn deliver(shared: Arc<Shared>, receiver: Receiver<ClassifiedEvent>, epoch: u64) {
    for event in receiver {
        let delivered = {
            let lifecycle = shared.lifecycle.lock().unwrap();
            if lifecycle.state == MonitorState::Running && lifecycle.epoch == epoch {
                shared.stats.apply(event.level);
                let mut recent = shared.recent.lock().unwrap();
                if recent.len() >= shared.config.log_capacity {
                    recent.pop_front();
                }
                recent.push_back(event.clone());
                true
            } else {
                false
            }
        };
        if delivered {
            tracing::debug!(
                address = %event.event.address,
                score = event.score,
                level = %event.level,
                "event delivered"
            );
            shared.sink.on_classified_event(&event);
        }
    }
    tracing::debug!(epoch, "delivery drained");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn idle_monitor(sink: &MemorySink) -> Monitor {
        Monitor::new(
            MonitorConfig::default(),
            RuleSet::default(),
            Box::new(sink.clone()),
        )
    }

    #[test]
    fn test_new_monitor_is_idle_and_empty() {
        let sink = MemorySink::new();
        let monitor = idle_monitor(&sink);
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert_eq!(monitor.stats(), StatsSnapshot::default());
        assert!(monitor.recent_events().is_empty());
        assert!(monitor.rules().is_empty());
    }

    #[test]
    fn test_stop_while_idle_is_a_noop() {
        let sink = MemorySink::new();
        let monitor = idle_monitor(&sink);
        monitor.stop();
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert!(sink.transitions().is_empty());
    }

    #[test]
    fn test_reset_is_safe_from_idle() {
        let sink = MemorySink::new();
        let monitor = idle_monitor(&sink);
        monitor.reset();
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert_eq!(sink.transitions(), vec![MonitorState::Idle]);
    }

    #[test]
    fn test_publish_stats_hands_sink_a_snapshot() {
        let sink = MemorySink::new();
        let monitor = idle_monitor(&sink);
        monitor.publish_stats();
        assert_eq!(sink.snapshots(), vec![StatsSnapshot::default()]);
    }
}
