use std::sync::{Arc, Mutex};

use crate::models::ClassifiedEvent;
use crate::monitor::MonitorState;
use crate::stats::StatsSnapshot;

const BAR_WIDTH: usize = 20;

/// Receives the pipeline's output. Event delivery is serialized in
/// production order; snapshots arrive on their own cadence.
pub trait DisplaySink: Send + Sync {
    fn on_classified_event(&self, event: &ClassifiedEvent);

    fn on_stats_snapshot(&self, stats: &StatsSnapshot);

    fn on_state_changed(&self, state: MonitorState) {
        let _ = state;
    }
}

/// Reference sink for the console host. Plain text by default, one JSON
/// document per line when `json` is set.
pub struct ConsoleSink {
    json: bool,
}

impl ConsoleSink {
    pub fn new(json: bool) -> Self {
        ConsoleSink { json }
    }
}

impl DisplaySink for ConsoleSink {
    fn on_classified_event(&self, event: &ClassifiedEvent) {
        if self.json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        } else {
            println!("{}", format_event_line(event));
        }
    }

    fn on_stats_snapshot(&self, stats: &StatsSnapshot) {
        if self.json {
            if let Ok(line) = serde_json::to_string(stats) {
                println!("{line}");
            }
        } else {
            println!(
                "Safe: {} | Suspicious: {} | Critical: {} | Packets: {}",
                stats.safe, stats.suspicious, stats.critical, stats.total_packets
            );
        }
    }

    fn on_state_changed(&self, state: MonitorState) {
        if self.json {
            println!("{}", serde_json::json!({ "state": state }));
        } else {
            println!("{}", state_banner(state));
        }
    }
}

fn format_event_line(event: &ClassifiedEvent) -> String {
    format!(
        "{} | {:<4} | {}:{:<5} | Risk:{:03} -> {:<10} {}",
        event.event.observed_at.format("%H:%M:%S"),
        event.event.protocol,
        event.event.address,
        event.event.port,
        event.score,
        event.level,
        severity_bar(event.score),
    )
}

fn severity_bar(score: u8) -> String {
    let filled = usize::from(score) * BAR_WIDTH / 100;
    let mut bar = String::with_capacity(BAR_WIDTH);
    bar.extend(std::iter::repeat('#').take(filled));
    bar.extend(std::iter::repeat('.').take(BAR_WIDTH - filled));
    bar
}

fn state_banner(state: MonitorState) -> &'static str {
    match state {
        MonitorState::Running => "[AI Monitoring Started]",
        MonitorState::Paused => "[Monitoring Paused]",
        MonitorState::Idle => "[SmartShield X Reset]",
    }
}

/// Test sink recording everything it receives. Clones share state, so a
/// handle kept by the test observes what the pipeline delivered.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<MemorySinkState>,
}

#[derive(Default)]
struct MemorySinkState {
    events: Mutex<Vec<ClassifiedEvent>>,
    snapshots: Mutex<Vec<StatsSnapshot>>,
    transitions: Mutex<Vec<MonitorState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn events(&self) -> Vec<ClassifiedEvent> {
        self.inner.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.inner.events.lock().unwrap().len()
    }

    pub fn snapshots(&self) -> Vec<StatsSnapshot> {
        self.inner.snapshots.lock().unwrap().clone()
    }

    pub fn transitions(&self) -> Vec<MonitorState> {
        self.inner.transitions.lock().unwrap().clone()
    }
}

impl DisplaySink for MemorySink {
    fn on_classified_event(&self, event: &ClassifiedEvent) {
        self.inner.events.lock().unwrap().push(event.clone());
    }

    fn on_stats_snapshot(&self, stats: &StatsSnapshot) {
        self.inner.snapshots.lock().unwrap().push(*stats);
    }

    fn on_state_changed(&self, state: MonitorState) {
        self.inner.transitions.lock().unwrap().push(state);
    }
}
