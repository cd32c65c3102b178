//! SmartShield: a firewall-style monitor fed by synthetic traffic.
//!
//! A background generator draws one observation per interval, the scoring
//! heuristic attaches a 0-100 risk score and level, and the monitor keeps
//! running aggregates while streaming classified events to a display sink.
//! The host drives the lifecycle through [`Monitor::start`],
//! [`Monitor::stop`] and [`Monitor::reset`].

pub mod classifier;
pub mod generator;
pub mod models;
pub mod monitor;
pub mod rules;
pub mod sink;
pub mod stats;

pub use models::{ClassifiedEvent, NetworkEvent, Protocol, RiskAssessment, RiskLevel};
pub use monitor::{Monitor, MonitorConfig, MonitorState};
pub use rules::{RuleSet, RulesError};
pub use sink::{ConsoleSink, DisplaySink, MemorySink};
pub use stats::StatsSnapshot;
