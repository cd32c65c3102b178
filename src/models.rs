use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Score partition: below SUSPICIOUS is Safe, below CRITICAL is Suspicious.
pub const SUSPICIOUS_THRESHOLD: u8 = 40;
pub const CRITICAL_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::Tcp, Protocol::Udp, Protocol::Icmp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized protocol tag: {0:?}")]
pub struct ParseProtocolError(pub String);

impl FromStr for Protocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            t if t.eq_ignore_ascii_case("TCP") => Ok(Protocol::Tcp),
            t if t.eq_ignore_ascii_case("UDP") => Ok(Protocol::Udp),
            t if t.eq_ignore_ascii_case("ICMP") => Ok(Protocol::Icmp),
            other => Err(ParseProtocolError(other.to_string())),
        }
    }
}

/// One synthetic traffic observation. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkEvent {
    pub address: String,
    pub port: u16,
    pub protocol: Protocol,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Safe,
    Suspicious,
    Critical,
}

impl RiskLevel {
    /// Buckets a clamped 0-100 score. The partition is strict: every score
    /// maps to exactly one level.
    pub fn from_score(score: u8) -> RiskLevel {
        if score >= CRITICAL_THRESHOLD {
            RiskLevel::Critical
        } else if score >= SUSPICIOUS_THRESHOLD {
            RiskLevel::Suspicious
        } else {
            RiskLevel::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "Safe",
            RiskLevel::Suspicious => "Suspicious",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
}

/// The unit handed from the pipeline to the stats aggregate and the sink.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedEvent {
    #[serde(flatten)]
    pub event: NetworkEvent,
    pub score: u8,
    pub level: RiskLevel,
}

impl ClassifiedEvent {
    pub fn new(event: NetworkEvent, assessment: RiskAssessment) -> Self {
        ClassifiedEvent {
            event,
            score: assessment.score,
            level: assessment.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_parses_case_insensitively() {
        assert_eq!("TCP".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("udp".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert_eq!(" Icmp ".parse::<Protocol>().unwrap(), Protocol::Icmp);
    }

    #[test]
    fn test_protocol_rejects_unknown_tag() {
        let err = "GRE".parse::<Protocol>().unwrap_err();
        assert_eq!(err, ParseProtocolError("GRE".to_string()));
    }

    #[test]
    fn test_protocol_display_round_trips() {
        for proto in Protocol::ALL {
            assert_eq!(proto.to_string().parse::<Protocol>().unwrap(), proto);
        }
    }

    #[test]
    fn test_level_partition_boundaries() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Suspicious);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Suspicious);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
    }

    #[test]
    fn test_level_partition_covers_every_score() {
        for score in 0..=100u8 {
            let level = RiskLevel::from_score(score);
            match level {
                RiskLevel::Safe => assert!(score < SUSPICIOUS_THRESHOLD),
                RiskLevel::Suspicious => {
                    assert!(score >= SUSPICIOUS_THRESHOLD && score < CRITICAL_THRESHOLD)
                }
                RiskLevel::Critical => assert!(score >= CRITICAL_THRESHOLD),
            }
        }
    }
}
