// src/classifier.rs
use rand::Rng;

use crate::models::{NetworkEvent, ParseProtocolError, Protocol, RiskAssessment, RiskLevel};

pub const SENSITIVE_PORTS: [u16; 5] = [21, 22, 23, 25, 3389];
pub const WEB_PORTS: [u16; 2] = [80, 443];

const SENSITIVE_PORT_BASE: i16 = 55;
const WEB_PORT_BASE: i16 = 25;
const UDP_ADJUSTMENT: i16 = 15;
const ICMP_ADJUSTMENT: i16 = 30;
const EXTERNAL_ADDRESS_ADJUSTMENT: i16 = 10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    #[error("port {0} is outside the valid range 0-65535")]
    PortOutOfRange(i64),
    #[error(transparent)]
    UnknownProtocol(#[from] ParseProtocolError),
}

/// Scores one observation. Repeated calls on the same input differ by the
/// injected noise, but the result always satisfies the 0-100 clamp and the
/// score/level partition.
pub fn assess<R: Rng + ?Sized>(
    address: &str,
    port: u16,
    protocol: Protocol,
    rng: &mut R,
) -> RiskAssessment {
    let mut score: i16 = if SENSITIVE_PORTS.contains(&port) {
        SENSITIVE_PORT_BASE
    } else if WEB_PORTS.contains(&port) {
        WEB_PORT_BASE
    } else {
        rng.gen_range(5..=20)
    };

    score += match protocol {
        Protocol::Udp => UDP_ADJUSTMENT,
        Protocol::Icmp => ICMP_ADJUSTMENT,
        Protocol::Tcp => 0,
    };

    if !is_private_address(address) {
        score += EXTERNAL_ADDRESS_ADJUSTMENT;
    }

    // Adaptive noise
    score += rng.gen_range(-10..=10);

    let score = score.clamp(0, 100) as u8;
    RiskAssessment {
        score,
        level: RiskLevel::from_score(score),
    }
}

pub fn assess_event<R: Rng + ?Sized>(event: &NetworkEvent, rng: &mut R) -> RiskAssessment {
    assess(&event.address, event.port, event.protocol, rng)
}

/// Validating entry point for input that did not come from the generator.
/// Rejects out-of-range ports and unknown protocol tags instead of coercing.
pub fn assess_raw<R: Rng + ?Sized>(
    address: &str,
    port: i64,
    protocol: &str,
    rng: &mut R,
) -> Result<RiskAssessment, ClassifyError> {
    let port = u16::try_from(port).map_err(|_| ClassifyError::PortOutOfRange(port))?;
    let protocol: Protocol = protocol.parse()?;
    Ok(assess(address, port, protocol, rng))
}

fn is_private_address(address: &str) -> bool {
    address.starts_with("192.168.") || address.starts_with("10.")
}
