//! Tunable parameters and source configuration.
//!
//! The constants mirror the behaviour of the chest-strap receivers this
//! pipeline was built against: readings arrive a few times per second,
//! glitch bursts are common right after strap contact is lost, and a real
//! heart rate never moves faster than ~50 bpm per second.

use serde::{Deserialize, Serialize};

/// Reserved port identifier that selects the synthetic source instead of a
/// physical serial device.
pub const FAKE_PORT_NAME: &str = "$fake-port$";

/// A player whose signal has not been refreshed for this long is reported
/// as disconnected.
pub const DISCONNECTION_TIMEOUT_SECS: f32 = 10.0;

/// Consecutive consistent readings required after a discontinuity before
/// the source is trusted again.
pub const STABLE_THRESHOLD: u16 = 7;

/// Maximum plausible heart-rate change, in bpm per second. Faster implied
/// drifts are rejected as sensor artifacts.
pub const MAX_RATE_CHANGE_PER_SEC: f32 = 50.0;

/// Raw jump (bpm, against the previous *received* value) at or above which
/// a reading is treated as a discontinuity rather than a measurement.
pub const DISCONTINUITY_JUMP: u32 = 100;

/// Gaps shorter than this make the rate-of-change estimate too noisy to
/// trust, so the velocity guard is skipped below it.
pub const MIN_VELOCITY_GAP_SECS: f32 = 0.02;

/// Exponential smoothing weight of the previous smoothed value.
pub const SMOOTHING_OLD_WEIGHT: f32 = 0.8;

/// Source configuration: one port entry per player slot.
///
/// The same port name may appear in several slots — those slots then share
/// a single reader (a multiplexed device reporting for multiple players).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Ordered port identifiers, one per player slot (slots are 1-based).
    /// [`FAKE_PORT_NAME`] selects the synthetic source.
    pub ports: Vec<String>,
    /// Baud rate shared by every physical port.
    pub baud_rate: u32,
    /// Interval between polls, in milliseconds. Drains are non-blocking,
    /// so this bounds reaction latency rather than throughput.
    pub poll_interval_ms: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            ports: vec![FAKE_PORT_NAME.to_string()],
            baud_rate: 115_200,
            poll_interval_ms: 20,
        }
    }
}

impl TelemetryConfig {
    /// Reject configurations the registry cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.ports.is_empty() {
            return Err(crate::error::Error::Config("no player slots configured"));
        }
        if self.ports.iter().any(|p| p.trim().is_empty()) {
            return Err(crate::error::Error::Config("empty port identifier"));
        }
        if self.baud_rate == 0 {
            return Err(crate::error::Error::Config("baud rate must be non-zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(crate::error::Error::Config("poll interval must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = TelemetryConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.ports.len(), 1);
        assert_eq!(c.ports[0], FAKE_PORT_NAME);
        assert!(c.baud_rate > 0);
    }

    #[test]
    fn serde_roundtrip() {
        let c = TelemetryConfig {
            ports: vec!["/dev/ttyUSB0".into(), "/dev/ttyUSB0".into()],
            baud_rate: 9600,
            poll_interval_ms: 50,
        };
        let json = serde_json::to_string(&c).unwrap();
        let c2: TelemetryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.ports, c2.ports);
        assert_eq!(c.baud_rate, c2.baud_rate);
        assert_eq!(c.poll_interval_ms, c2.poll_interval_ms);
    }

    #[test]
    fn validate_rejects_bad_configs() {
        let mut c = TelemetryConfig::default();
        c.ports.clear();
        assert!(c.validate().is_err());

        let mut c = TelemetryConfig::default();
        c.baud_rate = 0;
        assert!(c.validate().is_err());

        let mut c = TelemetryConfig::default();
        c.ports = vec![" ".into()];
        assert!(c.validate().is_err());
    }
}
