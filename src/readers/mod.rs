//! Source readers — one per distinct physical or synthetic device.
//!
//! ```text
//!   bytes ──▶ LineFramer ──▶ scan_batch ──▶ StabilityFilter ──▶ fan-out
//!                                                                 │
//!                                              assigned PlayerStates
//! ```
//!
//! A reader owns the framing/filtering state for its device and pushes
//! accepted readings into every player slot assigned to it. Several slots
//! may share one reader (one multiplexed device feeding two players); a
//! reader with no assigned slots is legal and simply inert.

pub mod serial;
pub mod synthetic;

use std::time::Instant;

use crate::config::FAKE_PORT_NAME;
use crate::error::Result;
use crate::player::PlayerState;
use crate::protocol::RawSample;

pub use serial::SerialReader;
pub use synthetic::FakeReader;

/// Common contract for every source variant.
pub trait SourceReader {
    /// Human-readable port label.
    fn label(&self) -> &str;

    /// Whether the underlying device is open. A device that failed to open
    /// stays closed for the reader's whole lifetime — no retry.
    fn is_open(&self) -> bool;

    /// Last raw rate received, pre-filter. Diagnostic only — never use it
    /// to drive control decisions.
    fn last_raw_rate(&self) -> u32;

    /// Whether the source currently passes the stability warm-up.
    /// Diagnostic only.
    fn is_stable(&self) -> bool;

    /// Player slots (0-based) this reader fans out to.
    fn assigned_players(&self) -> &[usize];

    /// Assign a player slot. Assigning the same slot twice is a no-op.
    fn assign_player(&mut self, slot: usize);

    /// Drain whatever the device has buffered and update the assigned
    /// players. Must never block waiting for more bytes: partial lines are
    /// deferred to the next tick via the framer.
    fn poll(&mut self, now: Instant, players: &mut [PlayerState]) -> Result<()>;

    /// Release the underlying device. Idempotent; called on teardown and
    /// again on drop.
    fn shutdown(&mut self);
}

/// Build the reader variant for a configured port name.
pub(crate) fn open_reader(name: &str, baud_rate: u32, now: Instant) -> Box<dyn SourceReader> {
    if name == FAKE_PORT_NAME {
        Box::new(FakeReader::new())
    } else {
        Box::new(SerialReader::open(name, baud_rate, now))
    }
}

/// Apply one sample to every assigned player. Out-of-range slots are
/// skipped rather than faulting — they can only appear transiently during
/// reconfiguration.
pub(crate) fn fan_out(
    players: &mut [PlayerState],
    assigned: &[usize],
    sample: RawSample,
    now: Instant,
) {
    if sample.is_empty() {
        return;
    }
    for &slot in assigned {
        if let Some(player) = players.get_mut(slot) {
            player.apply(sample, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_picks_variant_by_sentinel() {
        let now = Instant::now();
        let fake = open_reader(FAKE_PORT_NAME, 115_200, now);
        assert!(fake.is_open());

        // A nonsense device path degrades to a permanently closed reader.
        let dead = open_reader("/definitely/not/a/port", 115_200, now);
        assert!(!dead.is_open());
        assert_eq!(dead.label(), "/definitely/not/a/port");
    }

    #[test]
    fn fan_out_skips_empty_samples_and_bad_slots() {
        let now = Instant::now();
        let mut players = vec![PlayerState::new(now)];

        fan_out(&mut players, &[0, 7], RawSample::default(), now);
        assert_eq!(players[0].rate(), 0);

        let sample = RawSample {
            rate: 75,
            breaking: Some(true),
        };
        fan_out(&mut players, &[0, 7], sample, now);
        assert_eq!(players[0].rate(), 75);
        assert!(players[0].is_breaking());
    }
}
