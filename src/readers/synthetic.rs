//! Synthetic source for development and testing without hardware.
//!
//! Produces one shared channel — a gentle wander between plausible resting
//! and effort rates — and fans it out to every assigned player, exactly
//! like a real multiplexed device would. Tests (and a host application
//! that keeps a handle before registration) can switch it to manual
//! control to script rates, break presses, and dropouts.

use std::time::Instant;

use log::info;

use crate::error::Result;
use crate::player::PlayerState;
use crate::protocol::RawSample;
use crate::readers::{fan_out, SourceReader};

const WANDER_LOW: u32 = 60;
const WANDER_HIGH: u32 = 100;

pub struct FakeReader {
    assigned: Vec<usize>,
    rate: u32,
    breaking: bool,
    /// While set, the reader emits nothing at all — its players drift
    /// toward the disconnection timeout like with a real dropout.
    suppressed: bool,
    rising: bool,
    /// Manual mode freezes the wander; set by any scripting call.
    manual: bool,
}

impl FakeReader {
    pub fn new() -> Self {
        info!("created synthetic source (wandering {WANDER_LOW}-{WANDER_HIGH} bpm)");
        Self {
            assigned: Vec::new(),
            rate: 72,
            breaking: false,
            suppressed: false,
            rising: true,
            manual: false,
        }
    }

    /// Pin the emitted rate. Disables the automatic wander.
    pub fn set_rate(&mut self, rate: u32) {
        self.manual = true;
        self.rate = rate;
    }

    /// Adjust the emitted rate by a signed step. Disables the wander.
    pub fn nudge_rate(&mut self, delta: i32) {
        self.manual = true;
        self.rate = self.rate.saturating_add_signed(delta);
    }

    pub fn set_breaking(&mut self, breaking: bool) {
        self.breaking = breaking;
    }

    /// Simulate signal dropout: while suppressed, polls emit nothing.
    pub fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    fn advance_wander(&mut self) {
        if self.manual {
            return;
        }
        if self.rate >= WANDER_HIGH {
            self.rising = false;
        } else if self.rate <= WANDER_LOW {
            self.rising = true;
        }
        self.rate = if self.rising {
            self.rate + 1
        } else {
            self.rate - 1
        };
    }
}

impl Default for FakeReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader for FakeReader {
    fn label(&self) -> &str {
        "Fake port"
    }

    fn is_open(&self) -> bool {
        true
    }

    fn last_raw_rate(&self) -> u32 {
        self.rate
    }

    fn is_stable(&self) -> bool {
        !self.suppressed
    }

    fn assigned_players(&self) -> &[usize] {
        &self.assigned
    }

    fn assign_player(&mut self, slot: usize) {
        if !self.assigned.contains(&slot) {
            self.assigned.push(slot);
        }
    }

    fn poll(&mut self, now: Instant, players: &mut [PlayerState]) -> Result<()> {
        if self.suppressed {
            return Ok(());
        }
        self.advance_wander();
        let sample = RawSample {
            rate: self.rate,
            breaking: Some(self.breaking),
        };
        fan_out(players, &self.assigned, sample, now);
        Ok(())
    }

    fn shutdown(&mut self) {}
}
