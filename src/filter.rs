//! Per-source stability filtering of raw heart-rate candidates.
//!
//! Raw streams carry two distinct failure shapes: instantaneous spikes
//! (electrode noise, partial records that still parse) and drifts that look
//! locally plausible but are physiologically impossible. The filter runs
//! two stages against them:
//!
//! 1. **Discontinuity gate** — a jump of [`DISCONTINUITY_JUMP`] or more
//!    against the previous *received* value resets the warm-up counter;
//!    the source must then deliver [`STABLE_THRESHOLD`] consistent
//!    readings before anything is accepted again.
//! 2. **Velocity cap** — once warm, the implied change rate against the
//!    last *accepted* value may not exceed [`MAX_RATE_CHANGE_PER_SEC`].
//!    Gaps under [`MIN_VELOCITY_GAP_SECS`] are too noisy to divide by, so
//!    the cap is skipped for them.

use std::time::Instant;

use crate::config::{
    DISCONTINUITY_JUMP, MAX_RATE_CHANGE_PER_SEC, MIN_VELOCITY_GAP_SECS, STABLE_THRESHOLD,
};

/// Stability state machine for one source.
#[derive(Debug)]
pub struct StabilityFilter {
    /// Last raw candidate, always updated (diagnostic, drives the gate).
    last_received: u32,
    /// Last value that survived both stages; `0` = none yet.
    last_accepted: u32,
    last_accepted_at: Instant,
    /// Saturates at [`STABLE_THRESHOLD`]; reset to 0 on discontinuity.
    stable_receptions: u16,
}

impl StabilityFilter {
    /// A fresh filter starts cold: the source has to prove itself with a
    /// full warm-up run before its readings are trusted.
    pub fn new(now: Instant) -> Self {
        Self {
            last_received: 0,
            last_accepted: 0,
            last_accepted_at: now,
            stable_receptions: 0,
        }
    }

    /// Offer a raw candidate. Returns the rate if it was accepted.
    ///
    /// A candidate of `0` means "no reading" and changes nothing.
    pub fn accept(&mut self, rate: u32, now: Instant) -> Option<u32> {
        if rate == 0 {
            return None;
        }

        if self.last_received.abs_diff(rate) >= DISCONTINUITY_JUMP {
            self.stable_receptions = 0;
            self.last_received = rate;
            return None;
        }
        self.last_received = rate;

        if self.stable_receptions < STABLE_THRESHOLD {
            self.stable_receptions += 1;
            if self.stable_receptions < STABLE_THRESHOLD {
                return None; // still warming up
            }
            // The reading that completes the warm-up falls through.
        }

        if self.would_change_too_fast(rate, now) {
            return None;
        }

        self.last_accepted = rate;
        self.last_accepted_at = now;
        Some(rate)
    }

    /// Velocity cap against the last accepted value. Not evaluated before
    /// the first acceptance (`last_accepted == 0` carries no reference) or
    /// for sub-noise-floor gaps.
    fn would_change_too_fast(&self, rate: u32, now: Instant) -> bool {
        if self.last_accepted == 0 {
            return false;
        }
        let gap = now.duration_since(self.last_accepted_at).as_secs_f32();
        if gap < MIN_VELOCITY_GAP_SECS {
            return false;
        }
        self.last_accepted.abs_diff(rate) as f32 / gap > MAX_RATE_CHANGE_PER_SEC
    }

    /// Last raw candidate seen, pre-filter. Diagnostic only.
    pub fn last_received(&self) -> u32 {
        self.last_received
    }

    /// Whether the source is currently considered stable (fully warmed up).
    pub fn is_stable(&self) -> bool {
        self.stable_receptions == STABLE_THRESHOLD
    }
}
