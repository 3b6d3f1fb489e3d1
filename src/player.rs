//! Smoothed per-player signal state.
//!
//! Holds the owned, conditioned signal for one player slot: current rate,
//! break flag, liveness, and the running statistics window used for
//! "average over the race" style displays.

use std::time::{Duration, Instant};

use crate::config::{DISCONNECTION_TIMEOUT_SECS, SMOOTHING_OLD_WEIGHT};
use crate::protocol::RawSample;

/// Signal state for one player slot.
#[derive(Debug)]
pub struct PlayerState {
    breaking: bool,
    /// Last accepted (smoothed) heart rate; `0` = no valid reading yet.
    rate: u32,
    rate_sum: i64,
    rate_samples: i64,
    top_rate: u32,
    recording_stats: bool,
    last_update: Instant,
}

impl PlayerState {
    /// A fresh slot starts "live": it has the full disconnection timeout
    /// to produce its first reading before being reported disconnected.
    pub fn new(now: Instant) -> Self {
        Self {
            breaking: false,
            rate: 0,
            rate_sum: 0,
            rate_samples: 0,
            top_rate: 0,
            recording_stats: false,
            last_update: now,
        }
    }

    /// Apply one accepted reading. Runs once per accepted sample per
    /// assigned player.
    ///
    /// The break flag is overwritten whenever present. A fresh or
    /// reconnecting signal snaps to the new value directly — dragging a
    /// returning player slowly toward truth through the smoother would be
    /// worse than the jump. An already-live signal is blended
    /// exponentially.
    pub fn apply(&mut self, sample: RawSample, now: Instant) {
        if let Some(b) = sample.breaking {
            self.breaking = b;
        }
        if sample.rate == 0 {
            return;
        }
        if self.rate == 0 || !self.is_connected(now) {
            self.assign_rate(sample.rate, now);
        } else {
            let blended = SMOOTHING_OLD_WEIGHT * self.rate as f32
                + (1.0 - SMOOTHING_OLD_WEIGHT) * sample.rate as f32;
            self.assign_rate(blended.round() as u32, now);
        }
    }

    /// Direct rate assignment: refreshes liveness and, while recording,
    /// folds the value into the statistics window. Used by [`apply`] and
    /// by the synthetic source (which bypasses smoothing).
    ///
    /// [`apply`]: Self::apply
    pub(crate) fn assign_rate(&mut self, rate: u32, now: Instant) {
        self.rate = rate;
        self.last_update = now;
        if self.recording_stats {
            self.rate_sum += i64::from(rate);
            self.rate_samples += 1;
            if rate > self.top_rate {
                self.top_rate = rate;
            }
        }
    }

    pub(crate) fn set_breaking(&mut self, breaking: bool) {
        self.breaking = breaking;
    }

    pub fn is_breaking(&self) -> bool {
        self.breaking
    }

    /// Current smoothed rate; `0` until the first accepted reading.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Average over the recording window, or `0` with no samples.
    pub fn average_rate(&self) -> u32 {
        if self.rate_samples > 0 {
            (self.rate_sum / self.rate_samples) as u32
        } else {
            0
        }
    }

    /// Highest rate seen during the recording window.
    pub fn max_rate(&self) -> u32 {
        self.top_rate
    }

    /// Whether the signal was refreshed within the disconnection timeout.
    pub fn is_connected(&self, now: Instant) -> bool {
        now < self.last_update + Duration::from_secs_f32(DISCONNECTION_TIMEOUT_SECS)
    }

    /// Start a fresh statistics window. Destructive: any previously
    /// accumulated sum/top is discarded before recording begins.
    pub fn record_stats(&mut self) {
        self.reset_stats();
        self.recording_stats = true;
    }

    /// Freeze the statistics window; accumulated values remain readable.
    pub fn stop_recording_stats(&mut self) {
        self.recording_stats = false;
    }

    fn reset_stats(&mut self) {
        self.rate_sum = 0;
        self.rate_samples = 0;
        self.top_rate = 0;
    }
}
