//! Reader registry — owns the player roster and the source readers.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Registry                           │
//! │                                                          │
//! │  ports config ──▶ dedup by name ──▶ [SourceReader; M]    │
//! │                                          │ poll tick     │
//! │                                          ▼               │
//! │                              [PlayerState; N] ◀── fan-out│
//! │                                          │               │
//! │                    read-only query surface (every frame) │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one registry may be live per process; a second construction is
//! rejected while the first exists. The poll path is the single writer of
//! player state — queries only read. Overlapping polls are
//! unrepresentable here: `poll` takes `&mut self`, so a caller physically
//! cannot have two in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{info, warn};

use crate::config::TelemetryConfig;
use crate::error::{Error, Result};
use crate::player::PlayerState;
use crate::readers::{self, SourceReader};

/// Default label for an out-of-range reader index.
const NO_READER_LABEL: &str = "no reader";

/// Process-wide single-instance guard. Claimed in [`Registry::new`],
/// released when the instance drops.
static REGISTRY_LIVE: AtomicBool = AtomicBool::new(false);

pub struct Registry {
    players: Vec<PlayerState>,
    readers: Vec<Box<dyn SourceReader>>,
    enabled: bool,
}

impl Registry {
    /// Build the roster and readers from a validated configuration.
    ///
    /// Fails with [`Error::RegistryAlreadyRunning`] while another instance
    /// is live — the existing one stays authoritative.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        config.validate()?;
        if REGISTRY_LIVE.swap(true, Ordering::AcqRel) {
            return Err(Error::RegistryAlreadyRunning);
        }
        let mut registry = Self {
            players: Vec::new(),
            readers: Vec::new(),
            enabled: true,
        };
        registry.rebuild(config);
        Ok(registry)
    }

    /// Tear down and re-initialise in one step. Old readers are fully shut
    /// down — device handles released — before any new port is opened, so
    /// a port shared between the old and new configuration reopens
    /// cleanly.
    pub fn reconfigure(&mut self, config: &TelemetryConfig) -> Result<()> {
        config.validate()?;
        self.rebuild(config);
        Ok(())
    }

    fn rebuild(&mut self, config: &TelemetryConfig) {
        for reader in &mut self.readers {
            reader.shutdown();
        }
        self.readers.clear();

        let now = Instant::now();
        self.players = (0..config.ports.len())
            .map(|_| PlayerState::new(now))
            .collect();

        // Identical port names collapse onto one reader with several
        // assigned players.
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (slot, name) in config.ports.iter().enumerate() {
            let idx = match by_name.get(name.as_str()) {
                Some(&idx) => idx,
                None => {
                    self.readers
                        .push(readers::open_reader(name, config.baud_rate, now));
                    by_name.insert(name, self.readers.len() - 1);
                    self.readers.len() - 1
                }
            };
            self.readers[idx].assign_player(slot);
        }

        info!(
            "registry configured: {} player slot(s) across {} reader(s)",
            self.players.len(),
            self.readers.len()
        );
    }

    /// Drive one poll tick at the current instant.
    pub fn poll(&mut self) {
        self.poll_at(Instant::now());
    }

    /// Drive one poll tick with an explicit timestamp (test/replay entry).
    ///
    /// While suspended this is a no-op that keeps all framing state, so no
    /// partial line is lost across a pause. Each reader is polled to
    /// completion in sequence; a read fault in one is logged and does not
    /// stop the others. After teardown the reader set is empty and the
    /// tick exits cleanly.
    pub fn poll_at(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        for reader in &mut self.readers {
            if let Err(e) = reader.poll(now, &mut self.players) {
                warn!("reader '{}' failed this tick: {e}", reader.label());
            }
        }
    }

    /// Suspend or resume polling. Suspension is cooperative: ticks still
    /// arrive, they just do nothing until re-enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Release every reader and clear the roster. Safe to call at any
    /// point between ticks and safe to call twice.
    pub fn teardown(&mut self) {
        for reader in &mut self.readers {
            reader.shutdown();
        }
        self.readers.clear();
        self.players.clear();
    }

    // ───────────────────────────────────────────────────────────
    // Query surface — read-only, polled every frame by consumers.
    // Out-of-range indices return defined defaults instead of failing.
    // ───────────────────────────────────────────────────────────

    fn player(&self, player: usize) -> Option<&PlayerState> {
        player.checked_sub(1).and_then(|i| self.players.get(i))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Liveness of a player's signal (1-based slot).
    pub fn is_connected(&self, player: usize) -> bool {
        self.is_connected_at(player, Instant::now())
    }

    pub fn is_connected_at(&self, player: usize, now: Instant) -> bool {
        self.player(player).is_some_and(|p| p.is_connected(now))
    }

    pub fn is_breaking(&self, player: usize) -> bool {
        self.player(player).is_some_and(PlayerState::is_breaking)
    }

    /// Current smoothed heart rate; `0` for unknown or bad index.
    pub fn heart_rate(&self, player: usize) -> u32 {
        self.player(player).map_or(0, PlayerState::rate)
    }

    pub fn average_heart_rate(&self, player: usize) -> u32 {
        self.player(player).map_or(0, PlayerState::average_rate)
    }

    pub fn max_heart_rate(&self, player: usize) -> u32 {
        self.player(player).map_or(0, PlayerState::max_rate)
    }

    /// Start a fresh statistics window for every player. Destructive:
    /// previously accumulated stats are discarded first.
    pub fn record_stats(&mut self) {
        for player in &mut self.players {
            player.record_stats();
        }
    }

    /// Freeze the statistics window of one player (1-based slot);
    /// accumulated average/max stay readable.
    pub fn stop_recording_stats(&mut self, player: usize) {
        if let Some(i) = player.checked_sub(1) {
            if let Some(p) = self.players.get_mut(i) {
                p.stop_recording_stats();
            }
        }
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Port label of a reader (0-based index).
    pub fn reader_label(&self, idx: usize) -> &str {
        self.readers
            .get(idx)
            .map_or(NO_READER_LABEL, |r| r.label())
    }

    pub fn is_reader_open(&self, idx: usize) -> bool {
        self.readers.get(idx).is_some_and(|r| r.is_open())
    }

    /// Last raw pre-filter rate seen by a reader. Diagnostic only — never
    /// use this to drive control decisions.
    pub fn reader_last_raw_rate(&self, idx: usize) -> u32 {
        self.readers.get(idx).map_or(0, |r| r.last_raw_rate())
    }

    /// Whether a reader's source currently passes the stability warm-up.
    /// Diagnostic only.
    pub fn is_reader_stable(&self, idx: usize) -> bool {
        self.readers.get(idx).is_some_and(|r| r.is_stable())
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.teardown();
        REGISTRY_LIVE.store(false, Ordering::Release);
    }
}
