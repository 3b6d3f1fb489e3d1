//! Serial device reader.
//!
//! Drains already-buffered bytes from a serial port each poll, runs them
//! through the framing → parsing → stability pipeline and fans accepted
//! readings out to the assigned players. The drain never waits for more
//! bytes: an incomplete trailing line stays in the framer until a later
//! tick completes it.

use std::io::Read;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use serialport::{ClearBuffer, SerialPort};

use crate::error::{Error, Result};
use crate::filter::StabilityFilter;
use crate::framing::LineFramer;
use crate::player::PlayerState;
use crate::protocol;
use crate::readers::{fan_out, SourceReader};

const DRAIN_BUF_LEN: usize = 512;

pub struct SerialReader {
    label: String,
    /// `None` when the device failed to open or was shut down. There is no
    /// reopen path — downstream treats the reader as "never connects".
    port: Option<Box<dyn SerialPort>>,
    framer: LineFramer,
    filter: StabilityFilter,
    assigned: Vec<usize>,
}

impl SerialReader {
    /// Open a serial device. On failure the error is logged and the reader
    /// is created permanently closed, which correctly drives the
    /// disconnection-timeout path for its players.
    pub fn open(name: &str, baud_rate: u32, now: Instant) -> Self {
        info!("opening serial port {name} at {baud_rate} baud");
        let port = match serialport::new(name, baud_rate)
            .timeout(Duration::ZERO)
            .open()
        {
            Ok(port) => {
                // Stale bytes from before our first poll are not ours.
                if let Err(e) = port.clear(ClearBuffer::Input) {
                    warn!("could not discard input buffer of {name}: {e}");
                }
                Some(port)
            }
            Err(source) => {
                error!(
                    "{}",
                    Error::PortOpen {
                        port: name.to_string(),
                        source,
                    }
                );
                None
            }
        };
        Self {
            label: name.to_string(),
            port,
            framer: LineFramer::new(),
            filter: StabilityFilter::new(now),
            assigned: Vec::new(),
        }
    }

    /// Build a reader with no backing device. Bytes arrive via
    /// [`ingest`](Self::ingest) instead — the replay and test path.
    pub fn detached(label: &str, now: Instant) -> Self {
        Self {
            label: label.to_string(),
            port: None,
            framer: LineFramer::new(),
            filter: StabilityFilter::new(now),
            assigned: Vec::new(),
        }
    }

    /// Run one drained chunk through the conditioning pipeline.
    ///
    /// All lines completed by the chunk form one batch: the parser keeps
    /// the newest valid value per field, the stability filter vets the
    /// rate, and whatever survives is fanned out. The break flag passes
    /// through even when the rate is rejected.
    pub fn ingest(&mut self, chunk: &str, now: Instant, players: &mut [PlayerState]) {
        let lines = self.framer.feed(chunk);
        if lines.is_empty() {
            return;
        }
        let mut sample = protocol::scan_batch(lines.iter().map(String::as_str));
        sample.rate = self.filter.accept(sample.rate, now).unwrap_or(0);
        fan_out(players, &self.assigned, sample, now);
    }

    /// Read every already-buffered byte without blocking. Garbage bytes
    /// are tolerated: the lossy conversion turns them into replacement
    /// characters, which the parser then skips as malformed fields.
    fn drain(&mut self) -> Result<String> {
        let Some(port) = self.port.as_mut() else {
            return Ok(String::new());
        };
        let mut chunk = String::new();
        let mut buf = [0u8; DRAIN_BUF_LEN];
        loop {
            let available = port.bytes_to_read().map_err(|e| Error::PortRead {
                port: self.label.clone(),
                source: std::io::Error::other(e),
            })? as usize;
            if available == 0 {
                break;
            }
            let want = available.min(DRAIN_BUF_LEN);
            match port.read(&mut buf[..want]) {
                Ok(0) => break,
                Ok(n) => chunk.push_str(&String::from_utf8_lossy(&buf[..n])),
                Err(e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    break
                }
                Err(source) => {
                    return Err(Error::PortRead {
                        port: self.label.clone(),
                        source,
                    })
                }
            }
        }
        Ok(chunk)
    }
}

impl SourceReader for SerialReader {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn last_raw_rate(&self) -> u32 {
        self.filter.last_received()
    }

    fn is_stable(&self) -> bool {
        self.filter.is_stable()
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
        let chunk = self.drain()?;
        if !chunk.is_empty() {
            self.ingest(&chunk, now, players);
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.port.take().is_some() {
            info!("closing serial port {}", self.label);
        }
    }
}

impl Drop for SerialReader {
    fn drop(&mut self) {
        self.shutdown();
    }
}
