//! Pulselink monitor — poll configured sources and print player telemetry.
//!
//! Manual smoke-test surface for the pipeline: wire up real receivers (or
//! the synthetic source with `--fake`) and watch the conditioned signal.
//!
//! ```text
//!   pulselink /dev/ttyUSB0 /dev/ttyUSB0        # two players, one device
//!   pulselink --fake --slots 2                 # no hardware needed
//!   pulselink --config sources.json
//! ```

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use pulselink::{Registry, TelemetryConfig, FAKE_PORT_NAME};

#[derive(Parser, Debug)]
#[command(version, about = "Serial heart-rate telemetry monitor")]
struct Args {
    /// Serial port per player slot; the same port may serve several slots.
    ports: Vec<String>,

    /// Load the full source configuration from a JSON file instead.
    #[arg(long, conflicts_with_all = ["ports", "fake", "slots", "baud"])]
    config: Option<PathBuf>,

    /// Use the synthetic source for every slot.
    #[arg(long)]
    fake: bool,

    /// Number of player slots when using --fake.
    #[arg(long, default_value_t = 1, requires = "fake")]
    slots: usize,

    /// Baud rate for physical ports.
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Poll interval in milliseconds.
    #[arg(long, default_value_t = 20)]
    interval_ms: u32,
}

impl Args {
    fn into_config(self) -> Result<TelemetryConfig> {
        if let Some(path) = &self.config {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            return serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()));
        }
        let ports = if self.fake {
            vec![FAKE_PORT_NAME.to_string(); self.slots]
        } else {
            self.ports.clone()
        };
        anyhow::ensure!(
            !ports.is_empty(),
            "no sources given — pass ports, --fake or --config"
        );
        Ok(TelemetryConfig {
            ports,
            baud_rate: self.baud,
            poll_interval_ms: self.interval_ms,
        })
    }
}

fn print_status(registry: &Registry) {
    for player in 1..=registry.player_count() {
        println!(
            "player {player}: {:>3} bpm (avg {:>3}, max {:>3}) {} {}",
            registry.heart_rate(player),
            registry.average_heart_rate(player),
            registry.max_heart_rate(player),
            if registry.is_connected(player) {
                "connected"
            } else {
                "DISCONNECTED"
            },
            if registry.is_breaking(player) {
                "[break]"
            } else {
                ""
            },
        );
    }
    for idx in 0..registry.reader_count() {
        println!(
            "  reader {idx} '{}': open={} raw={} stable={}",
            registry.reader_label(idx),
            registry.is_reader_open(idx),
            registry.reader_last_raw_rate(idx),
            registry.is_reader_stable(idx),
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    let tick = Duration::from_millis(u64::from(config.poll_interval_ms));
    let mut registry = Registry::new(&config)?;
    info!(
        "monitoring {} player slot(s) across {} reader(s), tick {:?}",
        registry.player_count(),
        registry.reader_count(),
        tick
    );
    registry.record_stats();

    let mut last_print = Instant::now();
    loop {
        registry.poll();
        if last_print.elapsed() >= Duration::from_secs(1) {
            print_status(&registry);
            last_print = Instant::now();
        }
        thread::sleep(tick);
    }
}
