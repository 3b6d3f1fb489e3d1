//! Integration tests: raw chunks → framing → parsing → stability →
//! player state, plus registry-level behaviour with mixed sources.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use pulselink::config::STABLE_THRESHOLD;
use pulselink::player::PlayerState;
use pulselink::readers::{SerialReader, SourceReader};
use pulselink::{Registry, TelemetryConfig, FAKE_PORT_NAME};

// Registry tests share the process-wide single-instance guard.
static SERIAL_TESTS: Mutex<()> = Mutex::new(());

fn lock() -> std::sync::MutexGuard<'static, ()> {
    SERIAL_TESTS.lock().unwrap_or_else(|e| e.into_inner())
}

/// Feed enough consistent readings to finish the stability warm-up.
fn warm_up(reader: &mut SerialReader, players: &mut [PlayerState], t0: Instant, rate: u32) {
    for i in 0..u64::from(STABLE_THRESHOLD) {
        let t = t0 + Duration::from_millis(200 * (i + 1));
        reader.ingest(&format!("{rate};0\n"), t, players);
    }
}

#[test]
fn full_pipeline_survives_chunking_garbage_and_dropout() {
    let t0 = Instant::now();
    let mut players = vec![PlayerState::new(t0)];
    let mut reader = SerialReader::detached("strap-1", t0);
    reader.assign_player(0);

    warm_up(&mut reader, &mut players, t0, 72);
    assert_eq!(players[0].rate(), 72);
    assert!(reader.is_stable());

    // A burst with split records and binary garbage in the middle.
    let t1 = t0 + Duration::from_secs(3);
    reader.ingest("7", t1, &mut players);
    reader.ingest("4;0\n\u{fffd}\u{fffd}\n75;", t1 + Duration::from_millis(5), &mut players);
    reader.ingest("1\n", t1 + Duration::from_millis(10), &mut players);
    // Last complete batch line was "75;1" — blended, breaking set.
    assert!(players[0].is_breaking());
    assert!(players[0].rate() >= 72);

    // Dropout: nothing arrives for > 10 s.
    let t2 = t1 + Duration::from_secs(12);
    assert!(!players[0].is_connected(t2));

    // The first reading after the dropout snaps instead of blending.
    reader.ingest("95;0\n", t2, &mut players);
    assert_eq!(players[0].rate(), 95);
    assert!(players[0].is_connected(t2));
    assert!(!players[0].is_breaking());
}

#[test]
fn newest_wins_pairing_may_cross_lines() {
    let t0 = Instant::now();
    let mut players = vec![PlayerState::new(t0)];
    let mut reader = SerialReader::detached("strap-1", t0);
    reader.assign_player(0);
    warm_up(&mut reader, &mut players, t0, 60);

    // One poll batch: the newest rate-bearing line and the newest
    // break-bearing line are different physical lines. Documented
    // behaviour: the fields pair up anyway.
    let t1 = t0 + Duration::from_secs(4);
    reader.ingest("62;1\n0;x\nabc;0\n", t1, &mut players);
    assert_eq!(players[0].rate(), 60, "round(0.8*60 + 0.2*62)");
    assert!(!players[0].is_breaking(), "break taken from the newer line");
    assert_eq!(reader.last_raw_rate(), 62);
}

#[test]
fn spike_burst_is_rejected_and_signal_recovers() {
    let t0 = Instant::now();
    let mut players = vec![PlayerState::new(t0)];
    let mut reader = SerialReader::detached("strap-1", t0);
    reader.assign_player(0);
    warm_up(&mut reader, &mut players, t0, 70);

    // A glitch burst: each poll sees one absurd value. The first is a
    // discontinuity, the follow-ups keep resetting the warm-up.
    let mut t = t0 + Duration::from_secs(2);
    for noise in [240, 15, 250, 3] {
        reader.ingest(&format!("{noise};0\n"), t, &mut players);
        t += Duration::from_millis(200);
    }
    assert_eq!(players[0].rate(), 70, "glitches must not move the signal");
    assert!(!reader.is_stable());

    // The real signal returns and re-earns trust after a full warm-up.
    for i in 0..u64::from(STABLE_THRESHOLD) {
        reader.ingest("71;0\n", t + Duration::from_millis(200 * i), &mut players);
    }
    assert!(reader.is_stable());
    assert_eq!(players[0].rate(), 70, "round(0.8*70 + 0.2*71)");
}

#[test]
fn two_players_on_one_strap_get_identical_signal() {
    let t0 = Instant::now();
    let mut players = vec![PlayerState::new(t0), PlayerState::new(t0)];
    let mut reader = SerialReader::detached("shared", t0);
    reader.assign_player(0);
    reader.assign_player(1);

    warm_up(&mut reader, &mut players, t0, 68);
    reader.ingest("70;1\n", t0 + Duration::from_secs(3), &mut players);

    assert_eq!(players[0].rate(), players[1].rate());
    assert_eq!(players[0].is_breaking(), players[1].is_breaking());
    assert!(players[0].is_breaking());
}

#[test]
fn registry_with_mixed_sources_degrades_per_source() {
    let _guard = lock();
    let cfg = TelemetryConfig {
        ports: vec![
            FAKE_PORT_NAME.to_string(),
            "/definitely/not/a/port".to_string(),
        ],
        ..TelemetryConfig::default()
    };
    let mut reg = Registry::new(&cfg).unwrap();
    assert_eq!(reg.reader_count(), 2);
    assert!(reg.is_reader_open(0));
    assert!(!reg.is_reader_open(1), "dead port stays closed forever");

    for _ in 0..3 {
        reg.poll();
    }

    // The synthetic player has signal; the dead-port player degrades to
    // "no signal" instead of faulting anything.
    assert!(reg.heart_rate(1) > 0);
    assert_eq!(reg.heart_rate(2), 0);
    assert_eq!(reg.reader_last_raw_rate(1), 0);
}

#[test]
fn reconfigure_swaps_sources_atomically() {
    let _guard = lock();
    let mut reg = Registry::new(&TelemetryConfig {
        ports: vec![FAKE_PORT_NAME.to_string()],
        ..TelemetryConfig::default()
    })
    .unwrap();
    reg.poll();
    assert!(reg.heart_rate(1) > 0);

    // Same fake source for two slots now — one reader, fresh roster.
    reg.reconfigure(&TelemetryConfig {
        ports: vec![FAKE_PORT_NAME.to_string(), FAKE_PORT_NAME.to_string()],
        ..TelemetryConfig::default()
    })
    .unwrap();
    assert_eq!(reg.player_count(), 2);
    assert_eq!(reg.reader_count(), 1);
    reg.poll();
    assert_eq!(reg.heart_rate(1), reg.heart_rate(2));
}
