//! Tests for the background ExpirationEngine
//!
//! These tests verify:
//! - The sweep drains every due entry each cycle
//! - stop() interrupts the poll sleep and joins the thread
//! - Failure policies: log-and-continue vs abort
//! - The engine drives both store backends

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotkv::storage::{ensure_file, FileStore};
use slotkv::ttl::{ExpirationEngine, Sweep, SweepOutcome};
use slotkv::{MemStore, SlotKvError, Store, SweepFailurePolicy};
use tempfile::TempDir;

// =============================================================================
// Helper Types
// =============================================================================

/// Scripted sweep target: yields queued outcomes, then Idle
#[derive(Default)]
struct ScriptedSweep {
    script: Mutex<Vec<Result<SweepOutcome, SlotKvError>>>,
    calls: AtomicUsize,
}

impl ScriptedSweep {
    fn with_script(mut script: Vec<Result<SweepOutcome, SlotKvError>>) -> Self {
        script.reverse();
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

impl Sweep for ScriptedSweep {
    fn expire_next(&self, _now: u32) -> slotkv::Result<SweepOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().pop().unwrap_or(Ok(SweepOutcome::Idle))
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

fn io_failure() -> SlotKvError {
    SlotKvError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_sweep_runs_until_idle() {
    let target = Arc::new(ScriptedSweep::with_script(vec![
        Ok(SweepOutcome::Removed(b"a".to_vec())),
        Ok(SweepOutcome::Stale),
        Ok(SweepOutcome::Removed(b"b".to_vec())),
    ]));

    let mut engine = ExpirationEngine::start(
        Arc::clone(&target),
        Duration::from_secs(60),
        SweepFailurePolicy::LogAndContinue,
    )
    .unwrap();

    assert!(wait_until(Duration::from_secs(2), || target.remaining() == 0));
    engine.stop();

    // Three outcomes plus the Idle that ends the cycle
    assert_eq!(target.calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_stop_interrupts_poll_sleep() {
    let target = Arc::new(ScriptedSweep::default());
    let mut engine = ExpirationEngine::start(
        Arc::clone(&target),
        Duration::from_secs(3600),
        SweepFailurePolicy::LogAndContinue,
    )
    .unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        target.calls.load(Ordering::SeqCst) >= 1
    }));

    let started = Instant::now();
    engine.stop();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!engine.is_running());
}

#[test]
fn test_stop_is_idempotent() {
    let target = Arc::new(ScriptedSweep::default());
    let mut engine = ExpirationEngine::start(
        target,
        Duration::from_millis(20),
        SweepFailurePolicy::LogAndContinue,
    )
    .unwrap();

    engine.stop();
    engine.stop();
    assert!(!engine.is_running());
}

#[test]
fn test_polls_repeatedly() {
    let target = Arc::new(ScriptedSweep::default());
    let _engine = ExpirationEngine::start(
        Arc::clone(&target),
        Duration::from_millis(20),
        SweepFailurePolicy::LogAndContinue,
    )
    .unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        target.calls.load(Ordering::SeqCst) >= 3
    }));
}

#[test]
fn test_drop_joins_thread_and_releases_target() {
    let target = Arc::new(ScriptedSweep::default());
    let engine = ExpirationEngine::start(
        Arc::clone(&target),
        Duration::from_secs(3600),
        SweepFailurePolicy::LogAndContinue,
    )
    .unwrap();

    drop(engine);

    assert_eq!(Arc::strong_count(&target), 1);
}

// =============================================================================
// Failure Policy Tests
// =============================================================================

#[test]
fn test_log_and_continue_keeps_sweeping() {
    let target = Arc::new(ScriptedSweep::with_script(vec![
        Err(io_failure()),
        Ok(SweepOutcome::Removed(b"after".to_vec())),
    ]));

    let mut engine = ExpirationEngine::start(
        Arc::clone(&target),
        Duration::from_millis(20),
        SweepFailurePolicy::LogAndContinue,
    )
    .unwrap();

    assert!(wait_until(Duration::from_secs(2), || target.remaining() == 0));
    assert!(engine.is_running());
    engine.stop();
}

#[test]
fn test_abort_stops_on_first_failure() {
    let target = Arc::new(ScriptedSweep::with_script(vec![
        Err(io_failure()),
        Ok(SweepOutcome::Removed(b"never".to_vec())),
    ]));

    let engine = ExpirationEngine::start(
        Arc::clone(&target),
        Duration::from_millis(20),
        SweepFailurePolicy::Abort,
    )
    .unwrap();

    assert!(wait_until(Duration::from_secs(2), || !engine.is_running()));
    assert_eq!(target.remaining(), 1);
    assert_eq!(target.calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Backend Tests
// =============================================================================

#[test]
fn test_engine_expires_memory_store_keys() {
    let store = Arc::new(MemStore::new());
    store.create(b"temp", b"v", 1).unwrap();
    store.create(b"perm", b"v", 0).unwrap();

    let _engine = ExpirationEngine::start(
        Arc::clone(&store),
        Duration::from_millis(50),
        SweepFailurePolicy::LogAndContinue,
    )
    .unwrap();

    assert!(wait_until(Duration::from_secs(4), || !store.is_exists(b"temp")));
    assert!(store.is_exists(b"perm"));
    assert_eq!(store.pending_expirations(), 0);
}

#[test]
fn test_engine_expires_file_store_keys() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sweep.db");
    ensure_file(&path).unwrap();

    let store = Arc::new(FileStore::open(&path, 16).unwrap());
    store.create(b"temp", &vec![1u8; 1500], 1).unwrap();
    store.create(b"perm", b"v", 0).unwrap();

    let mut engine = ExpirationEngine::start(
        Arc::clone(&store),
        Duration::from_millis(50),
        SweepFailurePolicy::LogAndContinue,
    )
    .unwrap();

    assert!(wait_until(Duration::from_secs(4), || !store.is_exists(b"temp")));
    engine.stop();

    assert_eq!(store.record_count(), 1);
    assert!(store.is_exists(b"perm"));
}
