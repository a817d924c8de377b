//! Background Expiration Engine
//!
//! One periodic sweep thread per store instance.
//!
//! ## Cycle
//! 1. Check the stop signal (top of loop)
//! 2. Expire every due heap entry through the store's `Sweep` impl
//! 3. Sleep for the poll interval, waking early on stop
//!
//! Stopping drops the signal sender and joins the thread, so once
//! `stop()` returns the task no longer touches the store.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender, TryRecvError};

use crate::config::SweepFailurePolicy;
use crate::error::{Result, SlotKvError};

use super::now_unix_secs;

/// Result of expiring at most one heap entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Nothing is due
    Idle,

    /// A due key was deleted
    Removed(Vec<u8>),

    /// A due entry no longer matched a live record
    Stale,
}

/// Capability of a store to expire its due keys
///
/// A failed delete must still consume the heap entry, or the sweep would
/// spin on it.
pub trait Sweep: Send + Sync {
    /// Pop one due heap entry (if any) and delete its key
    fn expire_next(&self, now: u32) -> Result<SweepOutcome>;
}

/// Handle to a running sweep thread
pub struct ExpirationEngine {
    /// Dropping this wakes and stops the thread
    stop_tx: Option<Sender<()>>,

    handle: Option<JoinHandle<()>>,
}

impl ExpirationEngine {
    /// Spawn the sweep thread for `target`
    pub fn start<T>(
        target: Arc<T>,
        poll_interval: Duration,
        policy: SweepFailurePolicy,
    ) -> Result<Self>
    where
        T: Sweep + ?Sized + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("slotkv-expiry".to_string())
            .spawn(move || {
                tracing::debug!(?poll_interval, ?policy, "Expiration engine started");

                loop {
                    match stop_rx.try_recv() {
                        Err(TryRecvError::Empty) => {}
                        _ => break,
                    }

                    if !sweep_due(target.as_ref(), policy) {
                        tracing::error!("Expiration engine aborted after a failed delete");
                        return;
                    }

                    match stop_rx.recv_timeout(poll_interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }

                tracing::debug!("Expiration engine stopped");
            })
            .map_err(|e| SlotKvError::Sweeper(format!("failed to spawn sweep thread: {}", e)))?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Signal the thread and block until it has exited
    pub fn stop(&mut self) {
        drop(self.stop_tx.take());

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Expiration thread panicked");
            }
        }
    }

    /// Whether the thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for ExpirationEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Expire everything due right now
///
/// Returns `false` if the policy says the task must stop.
fn sweep_due<T: Sweep + ?Sized>(target: &T, policy: SweepFailurePolicy) -> bool {
    let now = now_unix_secs();
    let mut removed = 0usize;

    loop {
        match target.expire_next(now) {
            Ok(SweepOutcome::Idle) => break,
            Ok(SweepOutcome::Removed(key)) => {
                removed += 1;
                tracing::debug!(key = %String::from_utf8_lossy(&key), "Expired key removed");
            }
            Ok(SweepOutcome::Stale) => {}
            Err(e) => match policy {
                SweepFailurePolicy::LogAndContinue => {
                    tracing::warn!("Failed to delete expired key: {}", e);
                }
                SweepFailurePolicy::Abort => {
                    tracing::error!("Failed to delete expired key: {}", e);
                    return false;
                }
            },
        }
    }

    if removed > 0 {
        tracing::debug!(removed, "Expiration sweep finished");
    }
    true
}
