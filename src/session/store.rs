/*!
 * Session store: the single synchronization point for all per-session state.
 *
 * Every mutation of a session (timestamps, pending buffer, task handle,
 * published result) happens inside one process-wide lock, so the compound
 * operations below are atomic with respect to each other. The slow external
 * calls never run under this lock; callers claim quickly, release, do the
 * slow work, then re-enter to publish.
 */

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::models::{AnalysisResult, ScheduledTask, Session};

/// Session identifier used when the caller supplies none
pub const DEFAULT_SESSION_ID: &str = "default";

/// Outcome of the atomic claim step for an incoming frame
#[derive(Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The rate gate is open; the caller owns this processing run
    Immediate,
    /// The frame was buffered; a deferred task should be (re)scheduled
    Deferred,
}

/// Point-in-time view of a session's observable state
///
/// Snapshots are taken under the store lock and never expose the task handle
/// or the buffered payload itself; they are for pollers and diagnostics.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// When the last completed classification finished, or never
    pub last_processed_at: Option<Instant>,
    /// Whether an image is currently buffered
    pub has_pending_image: bool,
    /// Whether a deferred task handle is currently installed
    pub has_scheduled_task: bool,
    /// The most recently published result
    pub last_result: Option<AnalysisResult>,
}

/// Mapping from session identifier to session state, guarded by one lock
///
/// Sessions are created implicitly on first reference and live for the
/// process lifetime. The store is injected into the scheduler and the HTTP
/// layer rather than held in a global; tests create a fresh store per test.
#[derive(Debug, Default)]
pub struct SessionStore {
    /// All known sessions
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically decide between immediate and deferred handling of a frame.
    ///
    /// If at least `min_interval` has passed since the session's last
    /// completed run (a session that never ran counts as infinitely old), the
    /// pending buffer is cleared, any scheduled task is cancelled, the
    /// session is stamped as processing now, and `Immediate` is returned —
    /// the caller owns the run. Otherwise the image replaces whatever was
    /// buffered, the prior task handle is cancelled, and `Deferred` is
    /// returned; the caller must schedule a fresh task and install it.
    pub fn try_claim_immediate(
        &self,
        session_id: &str,
        now: Instant,
        min_interval: Duration,
        image: &Bytes,
    ) -> ClaimOutcome {
        let mut sessions = self.sessions.lock();
        let session = sessions.entry(session_id.to_string()).or_default();

        let gate_open = match session.last_processed_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= min_interval,
        };

        if let Some(task) = session.scheduled_task.take() {
            task.cancel();
        }

        if gate_open {
            session.pending_image = None;
            session.last_processed_at = Some(now);
            ClaimOutcome::Immediate
        } else {
            session.pending_image = Some(image.clone());
            ClaimOutcome::Deferred
        }
    }

    /// Install a freshly scheduled deferred task, superseding any prior one.
    ///
    /// The replaced handle (if any) is cancelled, preserving the at-most-one
    /// scheduled task invariant even when two submits race between claim and
    /// install.
    pub fn install_scheduled_task(&self, session_id: &str, task: ScheduledTask) {
        let mut sessions = self.sessions.lock();
        let session = sessions.entry(session_id.to_string()).or_default();
        if let Some(prior) = session.scheduled_task.replace(task) {
            prior.cancel();
        }
    }

    /// Atomically remove and return the buffered image, if any.
    ///
    /// Idempotent: a second pop without an intervening buffer-write finds
    /// nothing, which is how a stale deferred task that lost the cancel race
    /// becomes a no-op.
    pub fn pop_pending(&self, session_id: &str) -> Option<Bytes> {
        let mut sessions = self.sessions.lock();
        sessions.get_mut(session_id)?.pending_image.take()
    }

    /// Atomically publish a completed run's result and refresh the timestamp.
    pub fn publish_result(&self, session_id: &str, result: AnalysisResult, now: Instant) {
        let mut sessions = self.sessions.lock();
        let session = sessions.entry(session_id.to_string()).or_default();
        session.last_result = Some(result);
        session.last_processed_at = Some(now);
    }

    /// Read a consistent snapshot of a session, or `None` if it was never
    /// referenced.
    pub fn read(&self, session_id: &str) -> Option<SessionSnapshot> {
        let sessions = self.sessions.lock();
        let session = sessions.get(session_id)?;
        Some(SessionSnapshot {
            last_processed_at: session.last_processed_at,
            has_pending_image: session.pending_image.is_some(),
            has_scheduled_task: session.scheduled_task.is_some(),
            last_result: session.last_result.clone(),
        })
    }

    /// Read the last published result, possibly stale, without blocking on
    /// any in-flight processing.
    pub fn last_result(&self, session_id: &str) -> Option<AnalysisResult> {
        let sessions = self.sessions.lock();
        sessions.get(session_id)?.last_result.clone()
    }

    /// Whether the session currently has a buffered image (test accessor)
    pub fn has_pending_image(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock();
        sessions.get(session_id).is_some_and(|s| s.pending_image.is_some())
    }

    /// Whether the session currently holds a scheduled task handle (test accessor)
    pub fn has_scheduled_task(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock();
        sessions.get(session_id).is_some_and(|s| s.scheduled_task.is_some())
    }

    /// Number of sessions created so far
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}
