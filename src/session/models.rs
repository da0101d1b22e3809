/*!
 * Data models for per-session analysis state.
 */

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
// tokio's Instant (not std's) so the paused test clock governs timestamps
use tokio::time::Instant;

use crate::emotion::Emotion;

/// The published outcome of one complete processing run
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisResult {
    /// The classified emotion label
    pub emotion: Emotion,

    /// The generated reply, empty when no text accompanied the frame
    pub reply: String,
}

impl AnalysisResult {
    /// Create a result with an emotion and no reply text
    pub fn emotion_only(emotion: Emotion) -> Self {
        Self {
            emotion,
            reply: String::new(),
        }
    }
}

/// Handle to an outstanding single-shot deferred processing task
///
/// Cancellation is best-effort: aborting a task that is still sleeping stops
/// it before it does any work, while a task past its sleep is killed at its
/// next await point and may drop an image it already popped. A replacement
/// task only ever exists when a fresher frame was buffered, and the store's
/// pop-pending idempotence absorbs the race, so no stale result is published
/// either way.
#[derive(Debug)]
pub struct ScheduledTask {
    /// Handle to the spawned task
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Wrap a spawned task handle
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Cancel the task if it has not started running yet
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the underlying task has completed or been aborted
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Per-session mutable state, owned exclusively by the session store
#[derive(Debug, Default)]
pub struct Session {
    /// When the last completed classification finished, or never
    pub last_processed_at: Option<Instant>,

    /// At most one buffered image awaiting deferred processing
    pub pending_image: Option<Bytes>,

    /// At most one outstanding deferred task handle
    pub scheduled_task: Option<ScheduledTask>,

    /// The most recently published result
    pub last_result: Option<AnalysisResult>,
}
