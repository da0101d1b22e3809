/*!
 * Per-session request-coalescing scheduler.
 *
 * On each incoming frame the scheduler consults the session store: if the
 * session's rate gate is open the frame is classified right away and the
 * result returned to the caller; otherwise the frame lands in the session's
 * single-slot pending buffer (overwriting any older frame) and a single-shot
 * deferred task is scheduled, replacing any previously scheduled one. The
 * backend classifier is therefore invoked at most roughly once per
 * `min_process_interval` per session, while the newest frame is always the
 * one that eventually gets classified.
 */

use bytes::Bytes;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::time::Instant;

use crate::app_config::SchedulerConfig;
use crate::emotion::{Emotion, dominant_emotion};
use crate::providers::{Classifier, Responder};
use crate::session::{AnalysisResult, ClaimOutcome, ScheduledTask, SessionStore};

/// Outcome of submitting a frame to the scheduler
#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The frame was processed immediately; this call's own result
    Completed(AnalysisResult),
    /// The frame was buffered for deferred processing; no result yet
    Queued,
}

/// The coalescing decision core
///
/// Holds the injected session store and the two external collaborators. The
/// scheduler is cheap to clone (all shared state is behind `Arc`); deferred
/// tasks capture a clone of it.
#[derive(Clone)]
pub struct CoalescingScheduler {
    /// Shared per-session state
    store: Arc<SessionStore>,
    /// Face classification collaborator
    classifier: Arc<dyn Classifier>,
    /// Reply generation collaborator
    responder: Arc<dyn Responder>,
    /// Timing knobs
    config: SchedulerConfig,
}

impl CoalescingScheduler {
    /// Create a scheduler over the given store and collaborators
    pub fn new(
        store: Arc<SessionStore>,
        classifier: Arc<dyn Classifier>,
        responder: Arc<dyn Responder>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            responder,
            config,
        }
    }

    /// The session store backing this scheduler
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Submit a frame (and optional message) for a session.
    ///
    /// Returns `Completed` with this call's own result when the rate gate was
    /// open, or `Queued` when the frame was buffered behind the gate. Never
    /// fails: classifier faults degrade to a neutral label and responder
    /// faults are embedded in the reply text.
    pub async fn submit(&self, session_id: &str, image: Bytes, message: &str) -> SubmitOutcome {
        let now = Instant::now();
        let claim = self.store.try_claim_immediate(
            session_id,
            now,
            self.config.min_process_interval(),
            &image,
        );

        match claim {
            ClaimOutcome::Immediate => {
                debug!("Session {}: rate gate open, processing immediately", session_id);

                // Slow calls run outside the store lock
                let emotion = self.classify(&image).await;
                let reply = self.generate_reply(emotion, message).await;

                let result = AnalysisResult {
                    emotion,
                    reply,
                };
                self.store.publish_result(session_id, result.clone(), Instant::now());
                info!("Session {}: published {} (immediate)", session_id, result.emotion);
                SubmitOutcome::Completed(result)
            }
            ClaimOutcome::Deferred => {
                debug!(
                    "Session {}: rate gate closed, buffered frame and rescheduling",
                    session_id
                );

                let scheduler = self.clone();
                let id = session_id.to_string();
                let delay = self.config.debounce_delay();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    scheduler.run_deferred(&id).await;
                });
                self.store.install_scheduled_task(session_id, ScheduledTask::new(handle));
                SubmitOutcome::Queued
            }
        }
    }

    /// Body of a fired deferred task: drain the pending buffer and classify.
    ///
    /// No text accompanies a deferred frame, so no reply is generated and the
    /// published reply field is empty. If the buffer is already empty (a later
    /// call claimed it, or a superseded task lost the cancel race) this is a
    /// no-op.
    async fn run_deferred(&self, session_id: &str) {
        let Some(image) = self.store.pop_pending(session_id) else {
            debug!("Session {}: deferred task found no pending image", session_id);
            return;
        };

        let emotion = self.classify(&image).await;
        self.store.publish_result(
            session_id,
            AnalysisResult::emotion_only(emotion),
            Instant::now(),
        );
        info!("Session {}: published {} (deferred)", session_id, emotion);
    }

    /// Read the last published result for a session, if any.
    pub fn last_result(&self, session_id: &str) -> Option<AnalysisResult> {
        self.store.last_result(session_id)
    }

    /// Classify an image, degrading every fault to `neutral`.
    ///
    /// This is the single boundary where classifier faults and zero-face
    /// detections collapse into the neutral label; nothing downstream ever
    /// sees a classifier error.
    async fn classify(&self, image: &[u8]) -> Emotion {
        match self.classifier.detect_faces(image).await {
            Ok(faces) => match faces.first() {
                Some(face) => dominant_emotion(face),
                None => Emotion::Neutral,
            },
            Err(e) => {
                warn!("Classifier fault, degrading to neutral: {}", e);
                Emotion::Neutral
            }
        }
    }

    /// Generate a reply for a non-empty message, embedding faults textually.
    async fn generate_reply(&self, emotion: Emotion, message: &str) -> String {
        if message.is_empty() {
            return String::new();
        }
        match self.responder.reply(emotion, message).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Responder fault, embedding in reply: {}", e);
                format!("(chatbot error: {})", e)
            }
        }
    }
}
