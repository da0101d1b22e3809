/*!
 * Common test utilities for the moodgate test suite
 */

use std::sync::Arc;

use moodgate::app_config::SchedulerConfig;
use moodgate::emotion::{FaceAnnotation, Likelihood};
use moodgate::providers::mock::{MockClassifier, MockResponder};
use moodgate::scheduler::CoalescingScheduler;
use moodgate::session::SessionStore;

/// Scheduler timing used across tests: 1200ms rate gate, 1000ms debounce
pub fn test_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        min_process_interval_ms: 1200,
        debounce_delay_ms: 1000,
    }
}

/// Build a scheduler over a fresh store with the given mocks
///
/// The mocks are taken as `Arc`s so the caller keeps a handle for asserting
/// on call counts after the scheduler has consumed its copy.
pub fn build_scheduler(
    classifier: Arc<MockClassifier>,
    responder: Arc<MockResponder>,
) -> (CoalescingScheduler, Arc<SessionStore>) {
    let store = Arc::new(SessionStore::new());
    let scheduler = CoalescingScheduler::new(
        Arc::clone(&store),
        classifier,
        responder,
        test_scheduler_config(),
    );
    (scheduler, store)
}

/// A face whose dominant emotion is sorrow
pub fn sorrow_face() -> FaceAnnotation {
    FaceAnnotation::new(
        Likelihood::Unlikely,
        Likelihood::VeryLikely,
        Likelihood::Possible,
        Likelihood::VeryUnlikely,
    )
}

/// Build a multipart body with the standard field layout the server expects
pub fn multipart_body(boundary: &str, image: &[u8], message: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();

    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"frame.jpg\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    body.extend_from_slice(image);
    body.extend_from_slice(b"\r\n");

    if let Some(message) = message {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"message\"\r\n\r\n");
        body.extend_from_slice(message.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
