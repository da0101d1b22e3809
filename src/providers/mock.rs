/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockClassifier::working()` / `MockResponder::working()` - Always succeed
 * - `MockClassifier::no_faces()` - Succeeds with zero detections
 * - `MockClassifier::failing()` / `MockResponder::failing()` - Always fail
 *
 * The classifier mock records every image it receives, so tests can assert
 * which buffered frames actually reached the backend.
 */

// Allow dead code - the mocks are exercised through the library in tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::emotion::{Emotion, FaceAnnotation, Likelihood};
use crate::errors::ProviderError;
use crate::providers::{Classifier, Responder, build_reply_prompt};

/// Mock implementation of a face classification provider
#[derive(Debug)]
pub struct MockClassifier {
    /// Faces returned on a successful call
    faces: Vec<FaceAnnotation>,
    /// Whether every call should fail
    fail_always: bool,
    /// Whether only the next call should fail
    fail_next: Arc<Mutex<bool>>,
    /// Number of calls made
    call_count: Arc<AtomicUsize>,
    /// Every image payload received, in call order
    images: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockClassifier {
    /// Create a classifier that always detects one joy-dominant face
    pub fn working() -> Self {
        Self::with_faces(vec![FaceAnnotation::new(
            Likelihood::VeryLikely,
            Likelihood::VeryUnlikely,
            Likelihood::VeryUnlikely,
            Likelihood::Unlikely,
        )])
    }

    /// Create a classifier that returns the given faces on every call
    pub fn with_faces(faces: Vec<FaceAnnotation>) -> Self {
        Self {
            faces,
            fail_always: false,
            fail_next: Arc::new(Mutex::new(false)),
            call_count: Arc::new(AtomicUsize::new(0)),
            images: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a classifier that succeeds but never detects a face
    pub fn no_faces() -> Self {
        Self::with_faces(Vec::new())
    }

    /// Create a classifier that fails every call
    pub fn failing() -> Self {
        Self {
            fail_always: true,
            ..Self::with_faces(Vec::new())
        }
    }

    /// Configure the mock to fail on the next call only
    pub fn fail_next_call(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    /// Number of detect_faces calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every image payload received so far, in call order
    pub fn received_images(&self) -> Vec<Vec<u8>> {
        self.images.lock().unwrap().clone()
    }

    /// The most recently received image payload, if any
    pub fn last_image(&self) -> Option<Vec<u8>> {
        self.images.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn detect_faces(&self, image: &[u8]) -> Result<Vec<FaceAnnotation>, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.images.lock().unwrap().push(image.to_vec());

        let fail_once = {
            let mut flag = self.fail_next.lock().unwrap();
            std::mem::replace(&mut *flag, false)
        };
        if self.fail_always || fail_once {
            return Err(ProviderError::ConnectionError("Mock classifier offline".into()));
        }

        Ok(self.faces.clone())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        if self.fail_always {
            return Err(ProviderError::ConnectionError("Mock classifier offline".into()));
        }
        Ok(())
    }
}

/// Mock implementation of a reply generation provider
///
/// The working variant echoes the exact prompt the real provider would send,
/// so tests can assert on prompt framing without a network call.
#[derive(Debug)]
pub struct MockResponder {
    /// Whether every call should fail
    fail_always: bool,
    /// Number of calls made
    call_count: Arc<AtomicUsize>,
}

impl MockResponder {
    /// Create a responder that echoes the reply prompt
    pub fn working() -> Self {
        Self {
            fail_always: false,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a responder that fails every call
    pub fn failing() -> Self {
        Self {
            fail_always: true,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of reply calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn reply(&self, emotion: Emotion, message: &str) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_always {
            return Err(ProviderError::ConnectionError("Mock responder offline".into()));
        }
        Ok(build_reply_prompt(emotion, message))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        if self.fail_always {
            return Err(ProviderError::ConnectionError("Mock responder offline".into()));
        }
        Ok(())
    }
}
