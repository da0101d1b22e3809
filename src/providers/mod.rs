/*!
 * Provider implementations for the external classification and reply services.
 *
 * This module contains client implementations for the two collaborators:
 * - Google Vision: face detection with per-emotion likelihoods
 * - Gemini: empathetic chat reply generation
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::emotion::{Emotion, FaceAnnotation};
use crate::errors::ProviderError;

/// Common trait for face classification providers
///
/// Implementations return the raw detected faces; turning faces (or a fault)
/// into an emotion label is the scheduler's job, so the degrade-to-neutral
/// policy lives in exactly one place.
#[async_trait]
pub trait Classifier: Send + Sync + Debug {
    /// Detect faces in the given image bytes
    ///
    /// # Arguments
    /// * `image` - Raw image bytes as uploaded by the client
    ///
    /// # Returns
    /// * `Result<Vec<FaceAnnotation>, ProviderError>` - Detected faces, possibly empty
    async fn detect_faces(&self, image: &[u8]) -> Result<Vec<FaceAnnotation>, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Common trait for reply generation providers
#[async_trait]
pub trait Responder: Send + Sync + Debug {
    /// Generate a reply to the user's message, tinted by the detected emotion
    ///
    /// # Arguments
    /// * `emotion` - The most recently classified emotion for the session
    /// * `message` - The user's free-text message (non-empty)
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The reply text or an error
    async fn reply(&self, emotion: Emotion, message: &str) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Build the chat prompt for a reply request.
///
/// A specific emotion is named in the prompt; neutral (or unknown) omits any
/// emotion mention so the model does not invent one.
pub fn build_reply_prompt(emotion: Emotion, message: &str) -> String {
    if emotion.is_specific() {
        format!(
            "The user feels {}. They said: '{}'. Reply empathetically as a supportive chatbot.",
            emotion, message
        )
    } else {
        format!(
            "The user said: '{}'. Reply empathetically as a supportive chatbot.",
            message
        )
    }
}

pub mod vision;
pub mod gemini;
pub mod mock;
