/*!
 * # moodgate
 *
 * An emotion-aware chat backend with per-session request coalescing.
 *
 * ## Features
 *
 * - Accepts rapid streams of webcam frames tied to client sessions
 * - Rate-limits and coalesces calls to the face classification backend:
 *   at most one in-flight classification per session, newest frame wins
 * - Classifies the dominant emotion of the first detected face
 * - Optionally generates an empathetic chat reply via an LLM provider
 * - Publishes the latest result per session to any number of pollers
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `emotion`: Emotion labels and face-likelihood scoring
 * - `session`: Per-session state and the lock-guarded session store
 * - `scheduler`: The request-coalescing decision core
 * - `server`: The HTTP boundary (submit and poll endpoints)
 * - `providers`: Client implementations for the external services:
 *   - `providers::vision`: Google Vision face detection client
 *   - `providers::gemini`: Gemini reply generation client
 *   - `providers::mock`: Scripted providers for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod emotion;
pub mod errors;
pub mod providers;
pub mod scheduler;
pub mod server;
pub mod session;

// Re-export main types for easier usage
pub use app_config::Config;
pub use emotion::{Emotion, FaceAnnotation, Likelihood, dominant_emotion};
pub use scheduler::{CoalescingScheduler, SubmitOutcome};
pub use session::{AnalysisResult, SessionStore};
pub use errors::{AppError, ProviderError, ServerError};
