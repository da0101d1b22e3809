/*!
 * Session state module for per-client analysis sessions.
 *
 * This module provides:
 * - Session creation and tracking
 * - The pending-image buffer and scheduled-task handle per session
 * - Atomic claim / pop / publish operations under a single store lock
 */

// Allow dead code - session types have extra accessors for tests and future use
#![allow(dead_code)]

pub mod models;
pub mod store;

// Re-export main types
pub use models::{AnalysisResult, ScheduledTask, Session};
pub use store::{ClaimOutcome, SessionSnapshot, SessionStore, DEFAULT_SESSION_ID};
