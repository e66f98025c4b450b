//! Error taxonomy for answering sessions.
//!
//! Each collaborator call maps its failures onto one variant, so the session
//! can decide per variant whether a failure is local or fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Missing coordinates, credentials or invalid settings. Detected before the loop.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Authentication, network and empty-answer failures from the answer oracle.
    #[error("answer oracle failed: {0}")]
    Oracle(String),

    #[error("pointer injection failed: {0}")]
    Injection(String),

    #[error("a session is already running")]
    AlreadyRunning,
}
