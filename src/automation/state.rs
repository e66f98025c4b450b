//! Session lifecycle states and the cooperative stop flag.
//!
//! A session moves Idle → Running → Completed / Failed / Stopped. The stop
//! flag is the only value written by the initiator and read by the worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle of an answering session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// No session has been started
    Idle,
    /// The worker is running a loop
    Running,
    /// The loop ran to its end
    Completed,
    /// A fatal error ended the loop
    Failed(String),
    /// The user requested a stop
    Stopped,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed(_) | SessionStatus::Stopped
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "Idle"),
            SessionStatus::Running => write!(f, "Running"),
            SessionStatus::Completed => write!(f, "Completed"),
            SessionStatus::Failed(msg) => write!(f, "Failed: {}", msg),
            SessionStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Cooperative cancellation flag shared between the initiator and the worker.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the worker to stop at its next check point.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", SessionStatus::Idle), "Idle");
        assert_eq!(format!("{}", SessionStatus::Completed), "Completed");
        assert_eq!(
            format!("{}", SessionStatus::Failed("capture".to_string())),
            "Failed: capture"
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionStatus::Idle.is_terminal());
        assert!(!SessionStatus::Running.is_terminal());
        assert!(SessionStatus::Stopped.is_terminal());
        assert!(SessionStatus::Failed(String::new()).is_terminal());
    }

    #[test]
    fn test_stop_flag_shared_between_clones() {
        let flag = StopFlag::new();
        let worker_view = flag.clone();
        assert!(!worker_view.is_requested());
        flag.request();
        assert!(worker_view.is_requested());
    }
}
