//! Log sink handed to the interaction session.
//!
//! `SharedLog` forwards every line to `crate::log` (console + log file) and
//! keeps a bounded in-memory tail for the GUI log view.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::automation::ports::LogSink;

/// Lines kept for display in the GUI.
pub const MAX_GUI_LINES: usize = 500;

#[derive(Debug, Clone)]
pub struct SharedLog {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for SharedLog {
    fn default() -> Self {
        Self::with_capacity(MAX_GUI_LINES)
    }
}

impl SharedLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Copy of the buffered lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }

    fn push(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            while lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(line.to_string());
        }
    }
}

impl LogSink for SharedLog {
    fn append(&self, line: &str) {
        crate::log(line);
        self.push(line);
    }
}
