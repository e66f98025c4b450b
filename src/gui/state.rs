//! GUI application state management.
//!
//! Tracks the form values the user edits and the session status for display.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::automation::geometry::Point;
use crate::automation::markers::OPTION_MARKERS;
use crate::automation::state::SessionStatus;
use crate::calibration::state::CalibrationItems;
use crate::config::AppConfig;

/// Session status for display in GUI.
#[derive(Clone, Debug, Default)]
pub enum DisplayStatus {
    /// Not running, ready to start
    #[default]
    Idle,
    Running {
        total: u32,
        start_time: Instant,
    },
    /// Stop requested, waiting for the worker to finish its current step
    Stopping { start_time: Instant },
    /// The worker returned a terminal status
    Finished(SessionStatus),
    /// The session could not be started
    Error(String),
}

impl DisplayStatus {
    pub fn status_text(&self) -> String {
        match self {
            Self::Idle => "空闲".to_string(),
            Self::Running { total, .. } => format!("答题中 (共 {} 题)", total),
            Self::Stopping { .. } => "正在停止...".to_string(),
            Self::Finished(SessionStatus::Completed) => "已完成".to_string(),
            Self::Finished(SessionStatus::Stopped) => "已停止".to_string(),
            Self::Finished(SessionStatus::Failed(msg)) => format!("失败: {}", msg),
            Self::Finished(other) => other.to_string(),
            Self::Error(msg) => format!("错误: {}", msg),
        }
    }

    pub fn elapsed_text(&self) -> Option<String> {
        match self {
            Self::Running { start_time, .. } | Self::Stopping { start_time } => {
                let secs = start_time.elapsed().as_secs();
                Some(format!("{:02}:{:02}", secs / 60, secs % 60))
            }
            _ => None,
        }
    }

    /// True while a worker may still be alive.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running { .. } | Self::Stopping { .. })
    }
}

/// One editable option position row.
#[derive(Clone, Debug)]
pub struct OptionRow {
    pub label: &'static str,
    pub enabled: bool,
    pub x: i32,
    pub y: i32,
}

fn option_rows(config: &AppConfig) -> Vec<OptionRow> {
    let marked = config.session.explicit_options().cloned().unwrap_or_default();
    OPTION_MARKERS
        .iter()
        .map(|&label| {
            let point = marked.get(label).copied();
            OptionRow {
                label,
                enabled: point.is_some(),
                x: point.map_or(0, |p| p.x),
                y: point.map_or(0, |p| p.y),
            }
        })
        .collect()
}

/// GUI application state.
pub struct GuiState {
    /// Config being edited; saved on start.
    pub config: AppConfig,
    pub option_rows: Vec<OptionRow>,
    pub next_enabled: bool,
    pub next_button: Point,
    /// Reveal secrets in the credential fields.
    pub show_secrets: bool,
    pub status: DisplayStatus,
}

impl GuiState {
    pub fn new(config: AppConfig) -> Self {
        let next_button = config.session.next_button;
        Self {
            option_rows: option_rows(&config),
            next_enabled: next_button.is_some(),
            next_button: next_button.unwrap_or_default(),
            show_secrets: false,
            status: DisplayStatus::Idle,
            config,
        }
    }

    /// Merges calibrated positions into the config and refreshes the form rows.
    pub fn apply_calibration(&mut self, items: &CalibrationItems) {
        // Keep unsaved edits to rows the calibration skipped
        self.sync_session();
        items.apply_to(&mut self.config.session);

        self.option_rows = option_rows(&self.config);
        let next_button = self.config.session.next_button;
        self.next_enabled = next_button.is_some();
        self.next_button = next_button.unwrap_or_default();
    }

    /// Writes the form rows back into the session config.
    pub fn sync_session(&mut self) {
        let positions: BTreeMap<String, Point> = self
            .option_rows
            .iter()
            .filter(|row| row.enabled)
            .map(|row| (row.label.to_string(), Point::new(row.x, row.y)))
            .collect();

        let session = &mut self.config.session;
        session.option_positions = if positions.is_empty() {
            None
        } else {
            Some(positions)
        };
        session.next_button = self.next_enabled.then_some(self.next_button);
    }
}
