//! Calibration state tracking.
//!
//! Tracks which items have been captured and the current step in the wizard.

use std::collections::BTreeMap;

use crate::automation::config::SessionConfig;
use crate::automation::geometry::{Point, Rect};
use crate::automation::markers::OPTION_MARKERS;

/// Collected calibration data, in absolute screen pixels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalibrationItems {
    /// Capture region.
    pub region: Option<Rect>,
    /// Option centers keyed by marker.
    pub options: BTreeMap<&'static str, Point>,
    /// "Next question" button.
    pub next_button: Option<Point>,
}

impl CalibrationItems {
    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.options.is_empty() && self.next_button.is_none()
    }

    /// Writes the captured values into the session config.
    ///
    /// Skipped items keep whatever the config already had. Captured options are
    /// merged into the existing marked set.
    pub fn apply_to(&self, session: &mut SessionConfig) {
        if let Some(region) = self.region {
            session.region = region;
        }

        if !self.options.is_empty() {
            let positions = session.option_positions.get_or_insert_with(BTreeMap::new);
            for (label, point) in &self.options {
                positions.insert(label.to_string(), *point);
            }
        }

        if let Some(point) = self.next_button {
            session.next_button = Some(point);
        }
    }
}

/// Steps in the calibration wizard.
///
/// Region corners first, then one step per option marker (A–F, 对, 错),
/// then the next button when the session runs on a fixed page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationStep {
    RegionTopLeft,
    RegionBottomRight,
    /// Index into `OPTION_MARKERS`.
    Option(usize),
    NextButton,
    Complete,
}

impl CalibrationStep {
    pub fn description(&self) -> String {
        match self {
            Self::RegionTopLeft => "截图区域 - 左上角".to_string(),
            Self::RegionBottomRight => "截图区域 - 右下角".to_string(),
            Self::Option(index) => format!("选项 {}", option_label(*index)),
            Self::NextButton => "下一题按钮".to_string(),
            Self::Complete => "完成".to_string(),
        }
    }

    /// Step number (1-based) for display. Both region corners count as one step.
    pub fn step_number(&self) -> usize {
        match self {
            Self::RegionTopLeft | Self::RegionBottomRight => 1,
            Self::Option(index) => index + 2,
            Self::NextButton => OPTION_MARKERS.len() + 2,
            Self::Complete => OPTION_MARKERS.len() + 3,
        }
    }

    /// Total number of steps in the wizard.
    pub fn total_steps(include_next: bool) -> usize {
        // Region + one per option (+ next button)
        1 + OPTION_MARKERS.len() + usize::from(include_next)
    }

    /// True for steps recorded with a single point (F1).
    pub fn expects_point(&self) -> bool {
        matches!(self, Self::Option(_) | Self::NextButton)
    }

    /// Marker captured by this step, if it is an option step.
    pub fn option_marker(&self) -> Option<&'static str> {
        match self {
            Self::Option(index) => OPTION_MARKERS.get(*index).copied(),
            _ => None,
        }
    }
}

fn option_label(index: usize) -> &'static str {
    OPTION_MARKERS.get(index).copied().unwrap_or("?")
}
