//! Configuration for one answering session.
//!
//! A `SessionConfig` is built by the GUI (or loaded from config.json), validated
//! once, and handed to the worker by value when the session starts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::automation::error::SessionError;
use crate::automation::geometry::{Point, Rect};
use crate::automation::input::PIXELS_PER_NOTCH;
use crate::automation::ports::OcrMode;

/// Models accepted by the answer oracle.
pub const SUPPORTED_MODELS: [&str; 2] = ["deepseek-chat", "deepseek-reasoner"];

/// How the page presents its questions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    /// One question per screen, advanced with a "next" button.
    #[default]
    Fixed,
    /// A long page of numbered questions that is scrolled window by window.
    Scroll,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Fixed => write!(f, "fixed"),
            SessionMode::Scroll => write!(f, "scroll"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Screen region that is captured each cycle
    pub region: Rect,
    #[serde(default)]
    pub mode: SessionMode,
    /// Manually marked option centers. `None` means extract them from positional OCR.
    #[serde(default)]
    pub option_positions: Option<BTreeMap<String, Point>>,
    /// "Next question" button, fixed mode only
    #[serde(default)]
    pub next_button: Option<Point>,
    /// Pause between questions (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Questions to answer: iterations in fixed mode, distinct ids in scroll mode
    #[serde(default = "default_total_questions")]
    pub total_questions: u32,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub ocr_mode: OcrMode,
    /// The page advances by itself after an option is clicked
    #[serde(default)]
    pub auto_next: bool,
    /// Pixels kept visible between consecutive windows
    #[serde(default = "default_scroll_overlap")]
    pub scroll_overlap: i32,
    /// Wait after scrolling for the page to settle (milliseconds)
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,
    /// Wait after each option click (milliseconds)
    #[serde(default = "default_click_delay_ms")]
    pub click_delay_ms: u64,
    /// Wait after clicking the next button (milliseconds)
    #[serde(default = "default_next_delay_ms")]
    pub next_delay_ms: u64,
}

fn default_interval_ms() -> u64 {
    3000
}

fn default_total_questions() -> u32 {
    10
}

fn default_model() -> String {
    SUPPORTED_MODELS[0].to_string()
}

fn default_scroll_overlap() -> i32 {
    100
}

fn default_scroll_delay_ms() -> u64 {
    1000
}

fn default_click_delay_ms() -> u64 {
    300
}

fn default_next_delay_ms() -> u64 {
    500
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            region: Rect::default(),
            mode: SessionMode::Fixed,
            option_positions: None,
            next_button: None,
            interval_ms: default_interval_ms(),
            total_questions: default_total_questions(),
            model: default_model(),
            ocr_mode: OcrMode::Basic,
            auto_next: false,
            scroll_overlap: default_scroll_overlap(),
            scroll_delay_ms: default_scroll_delay_ms(),
            click_delay_ms: default_click_delay_ms(),
            next_delay_ms: default_next_delay_ms(),
        }
    }
}

impl SessionConfig {
    /// Explicit option positions, ignoring an empty map.
    pub fn explicit_options(&self) -> Option<&BTreeMap<String, Point>> {
        self.option_positions.as_ref().filter(|map| !map.is_empty())
    }

    /// Checks everything that must hold before the loop starts.
    pub fn validate(&self) -> Result<(), SessionError> {
        self.region.validate()?;

        if self.total_questions == 0 {
            return Err(SessionError::Configuration(
                "total question count must be positive".to_string(),
            ));
        }

        if !SUPPORTED_MODELS.contains(&self.model.as_str()) {
            return Err(SessionError::Configuration(format!(
                "unsupported model '{}', expected one of: {}",
                self.model,
                SUPPORTED_MODELS.join(", ")
            )));
        }

        match self.mode {
            SessionMode::Fixed => {
                if self.explicit_options().is_none() && !self.ocr_mode.returns_positions() {
                    return Err(SessionError::Configuration(
                        "option positions are not marked and the OCR mode returns no positions; \
                         mark options or switch to accurate OCR"
                            .to_string(),
                    ));
                }
            }
            SessionMode::Scroll => {
                if self.scroll_overlap < 0 || self.scroll_overlap >= self.region.height() {
                    return Err(SessionError::Configuration(format!(
                        "scroll overlap {} must be within 0..{} (region height)",
                        self.scroll_overlap,
                        self.region.height()
                    )));
                }

                // Every scroll step lies in [min(h/2, h - overlap), h - overlap]
                let height = self.region.height();
                let smallest_step = (height / 2).min(height - self.scroll_overlap);
                if smallest_step < PIXELS_PER_NOTCH {
                    return Err(SessionError::Configuration(format!(
                        "scroll step of {} px is below one wheel notch ({} px); \
                         use a taller region or a smaller overlap",
                        smallest_step, PIXELS_PER_NOTCH
                    )));
                }
            }
        }

        Ok(())
    }
}
