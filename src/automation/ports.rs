//! Collaborator interfaces consumed by the interaction session.
//!
//! The session only talks to the outside world through these traits:
//! screen capture, text recognition, the answer oracle, pointer injection
//! and a log sink. Concrete implementations live in `capture`, `ocr`,
//! `oracle`, `automation::input` and `logging`.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::automation::error::SessionError;
use crate::automation::geometry::{Point, PositionedWord, Rect};

/// Recognition capability requested from the recognizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OcrMode {
    /// Plain text only.
    #[default]
    Basic,
    /// Text plus the location of every word.
    Accurate,
}

impl OcrMode {
    pub fn returns_positions(&self) -> bool {
        matches!(self, OcrMode::Accurate)
    }

    /// Endpoint name used by the OCR service.
    pub fn endpoint(&self) -> &'static str {
        match self {
            OcrMode::Basic => "general_basic",
            OcrMode::Accurate => "accurate_basic",
        }
    }
}

impl std::fmt::Display for OcrMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Result of a recognition call. The shape follows the requested `OcrMode`.
#[derive(Clone, Debug, PartialEq)]
pub enum Recognition {
    Plain(String),
    Positioned {
        text: String,
        words: Vec<PositionedWord>,
    },
}

impl Recognition {
    pub fn text(&self) -> &str {
        match self {
            Recognition::Plain(text) => text,
            Recognition::Positioned { text, .. } => text,
        }
    }

    pub fn words(&self) -> Option<&[PositionedWord]> {
        match self {
            Recognition::Plain(_) => None,
            Recognition::Positioned { words, .. } => Some(words),
        }
    }
}

pub trait ScreenCapture {
    fn capture(&mut self, region: Rect) -> Result<RgbaImage, SessionError>;
}

pub trait TextRecognizer {
    fn recognize(&mut self, image: &RgbaImage, mode: OcrMode) -> Result<Recognition, SessionError>;
}

pub trait AnswerOracle {
    /// Returns the raw answer string, e.g. "A", "A,C" or "对".
    fn ask(&mut self, question_text: &str, model: &str) -> Result<String, SessionError>;
}

pub trait PointerInjector {
    fn click(&mut self, x: i32, y: i32) -> Result<(), SessionError>;

    /// Scrolls the page under `at`. Positive `delta_pixels` scrolls down.
    fn scroll(&mut self, delta_pixels: i32, at: Point) -> Result<(), SessionError>;
}

pub trait LogSink: Send + Sync {
    fn append(&self, line: &str);
}

/// The full set of collaborators handed to a session at start.
pub struct Services {
    pub capture: Box<dyn ScreenCapture + Send>,
    pub recognizer: Box<dyn TextRecognizer + Send>,
    pub oracle: Box<dyn AnswerOracle + Send>,
    pub pointer: Box<dyn PointerInjector + Send>,
    pub log: std::sync::Arc<dyn LogSink>,
}
