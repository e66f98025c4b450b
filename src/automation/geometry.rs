//! Screen geometry shared by the session and its collaborators.

use serde::{Deserialize, Serialize};

use crate::automation::error::SessionError;

/// An absolute point on the screen, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A capture region in absolute screen pixels: top-left (x1, y1), bottom-right (x2, y2).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Top-left corner, used to turn capture-relative boxes into screen points.
    pub fn origin(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Returns a configuration error unless x1 < x2 and y1 < y2.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SessionError::Configuration(format!(
                "invalid region {}: expected x1 < x2 and y1 < y2",
                self
            )))
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) - ({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Bounding box of a recognized word, relative to the captured image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct WordBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl WordBox {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Center of the box offset by `origin`.
    pub fn center_from(&self, origin: Point) -> Point {
        Point::new(
            origin.x + self.left + self.width / 2,
            origin.y + self.top + self.height / 2,
        )
    }
}

/// A recognized text fragment with its location inside the capture.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedWord {
    pub text: String,
    pub bounds: WordBox,
}

impl PositionedWord {
    pub fn new(text: impl Into<String>, bounds: WordBox) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }
}
