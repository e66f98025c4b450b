//! Quiz answering automation.
//!
//! This module provides:
//! - Session configuration and validation
//! - Option / question marker extraction from positioned OCR words
//! - Scroll window bookkeeping for long pages
//! - The interaction session (fixed-page and scroll loops)
//! - A background runner with cooperative stop
//! - Pointer input simulation via SendInput

pub mod answer;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod markers;
pub mod ports;
pub mod runner;
pub mod scroll;
pub mod session;
pub mod state;

#[cfg(test)]
pub mod testing;
