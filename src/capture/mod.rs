//! Screen capture of a fixed screen region.
//!
//! This module provides:
//! - GDI region capture (`GdiScreenCapture`)
//! - BGRA to RGBA pixel conversion (`bgra_to_rgba`)

pub mod screen;

pub use screen::GdiScreenCapture;
