//! Calibration module for interactive region and click position configuration.
//!
//! Provides a wizard that guides the user through marking the capture region,
//! the option centers and the next button by pointing and pressing hotkeys.

pub mod coords;
pub mod state;
pub mod wizard;

pub use coords::{KeyPoller, get_cursor_position};
pub use wizard::{CalibrationWizard, WizardOutcome};
