//! Cursor and hotkey polling for the calibration wizard.
//!
//! The GUI owns the event loop, so instead of registering hotkeys the wizard
//! polls the global key state once per frame and reacts to fresh presses.

use anyhow::Result;

use crate::automation::geometry::Point;
use crate::calibration::wizard::CalibrationKey;

/// Keys polled while calibrating, in press-priority order.
pub const CALIBRATION_KEYS: [CalibrationKey; 7] = [
    CalibrationKey::Abort,
    CalibrationKey::Confirm,
    CalibrationKey::Redo,
    CalibrationKey::RecordPoint,
    CalibrationKey::RecordTopLeft,
    CalibrationKey::RecordBottomRight,
    CalibrationKey::Skip,
];

/// Gets the current cursor position in screen coordinates.
#[cfg(windows)]
pub fn get_cursor_position() -> Result<Point> {
    use windows::Win32::Foundation::POINT;
    use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

    let mut pt = POINT::default();
    unsafe {
        GetCursorPos(&mut pt)?;
    }
    Ok(Point::new(pt.x, pt.y))
}

#[cfg(not(windows))]
pub fn get_cursor_position() -> Result<Point> {
    Err(anyhow::anyhow!("cursor position is only available on Windows"))
}

/// True while the key is held down anywhere on the desktop.
#[cfg(windows)]
fn is_key_down(key: CalibrationKey) -> bool {
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        GetAsyncKeyState, VK_ESCAPE, VK_F1, VK_F2, VK_F3, VK_N, VK_RETURN, VK_Y,
    };

    let vk = match key {
        CalibrationKey::RecordPoint => VK_F1,
        CalibrationKey::RecordTopLeft => VK_F2,
        CalibrationKey::RecordBottomRight => VK_F3,
        CalibrationKey::Confirm => VK_Y,
        CalibrationKey::Redo => VK_N,
        CalibrationKey::Skip => VK_RETURN,
        CalibrationKey::Abort => VK_ESCAPE,
    };
    // High bit set means the key is currently down
    unsafe { GetAsyncKeyState(i32::from(vk.0)) < 0 }
}

#[cfg(not(windows))]
fn is_key_down(_key: CalibrationKey) -> bool {
    false
}

/// Turns held-key snapshots into single presses.
#[derive(Debug, Default)]
pub struct KeyPoller {
    held: [bool; CALIBRATION_KEYS.len()],
}

impl KeyPoller {
    /// Seeds the held state so keys already down (e.g. the click or Enter that
    /// started calibration) do not count as presses.
    pub fn new() -> Self {
        let mut poller = Self::default();
        poller.poll();
        poller
    }

    /// Returns the first key pressed since the last poll, if any.
    pub fn poll(&mut self) -> Option<CalibrationKey> {
        let mut down = [false; CALIBRATION_KEYS.len()];
        for (slot, key) in down.iter_mut().zip(CALIBRATION_KEYS) {
            *slot = is_key_down(key);
        }
        self.update(down)
    }

    fn update(&mut self, down: [bool; CALIBRATION_KEYS.len()]) -> Option<CalibrationKey> {
        let pressed = CALIBRATION_KEYS
            .iter()
            .zip(down.iter().zip(self.held.iter()))
            .find(|(_, (now, before))| **now && !**before)
            .map(|(key, _)| *key);
        self.held = down;
        pressed
    }
}
