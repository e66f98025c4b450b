//! Mouse input simulation for answering sessions.
//!
//! Uses SendInput (hardware-level input) with absolute coordinates, so the
//! real cursor moves. Scrolling moves the cursor over the page first, then
//! sends wheel notches.

use crate::automation::error::SessionError;
use crate::automation::geometry::Point;
use crate::automation::ports::PointerInjector;

/// Pixels scrolled by one wheel notch.
pub const PIXELS_PER_NOTCH: i32 = 120;

/// Wheel notches for a scroll distance. Positive distances scroll down,
/// which the wheel expresses as negative notches.
pub fn wheel_notches(distance: i32) -> i32 {
    -(distance / PIXELS_PER_NOTCH)
}

/// Pointer injector backed by the Windows SendInput API.
#[derive(Debug, Default)]
pub struct SendInputPointer;

impl PointerInjector for SendInputPointer {
    fn click(&mut self, x: i32, y: i32) -> Result<(), SessionError> {
        platform::click(x, y)
            .map_err(|e| SessionError::Injection(format!("click at ({}, {}) failed: {}", x, y, e)))
    }

    fn scroll(&mut self, delta_pixels: i32, at: Point) -> Result<(), SessionError> {
        let notches = wheel_notches(delta_pixels);
        if notches == 0 {
            return Ok(());
        }
        platform::scroll(notches, at).map_err(|e| {
            SessionError::Injection(format!("scroll of {} px at {} failed: {}", delta_pixels, at, e))
        })
    }
}

#[cfg(windows)]
mod platform {
    use anyhow::{Result, anyhow};
    use std::time::Duration;

    use windows::Win32::UI::Input::KeyboardAndMouse::{
        INPUT, INPUT_0, INPUT_MOUSE, MOUSE_EVENT_FLAGS, MOUSEEVENTF_ABSOLUTE,
        MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEEVENTF_WHEEL, MOUSEINPUT,
        SendInput,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

    use crate::automation::geometry::Point;

    const WHEEL_DELTA: i32 = 120;

    /// Normalizes screen pixels to the 0-65535 range used by MOUSEEVENTF_ABSOLUTE.
    fn normalize(x: i32, y: i32) -> Result<(i32, i32)> {
        let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
        let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
        if screen_width <= 0 || screen_height <= 0 {
            return Err(anyhow!("could not read screen size"));
        }
        let norm_x = ((x as i64 * 65535) / screen_width as i64) as i32;
        let norm_y = ((y as i64 * 65535) / screen_height as i64) as i32;
        Ok((norm_x, norm_y))
    }

    fn send(dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS, data: i32) -> Result<()> {
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    mouseData: data,
                    dwFlags: flags,
                    ..Default::default()
                },
            },
        };
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent == 1 {
            Ok(())
        } else {
            Err(anyhow!("SendInput rejected the event"))
        }
    }

    pub fn click(x: i32, y: i32) -> Result<()> {
        let (nx, ny) = normalize(x, y)?;
        send(nx, ny, MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE, 0)?;
        std::thread::sleep(Duration::from_millis(50));
        send(nx, ny, MOUSEEVENTF_LEFTDOWN | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE, 0)?;
        std::thread::sleep(Duration::from_millis(50));
        send(nx, ny, MOUSEEVENTF_LEFTUP | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE, 0)
    }

    pub fn scroll(notches: i32, at: Point) -> Result<()> {
        let (nx, ny) = normalize(at.x, at.y)?;
        send(nx, ny, MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE, 0)?;
        std::thread::sleep(Duration::from_millis(200));
        send(0, 0, MOUSEEVENTF_WHEEL, notches * WHEEL_DELTA)
    }
}

#[cfg(not(windows))]
mod platform {
    use anyhow::{Result, anyhow};

    use crate::automation::geometry::Point;

    pub fn click(_x: i32, _y: i32) -> Result<()> {
        Err(anyhow!("pointer injection is only supported on Windows"))
    }

    pub fn scroll(_notches: i32, _at: Point) -> Result<()> {
        Err(anyhow!("pointer injection is only supported on Windows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_notches() {
        assert_eq!(wheel_notches(850), -7);
        assert_eq!(wheel_notches(500), -4);
        assert_eq!(wheel_notches(119), 0);
        assert_eq!(wheel_notches(-240), 2);
    }

    #[test]
    fn test_sub_notch_scroll_is_noop() {
        let mut pointer = SendInputPointer;
        assert!(pointer.scroll(60, Point::new(10, 10)).is_ok());
    }
}
