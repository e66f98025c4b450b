//! Region screenshots using GDI.
//!
//! Copies the region from the screen DC into a 32-bit top-down DIB and
//! converts it to an RGBA image buffer.

use anyhow::{Result, anyhow};
use image::RgbaImage;

use crate::automation::error::SessionError;
use crate::automation::geometry::Rect;
use crate::automation::ports::ScreenCapture;

/// Converts BGRA pixel data to RGBA in place and forces full opacity.
pub fn bgra_to_rgba(pixels: &mut [u8]) {
    for chunk in pixels.chunks_exact_mut(4) {
        chunk.swap(0, 2);
        chunk[3] = 255;
    }
}

#[derive(Debug, Default)]
pub struct GdiScreenCapture;

impl ScreenCapture for GdiScreenCapture {
    fn capture(&mut self, region: Rect) -> std::result::Result<RgbaImage, SessionError> {
        if !region.is_valid() {
            return Err(SessionError::Capture(format!("invalid region {}", region)));
        }
        capture_region(region).map_err(|e| SessionError::Capture(e.to_string()))
    }
}

/// Captures `region` of the primary screen.
pub fn capture_region(region: Rect) -> Result<RgbaImage> {
    let width = region.width();
    let height = region.height();

    let mut pixels = platform::grab_bgra(region)?;
    bgra_to_rgba(&mut pixels);

    RgbaImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| anyhow!("captured buffer does not match {}x{}", width, height))
}

#[cfg(windows)]
mod platform {
    use anyhow::{Result, anyhow};
    use std::ffi::c_void;

    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap,
        CreateCompatibleDC, DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits, ReleaseDC,
        SRCCOPY, SelectObject,
    };

    use crate::automation::geometry::Rect;

    /// Returns the region as top-down BGRA rows.
    pub fn grab_bgra(region: Rect) -> Result<Vec<u8>> {
        let width = region.width();
        let height = region.height();
        let mut buffer = vec![0u8; (width as usize) * (height as usize) * 4];

        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(anyhow!("GetDC failed"));
            }

            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(
                mem_dc, 0, 0, width, height, screen_dc, region.x1, region.y1, SRCCOPY,
            );

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // Negative height requests top-down rows
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let lines = if blit.is_ok() {
                GetDIBits(
                    mem_dc,
                    bitmap,
                    0,
                    height as u32,
                    Some(buffer.as_mut_ptr() as *mut c_void),
                    &mut info,
                    DIB_RGB_COLORS,
                )
            } else {
                0
            };

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            blit.map_err(|e| anyhow!("BitBlt failed: {}", e))?;
            if lines != height {
                return Err(anyhow!("GetDIBits copied {} of {} rows", lines, height));
            }
        }

        Ok(buffer)
    }
}

#[cfg(not(windows))]
mod platform {
    use anyhow::{Result, anyhow};

    use crate::automation::geometry::Rect;

    pub fn grab_bgra(_region: Rect) -> Result<Vec<u8>> {
        Err(anyhow!("screen capture is only supported on Windows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_to_rgba() {
        let mut pixels = vec![10, 20, 30, 0, 1, 2, 3, 128];
        bgra_to_rgba(&mut pixels);
        assert_eq!(pixels, vec![30, 20, 10, 255, 3, 2, 1, 255]);
    }

    #[test]
    fn test_invalid_region_is_capture_error() {
        let mut capture = GdiScreenCapture;
        let result = capture.capture(Rect::new(100, 100, 100, 200));
        assert!(matches!(result, Err(SessionError::Capture(msg)) if msg.contains("invalid region")));
    }
}
