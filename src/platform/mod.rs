//! Platform abstraction layer
//!
//! Everything the toy needs from its host, passed in explicitly:
//! - Drawing surface
//! - Periodic timer (physics tick)
//! - Audio input (microphone buffers)
//! - Frame scheduling (redraw opportunities)
//! - User notification
//!
//! The browser implementations live in `crate::web` and `crate::audio`;
//! `headless` provides in-memory versions for the native binary and tests.

pub mod headless;

use crate::error::GameError;

/// An opaque RGB fill color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Same value on every channel
    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    /// CSS hex notation, e.g. `#A0A0A0`
    pub fn to_css(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Immediate-mode 2D drawing commands
pub trait Surface {
    /// Drawable size (width, height)
    fn size(&self) -> (f32, f32);
    fn begin_path(&mut self);
    fn set_fill_color(&mut self, color: Color);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    /// Add a full circle to the current path and fill it
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32);
    fn close_path(&mut self);
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Clear the whole drawable area
    fn clear(&mut self) {
        let (width, height) = self.size();
        self.clear_rect(0.0, 0.0, width, height);
    }
}

/// Handle to something that keeps calling back until cancelled
pub trait Subscription {
    /// Stop delivering callbacks. Calling twice is harmless.
    fn cancel(&mut self);
}

/// Repeating timer
pub trait Timer {
    /// Invoke `callback` every `period_ms` milliseconds until cancelled
    fn every(
        &mut self,
        period_ms: u32,
        callback: Box<dyn FnMut()>,
    ) -> Result<Box<dyn Subscription>, GameError>;
}

/// Microphone-like sample source
pub trait AudioInput {
    /// Request access and start delivering buffers of `buffer_size` samples in [-1, 1].
    ///
    /// Access may be granted asynchronously; a refusal arrives through `on_error`
    /// rather than the return value.
    fn open(
        &mut self,
        buffer_size: u32,
        on_buffer: Box<dyn FnMut(&[f32])>,
        on_error: Box<dyn FnOnce(GameError)>,
    ) -> Result<Box<dyn Subscription>, GameError>;
}

/// One-shot redraw scheduling
pub trait FrameScheduler {
    /// Run `callback` once at the next redraw opportunity
    fn request_frame(
        &mut self,
        callback: Box<dyn FnOnce()>,
    ) -> Result<Box<dyn Subscription>, GameError>;
}

/// User-facing messages
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_css() {
        assert_eq!(Color::BLACK.to_css(), "#000000");
        assert_eq!(Color::gray(0xA0).to_css(), "#A0A0A0");
        assert_eq!(Color::rgb(1, 0xab, 255).to_css(), "#01ABFF");
    }
}
