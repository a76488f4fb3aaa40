//! Hardware capability traits.
//!
//! The core never talks to a bus. Board support code implements these for
//! the real touch controller and e-paper panel; tests and the host binary
//! provide their own.

use embedded_graphics::prelude::Size;
use embedded_graphics::primitives::Rectangle;
use thiserror_no_std::Error;

use crate::framebuffer::Frame;
use crate::touch::RawTouchSample;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    #[error("bus I/O failed: {0}")]
    Io(&'static str),
    #[error("device did not become ready in time")]
    Timeout,
    #[error("device is not available")]
    Unavailable,
}

/// Waveform selection for the next panel update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Full,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelColor {
    White,
    Black,
}

pub trait TouchDriver {
    /// Current contact, or `None` when no finger is down.
    fn poll(&mut self) -> Result<Option<RawTouchSample>, DriverError>;
}

/// E-paper panel addressed in its native portrait orientation.
pub trait PanelDriver {
    /// Native resolution (width is the byte-addressed column axis).
    fn size(&self) -> Size;

    /// Power up and load the waveform tables. Also used to wake from sleep.
    fn init(&mut self) -> Result<(), DriverError>;

    fn clear(&mut self, color: PanelColor) -> Result<(), DriverError>;

    /// Write `area` of `frame` to panel memory and trigger a refresh using
    /// the current [`RefreshMode`].
    fn draw_region(&mut self, area: &Rectangle, frame: &Frame) -> Result<(), DriverError>;

    /// Deep sleep. The panel keeps its image; [`PanelDriver::init`] wakes it.
    fn sleep(&mut self) -> Result<(), DriverError>;

    fn set_refresh_mode(&mut self, mode: RefreshMode) -> Result<(), DriverError>;

    /// Release the hardware. Nothing may be called afterwards.
    fn halt(&mut self) -> Result<(), DriverError>;
}
