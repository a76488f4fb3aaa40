//! Touch input pipeline.
//!
//! Samples arrive in the sensor's portrait frame, get rotated into the
//! landscape UI frame by [`TouchMapper`], corrected by a [`Calibration`],
//! and filtered by [`TouchDebouncer`] before the UI state machine sees them.

pub mod calibration;
pub mod debounce;
pub mod mailbox;
pub mod mapper;

pub use calibration::{
    CALIBRATION_TARGETS, Calibration, CalibrationCapture, CalibrationError, apply_calibration,
    compute_calibration,
};
pub use debounce::{DEBOUNCE_WINDOW, TouchDebouncer};
pub use mailbox::{MailboxTouch, TouchMailbox};
pub use mapper::{MappedTouch, TouchMapper};

use embedded_graphics::prelude::Point;

/// Sensor frame width (portrait).
pub const SENSOR_WIDTH: u16 = 122;
/// Sensor frame height (portrait).
pub const SENSOR_HEIGHT: u16 = 250;

/// Landscape UI width.
pub const LANDSCAPE_WIDTH: u16 = 250;
/// Landscape UI height.
pub const LANDSCAPE_HEIGHT: u16 = 122;

/// One reading from the touch controller, in sensor (portrait) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTouchSample {
    pub x: u16,
    pub y: u16,
}

impl RawTouchSample {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// A point in the landscape UI frame (0..250, 0..122).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalPoint {
    pub x: u16,
    pub y: u16,
}

impl LogicalPoint {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub fn to_point(&self) -> Point {
        Point::new(self.x as i32, self.y as i32)
    }
}
