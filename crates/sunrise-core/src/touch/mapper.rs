//! Sensor-to-landscape coordinate mapping.

use super::calibration::{Calibration, apply_calibration};
use super::{LANDSCAPE_WIDTH, LogicalPoint, RawTouchSample, SENSOR_HEIGHT, SENSOR_WIDTH};
use crate::ui::core::TouchSpace;

/// A touch expressed in both landscape coordinate flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedTouch {
    /// Rotated but uncalibrated. The calibration screen hit-tests and
    /// captures in this space so its targets stay meaningful whatever the
    /// current calibration is.
    pub base: LogicalPoint,
    /// Rotated and calibrated. Every other screen uses this.
    pub calibrated: LogicalPoint,
}

impl MappedTouch {
    pub fn point_in(&self, space: TouchSpace) -> LogicalPoint {
        match space {
            TouchSpace::Calibrated => self.calibrated,
            TouchSpace::Uncalibrated => self.base,
        }
    }
}

/// Fixed 90° rotation matching the panel mounting, followed by calibration.
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchMapper;

impl TouchMapper {
    /// Rotate a sensor sample into the landscape frame.
    ///
    /// Returns `None` for samples outside the sensor frame.
    pub fn to_logical(raw: RawTouchSample) -> Option<LogicalPoint> {
        if raw.x >= SENSOR_WIDTH || raw.y >= SENSOR_HEIGHT {
            return None;
        }
        Some(LogicalPoint::new(LANDSCAPE_WIDTH - 1 - raw.y, raw.x))
    }

    pub fn map(raw: RawTouchSample, calibration: &Calibration) -> Option<MappedTouch> {
        let base = Self::to_logical(raw)?;
        Some(MappedTouch {
            base,
            calibrated: apply_calibration(base, calibration),
        })
    }
}
