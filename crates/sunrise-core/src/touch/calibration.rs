//! Three-point affine touch calibration.
//!
//! Each axis gets an independent `value * scale + offset` correction. The x
//! axis is fitted from targets 0 and 1 (same row), the y axis from targets 0
//! and 2 (same column region, different rows).

use log::{debug, info};
use thiserror_no_std::Error;

use super::{LANDSCAPE_HEIGHT, LANDSCAPE_WIDTH, LogicalPoint};

/// Where the calibration screen draws its crosshairs.
pub const CALIBRATION_TARGETS: [LogicalPoint; 3] = [
    LogicalPoint::new(20, 38),
    LogicalPoint::new(230, 38),
    LogicalPoint::new(125, 106),
];

/// Samples closer than this on the fitted axis are rejected.
const MIN_SAMPLE_SPREAD_PX: f64 = 2.0;

/// Largest accepted |scale| on either axis.
const MAX_SCALE: f64 = 3.0;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    #[error("touch points too close (dx={dx}, dy={dy}), retry calibration")]
    PointsTooClose { dx: f64, dy: f64 },
    #[error("invalid scale computed (x={x_scale}, y={y_scale}), retry calibration")]
    ScaleOutOfRange { x_scale: f64, y_scale: f64 },
    #[error("capture incomplete ({step}/3 samples)")]
    Incomplete { step: usize },
}

/// Per-axis affine correction applied to rotated touch points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub x_scale: f64,
    pub y_scale: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::identity()
    }
}

impl Calibration {
    pub const fn identity() -> Self {
        Self {
            x_scale: 1.0,
            y_scale: 1.0,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }

    /// Whether every parameter is finite and both scales are non-zero and
    /// within the accepted bound.
    pub fn is_valid(&self) -> bool {
        let finite = self.x_scale.is_finite()
            && self.y_scale.is_finite()
            && self.x_offset.is_finite()
            && self.y_offset.is_finite();
        finite && scale_in_range(self.x_scale) && scale_in_range(self.y_scale)
    }

    /// Repair values read from storage: a zero scale means "unset" and
    /// becomes 1, anything else invalid falls back to identity.
    pub fn sanitized(self) -> Self {
        let mut cal = self;
        if cal.x_scale == 0.0 {
            cal.x_scale = 1.0;
        }
        if cal.y_scale == 0.0 {
            cal.y_scale = 1.0;
        }
        if cal.is_valid() {
            cal
        } else {
            Self::identity()
        }
    }
}

fn scale_in_range(scale: f64) -> bool {
    scale != 0.0 && libm::fabs(scale) <= MAX_SCALE
}

/// Apply `cal` to `point`, rounding to the nearest pixel and clamping into
/// the landscape frame.
pub fn apply_calibration(point: LogicalPoint, cal: &Calibration) -> LogicalPoint {
    let x = libm::round(point.x as f64 * cal.x_scale + cal.x_offset);
    let y = libm::round(point.y as f64 * cal.y_scale + cal.y_offset);
    LogicalPoint::new(
        clamp_axis(x, LANDSCAPE_WIDTH),
        clamp_axis(y, LANDSCAPE_HEIGHT),
    )
}

fn clamp_axis(value: f64, extent: u16) -> u16 {
    // `as` saturates and maps NaN to 0
    (value as i64).clamp(0, extent as i64 - 1) as u16
}

/// Fit a calibration mapping `samples[i]` onto `targets[i]`.
pub fn compute_calibration(
    samples: &[LogicalPoint; 3],
    targets: &[LogicalPoint; 3],
) -> Result<Calibration, CalibrationError> {
    let dx = samples[1].x as f64 - samples[0].x as f64;
    let dy = samples[2].y as f64 - samples[0].y as f64;
    if libm::fabs(dx) < MIN_SAMPLE_SPREAD_PX || libm::fabs(dy) < MIN_SAMPLE_SPREAD_PX {
        return Err(CalibrationError::PointsTooClose { dx, dy });
    }

    let x_scale = (targets[1].x as f64 - targets[0].x as f64) / dx;
    let y_scale = (targets[2].y as f64 - targets[0].y as f64) / dy;
    if !scale_in_range(x_scale) || !scale_in_range(y_scale) {
        return Err(CalibrationError::ScaleOutOfRange { x_scale, y_scale });
    }

    let cal = Calibration {
        x_scale,
        y_scale,
        x_offset: targets[0].x as f64 - samples[0].x as f64 * x_scale,
        y_offset: targets[0].y as f64 - samples[0].y as f64 * y_scale,
    };
    debug!("calibration fit: {:?}", cal);
    Ok(cal)
}

/// Samples collected on the calibration screen, one per accepted tap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalibrationCapture {
    samples: [LogicalPoint; 3],
    step: usize,
    last_error: Option<CalibrationError>,
}

impl CalibrationCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples captured so far (0..=3).
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step >= CALIBRATION_TARGETS.len()
    }

    /// Record the next sample. Returns `false` once the capture is full.
    pub fn push(&mut self, point: LogicalPoint) -> bool {
        if self.is_complete() {
            return false;
        }
        self.samples[self.step] = point;
        self.step += 1;
        info!(
            "calib: captured step {} at ({}, {})",
            self.step, point.x, point.y
        );
        true
    }

    pub fn samples(&self) -> &[LogicalPoint] {
        &self.samples[..self.step]
    }

    /// Fit against [`CALIBRATION_TARGETS`]. The capture itself is left as is.
    pub fn compute(&self) -> Result<Calibration, CalibrationError> {
        if !self.is_complete() {
            return Err(CalibrationError::Incomplete { step: self.step });
        }
        compute_calibration(&self.samples, &CALIBRATION_TARGETS)
    }

    pub fn last_error(&self) -> Option<CalibrationError> {
        self.last_error
    }

    pub fn record_error(&mut self, err: CalibrationError) {
        self.last_error = Some(err);
    }
}
