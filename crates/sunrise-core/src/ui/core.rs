//! Core UI types: hit regions and the actions they trigger.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::touch::LogicalPoint;

/// Axis-aligned rectangle with inclusive bounds, as used for hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRect {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl HitRect {
    pub const fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn contains(&self, point: LogicalPoint) -> bool {
        point.x >= self.x0 && point.x <= self.x1 && point.y >= self.y0 && point.y <= self.y1
    }

    /// Drawing rectangle covering the same pixels.
    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::with_corners(
            Point::new(self.x0 as i32, self.y0 as i32),
            Point::new(self.x1 as i32, self.y1 as i32),
        )
    }
}

/// Settings fields adjustable with the ± buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    Latitude,
    Longitude,
    Interval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Down,
    Up,
}

/// What a tapped region asks the state machine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CycleTheme,
    CyclePage,
    OpenSettings,
    /// First tap arms, second tap inside the window confirms.
    Exit,
    Back,
    Save,
    Calibrate,
    Adjust(SettingField, Step),
    Apply,
}

/// A hit region and the action it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub rect: HitRect,
    pub action: Action,
}

impl Region {
    pub const fn new(rect: HitRect, action: Action) -> Self {
        Self { rect, action }
    }
}

/// Which flavour of mapped coordinate a screen hit-tests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchSpace {
    Calibrated,
    /// Rotated only; used while calibrating.
    Uncalibrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Normal,
    Settings,
    Calibration,
}

/// First region containing `point`, in declaration order.
pub fn hit_test(regions: &[Region], point: LogicalPoint) -> Option<Action> {
    regions
        .iter()
        .find(|region| region.rect.contains(point))
        .map(|region| region.action)
}
