//! Tap debouncing.
//!
//! Two rules: a finger that stays down fires once, and an identical point
//! repeated shortly after the previous accepted tap is ignored. Points are
//! compared in whichever coordinate space the active screen hit-tests.

use core::time::Duration;

use log::debug;

use super::LogicalPoint;
use crate::time::Timestamp;

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(700);

#[derive(Debug, Clone, Copy, Default)]
pub struct TouchDebouncer {
    last_accepted: Option<(LogicalPoint, Timestamp)>,
    held: bool,
}

impl TouchDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one poll result; returns the point only if it is a new tap.
    ///
    /// `None` means the controller reported no contact, which releases a
    /// held finger.
    pub fn filter(&mut self, reading: Option<LogicalPoint>, now: Timestamp) -> Option<LogicalPoint> {
        let Some(point) = reading else {
            self.held = false;
            return None;
        };

        if self.held {
            return None;
        }
        self.held = true;

        if let Some((last, at)) = self.last_accepted
            && last == point
            && now.duration_since(at) < DEBOUNCE_WINDOW
        {
            debug!("debounced repeat tap at ({}, {})", point.x, point.y);
            return None;
        }

        self.last_accepted = Some((point, now));
        Some(point)
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch_at(x: u16, y: u16) -> LogicalPoint {
        LogicalPoint::new(x, y)
    }

    #[test]
    fn test_identical_taps_inside_window_fire_once() {
        let mut debouncer = TouchDebouncer::new();
        let t0 = Timestamp::from_millis(10_000);

        assert!(debouncer.filter(Some(touch_at(50, 50)), t0).is_some());
        debouncer.filter(None, Timestamp::from_millis(10_050));
        assert!(
            debouncer
                .filter(Some(touch_at(50, 50)), Timestamp::from_millis(10_100))
                .is_none()
        );
    }

    #[test]
    fn test_identical_taps_outside_window_both_fire() {
        let mut debouncer = TouchDebouncer::new();

        assert!(
            debouncer
                .filter(Some(touch_at(50, 50)), Timestamp::from_millis(10_000))
                .is_some()
        );
        debouncer.filter(None, Timestamp::from_millis(10_500));
        assert!(
            debouncer
                .filter(Some(touch_at(50, 50)), Timestamp::from_millis(11_000))
                .is_some()
        );
    }

    #[test]
    fn test_held_finger_does_not_repeat() {
        let mut debouncer = TouchDebouncer::new();

        assert!(
            debouncer
                .filter(Some(touch_at(10, 10)), Timestamp::from_millis(0))
                .is_some()
        );
        // Still down, even after the window and at a different point
        assert!(
            debouncer
                .filter(Some(touch_at(90, 90)), Timestamp::from_millis(5_000))
                .is_none()
        );
        assert!(debouncer.is_held());

        debouncer.filter(None, Timestamp::from_millis(5_100));
        assert!(
            debouncer
                .filter(Some(touch_at(90, 90)), Timestamp::from_millis(5_200))
                .is_some()
        );
    }

    #[test]
    fn test_different_point_inside_window_fires() {
        let mut debouncer = TouchDebouncer::new();

        debouncer.filter(Some(touch_at(50, 50)), Timestamp::from_millis(0));
        debouncer.filter(None, Timestamp::from_millis(40));
        assert!(
            debouncer
                .filter(Some(touch_at(200, 10)), Timestamp::from_millis(100))
                .is_some()
        );
    }
}
