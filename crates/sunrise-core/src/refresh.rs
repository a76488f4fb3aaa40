//! Full vs. partial e-paper update planning.
//!
//! Partial refreshes are fast but leave ghosting behind, so they are
//! rationed: after a fixed number of partials, or once a full refresh is
//! older than a fixed ceiling, the next update is forced to be full.

use core::time::Duration;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, info};

use crate::drivers::RefreshMode;
use crate::framebuffer::Frame;
use crate::time::Timestamp;

/// The panel addresses columns in groups of this many pixels.
pub const COLUMN_ALIGNMENT: u32 = 8;

/// Consecutive partial refreshes allowed before a full one is forced.
pub const PARTIAL_BUDGET: u32 = 6;

/// Maximum age of the last full refresh.
pub const FULL_REFRESH_CEILING: Duration = Duration::from_secs(24 * 3_600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Full,
    Partial,
    /// Nothing changed; no panel write.
    Skip,
}

impl RefreshKind {
    /// Panel waveform for this update, `None` when nothing is written.
    pub fn panel_mode(self) -> Option<RefreshMode> {
        match self {
            RefreshKind::Full => Some(RefreshMode::Full),
            RefreshKind::Partial => Some(RefreshMode::Partial),
            RefreshKind::Skip => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshDecision {
    pub rect: Rectangle,
    pub kind: RefreshKind,
}

impl RefreshDecision {
    fn full(frame: &Frame) -> Self {
        Self {
            rect: frame.bounds(),
            kind: RefreshKind::Full,
        }
    }
}

/// Decide how to push `curr` given the previously written frame.
pub fn plan(prev: Option<&Frame>, curr: &Frame, force_full: bool) -> RefreshDecision {
    let Some(prev) = prev else {
        return RefreshDecision::full(curr);
    };
    if force_full || prev.size() != curr.size() {
        return RefreshDecision::full(curr);
    }

    match curr.diff_bounds(prev) {
        Some(diff) => RefreshDecision {
            rect: align_columns(diff, curr.bounds()),
            kind: RefreshKind::Partial,
        },
        None => RefreshDecision {
            rect: Rectangle::zero(),
            kind: RefreshKind::Skip,
        },
    }
}

/// Widen `rect` horizontally to [`COLUMN_ALIGNMENT`] boundaries without
/// leaving `bounds`.
fn align_columns(rect: Rectangle, bounds: Rectangle) -> Rectangle {
    let mask = !(COLUMN_ALIGNMENT as i32 - 1);
    let right_edge = rect.top_left.x + rect.size.width as i32;
    let bounds_right = bounds.top_left.x + bounds.size.width as i32;

    let x0 = (rect.top_left.x & mask).max(bounds.top_left.x);
    let x1 = ((right_edge + COLUMN_ALIGNMENT as i32 - 1) & mask).min(bounds_right);
    if x1 <= x0 {
        return bounds;
    }

    Rectangle::new(
        Point::new(x0, rect.top_left.y),
        Size::new((x1 - x0) as u32, rect.size.height),
    )
    .intersection(&bounds)
}

/// Partial refreshes since the last full one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshCounter {
    pub partials_since_full: u32,
    pub last_full: Option<Timestamp>,
}

impl RefreshCounter {
    fn record(&mut self, kind: RefreshKind, now: Timestamp) {
        match kind {
            RefreshKind::Full => {
                self.partials_since_full = 0;
                self.last_full = Some(now);
            }
            RefreshKind::Partial => self.partials_since_full += 1,
            RefreshKind::Skip => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// With partials disabled every write is a full refresh.
    pub partial_enabled: bool,
    pub partial_budget: u32,
    pub full_ceiling: Duration,
}

impl RefreshPolicy {
    pub fn new(partial_enabled: bool) -> Self {
        Self {
            partial_enabled,
            partial_budget: PARTIAL_BUDGET,
            full_ceiling: FULL_REFRESH_CEILING,
        }
    }

    pub fn force_full(&self, counter: &RefreshCounter, now: Timestamp) -> bool {
        if !self.partial_enabled || counter.partials_since_full >= self.partial_budget {
            return true;
        }
        match counter.last_full {
            Some(at) => now.duration_since(at) >= self.full_ceiling,
            None => true,
        }
    }
}

/// Owns the last frame written to the panel and the refresh budget.
#[derive(Debug)]
pub struct RefreshPlanner {
    policy: RefreshPolicy,
    counter: RefreshCounter,
    previous: Option<Frame>,
}

impl RefreshPlanner {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            policy,
            counter: RefreshCounter::default(),
            previous: None,
        }
    }

    pub fn decide(&self, frame: &Frame, now: Timestamp) -> RefreshDecision {
        let force_full = self.policy.force_full(&self.counter, now);
        let decision = plan(self.previous.as_ref(), frame, force_full);
        debug!(
            "refresh plan: {:?} rect=({}, {}) {}x{} force_full={} partials={}",
            decision.kind,
            decision.rect.top_left.x,
            decision.rect.top_left.y,
            decision.rect.size.width,
            decision.rect.size.height,
            force_full,
            self.counter.partials_since_full
        );
        decision
    }

    /// Record that `frame` is now what the panel shows.
    ///
    /// Call only after the panel write succeeded; a failed write must
    /// leave the previous frame and the counters alone.
    pub fn commit(&mut self, frame: Frame, decision: &RefreshDecision, now: Timestamp) {
        self.counter.record(decision.kind, now);
        if decision.kind == RefreshKind::Full {
            info!("full refresh at {}", now.as_unix_secs());
        }
        self.previous = Some(frame);
    }

    pub fn counter(&self) -> &RefreshCounter {
        &self.counter
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    pub fn previous(&self) -> Option<&Frame> {
        self.previous.as_ref()
    }
}
