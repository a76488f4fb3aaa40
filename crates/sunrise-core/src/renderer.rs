//! Application state to landscape [`Frame`].
//!
//! Rendering is a pure function of the state and the [`RenderContext`]:
//! nothing here reads a clock, so the same inputs always produce the same
//! pixels.

use embedded_graphics::prelude::*;

use crate::app_state::AppState;
use crate::config::Capabilities;
use crate::framebuffer::Frame;
use crate::pages::{Screen, ScreenWrapper};
use crate::time::{Timestamp, UtcOffset};
use crate::ui::styling::Palette;

/// Per-redraw inputs that are not part of [`AppState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub now: Timestamp,
    pub utc_offset: UtcOffset,
    /// Next sunrise (or the fallback horizon).
    pub sunrise: Timestamp,
    pub started_at: Timestamp,
    /// Redraws so far; drives the small animations.
    pub draw_count: u32,
    pub partial_enabled: bool,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameRenderer;

impl FrameRenderer {
    pub fn render(state: &AppState, ctx: &RenderContext) -> Frame {
        let palette = Palette::for_theme(state.theme);
        let mut frame = Frame::landscape(palette.background);

        let screen = ScreenWrapper::for_state(state, ctx.capabilities);
        let Ok(()) = screen.draw_screen(state, ctx, &palette, &mut frame);
        frame
    }
}
