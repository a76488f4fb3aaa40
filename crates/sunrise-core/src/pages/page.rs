//! Screen abstraction and the enum wrapper that dispatches to the active one.
//!
//! A [`Screen`] is a view over [`AppState`]: it declares its hit regions
//! (in precedence order) and knows how to draw itself. Screens hold no
//! state of their own beyond borrowed views into the application state, so
//! a fresh [`ScreenWrapper`] is built whenever one is needed.

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use heapless::Vec;

use crate::app_state::{AppState, ScreenMode};
use crate::config::Capabilities;
use crate::pages::calibration::CalibrationScreen;
use crate::pages::home::HomeScreen;
use crate::pages::settings::SettingsScreen;
use crate::renderer::RenderContext;
use crate::ui::core::{Region, ScreenId, TouchSpace};
use crate::ui::styling::Palette;

/// Upper bound on hit regions per screen.
pub const MAX_REGIONS: usize = 12;

pub type Regions = Vec<Region, MAX_REGIONS>;

// ---------------------------------------------------------------------------
// Screen trait
// ---------------------------------------------------------------------------

pub trait Screen {
    fn id(&self) -> ScreenId;

    /// Human-readable title, used in logs.
    fn title(&self) -> &str;

    /// Coordinate flavour the regions are expressed in.
    fn touch_space(&self) -> TouchSpace {
        TouchSpace::Calibrated
    }

    /// Hit regions, first match wins.
    fn regions(&self) -> Regions;

    /// Draw onto a target already cleared to `palette.background`.
    fn draw_screen<D: DrawTarget<Color = Gray8>>(
        &self,
        state: &AppState,
        ctx: &RenderContext,
        palette: &Palette,
        display: &mut D,
    ) -> Result<(), D::Error>;
}

/// Push `region` when `enabled`. Capacity is sized for every screen.
pub(crate) fn push_region(regions: &mut Regions, region: Region, enabled: bool) {
    if enabled {
        regions.push(region).ok();
    }
}

// ---------------------------------------------------------------------------
// ScreenWrapper
// ---------------------------------------------------------------------------

/// The screen for the current [`ScreenMode`].
pub enum ScreenWrapper<'a> {
    Home(HomeScreen),
    Settings(SettingsScreen<'a>),
    Calibration(CalibrationScreen<'a>),
}

impl<'a> ScreenWrapper<'a> {
    pub fn for_state(state: &'a AppState, capabilities: Capabilities) -> Self {
        match &state.mode {
            ScreenMode::Normal => ScreenWrapper::Home(HomeScreen::new(capabilities)),
            ScreenMode::Settings(draft) => {
                ScreenWrapper::Settings(SettingsScreen::new(draft, capabilities))
            }
            ScreenMode::Calibration { capture, .. } => {
                ScreenWrapper::Calibration(CalibrationScreen::new(capture))
            }
        }
    }
}

impl Screen for ScreenWrapper<'_> {
    fn id(&self) -> ScreenId {
        match self {
            ScreenWrapper::Home(screen) => screen.id(),
            ScreenWrapper::Settings(screen) => screen.id(),
            ScreenWrapper::Calibration(screen) => screen.id(),
        }
    }

    fn title(&self) -> &str {
        match self {
            ScreenWrapper::Home(screen) => screen.title(),
            ScreenWrapper::Settings(screen) => screen.title(),
            ScreenWrapper::Calibration(screen) => screen.title(),
        }
    }

    fn touch_space(&self) -> TouchSpace {
        match self {
            ScreenWrapper::Home(screen) => screen.touch_space(),
            ScreenWrapper::Settings(screen) => screen.touch_space(),
            ScreenWrapper::Calibration(screen) => screen.touch_space(),
        }
    }

    fn regions(&self) -> Regions {
        match self {
            ScreenWrapper::Home(screen) => screen.regions(),
            ScreenWrapper::Settings(screen) => screen.regions(),
            ScreenWrapper::Calibration(screen) => screen.regions(),
        }
    }

    fn draw_screen<D: DrawTarget<Color = Gray8>>(
        &self,
        state: &AppState,
        ctx: &RenderContext,
        palette: &Palette,
        display: &mut D,
    ) -> Result<(), D::Error> {
        match self {
            ScreenWrapper::Home(screen) => screen.draw_screen(state, ctx, palette, display),
            ScreenWrapper::Settings(screen) => screen.draw_screen(state, ctx, palette, display),
            ScreenWrapper::Calibration(screen) => {
                screen.draw_screen(state, ctx, palette, display)
            }
        }
    }
}
