//! Normal screen: header controls plus one of three pages.

use core::f64::consts::PI;
use core::fmt::Write;

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle};
use heapless::String;

use crate::app_state::AppState;
use crate::config::Capabilities;
use crate::pages::page::{Regions, Screen, push_region};
use crate::pages::{draw_rule, minutes};
use crate::renderer::RenderContext;
use crate::time::format_hms;
use crate::ui::core::{Action, HitRect, Region, ScreenId};
use crate::ui::styling::Palette;
use crate::ui::{Button, TextSize, draw_text};

const THEME_REGION: HitRect = HitRect::new(2, 0, 62, 28);
const PAGE_REGION: HitRect = HitRect::new(63, 0, 124, 28);
const SET_REGION: HitRect = HitRect::new(125, 0, 186, 28);
const EXIT_REGION: HitRect = HitRect::new(187, 0, 249, 28);

const THEME_BUTTON: HitRect = HitRect::new(4, 2, 60, 20);
const PAGE_BUTTON: HitRect = HitRect::new(64, 2, 120, 20);
const SET_BUTTON: HitRect = HitRect::new(124, 2, 180, 20);
const EXIT_BUTTON: HitRect = HitRect::new(184, 2, 246, 20);

/// Column of the vertical split between the text and graphics halves.
const SPLIT_X: i32 = 125;
const RIGHT_X: i32 = 132;

pub const SUNRISE_PAGE: u8 = 0;
pub const STATS_PAGE: u8 = 1;
pub const ART_PAGE: u8 = 2;

pub struct HomeScreen {
    capabilities: Capabilities,
}

impl HomeScreen {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    fn draw_header<D: DrawTarget<Color = Gray8>>(
        &self,
        state: &AppState,
        ctx: &RenderContext,
        palette: &Palette,
        display: &mut D,
    ) -> Result<(), D::Error> {
        draw_rule(display, palette)?;

        Button::new(THEME_BUTTON, "THEME")
            .with_palette(*palette)
            .draw(display)?;
        if self.capabilities.page_count() > 1 {
            Button::new(PAGE_BUTTON, "PAGE")
                .with_palette(*palette)
                .draw(display)?;
        }
        if self.capabilities.settings {
            Button::new(SET_BUTTON, "SET")
                .with_palette(*palette)
                .draw(display)?;
        }

        let armed = state.exit_armed(ctx.now);
        Button::new(EXIT_BUTTON, if armed { "EXIT!" } else { "EXIT" })
            .with_palette(*palette)
            .with_active(armed)
            .draw(display)?;
        Ok(())
    }
}

impl Screen for HomeScreen {
    fn id(&self) -> ScreenId {
        ScreenId::Normal
    }

    fn title(&self) -> &str {
        "Home"
    }

    fn regions(&self) -> Regions {
        let mut regions = Regions::new();
        push_region(
            &mut regions,
            Region::new(THEME_REGION, Action::CycleTheme),
            true,
        );
        push_region(
            &mut regions,
            Region::new(PAGE_REGION, Action::CyclePage),
            self.capabilities.page_count() > 1,
        );
        push_region(
            &mut regions,
            Region::new(SET_REGION, Action::OpenSettings),
            self.capabilities.settings,
        );
        push_region(&mut regions, Region::new(EXIT_REGION, Action::Exit), true);
        regions
    }

    fn draw_screen<D: DrawTarget<Color = Gray8>>(
        &self,
        state: &AppState,
        ctx: &RenderContext,
        palette: &Palette,
        display: &mut D,
    ) -> Result<(), D::Error> {
        self.draw_header(state, ctx, palette, display)?;

        let size = display.bounding_box().size;
        Line::new(
            Point::new(SPLIT_X, 23),
            Point::new(SPLIT_X, size.height as i32 - 1),
        )
        .into_styled(PrimitiveStyle::with_stroke(palette.foreground, 1))
        .draw(display)?;
        draw_text(
            display,
            RIGHT_X,
            36,
            "Sunrise Touch",
            TextSize::Body,
            palette.foreground,
        )?;

        match state.page {
            STATS_PAGE => draw_stats_page(state, ctx, palette, display),
            ART_PAGE => draw_art_page(ctx, palette, display),
            _ => draw_sunrise_page(state, ctx, palette, display),
        }
    }
}

fn draw_sunrise_page<D: DrawTarget<Color = Gray8>>(
    state: &AppState,
    ctx: &RenderContext,
    palette: &Palette,
    display: &mut D,
) -> Result<(), D::Error> {
    let fg = palette.foreground;
    let settings = &state.settings;
    let local_now = ctx.now.to_local(ctx.utc_offset);
    let sunrise = ctx.sunrise.to_local(ctx.utc_offset);

    draw_text(display, 8, 38, "NEXT SUNRISE", TextSize::Body, fg)?;
    let countdown = format_hms(ctx.sunrise.duration_since(ctx.now));
    draw_text(display, 8, 58, &countdown, TextSize::Body, fg)?;
    draw_text(display, 8, 76, &sunrise.clock_with_seconds(), TextSize::Body, fg)?;

    let mut line: String<32> = String::new();
    write!(&mut line, "LAT {:.4}", settings.latitude).ok();
    draw_text(display, 8, 94, &line, TextSize::Body, fg)?;
    line.clear();
    write!(
        &mut line,
        "LON {:.4} R:{}m",
        settings.longitude,
        minutes(settings.refresh_interval)
    )
    .ok();
    draw_text(display, 8, 110, &line, TextSize::Body, fg)?;

    let stroke = PrimitiveStyle::with_stroke(fg, 1);
    Line::new(Point::new(130, 90), Point::new(245, 90))
        .into_styled(stroke)
        .draw(display)?;

    // Sun rides a sine arc across the day, peaking at local noon
    let day_fraction = local_now.seconds_of_day() as f64 / 86_400.0;
    let sun_x = 132 + (110.0 * day_fraction) as i32;
    let sun_y = 90 - (26.0 * libm::sin((day_fraction - 0.25) * 2.0 * PI)) as i32;
    Circle::with_center(Point::new(sun_x, sun_y), 17)
        .into_styled(stroke)
        .draw(display)?;

    let cloud_x = 132 + drift(ctx.draw_count, 7, 108);
    Line::new(Point::new(cloud_x, 42), Point::new(cloud_x + 16, 42))
        .into_styled(stroke)
        .draw(display)?;
    Line::new(Point::new(cloud_x + 2, 39), Point::new(cloud_x + 14, 39))
        .into_styled(stroke)
        .draw(display)?;

    draw_text(
        display,
        RIGHT_X,
        108,
        &local_now.weekday_clock(),
        TextSize::Body,
        fg,
    )
}

fn draw_stats_page<D: DrawTarget<Color = Gray8>>(
    state: &AppState,
    ctx: &RenderContext,
    palette: &Palette,
    display: &mut D,
) -> Result<(), D::Error> {
    let fg = palette.foreground;
    draw_text(display, 8, 38, "SYSTEM STATS", TextSize::Body, fg)?;

    let mut line: String<32> = String::new();
    write!(
        &mut line,
        "UPTIME {}",
        format_hms(ctx.now.duration_since(ctx.started_at))
    )
    .ok();
    draw_text(display, 8, 56, &line, TextSize::Body, fg)?;

    line.clear();
    write!(&mut line, "DRAWS {}", ctx.draw_count).ok();
    draw_text(display, 8, 74, &line, TextSize::Body, fg)?;

    line.clear();
    write!(&mut line, "TOUCH {}", state.touch_count).ok();
    draw_text(display, 8, 92, &line, TextSize::Body, fg)?;

    line.clear();
    write!(&mut line, "RFR {}m", minutes(state.settings.refresh_interval)).ok();
    draw_text(display, 8, 110, &line, TextSize::Body, fg)?;

    draw_text(display, RIGHT_X, 38, "DISPLAY MODE", TextSize::Body, fg)?;
    let mode = if ctx.partial_enabled { "PARTIAL" } else { "FULL" };
    Button::new(HitRect::new(132, 46, 246, 66), mode)
        .with_palette(*palette)
        .with_active(ctx.partial_enabled)
        .draw(display)?;

    draw_text(display, RIGHT_X, 86, "PAGE: STATS", TextSize::Body, fg)?;
    draw_text(
        display,
        RIGHT_X,
        104,
        &ctx.now.to_local(ctx.utc_offset).short_date(),
        TextSize::Body,
        fg,
    )
}

fn draw_art_page<D: DrawTarget<Color = Gray8>>(
    ctx: &RenderContext,
    palette: &Palette,
    display: &mut D,
) -> Result<(), D::Error> {
    let fg = palette.foreground;
    let stroke = PrimitiveStyle::with_stroke(fg, 1);

    draw_text(display, 8, 38, "MONO ART", TextSize::Body, fg)?;

    for i in 0..6 {
        let radius = 7 + i % 3;
        let center = Point::new(10 + i * 18 + drift(ctx.draw_count, 1, 6), 72);
        Circle::with_center(center, (2 * radius + 1) as u32)
            .into_styled(stroke)
            .draw(display)?;
    }

    for y in (42..=110).step_by(8) {
        let end = Point::new(246, y - 18 + drift(ctx.draw_count, 1, 12));
        Line::new(Point::new(130, y), end)
            .into_styled(stroke)
            .draw(display)?;
    }

    // Dotted divider only reads well as dark dots on a light background
    if palette.is_light() {
        let height = display.bounding_box().size.height as i32;
        display.draw_iter(
            (24..height)
                .step_by(4)
                .map(|y| Pixel(Point::new(126 + y % 5, y), fg)),
        )?;
    }

    let clock = ctx.now.to_local(ctx.utc_offset).clock();
    draw_text(display, RIGHT_X, 108, &clock, TextSize::Body, fg)
}

/// Offset in `0..period` that advances by `step` per draw.
fn drift(draw_count: u32, step: u32, period: u32) -> i32 {
    ((draw_count % period) * step % period) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_regions_in_order() {
        let regions = HomeScreen::new(Capabilities::full()).regions();
        let actions: alloc::vec::Vec<Action> = regions.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            [
                Action::CycleTheme,
                Action::CyclePage,
                Action::OpenSettings,
                Action::Exit
            ]
        );
    }

    #[test]
    fn test_minimal_regions_hide_page_and_settings() {
        let regions = HomeScreen::new(Capabilities::minimal()).regions();
        let actions: alloc::vec::Vec<Action> = regions.iter().map(|r| r.action).collect();
        assert_eq!(actions, [Action::CycleTheme, Action::Exit]);
    }

    #[test]
    fn test_drift_stays_in_period() {
        assert_eq!(drift(0, 7, 108), 0);
        assert_eq!(drift(16, 7, 108), 4);
        for count in [u32::MAX - 1, u32::MAX, i32::MAX as u32 + 1] {
            assert!((0..108).contains(&drift(count, 7, 108)));
            assert!((0..12).contains(&drift(count, 1, 12)));
        }
    }
}
