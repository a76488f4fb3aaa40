//! Calibration screen: tap three crosshairs, then APPLY.
//!
//! Regions here are matched against uncalibrated (rotated only) touch
//! points, so a badly skewed calibration can always be recovered.

use core::fmt::Write;

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle};
use heapless::String;

use crate::app_state::AppState;
use crate::pages::draw_modal_header_band;
use crate::pages::page::{Regions, Screen, push_region};
use crate::renderer::RenderContext;
use crate::touch::{CALIBRATION_TARGETS, CalibrationCapture};
use crate::ui::core::{Action, HitRect, Region, ScreenId, TouchSpace};
use crate::ui::styling::Palette;
use crate::ui::{Button, TextSize, draw_text};

const BACK_REGION: HitRect = HitRect::new(2, 0, 120, 28);
const APPLY_REGION: HitRect = HitRect::new(121, 0, 249, 28);

const BACK_BUTTON: HitRect = HitRect::new(4, 2, 116, 20);
const APPLY_BUTTON: HitRect = HitRect::new(120, 2, 246, 20);

const TARGET_DIAMETER: u32 = 17;
const CROSSHAIR_ARM: i32 = 10;

pub struct CalibrationScreen<'a> {
    capture: &'a CalibrationCapture,
}

impl<'a> CalibrationScreen<'a> {
    pub fn new(capture: &'a CalibrationCapture) -> Self {
        Self { capture }
    }

    fn step_text(&self) -> String<16> {
        let mut out = String::new();
        if self.capture.is_complete() {
            out.push_str("ready: tap APPLY").ok();
        } else {
            write!(
                &mut out,
                "step {}/{}",
                self.capture.step() + 1,
                CALIBRATION_TARGETS.len()
            )
            .ok();
        }
        out
    }
}

impl Screen for CalibrationScreen<'_> {
    fn id(&self) -> ScreenId {
        ScreenId::Calibration
    }

    fn title(&self) -> &str {
        "Calibration"
    }

    fn touch_space(&self) -> TouchSpace {
        TouchSpace::Uncalibrated
    }

    fn regions(&self) -> Regions {
        let mut regions = Regions::new();
        push_region(&mut regions, Region::new(BACK_REGION, Action::Back), true);
        push_region(&mut regions, Region::new(APPLY_REGION, Action::Apply), true);
        regions
    }

    fn draw_screen<D: DrawTarget<Color = Gray8>>(
        &self,
        state: &AppState,
        _ctx: &RenderContext,
        palette: &Palette,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let fg = palette.foreground;
        let header = draw_modal_header_band(display, palette)?;

        Button::new(BACK_BUTTON, "BACK")
            .with_palette(header)
            .draw(display)?;
        Button::new(APPLY_BUTTON, "APPLY")
            .with_palette(header)
            .with_active(self.capture.is_complete())
            .draw(display)?;

        draw_text(display, 40, 36, "Touch 3 targets", TextSize::Body, fg)?;

        let stroke = PrimitiveStyle::with_stroke(fg, 1);
        let filled = PrimitiveStyle::with_fill(fg);
        for (i, target) in CALIBRATION_TARGETS.iter().enumerate() {
            let center = target.to_point();
            let style = if i < self.capture.step() { filled } else { stroke };
            Circle::with_center(center, TARGET_DIAMETER)
                .into_styled(style)
                .draw(display)?;
            Line::new(
                center - Point::new(CROSSHAIR_ARM, 0),
                center + Point::new(CROSSHAIR_ARM, 0),
            )
            .into_styled(stroke)
            .draw(display)?;
            Line::new(
                center - Point::new(0, CROSSHAIR_ARM),
                center + Point::new(0, CROSSHAIR_ARM),
            )
            .into_styled(stroke)
            .draw(display)?;
        }

        if let Some(notice) = state.notice {
            draw_text(display, 8, 62, notice.message(), TextSize::Body, fg)?;
        }
        if self.capture.last_error().is_some() {
            draw_text(
                display,
                8,
                76,
                "retry: BACK, then CALIBRATE",
                TextSize::Body,
                fg,
            )?;
        }

        draw_text(display, 8, 118, &self.step_text(), TextSize::Body, fg)
    }
}
