//! Settings screen: edit a draft of location and refresh interval.

use core::fmt::Write;

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use heapless::String;

use crate::app_state::{AppState, SettingsDraft};
use crate::config::Capabilities;
use crate::pages::page::{Regions, Screen, push_region};
use crate::pages::{draw_modal_header_band, minutes};
use crate::renderer::RenderContext;
use crate::ui::core::{Action, HitRect, Region, ScreenId, SettingField, Step};
use crate::ui::styling::Palette;
use crate::ui::{Button, TextSize, draw_text};

const BACK_REGION: HitRect = HitRect::new(2, 0, 82, 28);
const SAVE_REGION: HitRect = HitRect::new(83, 0, 165, 28);
const EXIT_REGION: HitRect = HitRect::new(166, 0, 249, 28);
const CALIBRATE_REGION: HitRect = HitRect::new(132, 34, 246, 54);
const THEME_REGION: HitRect = HitRect::new(132, 62, 246, 82);

/// `(field, minus, plus)` for each adjustable row, top to bottom.
const ADJUST_ROWS: [(SettingField, HitRect, HitRect); 3] = [
    (
        SettingField::Latitude,
        HitRect::new(6, 34, 34, 54),
        HitRect::new(88, 34, 118, 54),
    ),
    (
        SettingField::Longitude,
        HitRect::new(6, 62, 34, 82),
        HitRect::new(88, 62, 118, 82),
    ),
    (
        SettingField::Interval,
        HitRect::new(6, 90, 34, 110),
        HitRect::new(88, 90, 118, 110),
    ),
];

const BACK_BUTTON: HitRect = HitRect::new(4, 2, 80, 20);
const SAVE_BUTTON: HitRect = HitRect::new(84, 2, 160, 20);
const EXIT_BUTTON: HitRect = HitRect::new(164, 2, 246, 20);

/// Left edge of the value text between the − and + buttons.
const VALUE_X: i32 = 38;

pub struct SettingsScreen<'a> {
    draft: &'a SettingsDraft,
    capabilities: Capabilities,
}

impl<'a> SettingsScreen<'a> {
    pub fn new(draft: &'a SettingsDraft, capabilities: Capabilities) -> Self {
        Self {
            draft,
            capabilities,
        }
    }

    fn caption(field: SettingField) -> &'static str {
        match field {
            SettingField::Latitude => "LAT",
            SettingField::Longitude => "LON",
            SettingField::Interval => "REFRESH",
        }
    }

    fn value(&self, field: SettingField) -> String<16> {
        let mut out = String::new();
        match field {
            SettingField::Latitude => write!(&mut out, "{:.3}", self.draft.latitude),
            SettingField::Longitude => write!(&mut out, "{:.3}", self.draft.longitude),
            SettingField::Interval => {
                write!(&mut out, "{}m", minutes(self.draft.refresh_interval))
            }
        }
        .ok();
        out
    }
}

impl Screen for SettingsScreen<'_> {
    fn id(&self) -> ScreenId {
        ScreenId::Settings
    }

    fn title(&self) -> &str {
        "Settings"
    }

    fn regions(&self) -> Regions {
        let mut regions = Regions::new();
        push_region(&mut regions, Region::new(BACK_REGION, Action::Back), true);
        push_region(&mut regions, Region::new(SAVE_REGION, Action::Save), true);
        push_region(&mut regions, Region::new(EXIT_REGION, Action::Exit), true);
        push_region(
            &mut regions,
            Region::new(CALIBRATE_REGION, Action::Calibrate),
            self.capabilities.calibration_enabled(),
        );
        for (field, minus, plus) in ADJUST_ROWS {
            push_region(
                &mut regions,
                Region::new(minus, Action::Adjust(field, Step::Down)),
                true,
            );
            push_region(
                &mut regions,
                Region::new(plus, Action::Adjust(field, Step::Up)),
                true,
            );
        }
        push_region(
            &mut regions,
            Region::new(THEME_REGION, Action::CycleTheme),
            true,
        );
        regions
    }

    fn draw_screen<D: DrawTarget<Color = Gray8>>(
        &self,
        state: &AppState,
        ctx: &RenderContext,
        palette: &Palette,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let fg = palette.foreground;
        let header = draw_modal_header_band(display, palette)?;

        Button::new(BACK_BUTTON, "BACK")
            .with_palette(header)
            .draw(display)?;
        Button::new(SAVE_BUTTON, "SAVE")
            .with_palette(header)
            .draw(display)?;
        let armed = state.exit_armed(ctx.now);
        Button::new(EXIT_BUTTON, if armed { "EXIT!" } else { "EXIT" })
            .with_palette(header)
            .with_active(armed)
            .draw(display)?;

        for (field, minus, plus) in ADJUST_ROWS {
            Button::new(minus, "-").with_palette(*palette).draw(display)?;
            Button::new(plus, "+").with_palette(*palette).draw(display)?;

            let top = minus.y0 as i32;
            draw_text(
                display,
                VALUE_X,
                top + 7,
                Self::caption(field),
                TextSize::Caption,
                fg,
            )?;
            draw_text(
                display,
                VALUE_X,
                top + 17,
                &self.value(field),
                TextSize::Body,
                fg,
            )?;
        }

        if self.capabilities.calibration_enabled() {
            Button::new(CALIBRATE_REGION, "CALIBRATE")
                .with_palette(*palette)
                .draw(display)?;
        }
        Button::new(THEME_REGION, "THEME CYCLE")
            .with_palette(*palette)
            .draw(display)?;

        let mut theme_line: String<16> = String::new();
        write!(&mut theme_line, "theme:{}", state.theme).ok();
        draw_text(display, 132, 98, &theme_line, TextSize::Body, fg)?;

        let hint = match state.notice {
            Some(notice) => notice.message(),
            None => "persist on SAVE",
        };
        draw_text(display, 132, 112, hint, TextSize::Body, fg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn draft() -> SettingsDraft {
        SettingsDraft {
            latitude: 37.7749,
            longitude: -122.4194,
            refresh_interval: Duration::from_secs(900),
        }
    }

    #[test]
    fn test_value_formatting() {
        let draft = draft();
        let screen = SettingsScreen::new(&draft, Capabilities::full());
        assert_eq!(screen.value(SettingField::Latitude).as_str(), "37.775");
        assert_eq!(screen.value(SettingField::Longitude).as_str(), "-122.419");
        assert_eq!(screen.value(SettingField::Interval).as_str(), "15m");
    }

    #[test]
    fn test_calibrate_region_follows_capabilities() {
        let draft = draft();
        let full = SettingsScreen::new(&draft, Capabilities::full()).regions();
        assert!(full.iter().any(|r| r.action == Action::Calibrate));
        assert_eq!(full.len(), 11);

        let no_cal = Capabilities {
            calibration: false,
            ..Capabilities::full()
        };
        let regions = SettingsScreen::new(&draft, no_cal).regions();
        assert!(!regions.iter().any(|r| r.action == Action::Calibrate));
        assert_eq!(regions.len(), 10);
    }
}
