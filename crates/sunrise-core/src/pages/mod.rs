//! Screens of the dashboard and the state machine that moves between them.

pub mod calibration;
pub mod home;
pub mod page;
pub mod page_manager;
pub mod settings;

pub use calibration::CalibrationScreen;
pub use home::HomeScreen;
pub use page::{Screen, ScreenWrapper};
pub use page_manager::UiStateMachine;
pub use settings::SettingsScreen;

use core::time::Duration;

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};

use crate::ui::styling::Palette;

/// Row of the rule under the header buttons.
const HEADER_RULE_Y: i32 = 22;

/// Horizontal rule separating the header from the content.
pub(crate) fn draw_rule<D: DrawTarget<Color = Gray8>>(
    display: &mut D,
    palette: &Palette,
) -> Result<(), D::Error> {
    let width = display.bounding_box().size.width as i32;
    Line::new(
        Point::new(0, HEADER_RULE_Y),
        Point::new(width - 1, HEADER_RULE_Y),
    )
    .into_styled(PrimitiveStyle::with_stroke(palette.foreground, 1))
    .draw(display)
}

/// Header band for the modal screens. Returns the palette to draw the
/// header buttons with.
pub(crate) fn draw_modal_header_band<D: DrawTarget<Color = Gray8>>(
    display: &mut D,
    palette: &Palette,
) -> Result<Palette, D::Error> {
    let header = palette.header();
    if palette.invert_headers {
        let width = display.bounding_box().size.width;
        Rectangle::new(Point::zero(), Size::new(width, HEADER_RULE_Y as u32))
            .into_styled(PrimitiveStyle::with_fill(header.background))
            .draw(display)?;
    }
    draw_rule(display, palette)?;
    Ok(header)
}

pub(crate) fn minutes(duration: Duration) -> u64 {
    duration.as_secs() / 60
}
