//! Outlined text button.

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle, StrokeAlignment};
use embedded_graphics::text::Text;

use crate::ui::core::HitRect;
use crate::ui::styling::Palette;

/// Label inset from the button's top-left corner (baseline position).
const LABEL_OFFSET: Point = Point::new(4, 14);

/// Button drawn as a filled, outlined box with a left-aligned label.
///
/// An active button swaps fill and ink, which is how the panel shows
/// "armed" or "selected" without colour.
///
/// # Examples
/// ```ignore
/// Button::new(HitRect::new(4, 2, 60, 20), "THEME")
///     .with_palette(palette)
///     .with_active(armed)
///     .draw(&mut frame)?;
/// ```
#[derive(Debug, Clone)]
pub struct Button {
    bounds: Rectangle,
    label: heapless::String<16>,
    active: bool,
    palette: Palette,
}

impl Button {
    /// Create a button covering `rect` (inclusive corners). Labels longer
    /// than 16 bytes are truncated.
    pub fn new(rect: HitRect, label: &str) -> Self {
        let mut label_string = heapless::String::new();
        for ch in label.chars() {
            if label_string.push(ch).is_err() {
                break;
            }
        }

        Self {
            bounds: rect.to_rectangle(),
            label: label_string,
            active: false,
            palette: Palette::default(),
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn colors(&self) -> (Gray8, Gray8) {
        if self.active {
            (self.palette.foreground, self.palette.background)
        } else {
            (self.palette.background, self.palette.foreground)
        }
    }
}

impl Drawable for Button {
    type Color = Gray8;
    type Output = ();

    fn draw<D>(&self, display: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        let (fill, ink) = self.colors();

        let style = PrimitiveStyleBuilder::new()
            .fill_color(fill)
            .stroke_color(self.palette.foreground)
            .stroke_width(1)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        self.bounds.into_styled(style).draw(display)?;

        Text::new(
            &self.label,
            self.bounds.top_left + LABEL_OFFSET,
            MonoTextStyle::new(&FONT_6X10, ink),
        )
        .draw(display)?;

        Ok(())
    }
}
