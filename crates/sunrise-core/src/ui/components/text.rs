//! Single-line text helpers.

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::{FONT_4X6, FONT_6X10};
use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    /// 4x6, for field captions.
    Caption,
    /// 6x10, everything else.
    Body,
}

/// Draw `text` with its baseline starting at `(x, y)`.
pub fn draw_text<D>(
    display: &mut D,
    x: i32,
    y: i32,
    text: &str,
    size: TextSize,
    color: Gray8,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray8>,
{
    let font = match size {
        TextSize::Caption => &FONT_4X6,
        TextSize::Body => &FONT_6X10,
    };
    Text::new(text, Point::new(x, y), MonoTextStyle::new(font, color)).draw(display)?;
    Ok(())
}
