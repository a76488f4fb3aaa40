//! Two-tone palettes for the e-paper panel.

use embedded_graphics::pixelcolor::{Gray8, GrayColor};

/// Foreground/background pair selected by theme id.
///
/// Themes 0 and 2 share colours; theme 2 additionally inverts the header
/// band of the settings and calibration screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Gray8,
    pub foreground: Gray8,
    pub invert_headers: bool,
}

impl Default for Palette {
    fn default() -> Self {
        Self::light()
    }
}

impl Palette {
    /// Black ink on white.
    pub const fn light() -> Self {
        Self {
            background: Gray8::WHITE,
            foreground: Gray8::BLACK,
            invert_headers: false,
        }
    }

    /// White ink on black.
    pub const fn dark() -> Self {
        Self {
            background: Gray8::BLACK,
            foreground: Gray8::WHITE,
            invert_headers: false,
        }
    }

    pub fn for_theme(theme: u8) -> Self {
        match theme {
            1 => Self::dark(),
            2 => Self {
                invert_headers: true,
                ..Self::light()
            },
            _ => Self::light(),
        }
    }

    /// Same palette with foreground and background swapped.
    pub fn inverted(&self) -> Self {
        Self {
            background: self.foreground,
            foreground: self.background,
            invert_headers: self.invert_headers,
        }
    }

    /// Palette for the settings/calibration header band.
    pub fn header(&self) -> Self {
        if self.invert_headers {
            self.inverted()
        } else {
            *self
        }
    }

    pub fn is_light(&self) -> bool {
        self.background.luma() == u8::MAX
    }
}
