//! Heap-backed grayscale raster.
//!
//! Every screen draws into a [`Frame`] through `embedded-graphics`. The
//! renderer produces one per redraw in landscape orientation; the refresh
//! path rotates it into the panel's portrait layout and diffs it against
//! the previously written frame.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::touch::{LANDSCAPE_HEIGHT, LANDSCAPE_WIDTH};

/// Bounding box of pixels that differ between two frames.
#[derive(Debug, Clone, Copy)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    /// Expand the dirty region to include the given pixel coordinate.
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::with_corners(
            Point::new(self.min_x as i32, self.min_y as i32),
            Point::new(self.max_x as i32, self.max_y as i32),
        )
    }
}

/// Row-major, one byte per pixel grayscale image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn new(size: Size, fill: Gray8) -> Self {
        let width = size.width as usize;
        let height = size.height as usize;
        Self {
            width,
            height,
            pixels: vec![fill.luma(); width * height],
        }
    }

    /// A 250x122 frame in the UI's landscape orientation.
    pub fn landscape(fill: Gray8) -> Self {
        Self::new(
            Size::new(LANDSCAPE_WIDTH as u32, LANDSCAPE_HEIGHT as u32),
            fill,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.size())
    }

    /// Luma at `(x, y)`, or `None` outside the frame.
    pub fn luma(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.pixels[start..start + self.width]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, luma: u8) {
        self.pixels[y * self.width + x] = luma;
    }

    /// Rotate a landscape frame into the panel's portrait layout.
    ///
    /// `portrait(x, y) = landscape(y, height - 1 - x)`, so a 250x122
    /// landscape frame becomes 122x250.
    pub fn to_panel_orientation(&self) -> Frame {
        let mut portrait = Frame {
            width: self.height,
            height: self.width,
            pixels: vec![0; self.pixels.len()],
        };
        for y in 0..portrait.height {
            for x in 0..portrait.width {
                let luma = self.pixels[(self.height - 1 - x) * self.width + y];
                portrait.set_pixel(x, y, luma);
            }
        }
        portrait
    }

    /// Smallest rectangle enclosing every pixel that differs from `other`.
    ///
    /// Frames of different dimensions differ everywhere. Returns `None`
    /// when the frames are identical.
    pub fn diff_bounds(&self, other: &Frame) -> Option<Rectangle> {
        if self.width != other.width || self.height != other.height {
            return Some(self.bounds());
        }

        let mut dirty: Option<DirtyRect> = None;
        for y in 0..self.height {
            let (ours, theirs) = (self.row(y), other.row(y));
            if ours == theirs {
                continue;
            }
            for (x, (a, b)) in ours.iter().zip(theirs).enumerate() {
                if a != b {
                    match &mut dirty {
                        Some(rect) => rect.expand(x, y),
                        None => dirty = Some(DirtyRect::from_point(x, y)),
                    }
                }
            }
        }

        let rect = dirty?.to_rectangle();
        debug!(
            "frame diff: {}x{} at ({}, {})",
            rect.size.width, rect.size.height, rect.top_left.x, rect.top_left.y
        );
        Some(rect)
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for Frame {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                self.set_pixel(x as usize, y as usize, color.luma());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounds());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        let luma = color.luma();
        let x_start = area.top_left.x as usize;
        let x_end = bottom_right.x as usize;
        for y in area.top_left.y as usize..=bottom_right.y as usize {
            let row = y * self.width;
            self.pixels[row + x_start..=row + x_end].fill(luma);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(color.luma());
        Ok(())
    }
}
