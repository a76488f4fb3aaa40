//! Panel driver backed by an off-screen `SimulatorDisplay`.

use std::path::PathBuf;

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};
use embedded_graphics_simulator::{OutputSettings, OutputSettingsBuilder, SimulatorDisplay};
use log::{debug, info, warn};

use sunrise_core::drivers::{DriverError, PanelColor, PanelDriver, RefreshMode};
use sunrise_core::framebuffer::Frame;
use sunrise_core::touch::{LANDSCAPE_HEIGHT, LANDSCAPE_WIDTH, SENSOR_HEIGHT, SENSOR_WIDTH};

/// Portrait view onto a landscape draw target.
///
/// The panel is addressed in its native portrait frame; pixels land in the
/// landscape orientation the user sees.
struct PortraitView<'a, D> {
    target: &'a mut D,
}

impl<D: DrawTarget> OriginDimensions for PortraitView<'_, D> {
    fn size(&self) -> Size {
        let landscape = self.target.bounding_box().size;
        Size::new(landscape.height, landscape.width)
    }
}

impl<D: DrawTarget> DrawTarget for PortraitView<'_, D> {
    type Color = D::Color;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bottom = self.target.bounding_box().size.height as i32 - 1;
        self.target.draw_iter(
            pixels
                .into_iter()
                .map(|Pixel(p, color)| Pixel(Point::new(p.y, bottom - p.x), color)),
        )
    }
}

/// Simulated 122x250 e-paper panel.
///
/// Every refresh writes `refresh-NNNN.png` (landscape, as the user sees it)
/// into the snapshot directory when one is configured.
pub struct SnapshotPanel {
    display: SimulatorDisplay<Gray8>,
    output_settings: OutputSettings,
    mode: RefreshMode,
    awake: bool,
    halted: bool,
    refreshes: u32,
    snapshot_dir: Option<PathBuf>,
}

impl SnapshotPanel {
    pub fn new(snapshot_dir: Option<PathBuf>, scale: u32) -> Self {
        let mut display = SimulatorDisplay::new(Size::new(
            LANDSCAPE_WIDTH as u32,
            LANDSCAPE_HEIGHT as u32,
        ));
        let Ok(()) = display.clear(Gray8::WHITE);
        Self {
            display,
            output_settings: OutputSettingsBuilder::new().scale(scale.max(1)).build(),
            mode: RefreshMode::Full,
            awake: false,
            halted: false,
            refreshes: 0,
            snapshot_dir,
        }
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    /// Panel memory at a landscape point.
    pub fn pixel(&self, point: Point) -> Gray8 {
        self.display.get_pixel(point)
    }

    fn ensure_ready(&self) -> Result<(), DriverError> {
        if self.halted {
            return Err(DriverError::Unavailable);
        }
        if !self.awake {
            return Err(DriverError::Io("panel is asleep"));
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<(), DriverError> {
        let Some(dir) = &self.snapshot_dir else {
            return Ok(());
        };
        let path = dir.join(format!("refresh-{:04}.png", self.refreshes));
        self.display
            .to_grayscale_output_image(&self.output_settings)
            .save_png(&path)
            .map_err(|err| {
                warn!("snapshot {} failed: {}", path.display(), err);
                DriverError::Io("snapshot write failed")
            })?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

impl PanelDriver for SnapshotPanel {
    fn size(&self) -> Size {
        Size::new(SENSOR_WIDTH as u32, SENSOR_HEIGHT as u32)
    }

    fn init(&mut self) -> Result<(), DriverError> {
        if self.halted {
            return Err(DriverError::Unavailable);
        }
        debug!("panel init");
        self.awake = true;
        Ok(())
    }

    fn clear(&mut self, color: PanelColor) -> Result<(), DriverError> {
        self.ensure_ready()?;
        let fill = match color {
            PanelColor::White => Gray8::WHITE,
            PanelColor::Black => Gray8::BLACK,
        };
        let Ok(()) = self.display.clear(fill);
        self.refreshes += 1;
        info!("panel clear {:?}", color);
        self.snapshot()
    }

    fn draw_region(&mut self, area: &Rectangle, frame: &Frame) -> Result<(), DriverError> {
        self.ensure_ready()?;
        let area = area.intersection(&Rectangle::new(Point::zero(), self.size()));

        let pixels = area.points().filter_map(|p| {
            frame
                .luma(p.x as usize, p.y as usize)
                .map(|luma| Pixel(p, Gray8::new(luma)))
        });
        let Ok(()) = PortraitView {
            target: &mut self.display,
        }
        .draw_iter(pixels);

        self.refreshes += 1;
        info!(
            "panel {:?} refresh #{}: {}x{} at ({}, {})",
            self.mode,
            self.refreshes,
            area.size.width,
            area.size.height,
            area.top_left.x,
            area.top_left.y
        );
        self.snapshot()
    }

    fn sleep(&mut self) -> Result<(), DriverError> {
        debug!("panel sleep");
        self.awake = false;
        Ok(())
    }

    fn set_refresh_mode(&mut self, mode: RefreshMode) -> Result<(), DriverError> {
        self.ensure_ready()?;
        self.mode = mode;
        Ok(())
    }

    fn halt(&mut self) -> Result<(), DriverError> {
        info!("panel halted after {} refreshes", self.refreshes);
        self.awake = false;
        self.halted = true;
        Ok(())
    }
}
