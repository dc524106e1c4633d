//! Floorplan density accumulation and heatmap rendering.
//!
//! Mapped track positions are painted into a [`DensityField`] as additive
//! discs; [`DensityAccumulator::render`] turns the field into a colored
//! overlay composited on the floorplan, plus the blurred grayscale layer
//! consumed by the zone analysis.

mod colormap;
mod field;
mod render;

pub use colormap::ocean;
pub use field::{DISC_VALUE, DensityField};
pub use render::{ALPHA_CAP, BLUR_SIGMA, GAMMA, RenderedHeatmap, gaussian_blur, render_field};

use image::RgbImage;

use crate::geometry::FloorPoint;

/// Owns the density field for one video together with the floorplan it is drawn over.
#[derive(Debug, Clone)]
pub struct DensityAccumulator {
    field: DensityField,
    floorplan: RgbImage,
    radius: u32,
    deposits: usize,
}

impl DensityAccumulator {
    /// Create an empty accumulator sized to `floorplan`.
    pub fn new(floorplan: RgbImage, radius: u32) -> Self {
        Self {
            field: DensityField::new(floorplan.width(), floorplan.height()),
            floorplan,
            radius,
            deposits: 0,
        }
    }

    /// Paint one visit at `point`. Returns `false` (field untouched) when the
    /// point is outside the floorplan or not finite.
    pub fn deposit(&mut self, point: FloorPoint) -> bool {
        let painted = self.field.deposit(point, self.radius);
        if painted {
            self.deposits += 1;
        }
        painted
    }

    /// Number of visits painted so far.
    pub fn deposits(&self) -> usize {
        self.deposits
    }

    pub fn field(&self) -> &DensityField {
        &self.field
    }

    pub fn floorplan(&self) -> &RgbImage {
        &self.floorplan
    }

    /// Render the field in its current state. Calling this before all visits
    /// are deposited gives a preview; the field itself is not modified.
    pub fn render(&self) -> RenderedHeatmap {
        render_field(&self.field, &self.floorplan)
    }
}
