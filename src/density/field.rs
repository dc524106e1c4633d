use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::geometry::FloorPoint;

/// Intensity added by one visit to every pixel inside its disc.
pub const DISC_VALUE: f32 = 1.0;

/// Floorplan-resolution visit intensity grid, indexed `[row, col]`.
///
/// Values only ever grow: overlapping discs add. Serializes with its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityField {
    values: Array2<f32>,
}

impl DensityField {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            values: Array2::zeros((height as usize, width as usize)),
        }
    }

    pub fn width(&self) -> u32 {
        self.values.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.values.nrows() as u32
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// Add a filled disc of `radius` pixels centered on `point`.
    ///
    /// Points outside `[0, width) x [0, height)` or with non-finite
    /// coordinates are rejected and leave the field unchanged.
    pub fn deposit(&mut self, point: FloorPoint, radius: u32) -> bool {
        let (rows, cols) = self.values.dim();
        if !point.x.is_finite()
            || !point.y.is_finite()
            || point.x < 0.0
            || point.y < 0.0
            || point.x >= cols as f64
            || point.y >= rows as f64
        {
            return false;
        }

        let cx = point.x.floor() as i64;
        let cy = point.y.floor() as i64;
        let r = radius as i64;
        let r2 = r * r;
        for y in (cy - r).max(0)..=(cy + r).min(rows as i64 - 1) {
            let dy = y - cy;
            for x in (cx - r).max(0)..=(cx + r).min(cols as i64 - 1) {
                let dx = x - cx;
                if dx * dx + dy * dy <= r2 {
                    self.values[[y as usize, x as usize]] += DISC_VALUE;
                }
            }
        }
        true
    }

    /// Sum of all intensities.
    pub fn total(&self) -> f64 {
        self.values.iter().map(|&v| v as f64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disc_footprint() {
        let mut field = DensityField::new(100, 100);
        assert!(field.deposit(FloorPoint::new(50.0, 50.0), 2));
        let v = field.values();
        assert_eq!(v[[50, 50]], 1.0);
        assert_eq!(v[[48, 50]], 1.0);
        assert_eq!(v[[50, 52]], 1.0);
        // corner of the bounding square lies outside the disc
        assert_eq!(v[[48, 48]], 0.0);
        // 13 lattice points satisfy dx^2 + dy^2 <= 4
        assert_eq!(field.total(), 13.0);
    }

    #[test]
    fn test_overlapping_visits_add() {
        let mut field = DensityField::new(40, 40);
        field.deposit(FloorPoint::new(20.0, 20.0), 3);
        field.deposit(FloorPoint::new(20.4, 20.7), 3);
        assert_eq!(field.values()[[20, 20]], 2.0);
    }

    #[test]
    fn test_disc_is_clipped_at_edges() {
        let mut field = DensityField::new(10, 10);
        assert!(field.deposit(FloorPoint::new(0.0, 0.0), 3));
        assert_eq!(field.values()[[0, 0]], 1.0);
        assert!(field.total() < 29.0);
    }

    #[test]
    fn test_out_of_bounds_and_nan_are_rejected() {
        let mut field = DensityField::new(10, 10);
        assert!(!field.deposit(FloorPoint::new(10.0, 5.0), 3));
        assert!(!field.deposit(FloorPoint::new(5.0, -0.1), 3));
        assert!(!field.deposit(FloorPoint::new(f64::NAN, 5.0), 3));
        assert!(!field.deposit(FloorPoint::new(f64::INFINITY, 5.0), 3));
        assert_eq!(field.total(), 0.0);
    }

    #[test]
    fn test_field_survives_json() {
        let mut field = DensityField::new(12, 8);
        field.deposit(FloorPoint::new(4.0, 4.0), 2);
        let json = serde_json::to_string(&field).unwrap();
        let restored: DensityField = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, field);
        assert_eq!((restored.width(), restored.height()), (12, 8));
    }

    #[test]
    fn test_field_is_monotone() {
        let mut field = DensityField::new(30, 30);
        let mut previous = field.values().clone();
        for i in 0..20 {
            field.deposit(FloorPoint::new((i * 7 % 30) as f64, (i * 3 % 30) as f64), 4);
            assert!(field.values().iter().zip(previous.iter()).all(|(n, o)| n >= o));
            previous = field.values().clone();
        }
    }
}
