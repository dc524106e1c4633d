//! Camera-plane geometry: bounding boxes and the camera-to-floorplan homography.

mod homography;
mod rect;

pub use homography::{Calibration, CoordinateMapper};
pub use rect::Rect;

/// A point in floorplan pixel coordinates.
pub type FloorPoint = nalgebra::Point2<f64>;
