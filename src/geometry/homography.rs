//! Planar homography from camera pixels to floorplan pixels.
//!
//! The four calibration points are solved exactly (8 unknowns, 8 equations)
//! after Hartley normalization of both point sets, which keeps the linear
//! system well conditioned for pixel-scale coordinates and guarantees the
//! normalized `h33` is non-zero for a convex quadrilateral.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::FloorPoint;

/// Relative area below which three calibration points count as collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-6;
/// Homogeneous scale below which a projected point is treated as at infinity.
const W_EPSILON: f64 = 1e-12;

/// Four camera-plane points bounding the visible floor area.
///
/// Order matters: each corner is mapped to the floorplan corner of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub bottom_left: (f64, f64),
    pub bottom_right: (f64, f64),
    pub top_right: (f64, f64),
    pub top_left: (f64, f64),
}

impl Calibration {
    /// Build from points ordered bottom-left, bottom-right, top-right, top-left.
    pub fn from_points(points: [(f64, f64); 4]) -> Self {
        Self {
            bottom_left: points[0],
            bottom_right: points[1],
            top_right: points[2],
            top_left: points[3],
        }
    }

    pub fn points(&self) -> [(f64, f64); 4] {
        [
            self.bottom_left,
            self.bottom_right,
            self.top_right,
            self.top_left,
        ]
    }
}

/// Maps camera pixel coordinates onto the floorplan image.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMapper {
    matrix: Matrix3<f64>,
}

impl CoordinateMapper {
    /// Compute the homography sending the calibration corners onto the corners
    /// of a `width` x `height` floorplan.
    pub fn new(calibration: &Calibration, width: u32, height: u32) -> Result<Self> {
        if width < 2 || height < 2 {
            return Err(Error::degenerate(format!(
                "floorplan of {width}x{height} pixels has no area to map onto"
            )));
        }
        let src = calibration.points();
        let (w, h) = ((width - 1) as f64, (height - 1) as f64);
        let dst = [(0.0, h), (w, h), (w, 0.0), (0.0, 0.0)];

        check_points(&src)?;

        let t_src = normalizing_transform(&src)?;
        let t_dst = normalizing_transform(&dst)?;
        let src_n = src.map(|p| apply(&t_src, p));
        let dst_n = dst.map(|p| apply(&t_dst, p));

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for (i, ((x, y), (u, v))) in src_n.iter().zip(dst_n.iter()).enumerate() {
            let r = 2 * i;
            a[(r, 0)] = *x;
            a[(r, 1)] = *y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -x * u;
            a[(r, 7)] = -y * u;
            b[r] = *u;

            a[(r + 1, 3)] = *x;
            a[(r + 1, 4)] = *y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -x * v;
            a[(r + 1, 7)] = -y * v;
            b[r + 1] = *v;
        }

        let solution = a
            .lu()
            .solve(&b)
            .ok_or_else(|| Error::degenerate("correspondence system is singular"))?;

        let normalized = Matrix3::new(
            solution[0],
            solution[1],
            solution[2],
            solution[3],
            solution[4],
            solution[5],
            solution[6],
            solution[7],
            1.0,
        );
        let t_dst_inv = t_dst
            .try_inverse()
            .ok_or_else(|| Error::degenerate("floorplan normalization is singular"))?;
        let mut matrix = t_dst_inv * normalized * t_src;

        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(Error::degenerate("solver produced a non-finite homography"));
        }
        let scale = matrix[(2, 2)];
        if scale.abs() > W_EPSILON {
            matrix /= scale;
        }

        let mapper = Self { matrix };
        mapper.check_correspondence(&src, &dst)?;

        tracing::debug!(homography = ?mapper.matrix, "homography computed");
        Ok(mapper)
    }

    /// The 3x3 camera-to-floorplan matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Project one camera pixel coordinate onto the floorplan.
    ///
    /// Results outside the floorplan are returned as-is. `None` only when the
    /// point lies on the horizon line of the transform (homogeneous `w` of zero)
    /// or the result is not finite.
    pub fn project(&self, point: (f64, f64)) -> Option<FloorPoint> {
        let v = self.matrix * Vector3::new(point.0, point.1, 1.0);
        if v.z.abs() < W_EPSILON {
            return None;
        }
        let projected = FloorPoint::new(v.x / v.z, v.y / v.z);
        (projected.x.is_finite() && projected.y.is_finite()).then_some(projected)
    }

    fn check_correspondence(&self, src: &[(f64, f64); 4], dst: &[(f64, f64); 4]) -> Result<()> {
        let span = dst
            .iter()
            .fold(1.0_f64, |acc, p| acc.max(p.0.abs()).max(p.1.abs()));
        let mut sign = 0.0;
        for (s, d) in src.iter().zip(dst) {
            let w = self.matrix[(2, 0)] * s.0 + self.matrix[(2, 1)] * s.1 + self.matrix[(2, 2)];
            // All four corners must sit on the same side of the horizon line;
            // a crossed or concave quad folds the floor through infinity.
            if sign != 0.0 && w.signum() != sign {
                return Err(Error::degenerate(
                    "calibration points are not a convex quadrilateral in corner order",
                ));
            }
            sign = w.signum();

            let mapped = self
                .project(*s)
                .ok_or_else(|| Error::degenerate("calibration corner maps to infinity"))?;
            let err = (mapped.x - d.0).abs().max((mapped.y - d.1).abs());
            if err > 1e-6 * span {
                return Err(Error::degenerate(format!(
                    "homography is ill-conditioned (corner error {err:.3e} px)"
                )));
            }
        }
        Ok(())
    }
}

fn check_points(points: &[(f64, f64); 4]) -> Result<()> {
    if points.iter().any(|p| !p.0.is_finite() || !p.1.is_finite()) {
        return Err(Error::degenerate("calibration contains non-finite coordinates"));
    }

    let mut extent: f64 = 0.0;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let d = (points[i].0 - points[j].0).hypot(points[i].1 - points[j].1);
            extent = extent.max(d);
        }
    }
    if extent < 1e-9 {
        return Err(Error::degenerate("calibration points coincide"));
    }

    for skip in 0..4 {
        let tri: Vec<&(f64, f64)> = points
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, p)| p)
            .collect();
        let cross = (tri[1].0 - tri[0].0) * (tri[2].1 - tri[0].1)
            - (tri[1].1 - tri[0].1) * (tri[2].0 - tri[0].0);
        if cross.abs() < COLLINEAR_TOLERANCE * extent * extent {
            return Err(Error::degenerate("three calibration points are collinear"));
        }
    }
    Ok(())
}

/// Similarity transform moving the centroid to the origin with mean distance sqrt(2).
fn normalizing_transform(points: &[(f64, f64); 4]) -> Result<Matrix3<f64>> {
    let (cx, cy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.0 / 4.0, sy + p.1 / 4.0));
    let mean_dist = points
        .iter()
        .map(|p| (p.0 - cx).hypot(p.1 - cy))
        .sum::<f64>()
        / 4.0;
    if mean_dist <= f64::EPSILON {
        return Err(Error::degenerate("points have no spatial extent"));
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    Ok(Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0))
}

fn apply(t: &Matrix3<f64>, p: (f64, f64)) -> (f64, f64) {
    let v = t * Vector3::new(p.0, p.1, 1.0);
    (v.x / v.z, v.y / v.z)
}
