use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::{Array2, Axis};

use super::colormap::ocean_lut;
use super::field::DensityField;

/// Exponent applied to raw intensities before normalization.
pub const GAMMA: f32 = 0.6;
/// Standard deviation, in pixels, of the smoothing blur.
pub const BLUR_SIGMA: f64 = 10.0;
/// Opacity of the overlay at peak density.
pub const ALPHA_CAP: f32 = 0.7;
/// Blur kernel extends this many standard deviations each side.
const BLUR_TRUNCATE: f64 = 4.0;

/// Output of one render pass.
#[derive(Debug, Clone)]
pub struct RenderedHeatmap {
    /// Colored density composited over the floorplan.
    pub overlay: RgbImage,
    /// Gamma-corrected, normalized and blurred intensity before colorization.
    pub grayscale: GrayImage,
}

/// Render `field` over `floorplan`.
///
/// Steps: `v^0.6`, min-max rescale to `[0, 1]` (alpha) and `[0, 255]` (color),
/// Gaussian blur of the color layer, ocean palette, then per-pixel blend with
/// `alpha * 0.7` opacity. Pure function of its inputs.
pub fn render_field(field: &DensityField, floorplan: &RgbImage) -> RenderedHeatmap {
    let corrected = field.values().mapv(|v| v.powf(GAMMA));
    let alpha = normalize(&corrected, 0.0, 1.0);
    let intensity = gaussian_blur(&normalize(&corrected, 0.0, 255.0), BLUR_SIGMA);

    let (rows, cols) = intensity.dim();
    let grayscale = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        // saturating cast truncates toward zero like a uint8 conversion
        Luma([intensity[[y as usize, x as usize]] as u8])
    });

    let lut = ocean_lut();
    let overlay = RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        let a = alpha[[y as usize, x as usize]] * ALPHA_CAP;
        let color = lut[grayscale.get_pixel(x, y)[0] as usize];
        let base = floorplan.get_pixel(x, y);
        let mut out = [0u8; 3];
        for c in 0..3 {
            out[c] = (base[c] as f32 * (1.0 - a) + color[c] as f32 * a) as u8;
        }
        Rgb(out)
    });

    RenderedHeatmap { overlay, grayscale }
}

/// Linearly map the value range of `values` onto `[lo, hi]`.
///
/// A constant array maps entirely to `lo`.
fn normalize(values: &Array2<f32>, lo: f64, hi: f64) -> Array2<f32> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(mn, mx), &v| {
            (mn.min(v as f64), mx.max(v as f64))
        });
    let range = max - min;
    let scale = if range > f64::EPSILON { (hi - lo) / range } else { 0.0 };
    let shift = if min.is_finite() { lo - min * scale } else { lo };
    values.mapv(|v| (v as f64 * scale + shift) as f32)
}

/// Separable Gaussian blur with mirrored borders (`d c b a | a b c d`).
pub fn gaussian_blur(values: &Array2<f32>, sigma: f64) -> Array2<f32> {
    if values.is_empty() || sigma <= 0.0 {
        return values.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let rows = blur_axis(values, &kernel, Axis(0));
    blur_axis(&rows, &kernel, Axis(1))
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (BLUR_TRUNCATE * sigma + 0.5) as i64;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

fn blur_axis(values: &Array2<f32>, kernel: &[f64], axis: Axis) -> Array2<f32> {
    let radius = (kernel.len() / 2) as i64;
    let mut out = Array2::<f32>::zeros(values.dim());
    for (src, mut dst) in values.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        let n = src.len() as i64;
        for i in 0..n {
            let mut acc = 0.0f64;
            for (k, w) in kernel.iter().enumerate() {
                let j = reflect(i + k as i64 - radius, n);
                acc += src[j] as f64 * w;
            }
            dst[i as usize] = acc as f32;
        }
    }
    out
}

fn reflect(i: i64, n: i64) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * n;
    let m = i.rem_euclid(period);
    (if m >= n { period - m - 1 } else { m }) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FloorPoint;

    #[test]
    fn test_reflect_indices() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-2, 5), 1);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(6, 5), 3);
        assert_eq!(reflect(12, 5), 2);
        assert_eq!(reflect(3, 1), 0);
    }

    #[test]
    fn test_kernel_is_normalized() {
        let kernel = gaussian_kernel(10.0);
        assert_eq!(kernel.len(), 81);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(kernel[40] > kernel[39]);
    }

    #[test]
    fn test_blur_preserves_constant_field() {
        let values = Array2::from_elem((12, 7), 42.0f32);
        let blurred = gaussian_blur(&values, 10.0);
        assert!(blurred.iter().all(|v| (v - 42.0).abs() < 1e-3));
    }

    #[test]
    fn test_blur_preserves_mass_away_from_edges() {
        let mut values = Array2::<f32>::zeros((200, 200));
        values[[100, 100]] = 1000.0;
        let blurred = gaussian_blur(&values, 10.0);
        let total: f32 = blurred.iter().sum();
        assert!((total - 1000.0).abs() < 0.1);
        assert!(blurred[[100, 100]] > blurred[[100, 110]]);
    }

    #[test]
    fn test_normalize_constant_maps_to_low_bound() {
        let values = Array2::from_elem((3, 3), 5.0f32);
        assert!(normalize(&values, 0.0, 255.0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_field_renders_floorplan_unchanged() {
        let floorplan = RgbImage::from_pixel(20, 10, Rgb([10, 20, 30]));
        let field = DensityField::new(20, 10);
        let out = render_field(&field, &floorplan);
        assert_eq!(out.overlay.as_raw(), floorplan.as_raw());
        assert!(out.grayscale.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_peak_is_brightest_and_most_opaque() {
        let floorplan = RgbImage::from_pixel(120, 120, Rgb([0, 0, 0]));
        let mut field = DensityField::new(120, 120);
        for _ in 0..5 {
            field.deposit(FloorPoint::new(60.0, 60.0), 20);
        }
        let out = render_field(&field, &floorplan);
        let center = out.grayscale.get_pixel(60, 60)[0];
        let corner = out.grayscale.get_pixel(0, 0)[0];
        assert!(center > corner);
        // black floorplan: overlay equals color * alpha, and alpha is 0 off-disc
        assert_eq!(out.overlay.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_ne!(out.overlay.get_pixel(60, 60), &Rgb([0, 0, 0]));
    }
}
