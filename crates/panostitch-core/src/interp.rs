//! Color reconstruction at continuous source coordinates.
//!
//! Samplers take 0-based continuous pixel coordinates, operate on
//! normalized channel values in [0, 1], and return `None` strictly outside
//! the image rectangle `[0, w−1] × [0, h−1]` — the convex hull of the
//! pixel lattice. Inside it, neighborhood taps that fall past the border
//! are clamped to the border.

use image::RgbImage;
use serde::{Deserialize, Serialize};

const INV_255: f32 = 1.0 / 255.0;

/// Interpolation kernel used when reconstructing source colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// 2×2 neighborhood.
    Bilinear,
    /// 4×4 Catmull-Rom neighborhood.
    Bicubic,
}

/// Backward-warp configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Reconstruction kernel.
    pub interpolation: Interpolation,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Bicubic,
        }
    }
}

#[inline]
fn in_bounds(img: &RgbImage, x: f64, y: f64) -> bool {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return false;
    }
    x >= 0.0 && y >= 0.0 && x <= (w - 1) as f64 && y <= (h - 1) as f64
}

/// Fetch a pixel with coordinates clamped to the image border, normalized
/// to [0, 1] per channel.
#[inline]
fn pixel_clamped(img: &RgbImage, x: i64, y: i64) -> [f32; 3] {
    let xc = x.clamp(0, img.width() as i64 - 1) as u32;
    let yc = y.clamp(0, img.height() as i64 - 1) as u32;
    let p = img.get_pixel(xc, yc);
    [
        p[0] as f32 * INV_255,
        p[1] as f32 * INV_255,
        p[2] as f32 * INV_255,
    ]
}

/// Catmull-Rom cubic convolution weight (a = −0.5).
///
/// Zero at every nonzero integer offset and one at zero, so lattice
/// points reproduce exactly.
#[inline]
fn cubic_weight(t: f32) -> f32 {
    let t = t.abs();
    if t <= 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t <= 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

/// Bilinear sample at continuous 0-based (x, y); `None` outside the image.
pub fn sample_bilinear(img: &RgbImage, x: f64, y: f64) -> Option<[f32; 3]> {
    if !in_bounds(img, x, y) {
        return None;
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let xi = x0 as i64;
    let yi = y0 as i64;

    let p00 = pixel_clamped(img, xi, yi);
    let p10 = pixel_clamped(img, xi + 1, yi);
    let p01 = pixel_clamped(img, xi, yi + 1);
    let p11 = pixel_clamped(img, xi + 1, yi + 1);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    Some(out)
}

/// Bicubic (Catmull-Rom) sample at continuous 0-based (x, y); `None`
/// outside the image. The kernel overshoots near strong edges, so values
/// may leave [0, 1]; callers clamp on quantization.
pub fn sample_bicubic(img: &RgbImage, x: f64, y: f64) -> Option<[f32; 3]> {
    if !in_bounds(img, x, y) {
        return None;
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let xi = x0 as i64;
    let yi = y0 as i64;

    let mut acc = [0.0f32; 3];
    for dy in -1..3i64 {
        let wy = cubic_weight(dy as f32 - fy);
        if wy == 0.0 {
            continue;
        }
        for dx in -1..3i64 {
            let w = wy * cubic_weight(dx as f32 - fx);
            if w == 0.0 {
                continue;
            }
            let p = pixel_clamped(img, xi + dx, yi + dy);
            acc[0] += w * p[0];
            acc[1] += w * p[1];
            acc[2] += w * p[2];
        }
    }
    Some(acc)
}

/// Sample with the configured kernel.
#[inline]
pub fn sample(img: &RgbImage, x: f64, y: f64, interpolation: Interpolation) -> Option<[f32; 3]> {
    match interpolation {
        Interpolation::Bilinear => sample_bilinear(img, x, y),
        Interpolation::Bicubic => sample_bicubic(img, x, y),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    fn gradient_image(w: u32, h: u32) -> RgbImage {
        let mut img = RgbImage::new(w, h);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgb([
                (20 + 3 * x as i32).min(255) as u8,
                (40 + 2 * y as i32).min(255) as u8,
                128,
            ]);
        }
        img
    }

    #[test]
    fn test_cubic_weight_values() {
        assert_relative_eq!(cubic_weight(0.0), 1.0);
        assert_relative_eq!(cubic_weight(1.0), 0.0);
        assert_relative_eq!(cubic_weight(2.0), 0.0);
        assert_relative_eq!(cubic_weight(0.5), 0.5625);
        // Negative lobe between 1 and 2.
        assert_relative_eq!(cubic_weight(1.5), -0.0625);
        assert_relative_eq!(cubic_weight(-0.5), cubic_weight(0.5));
    }

    #[test]
    fn test_both_kernels_reproduce_lattice_points() {
        let img = gradient_image(8, 6);
        for y in 0..6 {
            for x in 0..8 {
                let truth = img.get_pixel(x, y);
                for kernel in [Interpolation::Bilinear, Interpolation::Bicubic] {
                    let v = sample(&img, x as f64, y as f64, kernel).unwrap();
                    for c in 0..3 {
                        let back = (v[c] * 255.0).round() as u8;
                        assert_eq!(back, truth[c], "({}, {}) channel {}", x, y, c);
                    }
                }
            }
        }
    }

    #[test]
    fn test_bilinear_midpoint_averages() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([10, 0, 200]));
        img.put_pixel(1, 0, Rgb([30, 0, 100]));
        let v = sample_bilinear(&img, 0.5, 0.0).unwrap();
        assert_relative_eq!(v[0] * 255.0, 20.0, epsilon = 1e-4);
        assert_relative_eq!(v[2] * 255.0, 150.0, epsilon = 1e-4);
    }

    #[test]
    fn test_constant_image_is_preserved_off_lattice() {
        let mut img = RgbImage::new(6, 6);
        for p in img.pixels_mut() {
            *p = Rgb([77, 77, 77]);
        }
        // Kernel weights sum to one, so a constant field stays constant.
        for (x, y) in [(1.3, 2.7), (0.1, 0.1), (4.9, 4.9), (2.5, 2.5)] {
            let v = sample_bicubic(&img, x, y).unwrap();
            for c in 0..3 {
                assert_relative_eq!(v[c] * 255.0, 77.0, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_outside_rectangle_is_none() {
        let img = gradient_image(5, 4);
        assert!(sample_bicubic(&img, -0.01, 1.0).is_none());
        assert!(sample_bicubic(&img, 1.0, -0.01).is_none());
        assert!(sample_bicubic(&img, 4.01, 1.0).is_none());
        assert!(sample_bicubic(&img, 1.0, 3.01).is_none());
        assert!(sample_bilinear(&img, 5.0, 1.0).is_none());
        // Corners are still inside.
        assert!(sample_bicubic(&img, 0.0, 0.0).is_some());
        assert!(sample_bicubic(&img, 4.0, 3.0).is_some());
    }

    #[test]
    fn test_border_taps_are_clamped() {
        // Near-border queries reach taps past the edge; they must clamp,
        // not panic, and stay in a sane range on a smooth image.
        let img = gradient_image(5, 4);
        for (x, y) in [(0.1, 0.1), (3.9, 2.9), (0.5, 2.5), (3.5, 0.4)] {
            let v = sample_bicubic(&img, x, y).unwrap();
            for c in 0..3 {
                assert!(v[c] >= -0.2 && v[c] <= 1.2, "channel {} = {}", c, v[c]);
            }
        }
    }

    #[test]
    fn test_bicubic_overshoots_on_hard_edges() {
        // A step edge drives Catmull-Rom past the sample range; the
        // overshoot is what output quantization clamps away.
        let mut img = RgbImage::new(8, 1);
        for x in 0..8 {
            let v = if x < 4 { 0 } else { 255 };
            img.put_pixel(x, 0, Rgb([v, v, v]));
        }
        let mut min_v = f32::INFINITY;
        let mut max_v = f32::NEG_INFINITY;
        for i in 0..40 {
            let x = 1.0 + 0.125 * i as f64;
            if x > 6.0 {
                break;
            }
            let v = sample_bicubic(&img, x, 0.0).unwrap();
            min_v = min_v.min(v[0]);
            max_v = max_v.max(v[0]);
        }
        assert!(min_v < 0.0, "expected undershoot, min {}", min_v);
        assert!(max_v > 1.0, "expected overshoot, max {}", max_v);
    }
}
