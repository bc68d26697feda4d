//! Image warping: forward pixel transfer and backward resampling.
//!
//! Forward warping pushes every source pixel through H, rounds to the
//! nearest canvas pixel and copies the color; canvas pixels no source
//! pixel lands on keep the zero fill. Backward warping pulls every canvas
//! pixel through H⁻¹ and reconstructs its color by interpolation, which
//! leaves no holes inside the projected image.

use image::{Rgb, RgbImage};
use nalgebra::{DMatrix, Matrix3};

use crate::homography::{project, MIN_PROJECTIVE_W};
use crate::interp::{sample, WarpConfig};

/// Quantize a normalized channel back to `u8`, absorbing interpolation
/// overshoot.
#[inline]
fn quantize(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Forward-warp `src` through `h` onto a zeroed `out_w` × `out_h` canvas,
/// one pixel at a time.
///
/// Each source pixel is projected, rounded to the nearest integer
/// position and copied when it lands on the canvas. Pixels whose
/// projection collapses or falls outside are dropped. Collisions resolve
/// to the last writer in row-major order.
pub fn warp_forward(src: &RgbImage, h: &Matrix3<f64>, out_w: u32, out_h: u32) -> RgbImage {
    let mut out = RgbImage::new(out_w, out_h);
    for (x, y, px) in src.enumerate_pixels() {
        let Some([u, v]) = project(h, x as f64, y as f64) else {
            continue;
        };
        let ui = u.round();
        let vi = v.round();
        if ui >= 0.0 && vi >= 0.0 && ui < out_w as f64 && vi < out_h as f64 {
            out.put_pixel(ui as u32, vi as u32, *px);
        }
    }
    out
}

/// Forward-warp `src` through `h` by projecting all pixel coordinates in
/// one 3×N matrix product.
///
/// Produces output identical to [`warp_forward`]: the same projections,
/// the same rounding, and the same row-major write order deciding
/// collisions.
pub fn warp_forward_batch(src: &RgbImage, h: &Matrix3<f64>, out_w: u32, out_h: u32) -> RgbImage {
    let mut out = RgbImage::new(out_w, out_h);
    let (src_w, src_h) = src.dimensions();
    let n = (src_w as usize) * (src_h as usize);
    if n == 0 {
        return out;
    }

    // Homogeneous coordinates, one column per pixel, row-major pixel
    // order so column y·w + x is pixel (x, y).
    let mut coords = Vec::with_capacity(3 * n);
    for y in 0..src_h {
        for x in 0..src_w {
            coords.extend_from_slice(&[x as f64, y as f64, 1.0]);
        }
    }
    let coords = DMatrix::from_column_slice(3, n, &coords);
    let projected = h * &coords;

    for (col, px) in src.pixels().enumerate() {
        let p = projected.column(col);
        if p[2].abs() < MIN_PROJECTIVE_W {
            continue;
        }
        let u = (p[0] / p[2]).round();
        let v = (p[1] / p[2]).round();
        if u >= 0.0 && v >= 0.0 && u < out_w as f64 && v < out_h as f64 {
            out.put_pixel(u as u32, v as u32, *px);
        }
    }
    out
}

/// Backward-warp onto a zeroed `out_w` × `out_h` canvas: each canvas
/// pixel is mapped through `h_inv` into `src` and its color reconstructed
/// with the configured kernel.
///
/// Canvas pixels mapping outside the source rectangle, or through a
/// collapsed projection, keep the zero fill.
pub fn warp_backward(
    src: &RgbImage,
    h_inv: &Matrix3<f64>,
    out_w: u32,
    out_h: u32,
    config: &WarpConfig,
) -> RgbImage {
    let mut out = RgbImage::new(out_w, out_h);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let Some([sx, sy]) = project(h_inv, x as f64, y as f64) else {
            continue;
        };
        let Some(rgb) = sample(src, sx, sy, config.interpolation) else {
            continue;
        };
        *px = Rgb([quantize(rgb[0]), quantize(rgb[1]), quantize(rgb[2])]);
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────────────
