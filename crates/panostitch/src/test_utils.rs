//! Shared fixtures for stitching tests.

use image::{imageops, ImageBuffer, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Render a smooth synthetic color scene.
///
/// Per-channel low-frequency waves keep every channel well above zero, so
/// pasted scene content is never mistaken for unpainted canvas by the
/// zero-masking merge.
pub(crate) fn textured_scene(w: u32, h: u32) -> RgbImage {
    let mut img = RgbImage::new(w, h);
    for (x, y, p) in img.enumerate_pixels_mut() {
        let fx = x as f64;
        let fy = y as f64;
        let r = 128.0 + 60.0 * (0.12 * fx).sin() * (0.07 * fy).cos();
        let g = 128.0 + 55.0 * (0.05 * fx + 0.11 * fy).sin();
        let b = 128.0 + 50.0 * (0.09 * (fx - fy)).cos();
        *p = Rgb([r.round() as u8, g.round() as u8, b.round() as u8]);
    }
    img
}

/// Gaussian-blurred random texture via `imageproc`.
///
/// Raw noise is drawn in [64, 192] per channel, so every blurred channel
/// stays strictly positive and unbiased by the zero-masking merge. Rougher
/// than [`textured_scene`]; exercises the interpolation kernels on
/// high-frequency content.
pub(crate) fn noise_scene(w: u32, h: u32, sigma: f32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut f = ImageBuffer::<Rgb<f32>, Vec<f32>>::new(w, h);
    for p in f.pixels_mut() {
        *p = Rgb([
            rng.gen_range(64.0f32..192.0) / 255.0,
            rng.gen_range(64.0f32..192.0) / 255.0,
            rng.gen_range(64.0f32..192.0) / 255.0,
        ]);
    }
    let blurred = imageproc::filter::gaussian_blur_f32(&f, sigma);
    let mut out = RgbImage::new(w, h);
    for (x, y, p) in out.enumerate_pixels_mut() {
        let v = blurred.get_pixel(x, y);
        *p = Rgb([
            (v[0].clamp(0.0, 1.0) * 255.0).round() as u8,
            (v[1].clamp(0.0, 1.0) * 255.0).round() as u8,
            (v[2].clamp(0.0, 1.0) * 255.0).round() as u8,
        ]);
    }
    out
}

/// Rectangular crop with top-left corner `(x, y)`.
pub(crate) fn crop(img: &RgbImage, x: u32, y: u32, w: u32, h: u32) -> RgbImage {
    imageops::crop_imm(img, x, y, w, h).to_image()
}

/// Axis-aligned grid of points stepping through a `w` × `h` image,
/// keeping `margin` pixels from the borders.
pub(crate) fn grid_points(w: u32, h: u32, margin: f64, step: f64) -> Vec<[f64; 2]> {
    let mut pts = Vec::new();
    let mut y = margin;
    while y <= h as f64 - margin {
        let mut x = margin;
        while x <= w as f64 - margin {
            pts.push([x, y]);
            x += step;
        }
        y += step;
    }
    pts
}

/// Shift every point by `(tx, ty)`.
pub(crate) fn translate_points(pts: &[[f64; 2]], tx: f64, ty: f64) -> Vec<[f64; 2]> {
    pts.iter().map(|p| [p[0] + tx, p[1] + ty]).collect()
}
