//! High-level panorama assembly.
//!
//! [`Stitcher`] is the primary entry point: it wraps a [`StitchConfig`]
//! and runs the full pipeline — robust homography estimation from point
//! correspondences, canvas planning, backward warping of the source, and
//! the merge with the pasted destination.

use image::RgbImage;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use panostitch_core::canvas::{offset_backward_homography, plan_canvas, CanvasLayout};
use panostitch_core::homography::{invert_homography, HomographyError};
use panostitch_core::interp::WarpConfig;
use panostitch_core::ransac::{fit_homography_ransac, RansacConfig, RansacStats};
use panostitch_core::warp::warp_backward;

/// Everything configurable about a stitch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Robust homography estimation from the correspondences.
    pub ransac: RansacConfig,
    /// Backward warp of the source onto the canvas.
    pub warp: WarpConfig,
}

/// A stitched panorama together with the geometry that produced it.
#[derive(Debug, Clone)]
pub struct Panorama {
    /// The composited canvas.
    pub image: RgbImage,
    /// Canvas dimensions and destination placement.
    pub layout: CanvasLayout,
    /// Fitted forward homography source → destination (3x3, row-major).
    pub homography: [[f64; 3]; 3],
    /// Estimation statistics.
    pub ransac: RansacStats,
}

/// Serializable stitch summary: everything in [`Panorama`] except the
/// pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanoramaReport {
    /// Canvas dimensions and destination placement.
    pub layout: CanvasLayout,
    /// Fitted forward homography source → destination (3x3, row-major).
    pub homography: [[f64; 3]; 3],
    /// Estimation statistics.
    pub ransac: RansacStats,
}

impl Panorama {
    /// Summary view for serialization.
    pub fn report(&self) -> PanoramaReport {
        PanoramaReport {
            layout: self.layout,
            homography: self.homography,
            ransac: self.ransac.clone(),
        }
    }
}

fn matrix_rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

/// Copy `img` into `canvas` with its top-left corner at `(x, y)`.
///
/// The caller guarantees the window fits; [`plan_canvas`] sizes the
/// canvas so the destination always does.
fn paste_at(canvas: &mut RgbImage, img: &RgbImage, x: u32, y: u32) {
    for (px, py, p) in img.enumerate_pixels() {
        canvas.put_pixel(x + px, y + py, *p);
    }
}

/// Per-channel zero masking: a zero canvas channel counts as unpainted
/// and takes the warped value, a nonzero channel keeps the paste.
///
/// True black in the destination is indistinguishable from unpainted
/// canvas under this rule, so pure-zero destination channels get
/// overwritten where the warped source overlaps them.
fn merge_into(canvas: &mut RgbImage, warped: &RgbImage) {
    for (base, new) in canvas.pixels_mut().zip(warped.pixels()) {
        for c in 0..3 {
            if base[c] == 0 {
                base[c] = new[c];
            }
        }
    }
}

/// Stitch `src` onto `dst` given index-aligned correspondences mapping
/// source points to destination points.
///
/// Fits the forward homography with RANSAC, sizes a canvas holding the
/// destination plus the projected source, pastes the destination at its
/// window, backward-warps the source over the whole canvas, and merges
/// the two by zero masking. The destination always lands at
/// `(padding.left, padding.up)` in the output.
pub fn assemble_panorama(
    src: &RgbImage,
    dst: &RgbImage,
    src_pts: &[[f64; 2]],
    dst_pts: &[[f64; 2]],
    config: &StitchConfig,
) -> Result<Panorama, HomographyError> {
    let fit = fit_homography_ransac(src_pts, dst_pts, &config.ransac)?;
    debug!(
        "stitch: forward homography fitted, {}/{} inliers (mse {:.4})",
        fit.stats.n_inliers, fit.stats.n_points, fit.stats.mse
    );

    let layout = plan_canvas(&fit.homography, src.dimensions(), dst.dimensions())?;
    debug!(
        "stitch: canvas {}x{}, padding left={} right={} up={} down={}",
        layout.width,
        layout.height,
        layout.padding.left,
        layout.padding.right,
        layout.padding.up,
        layout.padding.down
    );

    // Backward map for the source, shifted into canvas coordinates.
    let hinv = invert_homography(&fit.homography)?;
    let canvas_map = offset_backward_homography(&hinv, &layout.padding);

    let mut canvas = RgbImage::new(layout.width, layout.height);
    paste_at(&mut canvas, dst, layout.padding.left, layout.padding.up);

    let warped = warp_backward(src, &canvas_map, layout.width, layout.height, &config.warp);
    merge_into(&mut canvas, &warped);

    info!(
        "stitched {}x{} source and {}x{} destination into {}x{} panorama",
        src.width(),
        src.height(),
        dst.width(),
        dst.height(),
        layout.width,
        layout.height
    );

    Ok(Panorama {
        image: canvas,
        layout,
        homography: matrix_rows(&fit.homography),
        ransac: fit.stats,
    })
}

/// Primary stitching interface.
///
/// Encapsulates the stitch configuration. Create once, stitch many pairs.
///
/// # Examples
///
/// ```no_run
/// use image::ImageReader;
/// use panostitch::Stitcher;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let src = ImageReader::open("right.png")?.decode()?.to_rgb8();
/// let dst = ImageReader::open("left.png")?.decode()?.to_rgb8();
/// // Matched feature locations: src_pts[i] in `src` corresponds to
/// // dst_pts[i] in `dst`.
/// let src_pts = vec![[12.0, 40.5], [301.0, 52.0], [290.5, 388.0], [18.0, 391.0]];
/// let dst_pts = vec![[412.0, 38.0], [701.5, 55.5], [688.0, 390.0], [417.5, 388.5]];
///
/// let pano = Stitcher::new().stitch(&src, &dst, &src_pts, &dst_pts)?;
/// pano.image.save("panorama.png")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Stitcher {
    config: StitchConfig,
}

impl Stitcher {
    /// Stitcher with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with full config control.
    pub fn with_config(config: StitchConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Mutable access for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut StitchConfig {
        &mut self.config
    }

    /// Stitch `src` onto `dst`; see [`assemble_panorama`].
    pub fn stitch(
        &self,
        src: &RgbImage,
        dst: &RgbImage,
        src_pts: &[[f64; 2]],
        dst_pts: &[[f64; 2]],
    ) -> Result<Panorama, HomographyError> {
        assemble_panorama(src, dst, src_pts, dst_pts, &self.config)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
