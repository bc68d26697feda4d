//! panostitch — panorama stitching for image pairs with known point
//! correspondences.
//!
//! Feature detection and matching are out of scope: the input is two RGB
//! images plus index-aligned match coordinates, the output is one canvas
//! holding both. A panorama is built in five stages:
//!
//! 1. **Estimate** – RANSAC-robust DLT homography from the correspondences.
//! 2. **Plan** – canvas sizing from the projected source corners.
//! 3. **Compose** – backward map shifted into canvas coordinates.
//! 4. **Warp** – dense backward resampling of the source (bilinear or
//!    bicubic).
//! 5. **Merge** – destination paste, then zero-masked fill from the
//!    warped source.
//!
//! # Public API
//! - [`Stitcher`] as the primary entry point, [`StitchConfig`] for tuning
//! - [`assemble_panorama`] as the underlying free function
//! - estimation and warping primitives re-exported from `panostitch-core`

mod stitcher;

#[cfg(test)]
mod test_utils;

pub use stitcher::{assemble_panorama, Panorama, PanoramaReport, StitchConfig, Stitcher};

pub use panostitch_core::canvas::{
    offset_backward_homography, plan_canvas, CanvasLayout, Padding,
};
pub use panostitch_core::homography::{
    estimate_homography_dlt, invert_homography, project, reprojection_error, HomographyError,
};
pub use panostitch_core::interp::{sample_bicubic, sample_bilinear, Interpolation, WarpConfig};
pub use panostitch_core::ransac::{
    filter_inliers, fit_homography_ransac, ransac_iterations, score_homography, ModelScore,
    RansacConfig, RansacResult, RansacStats, UNUSABLE_MSE,
};
pub use panostitch_core::warp::{warp_backward, warp_forward, warp_forward_batch};
