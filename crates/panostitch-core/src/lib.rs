//! panostitch-core — algorithms for homography-based image stitching.
//!
//! Estimates the plane-to-plane mapping between two overlapping views from
//! point correspondences and warps one view into the frame of the other.
//! The pipeline stages are:
//!
//! 1. **Homography** – Direct Linear Transform estimation with Hartley
//!    normalization, projection and inversion helpers.
//! 2. **Ransac** – robust estimation over contaminated correspondences:
//!    adaptive trial count, inlier scoring, refit on consensus.
//! 3. **Interp** – bilinear and bicubic (Catmull-Rom) color reconstruction
//!    at continuous source coordinates.
//! 4. **Warp** – forward pixel transfer (per-pixel and batched) and dense
//!    backward resampling.
//! 5. **Canvas** – panorama canvas sizing from projected corners, and the
//!    canvas-offset composition of the backward map.

pub mod canvas;
pub mod homography;
pub mod interp;
pub mod ransac;
pub mod warp;
