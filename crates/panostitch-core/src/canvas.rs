//! Panorama canvas geometry.
//!
//! Projects the source frame's corners into the destination frame to
//! measure how far the warped source overflows it in each direction, and
//! folds the resulting canvas offset into the backward homography.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::homography::{project, HomographyError};

/// Pixels of canvas added around the destination frame, per direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Padding {
    pub up: u32,
    pub down: u32,
    pub left: u32,
    pub right: u32,
}

/// Canvas dimensions together with the padding that produced them.
///
/// The destination image occupies the window starting at
/// `(padding.left, padding.up)` inside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasLayout {
    pub width: u32,
    pub height: u32,
    pub padding: Padding,
}

/// Plan the panorama canvas for warping a `src_dims` image into the frame
/// of a `dst_dims` image through the forward homography `h`.
///
/// The four 0-based source corners are projected through `h`; per
/// direction, the padding is the largest overflow beyond the destination
/// rectangle `[0, w−1] × [0, h−1]`, rounded up, floored at zero. A source
/// corner mapping to infinity makes the canvas unbounded and yields
/// [`HomographyError::DegenerateHomography`].
pub fn plan_canvas(
    h: &Matrix3<f64>,
    src_dims: (u32, u32),
    dst_dims: (u32, u32),
) -> Result<CanvasLayout, HomographyError> {
    let (src_w, src_h) = src_dims;
    let (dst_w, dst_h) = dst_dims;

    let max_x = (src_w.max(1) - 1) as f64;
    let max_y = (src_h.max(1) - 1) as f64;
    let corners = [[0.0, 0.0], [max_x, 0.0], [0.0, max_y], [max_x, max_y]];

    let edge_x = (dst_w.max(1) - 1) as f64;
    let edge_y = (dst_h.max(1) - 1) as f64;

    let mut left = 0.0f64;
    let mut right = 0.0f64;
    let mut up = 0.0f64;
    let mut down = 0.0f64;
    for [cx, cy] in corners {
        let [x, y] = project(h, cx, cy).ok_or(HomographyError::DegenerateHomography)?;
        left = left.max(-x);
        right = right.max(x - edge_x);
        up = up.max(-y);
        down = down.max(y - edge_y);
    }

    let padding = Padding {
        up: up.ceil() as u32,
        down: down.ceil() as u32,
        left: left.ceil() as u32,
        right: right.ceil() as u32,
    };
    Ok(CanvasLayout {
        width: dst_w.saturating_add(padding.left).saturating_add(padding.right),
        height: dst_h.saturating_add(padding.up).saturating_add(padding.down),
        padding,
    })
}

/// Fold the canvas offset into a backward homography.
///
/// Canvas coordinates sit `(padding.left, padding.up)` to the right and
/// below destination coordinates, so the composed map first translates by
/// `(−left, −up)` and then applies `hinv`. Both the translation and the
/// product are scaled to unit Frobenius norm; the projective action is
/// unchanged by either scaling.
pub fn offset_backward_homography(hinv: &Matrix3<f64>, padding: &Padding) -> Matrix3<f64> {
    let t = Matrix3::new(
        1.0,
        0.0,
        -(padding.left as f64),
        0.0,
        1.0,
        -(padding.up as f64),
        0.0,
        0.0,
        1.0,
    );
    let t_hat = t / t.norm();
    let composed = hinv * t_hat;
    composed / composed.norm()
}

// ── Tests ────────────────────────────────────────────────────────────────
