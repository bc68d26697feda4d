//! Homography estimation via DLT with Hartley normalization.
//!
//! Provides:
//! - Direct Linear Transform (DLT) from ≥4 point correspondences.
//! - Projection and inversion helpers with explicit degeneracy handling.
//!
//! Points are `[x, y]` in 0-based pixel coordinates (x = column, y = row).
//! Homographies are defined up to nonzero scale; estimation returns a matrix
//! scaled so `h[(2,2)] = 1` whenever that entry is well conditioned.

use nalgebra::{DMatrix, Matrix3, Vector3};

// ── Error type ───────────────────────────────────────────────────────────

/// Failure modes of estimation and panorama assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomographyError {
    /// Fewer correspondences than the operation requires.
    InsufficientCorrespondences { needed: usize, got: usize },
    /// Collinear or duplicated points left the DLT system rank-deficient,
    /// so no unique homography exists.
    DegenerateConfiguration,
    /// A homography whose projective action collapses: not invertible, or
    /// a perspective divide vanishing where a finite image is required.
    DegenerateHomography,
    /// RANSAC finished every iteration without a candidate clearing the
    /// minimal-inlier-fraction gate.
    NoModelFound { iterations: usize },
}

impl std::fmt::Display for HomographyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientCorrespondences { needed, got } => {
                write!(f, "insufficient correspondences: need {}, got {}", needed, got)
            }
            Self::DegenerateConfiguration => {
                write!(f, "degenerate point configuration (collinear or duplicated)")
            }
            Self::DegenerateHomography => write!(f, "degenerate homography"),
            Self::NoModelFound { iterations } => {
                write!(f, "no model found after {} RANSAC iterations", iterations)
            }
        }
    }
}

impl std::error::Error for HomographyError {}

// ── Projection ───────────────────────────────────────────────────────────

/// Perspective-divide denominators below this are treated as collapsed.
pub(crate) const MIN_PROJECTIVE_W: f64 = 1e-12;

/// Project a 2D point through a 3×3 homography: H · [x, y, 1]ᵗ → [u, v].
///
/// Returns `None` when the perspective divide collapses (|w| ≈ 0), i.e. the
/// point maps to infinity under `h`.
#[inline]
pub fn project(h: &Matrix3<f64>, x: f64, y: f64) -> Option<[f64; 2]> {
    let p = h * Vector3::new(x, y, 1.0);
    if p[2].abs() < MIN_PROJECTIVE_W {
        return None;
    }
    Some([p[0] / p[2], p[1] / p[2]])
}

/// Reprojection error ||project(H, src) − dst||.
///
/// A collapsed projection yields `f64::INFINITY`, which every finite inlier
/// threshold rejects.
pub fn reprojection_error(h: &Matrix3<f64>, src: &[f64; 2], dst: &[f64; 2]) -> f64 {
    match project(h, src[0], src[1]) {
        Some([u, v]) => {
            let dx = u - dst[0];
            let dy = v - dst[1];
            (dx * dx + dy * dy).sqrt()
        }
        None => f64::INFINITY,
    }
}

/// Invert a forward homography for backward mapping.
pub fn invert_homography(h: &Matrix3<f64>) -> Result<Matrix3<f64>, HomographyError> {
    h.try_inverse().ok_or(HomographyError::DegenerateHomography)
}

// ── Hartley normalization ────────────────────────────────────────────────

/// Compute a normalizing transform: translate the centroid to the origin,
/// scale so the mean distance from the origin is sqrt(2).
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx: f64 = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy: f64 = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let normalized: Vec<[f64; 2]> =
        pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();

    (t, normalized)
}

// ── DLT ──────────────────────────────────────────────────────────────────

/// Estimate the homography mapping `src` onto `dst` from ≥4 correspondences.
///
/// Slices are index-aligned (point `src[i]` pairs with `dst[i]`) and must
/// have equal length; the shorter length governs. Builds the 2N×9 DLT
/// system on Hartley-normalized points and takes the null-space direction
/// as the solution, so the fit is least-squares under a unit-norm
/// constraint for N > 4.
///
/// Returns the 3×3 homography H with dst ≈ project(H, src), or
/// [`HomographyError::DegenerateConfiguration`] when the input admits no
/// unique solution (collinear or duplicated points).
pub fn estimate_homography_dlt(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> Result<Matrix3<f64>, HomographyError> {
    debug_assert_eq!(src.len(), dst.len(), "correspondence slices must be index-aligned");
    let n = src.len().min(dst.len());
    if n < 4 {
        return Err(HomographyError::InsufficientCorrespondences { needed: 4, got: n });
    }

    let (t_src, src_n) = normalize_points(&src[..n]);
    let (t_dst, dst_n) = normalize_points(&dst[..n]);

    // Each correspondence (x, y) → (u, v) contributes two rows encoding
    // dst = H·src in homogeneous form.
    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let [x, y] = src_n[i];
        let [u, v] = dst_n[i];

        // Row 2i:   [ -x  -y  -1   0   0   0   u·x  u·y  u ]
        a[(2 * i, 0)] = -x;
        a[(2 * i, 1)] = -y;
        a[(2 * i, 2)] = -1.0;
        a[(2 * i, 6)] = u * x;
        a[(2 * i, 7)] = u * y;
        a[(2 * i, 8)] = u;

        // Row 2i+1: [  0   0   0  -x  -y  -1   v·x  v·y  v ]
        a[(2 * i + 1, 3)] = -x;
        a[(2 * i + 1, 4)] = -y;
        a[(2 * i + 1, 5)] = -1.0;
        a[(2 * i + 1, 6)] = v * x;
        a[(2 * i + 1, 7)] = v * y;
        a[(2 * i + 1, 8)] = v;
    }

    // The unit-norm least-squares solution is the right singular vector of
    // A for the smallest singular value — the eigenvector of AᵀA with the
    // smallest eigenvalue. Working on AᵀA keeps the decomposition on a
    // fixed 9×9 problem regardless of N.
    let ata = a.transpose() * &a;
    let eig = nalgebra::SymmetricEigen::new(ata);

    let mut min_idx = 0;
    for i in 1..9 {
        if eig.eigenvalues[i].abs() < eig.eigenvalues[min_idx].abs() {
            min_idx = i;
        }
    }

    // A rank-deficient system has a second near-zero eigenvalue: the
    // solution direction is then ambiguous and the configuration is
    // degenerate. Compare against the largest eigenvalue so the test is
    // scale-free.
    let mut second_min = f64::INFINITY;
    let mut max_val = 0.0f64;
    for i in 0..9 {
        let v = eig.eigenvalues[i].abs();
        if v > max_val {
            max_val = v;
        }
        if i != min_idx && v < second_min {
            second_min = v;
        }
    }
    if !max_val.is_finite() || max_val <= 0.0 || second_min < 1e-10 * max_val {
        return Err(HomographyError::DegenerateConfiguration);
    }

    let hv = eig.eigenvectors.column(min_idx);
    let h_n = Matrix3::new(hv[0], hv[1], hv[2], hv[3], hv[4], hv[5], hv[6], hv[7], hv[8]);
    if !h_n.iter().all(|v| v.is_finite()) {
        return Err(HomographyError::DegenerateConfiguration);
    }

    // Denormalize: H = T_dst⁻¹ · Hn · T_src
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or(HomographyError::DegenerateConfiguration)?;
    let h = t_dst_inv * h_n * t_src;

    // Scale so h[2][2] = 1 when possible; otherwise fall back to unit
    // Frobenius norm.
    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 {
        let norm = h.norm();
        if norm < 1e-15 {
            return Err(HomographyError::DegenerateConfiguration);
        }
        Ok(h / norm)
    } else {
        Ok(h / scale)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_test_homography() -> Matrix3<f64> {
        // Mild perspective view offset into a neighboring frame.
        Matrix3::new(
            1.2, 0.05, 40.0, //
            -0.03, 1.1, 25.0, //
            1e-5, -2e-5, 1.0,
        )
    }

    fn grid(nx: usize, ny: usize, step: f64) -> Vec<[f64; 2]> {
        let mut pts = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                pts.push([i as f64 * step, j as f64 * step]);
            }
        }
        pts
    }

    fn map_all(h: &Matrix3<f64>, pts: &[[f64; 2]]) -> Vec<[f64; 2]> {
        pts.iter()
            .map(|p| project(h, p[0], p[1]).expect("test homography is finite"))
            .collect()
    }

    #[test]
    fn test_dlt_exact_4points() {
        let h_true = make_test_homography();
        let src = [[0.0, 0.0], [100.0, 0.0], [100.0, 80.0], [0.0, 80.0]];
        let dst = map_all(&h_true, &src);

        let h_est = estimate_homography_dlt(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(&dst) {
            let err = reprojection_error(&h_est, s, d);
            assert!(err < 1e-6, "reprojection error too large: {}", err);
        }
    }

    #[test]
    fn test_dlt_overdetermined() {
        let h_true = make_test_homography();
        let src = grid(6, 6, 20.0);
        let dst = map_all(&h_true, &src);

        let h_est = estimate_homography_dlt(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(&dst) {
            let err = reprojection_error(&h_est, s, d);
            assert!(err < 1e-6, "reprojection error: {}", err);
        }
    }

    #[test]
    fn test_dlt_recovers_affine_up_to_scale() {
        // Affine map: rotation + anisotropic scale + translation, h22 = 1.
        let h_true = Matrix3::new(
            0.9, -0.2, 15.0, //
            0.25, 1.1, -8.0, //
            0.0, 0.0, 1.0,
        );
        let src = grid(4, 4, 30.0);
        let dst = map_all(&h_true, &src);

        let h_est = estimate_homography_dlt(&src, &dst).unwrap();
        // Estimation fixes h22 = 1, so the matrices agree entrywise.
        for r in 0..3 {
            for c in 0..3 {
                assert_relative_eq!(h_est[(r, c)], h_true[(r, c)], epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_projective_action_is_scale_invariant() {
        let h = make_test_homography();
        let scaled = h * 3.7;
        let a = project(&h, 12.0, 34.0).unwrap();
        let b = project(&scaled, 12.0, 34.0).unwrap();
        assert_relative_eq!(a[0], b[0], epsilon = 1e-9);
        assert_relative_eq!(a[1], b[1], epsilon = 1e-9);
    }

    #[test]
    fn test_project_roundtrip_through_inverse() {
        let h = make_test_homography();
        let h_inv = invert_homography(&h).unwrap();

        let p = [50.0, 75.0];
        let q = project(&h, p[0], p[1]).unwrap();
        let p_back = project(&h_inv, q[0], q[1]).unwrap();

        assert_relative_eq!(p[0], p_back[0], epsilon = 1e-8);
        assert_relative_eq!(p[1], p_back[1], epsilon = 1e-8);
    }

    #[test]
    fn test_project_collapses_on_horizon() {
        // Third row [0, 1, -5]: w = y − 5 vanishes on the line y = 5.
        let h = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, -5.0);
        assert!(project(&h, 3.0, 5.0).is_none());
        assert!(project(&h, 3.0, 8.0).is_some());
        assert_eq!(
            reprojection_error(&h, &[3.0, 5.0], &[0.0, 0.0]),
            f64::INFINITY
        );
    }

    #[test]
    fn test_too_few_points() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        match estimate_homography_dlt(&pts, &pts) {
            Err(HomographyError::InsufficientCorrespondences { needed: 4, got: 3 }) => {}
            other => panic!("expected InsufficientCorrespondences, got {:?}", other),
        }
    }

    #[test]
    fn test_collinear_points_degenerate() {
        // All points on the line y = 2x: no unique homography exists.
        let src: Vec<[f64; 2]> = (0..5).map(|i| [i as f64 * 10.0, i as f64 * 20.0]).collect();
        let dst = src.clone();
        assert_eq!(
            estimate_homography_dlt(&src, &dst),
            Err(HomographyError::DegenerateConfiguration)
        );
    }

    #[test]
    fn test_duplicate_points_degenerate() {
        let src = [[0.0, 0.0], [0.0, 0.0], [50.0, 0.0], [0.0, 50.0]];
        let dst = [[5.0, 5.0], [5.0, 5.0], [60.0, 4.0], [6.0, 55.0]];
        assert_eq!(
            estimate_homography_dlt(&src, &dst),
            Err(HomographyError::DegenerateConfiguration)
        );
    }

    #[test]
    fn test_three_collinear_of_four_degenerate() {
        // Three of four points on y = 0.
        let src = [[0.0, 0.0], [10.0, 0.0], [20.0, 0.0], [5.0, 30.0]];
        let dst = src;
        assert_eq!(
            estimate_homography_dlt(&src, &dst),
            Err(HomographyError::DegenerateConfiguration)
        );
    }

    #[test]
    fn test_invert_singular_homography() {
        let mut h = Matrix3::zeros();
        h[(0, 0)] = 1.0; // rank 1
        assert_eq!(
            invert_homography(&h),
            Err(HomographyError::DegenerateHomography)
        );
    }

    #[test]
    fn test_error_display() {
        let e = HomographyError::NoModelFound { iterations: 73 };
        assert!(e.to_string().contains("73"));
        let e = HomographyError::InsufficientCorrespondences { needed: 4, got: 2 };
        assert!(e.to_string().contains("need 4"));
    }
}
