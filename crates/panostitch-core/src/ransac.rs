//! Outlier-robust homography estimation: model scoring, inlier filtering,
//! and the seeded random-sample-consensus loop.
//!
//! The loop draws minimal 4-point samples, gates candidates on the inlier
//! fraction they reach over the full correspondence set, refits each
//! surviving candidate on its consensus set, and keeps the model with the
//! lowest mean squared residual.

use nalgebra::Matrix3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::homography::{
    estimate_homography_dlt, project, reprojection_error, HomographyError,
};

/// `mse` sentinel reported for a model with no inliers at all.
pub const UNUSABLE_MSE: f64 = 1e9;

/// Minimal sample size: a homography has 8 degrees of freedom.
const SAMPLE_SIZE: usize = 4;

// ── Model evaluation ─────────────────────────────────────────────────────

/// Quality of a candidate homography against a full correspondence set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelScore {
    /// Inlier fraction in [0, 1].
    pub fit_percent: f64,
    /// Mean squared per-coordinate residual over inliers only;
    /// [`UNUSABLE_MSE`] when no pair is an inlier.
    pub mse: f64,
}

/// Score `h` against every correspondence.
///
/// A pair is an inlier when its reprojection error is within `max_err`
/// pixels; a collapsed projection is an unconditional outlier. The mse
/// averages the squared x and y residuals of the inliers (2·n terms), so a
/// perfect fit scores `fit_percent = 1.0, mse ≈ 0`.
pub fn score_homography(
    h: &Matrix3<f64>,
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    max_err: f64,
) -> ModelScore {
    let n = src.len().min(dst.len());
    let mut n_inliers = 0usize;
    let mut sq_sum = 0.0f64;
    for i in 0..n {
        let Some([u, v]) = project(h, src[i][0], src[i][1]) else {
            continue;
        };
        let dx = u - dst[i][0];
        let dy = v - dst[i][1];
        let d2 = dx * dx + dy * dy;
        if d2.sqrt() <= max_err {
            n_inliers += 1;
            sq_sum += d2;
        }
    }
    if n_inliers == 0 {
        return ModelScore {
            fit_percent: 0.0,
            mse: UNUSABLE_MSE,
        };
    }
    ModelScore {
        fit_percent: n_inliers as f64 / n as f64,
        mse: sq_sum / (2 * n_inliers) as f64,
    }
}

/// Split out the correspondences that agree with `h` within `max_err`.
///
/// Returns `(src_subset, dst_subset)`, index-aligned and in input order,
/// ready for a refit.
pub fn filter_inliers(
    h: &Matrix3<f64>,
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    max_err: f64,
) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    let n = src.len().min(dst.len());
    let mut src_in = Vec::new();
    let mut dst_in = Vec::new();
    for i in 0..n {
        if reprojection_error(h, &src[i], &dst[i]) <= max_err {
            src_in.push(src[i]);
            dst_in.push(dst[i]);
        }
    }
    (src_in, dst_in)
}

// ── Configuration ────────────────────────────────────────────────────────

/// Configuration for RANSAC homography fitting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    /// Prior inlier fraction w ∈ (0, 1] used to size the iteration budget.
    pub inlier_ratio: f64,
    /// Inlier threshold: maximum reprojection error in pixels.
    pub max_err: f64,
    /// Target confidence p ∈ (0, 1) that at least one sample is all-inlier.
    pub confidence: f64,
    /// Inlier fraction d a candidate must strictly exceed over the full
    /// set before the consensus refit is attempted.
    pub min_inlier_fraction: f64,
    /// Seed for the sampling RNG; equal seeds give identical runs.
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            inlier_ratio: 0.8,
            max_err: 3.0,
            confidence: 0.99,
            min_inlier_fraction: 0.5,
            seed: 0,
        }
    }
}

impl RansacConfig {
    /// Iteration budget implied by this configuration.
    pub fn iterations(&self) -> usize {
        ransac_iterations(self.inlier_ratio, self.confidence)
    }
}

/// Closed-form RANSAC iteration count for minimal samples of 4:
/// `k = ceil(ln(1−p) / ln(1−w⁴)) + 1`.
///
/// The +1 keeps the count defined at w = 1, where the ratio underflows to
/// zero. Requires `w ∈ (0, 1]` and `p ∈ (0, 1)`.
pub fn ransac_iterations(inlier_ratio: f64, confidence: f64) -> usize {
    debug_assert!(
        inlier_ratio > 0.0 && inlier_ratio <= 1.0,
        "inlier ratio must be in (0, 1]"
    );
    debug_assert!(
        confidence > 0.0 && confidence < 1.0,
        "confidence must be in (0, 1)"
    );
    let miss = 1.0 - inlier_ratio.powi(SAMPLE_SIZE as i32);
    let k = ((1.0 - confidence).ln() / miss.ln()).ceil();
    (k as usize).saturating_add(1)
}

// ── Robust fit ───────────────────────────────────────────────────────────

/// Summary statistics for a RANSAC homography fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RansacStats {
    /// Number of correspondences fed to the estimator.
    pub n_points: usize,
    /// Number of inliers under the returned model.
    pub n_inliers: usize,
    /// Inlier fraction in [0, 1].
    pub fit_percent: f64,
    /// Mean squared per-coordinate inlier residual.
    pub mse: f64,
    /// Mean inlier reprojection error in pixels.
    pub mean_err_px: f64,
    /// 95th percentile inlier reprojection error in pixels.
    pub p95_err_px: f64,
    /// Iteration budget that was run.
    pub iterations: usize,
}

/// Result of RANSAC homography fitting.
#[derive(Debug, Clone)]
pub struct RansacResult {
    /// The fitted homography (src → dst).
    pub homography: Matrix3<f64>,
    /// Mask over the input correspondences: true for inliers of the final
    /// model.
    pub inlier_mask: Vec<bool>,
    /// Fit statistics for the final model.
    pub stats: RansacStats,
}

/// Draw 4 distinct indices in `0..n` uniformly. `n ≥ 4` guarantees
/// termination.
fn sample_indices(rng: &mut StdRng, n: usize) -> [usize; SAMPLE_SIZE] {
    let mut indices = [0usize; SAMPLE_SIZE];
    loop {
        for idx in &mut indices {
            *idx = rng.gen_range(0..n);
        }
        let distinct = (0..SAMPLE_SIZE)
            .all(|i| ((i + 1)..SAMPLE_SIZE).all(|j| indices[i] != indices[j]));
        if distinct {
            return indices;
        }
    }
}

/// Fit a homography to correspondences contaminated by outliers.
///
/// Runs the iteration budget from `config` with a `StdRng` seeded at
/// `config.seed`. Every iteration draws a minimal sample without
/// replacement, fits a candidate, and measures its inlier fraction over
/// the full set with `config.max_err`; candidates strictly above
/// `config.min_inlier_fraction` are refit on their consensus set and the
/// lowest-mse refit wins. The returned mask and statistics are recomputed
/// against the winning model.
///
/// Fails with [`HomographyError::NoModelFound`] when no iteration clears
/// the inlier-fraction gate.
pub fn fit_homography_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    config: &RansacConfig,
) -> Result<RansacResult, HomographyError> {
    let n = src.len().min(dst.len());
    if n < SAMPLE_SIZE {
        return Err(HomographyError::InsufficientCorrespondences {
            needed: SAMPLE_SIZE,
            got: n,
        });
    }

    let iterations = config.iterations();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut best: Option<Matrix3<f64>> = None;
    let mut best_mse = f64::INFINITY;

    for _ in 0..iterations {
        let idx = sample_indices(&mut rng, n);
        let sample_src: Vec<[f64; 2]> = idx.iter().map(|&i| src[i]).collect();
        let sample_dst: Vec<[f64; 2]> = idx.iter().map(|&i| dst[i]).collect();

        // A degenerate minimal sample cannot clear the gate; skip it.
        let Ok(candidate) = estimate_homography_dlt(&sample_src, &sample_dst) else {
            continue;
        };

        let (inl_src, inl_dst) = filter_inliers(&candidate, src, dst, config.max_err);
        if (inl_src.len() as f64) / (n as f64) <= config.min_inlier_fraction {
            continue;
        }

        // Refit on the consensus set, keeping the sample candidate if the
        // refit itself turns out degenerate.
        let refined = estimate_homography_dlt(&inl_src, &inl_dst).unwrap_or(candidate);
        let score = score_homography(&refined, src, dst, config.max_err);
        if score.mse < best_mse {
            best_mse = score.mse;
            best = Some(refined);
        }
    }

    let Some(homography) = best else {
        tracing::warn!(
            "homography RANSAC: no model after {} iterations over {} correspondences",
            iterations,
            n
        );
        return Err(HomographyError::NoModelFound { iterations });
    };

    // Final mask and error statistics against the winning model.
    let mut inlier_mask = vec![false; n];
    let mut inlier_errs = Vec::new();
    for i in 0..n {
        let err = reprojection_error(&homography, &src[i], &dst[i]);
        if err <= config.max_err {
            inlier_mask[i] = true;
            inlier_errs.push(err);
        }
    }
    let score = score_homography(&homography, src, dst, config.max_err);
    let stats = RansacStats {
        n_points: n,
        n_inliers: inlier_errs.len(),
        fit_percent: score.fit_percent,
        mse: score.mse,
        mean_err_px: mean(&inlier_errs),
        p95_err_px: percentile95(inlier_errs.clone()),
        iterations,
    };
    tracing::info!(
        "homography RANSAC: {}/{} inliers, mse={:.4}, mean_err={:.2}px, p95={:.2}px ({} iters)",
        stats.n_inliers,
        n,
        stats.mse,
        stats.mean_err_px,
        stats.p95_err_px,
        iterations
    );

    Ok(RansacResult {
        homography,
        inlier_mask,
        stats,
    })
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn percentile95(mut xs: Vec<f64>) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.sort_by(|a, b| a.total_cmp(b));
    let idx = ((xs.len() as f64) * 0.95).floor() as usize;
    xs[idx.min(xs.len() - 1)]
}

// ── Tests ────────────────────────────────────────────────────────────────
