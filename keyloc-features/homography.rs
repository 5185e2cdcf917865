//! Planar homography estimation: normalised DLT and a seeded RANSAC loop.

use log::debug;
use nalgebra::{DMatrix, Matrix3, Vector3};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::config::RansacConfig;
use crate::error::{FeatureError, FeatureResult};

/// Correspondences needed for a unique homography
pub const MIN_CORRESPONDENCES: usize = 4;

/// 3x3 projective transform mapping object-image points into the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Map a point; `None` when it lands on the line at infinity
    pub fn project(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let p = self.0 * Vector3::new(x, y, 1.0);
        if p[2].abs() > 1e-10 {
            Some((p[0] / p[2], p[1] / p[2]))
        } else {
            None
        }
    }

    fn reprojection_error(&self, src: (f64, f64), dst: (f64, f64)) -> f64 {
        match self.project(src.0, src.1) {
            Some((x, y)) => ((x - dst.0).powi(2) + (y - dst.1).powi(2)).sqrt(),
            None => f64::INFINITY,
        }
    }
}

/// Best model found by [`find_homography`] with its inlier mask
#[derive(Debug, Clone)]
pub struct RansacEstimate {
    pub homography: Homography,
    /// One flag per input correspondence
    pub inliers: Vec<bool>,
}

impl RansacEstimate {
    pub fn inlier_count(&self) -> usize {
        self.inliers.iter().filter(|&&i| i).count()
    }
}

/// Similarity that moves the centroid to the origin and the mean distance to sqrt(2)
fn normalising_transform(points: &[(f64, f64)]) -> Matrix3<f64> {
    let n = points.len() as f64;
    let (cx, cy) = points.iter().fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    let (cx, cy) = (cx / n, cy / n);
    let mean_dist = points
        .iter()
        .map(|&(x, y)| ((x - cx).powi(2) + (y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-12 { std::f64::consts::SQRT_2 / mean_dist } else { 1.0 };
    Matrix3::new(
        s, 0.0, -s * cx,
        0.0, s, -s * cy,
        0.0, 0.0, 1.0,
    )
}

fn apply(t: &Matrix3<f64>, (x, y): (f64, f64)) -> (f64, f64) {
    (t[(0, 0)] * x + t[(0, 2)], t[(1, 1)] * y + t[(1, 2)])
}

/// Least-squares homography through all correspondences (at least four).
///
/// Returns `None` when the system is degenerate.
pub fn estimate_homography(src: &[(f64, f64)], dst: &[(f64, f64)]) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < MIN_CORRESPONDENCES {
        return None;
    }
    let t_src = normalising_transform(src);
    let t_dst = normalising_transform(dst);

    // Pad to at least 9 rows so V^T carries the full null space
    let rows = (src.len() * 2).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);
    for (i, (&s, &d)) in src.iter().zip(dst.iter()).enumerate() {
        let (x1, y1) = apply(&t_src, s);
        let (x2, y2) = apply(&t_dst, d);
        let r = i * 2;
        a[(r, 0)] = -x1;
        a[(r, 1)] = -y1;
        a[(r, 2)] = -1.0;
        a[(r, 6)] = x2 * x1;
        a[(r, 7)] = x2 * y1;
        a[(r, 8)] = x2;
        a[(r + 1, 3)] = -x1;
        a[(r + 1, 4)] = -y1;
        a[(r + 1, 5)] = -1.0;
        a[(r + 1, 6)] = y2 * x1;
        a[(r + 1, 7)] = y2 * y1;
        a[(r + 1, 8)] = y2;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let h = v_t.row(8);
    let normalised = Matrix3::new(
        h[0], h[1], h[2],
        h[3], h[4], h[5],
        h[6], h[7], h[8],
    );

    let denormalised = t_dst.try_inverse()? * normalised * t_src;
    let scale = denormalised[(2, 2)];
    if scale.abs() < 1e-12 || !denormalised.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(Homography(denormalised / scale))
}

/// Twice the signed area of the triangle abc
fn cross(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// True when any three of the four points are (nearly) collinear
fn is_degenerate(points: &[(f64, f64); 4]) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    TRIPLES
        .iter()
        .any(|&(i, j, k)| cross(points[i], points[j], points[k]).abs() < 1e-3)
}

fn mark_inliers(
    h: &Homography,
    src: &[(f64, f64)],
    dst: &[(f64, f64)],
    threshold: f64,
) -> (Vec<bool>, usize) {
    let inliers: Vec<bool> = src
        .iter()
        .zip(dst.iter())
        .map(|(&s, &d)| h.reprojection_error(s, d) <= threshold)
        .collect();
    let count = inliers.iter().filter(|&&i| i).count();
    (inliers, count)
}

/// Iterations needed to draw one all-inlier sample with the configured confidence
fn required_iterations(inlier_ratio: f64, confidence: f64, cap: usize) -> usize {
    let p_good_sample = inlier_ratio.powi(MIN_CORRESPONDENCES as i32);
    if p_good_sample >= 1.0 {
        return 1;
    }
    let denom = (-p_good_sample).ln_1p();
    if denom >= 0.0 {
        return cap;
    }
    let needed = ((1.0 - confidence).ln() / denom).ceil();
    if needed.is_finite() && needed >= 0.0 {
        (needed as usize).clamp(1, cap)
    } else {
        cap
    }
}

/// Robustly fit a homography mapping `src[i]` to `dst[i]`.
///
/// Samples are drawn from a `StdRng` seeded with `cfg.seed`, so results are
/// repeatable. The winning model is refit on all of its inliers.
pub fn find_homography(
    src: &[(f64, f64)],
    dst: &[(f64, f64)],
    cfg: &RansacConfig,
) -> FeatureResult<RansacEstimate> {
    cfg.validate()?;
    let n = src.len().min(dst.len());
    if n < MIN_CORRESPONDENCES {
        return Err(FeatureError::InsufficientMatches { found: n, required: MIN_CORRESPONDENCES });
    }
    let (src, dst) = (&src[..n], &dst[..n]);

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut best: Option<(Homography, Vec<bool>, usize)> = None;
    let mut iterations = cfg.max_iterations;
    let mut iter = 0;

    while iter < iterations {
        iter += 1;
        let sample = index::sample(&mut rng, n, MIN_CORRESPONDENCES);
        let mut s = [(0.0, 0.0); 4];
        let mut d = [(0.0, 0.0); 4];
        for (k, idx) in sample.iter().enumerate() {
            s[k] = src[idx];
            d[k] = dst[idx];
        }
        if is_degenerate(&s) || is_degenerate(&d) {
            continue;
        }
        let Some(h) = estimate_homography(&s, &d) else {
            continue;
        };

        let (inliers, count) = mark_inliers(&h, src, dst, cfg.reprojection_threshold);
        if best.as_ref().map_or(true, |(_, _, c)| count > *c) {
            iterations = required_iterations(count as f64 / n as f64, cfg.confidence, cfg.max_iterations)
                .max(iter);
            best = Some((h, inliers, count));
        }
    }

    let Some((h, inliers, count)) = best else {
        return Err(FeatureError::DegenerateGeometry);
    };
    if count < MIN_CORRESPONDENCES {
        return Err(FeatureError::DegenerateGeometry);
    }

    let (in_src, in_dst): (Vec<_>, Vec<_>) = src
        .iter()
        .zip(dst.iter())
        .zip(inliers.iter())
        .filter(|(_, keep)| **keep)
        .map(|((&s, &d), _)| (s, d))
        .unzip();

    let (homography, inliers) = match estimate_homography(&in_src, &in_dst) {
        Some(refit) => {
            let (refit_inliers, refit_count) = mark_inliers(&refit, src, dst, cfg.reprojection_threshold);
            if refit_count >= count {
                (refit, refit_inliers)
            } else {
                (h, inliers)
            }
        }
        None => (h, inliers),
    };

    let estimate = RansacEstimate { homography, inliers };
    debug!(
        "homography after {} iterations: {}/{} inliers",
        iter,
        estimate.inlier_count(),
        n
    );
    Ok(estimate)
}
