use std::f64::consts::PI;

use keyloc_core::DESCRIPTOR_BYTES;

/// Ring radii of the unit pattern, before the 0.85 shrink
const RING_RADII: [f64; 5] = [0.0, 2.9, 4.9, 7.4, 10.8];
/// Points on each ring
const RING_POINTS: [usize; 5] = [1, 10, 14, 15, 20];
const RADIUS_SHRINK: f64 = 0.85;
const SIGMA_SCALE: f64 = 1.3;
const MIN_SIGMA: f64 = 0.5;
/// Pairs closer than this (times the pattern scale) feed descriptor bits
const SHORT_PAIR_MAX: f64 = 5.85;
/// Pairs further than this (times the pattern scale) feed orientation
const LONG_PAIR_MIN: f64 = 8.2;

/// Diameter of the outer ring of a unit-scale pattern; keypoint sizes are multiples of it
pub const PATTERN_DIAMETER: f32 = (2.0 * 10.8 * RADIUS_SHRINK) as f32;

/// Sampling point with its smoothing radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternPoint {
    pub x: f32,
    pub y: f32,
    pub sigma: f32,
}

/// Pair whose intensity difference contributes to the orientation estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongPair {
    pub i: usize,
    pub j: usize,
    /// (p_j - p_i) / |p_j - p_i|^2
    pub weighted_dx: f32,
    pub weighted_dy: f32,
}

/// Concentric-ring sampling pattern with its short and long point pairs
#[derive(Debug, Clone)]
pub struct BriskPattern {
    points: Vec<PatternPoint>,
    short_pairs: Vec<(usize, usize)>,
    long_pairs: Vec<LongPair>,
    extent: f32,
}

impl BriskPattern {
    pub fn new(pattern_scale: f32) -> Self {
        let scale = pattern_scale as f64;
        let mut coords: Vec<(f64, f64, f64)> = Vec::with_capacity(RING_POINTS.iter().sum());

        for (&radius, &count) in RING_RADII.iter().zip(RING_POINTS.iter()) {
            let r = radius * RADIUS_SHRINK * scale;
            let sigma = (SIGMA_SCALE * r * (PI / count as f64).sin()).max(MIN_SIGMA);
            for k in 0..count {
                let alpha = 2.0 * PI * k as f64 / count as f64;
                coords.push((r * alpha.cos(), r * alpha.sin(), sigma));
            }
        }

        let short_max = SHORT_PAIR_MAX * scale;
        let long_min = LONG_PAIR_MIN * scale;
        let mut short_pairs = Vec::with_capacity(DESCRIPTOR_BYTES * 8);
        let mut long_pairs = Vec::new();

        for i in 1..coords.len() {
            for j in 0..i {
                let dx = coords[j].0 - coords[i].0;
                let dy = coords[j].1 - coords[i].1;
                let d2 = dx * dx + dy * dy;
                let d = d2.sqrt();
                if d < short_max {
                    if short_pairs.len() < DESCRIPTOR_BYTES * 8 {
                        short_pairs.push((i, j));
                    }
                } else if d > long_min {
                    long_pairs.push(LongPair {
                        i,
                        j,
                        weighted_dx: (dx / d2) as f32,
                        weighted_dy: (dy / d2) as f32,
                    });
                }
            }
        }

        let extent = coords
            .iter()
            .map(|&(x, y, s)| (x * x + y * y).sqrt() + s)
            .fold(0.0f64, f64::max) as f32;

        let points = coords
            .into_iter()
            .map(|(x, y, sigma)| PatternPoint { x: x as f32, y: y as f32, sigma: sigma as f32 })
            .collect();

        Self { points, short_pairs, long_pairs, extent }
    }

    pub fn points(&self) -> &[PatternPoint] {
        &self.points
    }

    pub fn short_pairs(&self) -> &[(usize, usize)] {
        &self.short_pairs
    }

    pub fn long_pairs(&self) -> &[LongPair] {
        &self.long_pairs
    }

    /// Furthest reach of any smoothed sample from the keypoint at unit scale
    pub fn extent(&self) -> f32 {
        self.extent
    }
}

impl Default for BriskPattern {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_layout() {
        let pattern = BriskPattern::default();
        assert_eq!(pattern.points().len(), 60);
        assert_eq!(pattern.short_pairs().len(), 512);
        assert_eq!(pattern.long_pairs().len(), 870);
        assert_eq!(pattern.points()[0], PatternPoint { x: 0.0, y: 0.0, sigma: 0.5 });
    }

    #[test]
    fn test_pair_counts_do_not_depend_on_scale() {
        for &scale in &[0.5f32, 2.0] {
            let pattern = BriskPattern::new(scale);
            assert_eq!(pattern.short_pairs().len(), 512);
            assert_eq!(pattern.long_pairs().len(), 870);
        }
    }

    #[test]
    fn test_extent_covers_outer_ring() {
        let pattern = BriskPattern::default();
        let outer = pattern.points()[59];
        assert!((outer.x.hypot(outer.y) - 9.18).abs() < 1e-4);
        assert!((outer.sigma - 1.866).abs() < 1e-2);
        assert!((pattern.extent() - (9.18 + outer.sigma)).abs() < 1e-4);
        assert!((PATTERN_DIAMETER - 18.36).abs() < 1e-4);
    }

    #[test]
    fn test_pairs_reference_distinct_points() {
        let pattern = BriskPattern::default();
        assert!(pattern.short_pairs().iter().all(|&(i, j)| j < i && i < 60));
        assert!(pattern.long_pairs().iter().all(|p| p.j < p.i));
    }
}
