use image::GrayImage;
use keyloc_core::Keypoint;
use log::debug;
use rayon::prelude::*;

use crate::config::BriskConfig;
use crate::error::{FeatureError, FeatureResult};
use crate::pattern::PATTERN_DIAMETER;
use crate::pyramid::{ScaleLevel, ScalePyramid};

/// Segment-test circle of radius 3, clockwise from 12 o'clock
pub const FAST_OFFSETS: [(i32, i32); 16] = [
    (0, -3), (1, -3), (2, -2), (3, -1),
    (3, 0), (3, 1), (2, 2), (1, 3),
    (0, 3), (-1, 3), (-2, 2), (-3, 1),
    (-3, 0), (-3, -1), (-2, -2), (-1, -3),
];

/// Contiguous circle pixels required for a corner
pub const ARC_LENGTH: u32 = 9;

/// Segment test needs a 3-pixel border on each side
pub const MIN_SIZE: u32 = 7;

/// Multi-octave FAST 9-16 corner detector
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: BriskConfig,
}

impl FastDetector {
    /// Creates a new detector with validation
    pub fn new(cfg: BriskConfig) -> FeatureResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &BriskConfig {
        &self.cfg
    }

    /// Detect corners on every octave, strongest first, in base-image coordinates
    pub fn detect(&self, img: &GrayImage) -> FeatureResult<Vec<Keypoint>> {
        validate_image(img)?;
        let pyramid = ScalePyramid::build(img, self.cfg.octaves);

        let per_level: Vec<Vec<Keypoint>> = pyramid
            .iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(level, level_img)| {
                let raw = self.detect_at_level(level_img);
                let kept = non_maximum_suppression(&raw, self.cfg.nms_radius);
                debug!(
                    "octave {} ({}x{}): {} corners, {} after suppression",
                    level.level, level.width, level.height, raw.len(), kept.len()
                );
                kept.into_iter().map(|kp| to_base(kp, level)).collect()
            })
            .collect();

        let mut keypoints: Vec<Keypoint> = per_level.into_iter().flatten().collect();
        keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
        keypoints.truncate(self.cfg.max_keypoints);
        Ok(keypoints)
    }

    /// Segment-test corners of one pyramid level, in that level's pixel coordinates
    pub fn detect_at_level(&self, img: &GrayImage) -> Vec<Keypoint> {
        let (width, height) = img.dimensions();
        if width < MIN_SIZE || height < MIN_SIZE {
            return Vec::new();
        }
        let threshold = self.cfg.threshold as i16;

        let rows: Vec<Vec<Keypoint>> = (3..height - 3)
            .into_par_iter()
            .map(|y| {
                let mut row_keypoints = Vec::new();
                for x in 3..width - 3 {
                    if let Some(score) = corner_score(img, x, y, threshold) {
                        let mut kp = Keypoint::new(x as f32, y as f32, PATTERN_DIAMETER);
                        kp.response = score;
                        row_keypoints.push(kp);
                    }
                }
                row_keypoints
            })
            .collect();

        rows.into_iter().flatten().collect()
    }
}

fn validate_image(img: &GrayImage) -> FeatureResult<()> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(FeatureError::InvalidImageSize { width, height });
    }
    if width < MIN_SIZE || height < MIN_SIZE {
        return Err(FeatureError::ImageTooSmall { width, height, min_size: MIN_SIZE });
    }
    Ok(())
}

fn to_base(mut kp: Keypoint, level: &ScaleLevel) -> Keypoint {
    let (x, y) = level.to_base(kp.x, kp.y);
    kp.x = x;
    kp.y = y;
    kp.size = PATTERN_DIAMETER * level.scale;
    kp.octave = level.level;
    kp
}

/// Bitmasks of circle pixels brighter than `p + t` and darker than `p - t`
#[inline]
fn classify_circle(img: &GrayImage, x: u32, y: u32, threshold: i16) -> (u32, u32) {
    let center = img.get_pixel(x, y)[0] as i16;
    let mut brighter = 0u32;
    let mut darker = 0u32;
    for (i, &(dx, dy)) in FAST_OFFSETS.iter().enumerate() {
        let px = img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as i16;
        if px > center + threshold {
            brighter |= 1 << i;
        } else if px < center - threshold {
            darker |= 1 << i;
        }
    }
    (brighter, darker)
}

/// True when the 16-bit circular mask holds a run of `ARC_LENGTH` set bits
#[inline]
fn has_arc(mask: u32) -> bool {
    let mut run = mask | (mask << 16);
    for _ in 1..ARC_LENGTH {
        run &= run >> 1;
    }
    run != 0
}

/// Corner response at (x, y), or `None` when the segment test fails
fn corner_score(img: &GrayImage, x: u32, y: u32, threshold: i16) -> Option<f32> {
    let center = img.get_pixel(x, y)[0] as i16;

    // Any 9-arc covers at least two of the four compass pixels
    let mut bright_compass = 0;
    let mut dark_compass = 0;
    for &(dx, dy) in [FAST_OFFSETS[0], FAST_OFFSETS[4], FAST_OFFSETS[8], FAST_OFFSETS[12]].iter() {
        let px = img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as i16;
        if px > center + threshold {
            bright_compass += 1;
        } else if px < center - threshold {
            dark_compass += 1;
        }
    }
    if bright_compass < 2 && dark_compass < 2 {
        return None;
    }

    let (brighter, darker) = classify_circle(img, x, y, threshold);
    let bright_corner = has_arc(brighter);
    let dark_corner = has_arc(darker);
    if !bright_corner && !dark_corner {
        return None;
    }

    let mut bright_sum = 0i32;
    let mut dark_sum = 0i32;
    for &(dx, dy) in FAST_OFFSETS.iter() {
        let px = img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as i16;
        let diff = px - center;
        if diff > threshold {
            bright_sum += (diff - threshold) as i32;
        } else if -diff > threshold {
            dark_sum += (-diff - threshold) as i32;
        }
    }

    let score = match (bright_corner, dark_corner) {
        (true, true) => bright_sum.max(dark_sum),
        (true, false) => bright_sum,
        _ => dark_sum,
    };
    Some(score as f32)
}

/// Greedy suppression: strongest first, drop anything within `min_distance` of a kept point.
///
/// Kept points are bucketed on a grid of `min_distance` cells, so each candidate
/// is only compared against the kept points in its 3x3 neighbourhood.
pub fn non_maximum_suppression(keypoints: &[Keypoint], min_distance: f32) -> Vec<Keypoint> {
    if keypoints.is_empty() {
        return Vec::new();
    }

    let mut sorted = keypoints.to_vec();
    sorted.sort_by(|a, b| b.response.total_cmp(&a.response));
    if !min_distance.is_finite() || min_distance <= 0.0 {
        return sorted;
    }

    let (min_x, min_y, max_x, max_y) = sorted.iter().fold(
        (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        |(x0, y0, x1, y1), kp| (x0.min(kp.x), y0.min(kp.y), x1.max(kp.x), y1.max(kp.y)),
    );
    let cell_size = min_distance.max(1.0);
    let grid_cols = ((max_x - min_x) / cell_size) as usize + 1;
    let grid_rows = ((max_y - min_y) / cell_size) as usize + 1;
    let cell_of = |kp: &Keypoint| {
        let col = (((kp.x - min_x) / cell_size) as usize).min(grid_cols - 1);
        let row = (((kp.y - min_y) / cell_size) as usize).min(grid_rows - 1);
        (col, row)
    };

    let min_distance_sq = min_distance * min_distance;
    let mut grid: Vec<Vec<usize>> = vec![Vec::new(); grid_cols * grid_rows];
    let mut kept: Vec<Keypoint> = Vec::new();

    for candidate in sorted {
        let (col, row) = cell_of(&candidate);
        let mut is_local_max = true;
        'search: for r in row.saturating_sub(1)..=(row + 1).min(grid_rows - 1) {
            for c in col.saturating_sub(1)..=(col + 1).min(grid_cols - 1) {
                for &idx in &grid[r * grid_cols + c] {
                    let dx = candidate.x - kept[idx].x;
                    let dy = candidate.y - kept[idx].y;
                    if dx * dx + dy * dy < min_distance_sq {
                        is_local_max = false;
                        break 'search;
                    }
                }
            }
        }
        if is_local_max {
            grid[row * grid_cols + col].push(kept.len());
            kept.push(candidate);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn create_test_detector() -> FastDetector {
        FastDetector::new(BriskConfig { octaves: 1, ..BriskConfig::default() }).unwrap()
    }

    fn square_image() -> GrayImage {
        GrayImage::from_fn(64, 64, |x, y| {
            if (20..44).contains(&x) && (20..44).contains(&y) {
                Luma([220])
            } else {
                Luma([30])
            }
        })
    }

    #[test]
    fn test_has_arc() {
        assert!(has_arc(0b1_1111_1111));
        assert!(!has_arc(0b1111_1111));
        // Run that wraps from bit 15 to bit 0
        assert!(has_arc(0b1111_0000_0000_0000 | 0b1_1111));
        assert!(has_arc(0xFFFF));
        assert!(!has_arc(0b0101_0101_0101_0101));
    }

    #[test]
    fn test_uniform_image_has_no_corners() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        let detector = create_test_detector();
        assert!(detector.detect(&img).unwrap().is_empty());
    }

    #[test]
    fn test_square_corners_detected() {
        let detector = create_test_detector();
        let kps = detector.detect(&square_image()).unwrap();
        assert!(!kps.is_empty());
        for &(cx, cy) in &[(20.0, 20.0), (43.0, 20.0), (20.0, 43.0), (43.0, 43.0)] {
            let near = kps.iter().any(|kp| (kp.x - cx).abs() <= 2.0 && (kp.y - cy).abs() <= 2.0);
            assert!(near, "no keypoint near corner ({}, {})", cx, cy);
        }
        // Straight edges away from the corners are not segment-test corners
        assert!(!kps.iter().any(|kp| (kp.x - 32.0).abs() < 4.0 && (kp.y - 20.0).abs() < 2.0));
    }

    #[test]
    fn test_keypoints_sorted_and_capped() {
        let cfg = BriskConfig { octaves: 1, max_keypoints: 2, ..BriskConfig::default() };
        let detector = FastDetector::new(cfg).unwrap();
        let kps = detector.detect(&square_image()).unwrap();
        assert_eq!(kps.len(), 2);
        assert!(kps[0].response >= kps[1].response);
    }

    #[test]
    fn test_suppression_spacing() {
        let detector = create_test_detector();
        let kps = detector.detect(&square_image()).unwrap();
        for (i, a) in kps.iter().enumerate() {
            for b in &kps[i + 1..] {
                let d2 = (a.x - b.x).powi(2) + (a.y - b.y).powi(2);
                assert!(d2 >= 9.0);
            }
        }
    }

    #[test]
    fn test_higher_octaves_map_to_base_coordinates() {
        let img = GrayImage::from_fn(256, 256, |x, y| {
            if (64..192).contains(&x) && (64..192).contains(&y) {
                Luma([230])
            } else {
                Luma([20])
            }
        });
        let detector = FastDetector::new(BriskConfig::default()).unwrap();
        let kps = detector.detect(&img).unwrap();
        let upper: Vec<_> = kps.iter().filter(|kp| kp.octave > 0).collect();
        assert!(!upper.is_empty());
        for kp in upper {
            assert!(kp.size > PATTERN_DIAMETER);
            let near_corner = [(64.0, 64.0), (191.0, 64.0), (64.0, 191.0), (191.0, 191.0)]
                .iter()
                .any(|&(cx, cy): &(f32, f32)| (kp.x - cx).abs() <= 6.0 && (kp.y - cy).abs() <= 6.0);
            assert!(near_corner, "octave {} keypoint at ({}, {})", kp.octave, kp.x, kp.y);
        }
    }

    #[test]
    fn test_rejects_tiny_and_empty_images() {
        let detector = create_test_detector();
        assert_eq!(
            detector.detect(&GrayImage::new(0, 0)),
            Err(FeatureError::InvalidImageSize { width: 0, height: 0 })
        );
        assert!(matches!(
            detector.detect(&GrayImage::new(5, 40)),
            Err(FeatureError::ImageTooSmall { min_size: 7, .. })
        ));
    }

    #[test]
    fn test_nms_keeps_strongest() {
        let mut a = Keypoint::new(10.0, 10.0, 1.0);
        a.response = 5.0;
        let mut b = Keypoint::new(11.0, 10.0, 1.0);
        b.response = 9.0;
        let mut c = Keypoint::new(30.0, 10.0, 1.0);
        c.response = 1.0;
        let kept = non_maximum_suppression(&[a, b, c], 3.0);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].x, 11.0);
        assert_eq!(kept[1].x, 30.0);
    }

    /// Pairwise reference: every kept point checked against every other
    fn greedy_reference(keypoints: &[Keypoint], min_distance: f32) -> Vec<Keypoint> {
        let mut sorted = keypoints.to_vec();
        sorted.sort_by(|a, b| b.response.total_cmp(&a.response));
        let mut kept: Vec<Keypoint> = Vec::new();
        for candidate in sorted {
            if kept.iter().all(|k| (candidate.x - k.x).powi(2) + (candidate.y - k.y).powi(2) >= min_distance * min_distance) {
                kept.push(candidate);
            }
        }
        kept
    }

    fn scattered_keypoints(n: u32) -> Vec<Keypoint> {
        (0..n)
            .map(|i| {
                let h = i.wrapping_mul(2654435761);
                let mut kp = Keypoint::new((h % 97) as f32 * 0.5, ((h >> 8) % 89) as f32 * 0.5, 1.0);
                kp.response = ((h >> 16) % 1000) as f32;
                kp
            })
            .collect()
    }

    #[test]
    fn test_nms_matches_pairwise_greedy() {
        let kps = scattered_keypoints(3000);
        for &radius in &[0.7f32, 3.0, 7.5] {
            let fast = non_maximum_suppression(&kps, radius);
            let reference = greedy_reference(&kps, radius);
            assert_eq!(fast, reference, "radius {}", radius);
        }
    }

    #[test]
    fn test_nms_zero_radius_keeps_everything() {
        let kps = scattered_keypoints(50);
        assert_eq!(non_maximum_suppression(&kps, 0.0).len(), 50);
    }

    #[test]
    fn test_nms_dense_lattice() {
        // One candidate per pixel of a 600x400 level
        let kps: Vec<Keypoint> = (0..400u32)
            .flat_map(|y| {
                (0..600u32).map(move |x| {
                    let mut kp = Keypoint::new(x as f32, y as f32, 1.0);
                    kp.response = ((x * 7 + y * 13) % 31) as f32;
                    kp
                })
            })
            .collect();
        let kept = non_maximum_suppression(&kps, 3.0);
        assert!(!kept.is_empty());
        // A 3 px radius leaves at most one point per 2x2 block
        assert!(kept.len() <= 600 * 400 / 4);

        let occupied: std::collections::HashSet<(i32, i32)> =
            kept.iter().map(|kp| (kp.x as i32, kp.y as i32)).collect();
        for kp in &kept {
            let (x, y) = (kp.x as i32, kp.y as i32);
            for dy in -2..=2 {
                for dx in -2..=2 {
                    if (dx, dy) != (0, 0) && dx * dx + dy * dy < 9 {
                        assert!(!occupied.contains(&(x + dx, y + dy)));
                    }
                }
            }
        }
    }

    #[test]
    fn test_dense_texture_detection() {
        let img = GrayImage::from_fn(640, 480, |x, y| {
            let h = (x / 2).wrapping_mul(374761393) ^ (y / 2).wrapping_mul(668265263);
            Luma([((h ^ (h >> 13)).wrapping_mul(1274126177) >> 24) as u8])
        });
        let detector = FastDetector::new(BriskConfig::default()).unwrap();
        assert!(detector.detect_at_level(&img).len() > 10_000);
        let kps = detector.detect(&img).unwrap();
        assert_eq!(kps.len(), BriskConfig::default().max_keypoints);
    }
}
