use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, sum_image_pixels};
use keyloc_core::{Descriptor, Keypoint, DESCRIPTOR_BYTES};
use rayon::prelude::*;

use crate::pattern::{BriskPattern, PATTERN_DIAMETER};

type IntegralImage = ImageBuffer<Luma<u64>, Vec<u64>>;

/// Binary descriptor built from pairwise comparisons of smoothed pattern samples
#[derive(Debug, Clone)]
pub struct BriskDescriptor {
    pattern: BriskPattern,
}

impl BriskDescriptor {
    pub fn new(pattern_scale: f32) -> Self {
        Self { pattern: BriskPattern::new(pattern_scale) }
    }

    pub fn pattern(&self) -> &BriskPattern {
        &self.pattern
    }

    /// Orient and describe `keypoints`.
    ///
    /// Keypoints whose scaled pattern would leave the image are dropped; the
    /// returned keypoints carry their orientation and stay index-aligned with
    /// the descriptors.
    pub fn compute(&self, img: &GrayImage, keypoints: &[Keypoint]) -> (Vec<Keypoint>, Vec<Descriptor>) {
        if img.width() == 0 || img.height() == 0 || keypoints.is_empty() {
            return (Vec::new(), Vec::new());
        }
        let sampler = Sampler::new(img);

        keypoints
            .par_iter()
            .filter(|kp| self.fits(img, kp))
            .map(|kp| self.describe(&sampler, *kp))
            .unzip()
    }

    fn fits(&self, img: &GrayImage, kp: &Keypoint) -> bool {
        let reach = self.pattern.extent() * kp.size / PATTERN_DIAMETER;
        let max_x = (img.width() - 1) as f32;
        let max_y = (img.height() - 1) as f32;
        kp.x - reach >= 0.0 && kp.y - reach >= 0.0 && kp.x + reach <= max_x && kp.y + reach <= max_y
    }

    fn describe(&self, sampler: &Sampler<'_>, mut kp: Keypoint) -> (Keypoint, Descriptor) {
        let scale = kp.size / PATTERN_DIAMETER;
        let points = self.pattern.points();

        // Orientation from the mean local gradient over the long pairs
        let upright: Vec<f32> = points
            .iter()
            .map(|p| sampler.sample(kp.x + scale * p.x, kp.y + scale * p.y, scale * p.sigma))
            .collect();
        let (mut gx, mut gy) = (0.0f32, 0.0f32);
        for pair in self.pattern.long_pairs() {
            let delta = upright[pair.i] - upright[pair.j];
            gx += delta * pair.weighted_dx;
            gy += delta * pair.weighted_dy;
        }
        kp.angle = gy.atan2(gx);

        let (sin, cos) = kp.angle.sin_cos();
        let rotated: Vec<f32> = points
            .iter()
            .map(|p| {
                let rx = kp.x + scale * (cos * p.x - sin * p.y);
                let ry = kp.y + scale * (sin * p.x + cos * p.y);
                sampler.sample(rx, ry, scale * p.sigma)
            })
            .collect();

        let mut d = [0u8; DESCRIPTOR_BYTES];
        for (k, &(i, j)) in self.pattern.short_pairs().iter().enumerate() {
            if rotated[i] > rotated[j] {
                d[k >> 3] |= 1 << (7 - (k & 7));
            }
        }
        (kp, d)
    }
}

impl Default for BriskDescriptor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Smoothed intensity lookups backed by an integral image
struct Sampler<'a> {
    img: &'a GrayImage,
    integral: IntegralImage,
    w: u32,
    h: u32,
}

impl<'a> Sampler<'a> {
    fn new(img: &'a GrayImage) -> Self {
        Self {
            img,
            integral: integral_image::<_, u64>(img),
            w: img.width(),
            h: img.height(),
        }
    }

    /// Mean intensity of the box of half-width `sigma` around (x, y);
    /// point-sized boxes fall back to bilinear interpolation
    fn sample(&self, x: f32, y: f32, sigma: f32) -> f32 {
        if sigma < 1.0 {
            return self.bilinear_sample(x, y);
        }
        let left = (x - sigma).round().clamp(0.0, (self.w - 1) as f32) as u32;
        let right = (x + sigma).round().clamp(0.0, (self.w - 1) as f32) as u32;
        let top = (y - sigma).round().clamp(0.0, (self.h - 1) as f32) as u32;
        let bottom = (y + sigma).round().clamp(0.0, (self.h - 1) as f32) as u32;
        let area = (right - left + 1) * (bottom - top + 1);
        let sum = sum_image_pixels(&self.integral, left, top, right, bottom)[0];
        sum as f32 / area as f32
    }

    /// Bilinear interpolation for subpixel sampling
    fn bilinear_sample(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.w - 1) as f32);
        let y = y.clamp(0.0, (self.h - 1) as f32);
        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.w - 1);
        let y1 = (y0 + 1).min(self.h - 1);
        let dx = x - x0 as f32;
        let dy = y - y0 as f32;

        let p00 = self.img.get_pixel(x0, y0)[0] as f32;
        let p10 = self.img.get_pixel(x1, y0)[0] as f32;
        let p01 = self.img.get_pixel(x0, y1)[0] as f32;
        let p11 = self.img.get_pixel(x1, y1)[0] as f32;

        let top = p00 + (p10 - p00) * dx;
        let bottom = p01 + (p11 - p01) * dx;
        top + (bottom - top) * dy
    }
}
