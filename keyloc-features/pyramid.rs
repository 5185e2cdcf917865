use image::{imageops, GrayImage};

/// Smallest side length a level above the base may have
pub const MIN_LEVEL_SIZE: u32 = 32;

/// Scale information for pyramid levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    /// Base-image pixels per level pixel
    pub scale: f32,
    pub width: u32,
    pub height: u32,
}

impl ScaleLevel {
    /// Map a level coordinate to base-image pixel coordinates
    #[inline]
    pub fn to_base(&self, x: f32, y: f32) -> (f32, f32) {
        ((x + 0.5) * self.scale - 0.5, (y + 0.5) * self.scale - 0.5)
    }
}

/// Octave pyramid: each level half the size of the previous one
#[derive(Debug, Clone)]
pub struct ScalePyramid {
    levels: Vec<ScaleLevel>,
    images: Vec<GrayImage>,
}

impl ScalePyramid {
    /// Generate octave levels for a `width` x `height` base image
    pub fn generate_scale_levels(width: u32, height: u32, octaves: usize) -> Vec<ScaleLevel> {
        let mut levels = Vec::with_capacity(octaves);
        if width == 0 || height == 0 {
            return levels;
        }
        levels.push(ScaleLevel { level: 0, scale: 1.0, width, height });

        for level in 1..octaves {
            let factor = 1u32 << level;
            let (w, h) = (width / factor, height / factor);
            if w < MIN_LEVEL_SIZE || h < MIN_LEVEL_SIZE {
                break;
            }
            levels.push(ScaleLevel {
                level,
                scale: width as f32 / w as f32,
                width: w,
                height: h,
            });
        }
        levels
    }

    /// Build the pyramid from a base image
    pub fn build(img: &GrayImage, octaves: usize) -> Self {
        let levels = Self::generate_scale_levels(img.width(), img.height(), octaves);
        let images = levels
            .iter()
            .map(|l| {
                if l.level == 0 {
                    img.clone()
                } else {
                    imageops::resize(img, l.width, l.height, imageops::FilterType::Triangle)
                }
            })
            .collect();
        Self { levels, images }
    }

    pub fn levels(&self) -> &[ScaleLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels paired with their images, base first
    pub fn iter(&self) -> impl Iterator<Item = (&ScaleLevel, &GrayImage)> {
        self.levels.iter().zip(self.images.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_halve_until_minimum() {
        let levels = ScalePyramid::generate_scale_levels(640, 480, 8);
        let sizes: Vec<_> = levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(640, 480), (320, 240), (160, 120), (80, 60)]);
        assert_eq!(levels[2].scale, 4.0);
    }

    #[test]
    fn test_octave_count_is_respected() {
        assert_eq!(ScalePyramid::generate_scale_levels(640, 480, 3).len(), 3);
        assert_eq!(ScalePyramid::generate_scale_levels(640, 480, 1).len(), 1);
    }

    #[test]
    fn test_small_image_keeps_base_only() {
        let levels = ScalePyramid::generate_scale_levels(50, 50, 3);
        assert_eq!(levels.len(), 1);
        assert!(ScalePyramid::generate_scale_levels(0, 50, 3).is_empty());
    }

    #[test]
    fn test_build_resizes_images() {
        let img = GrayImage::from_pixel(128, 96, image::Luma([77]));
        let pyramid = ScalePyramid::build(&img, 3);
        assert_eq!(pyramid.len(), 3);
        for (level, level_img) in pyramid.iter() {
            assert_eq!(level_img.dimensions(), (level.width, level.height));
            assert!(level_img.pixels().all(|p| p[0] == 77));
        }
    }

    #[test]
    fn test_to_base_maps_pixel_centres() {
        let level = ScaleLevel { level: 1, scale: 2.0, width: 10, height: 10 };
        assert_eq!(level.to_base(0.0, 0.0), (0.5, 0.5));
        assert_eq!(level.to_base(3.0, 1.0), (6.5, 2.5));
    }
}
