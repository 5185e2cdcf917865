use image::{imageops, GrayImage, Rgb, RgbImage};
use imageproc::morphology::Mask;
use keyloc_core::{Hsv, HsvRange};
use log::debug;
use rayon::prelude::*;

use crate::colour::{in_range, invert, threshold_binary};
use crate::config::KeyingConfig;
use crate::error::{KeyingError, KeyingResult};
use crate::morphology::{clean_mask, cross_kernel};

/// Thresholds an image in HSV space and cleans the result morphologically
#[derive(Debug, Clone)]
pub struct ColourDetector {
    cfg: KeyingConfig,
    kernel: Mask,
}

impl ColourDetector {
    pub fn new(cfg: KeyingConfig) -> KeyingResult<Self> {
        cfg.validate()?;
        let kernel = cross_kernel(cfg.kernel_size);
        Ok(Self { cfg, kernel })
    }

    /// Mask of the pixels of `src` whose HSV lies in `range`, same size as `src`
    pub fn detect(&self, src: &RgbImage, range: &HsvRange) -> KeyingResult<GrayImage> {
        ensure_non_empty(src, "source")?;
        let raw = in_range(src, range);
        Ok(clean_mask(raw, &self.kernel, self.cfg.open_passes, self.cfg.close_passes))
    }

    pub fn config(&self) -> &KeyingConfig {
        &self.cfg
    }
}

/// Output of one keying pass
#[derive(Debug, Clone)]
pub struct Composite {
    /// Source with the key colour replaced by the background
    pub image: RgbImage,
    /// 255 where the background shows through
    pub mask: GrayImage,
    /// Scaled background restricted to the keyed pixels
    pub masked_background: RgbImage,
}

impl Composite {
    /// Fraction of pixels that were replaced
    pub fn coverage(&self) -> f32 {
        let total = self.mask.len();
        if total == 0 {
            return 0.0;
        }
        let keyed = self.mask.iter().filter(|&&p| p != 0).count();
        keyed as f32 / total as f32
    }
}

/// Replaces a hue band around a target colour with a background image
#[derive(Debug, Clone)]
pub struct GreenScreen {
    detector: ColourDetector,
}

impl GreenScreen {
    pub fn new(cfg: KeyingConfig) -> KeyingResult<Self> {
        Ok(Self { detector: ColourDetector::new(cfg)? })
    }

    /// Keying band for `target` under this configuration
    pub fn range_for(&self, target: Hsv) -> HsvRange {
        HsvRange::around_hue(target, self.detector.config().hue_tolerance)
    }

    pub fn apply(&self, src: &RgbImage, background: &RgbImage, target: Hsv) -> KeyingResult<Composite> {
        ensure_non_empty(src, "source")?;
        ensure_non_empty(background, "background")?;
        let cfg = self.detector.config();

        let range = self.range_for(target);
        debug!("keying hue band {:?}..={:?}", range.lower, range.upper);

        let detected = self.detector.detect(src, &range)?;
        let keep = invert(&threshold_binary(&detected, cfg.mask_threshold));
        let mask = invert(&keep);

        let (w, h) = src.dimensions();
        let scaled = imageops::resize(background, w, h, cfg.resize_filter.into());

        let masked_background = masked(&scaled, &mask)?;
        let foreground = masked(src, &keep)?;
        let image = add_saturating(&foreground, &masked_background)?;

        let composite = Composite { image, mask, masked_background };
        debug!("keyed {:.1}% of {}x{} pixels", composite.coverage() * 100.0, w, h);
        Ok(composite)
    }

    pub fn config(&self) -> &KeyingConfig {
        self.detector.config()
    }
}

/// Detects pixels in the inclusive HSV range [`lower`, `upper`] with the default cleanup
pub fn detect_colour(src: &RgbImage, lower: Hsv, upper: Hsv) -> KeyingResult<GrayImage> {
    ColourDetector::new(KeyingConfig::default())?.detect(src, &HsvRange::new(lower, upper))
}

/// Composites `background` into the pixels of `src` near `target`'s hue
pub fn green_screen(src: &RgbImage, background: &RgbImage, target: Hsv) -> KeyingResult<Composite> {
    GreenScreen::new(KeyingConfig::default())?.apply(src, background, target)
}

fn ensure_non_empty(img: &RgbImage, role: &'static str) -> KeyingResult<()> {
    if img.width() == 0 || img.height() == 0 {
        return Err(KeyingError::EmptyImage { role });
    }
    Ok(())
}

fn ensure_same_size(img: &RgbImage, mask: &GrayImage) -> KeyingResult<()> {
    if img.dimensions() != mask.dimensions() {
        return Err(KeyingError::DimensionMismatch {
            expected: img.dimensions(),
            actual: mask.dimensions(),
        });
    }
    Ok(())
}

/// Copy of `img` where `mask` is non-zero, black elsewhere
pub fn masked(img: &RgbImage, mask: &GrayImage) -> KeyingResult<RgbImage> {
    ensure_same_size(img, mask)?;
    let mut out = RgbImage::new(img.width(), img.height());
    let src: &[u8] = img;
    let gate: &[u8] = mask;
    let dst: &mut [u8] = &mut out;
    dst.par_chunks_mut(3)
        .zip(src.par_chunks(3))
        .zip(gate.par_iter())
        .for_each(|((o, i), &m)| {
            if m != 0 {
                o.copy_from_slice(i);
            }
        });
    Ok(out)
}

/// Per-channel saturating sum of two equally sized images
pub fn add_saturating(a: &RgbImage, b: &RgbImage) -> KeyingResult<RgbImage> {
    if a.dimensions() != b.dimensions() {
        return Err(KeyingError::DimensionMismatch {
            expected: a.dimensions(),
            actual: b.dimensions(),
        });
    }
    Ok(RgbImage::from_fn(a.width(), a.height(), |x, y| {
        let (p, q) = (a.get_pixel(x, y).0, b.get_pixel(x, y).0);
        Rgb([p[0].saturating_add(q[0]), p[1].saturating_add(q[1]), p[2].saturating_add(q[2])])
    }))
}
