use image::GrayImage;
use keyloc_core::{Descriptor, Keypoint};
use log::debug;

use crate::config::BriskConfig;
use crate::descriptor::BriskDescriptor;
use crate::detector::FastDetector;
use crate::error::FeatureResult;

/// Multi-scale corner detection followed by binary description
#[derive(Debug, Clone)]
pub struct Brisk {
    detector: FastDetector,
    descriptor: BriskDescriptor,
}

impl Brisk {
    pub fn new(cfg: BriskConfig) -> FeatureResult<Self> {
        let descriptor = BriskDescriptor::new(cfg.pattern_scale);
        let detector = FastDetector::new(cfg)?;
        Ok(Self { detector, descriptor })
    }

    /// Detect keypoints on every octave
    pub fn detect(&self, img: &GrayImage) -> FeatureResult<Vec<Keypoint>> {
        self.detector.detect(img)
    }

    /// Describe the given keypoints; those too close to the border are dropped
    pub fn compute(&self, img: &GrayImage, kps: &[Keypoint]) -> (Vec<Keypoint>, Vec<Descriptor>) {
        self.descriptor.compute(img, kps)
    }

    /// Detect keypoints and generate descriptors in one step
    pub fn detect_and_compute(&self, img: &GrayImage) -> FeatureResult<(Vec<Keypoint>, Vec<Descriptor>)> {
        let kps = self.detect(img)?;
        let detected = kps.len();
        let (kps, descs) = self.compute(img, &kps);
        debug!("{} keypoints detected, {} described", detected, kps.len());
        Ok((kps, descs))
    }

    pub fn config(&self) -> &BriskConfig {
        self.detector.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_detect_and_compute_aligned() {
        let img = GrayImage::from_fn(120, 120, |x, y| {
            let a = (20..50).contains(&x) && (20..50).contains(&y);
            let b = (70..100).contains(&x) && (60..95).contains(&y);
            Luma([if a || b { 200 } else { 40 }])
        });
        let brisk = Brisk::new(BriskConfig::default()).unwrap();
        let (kps, descs) = brisk.detect_and_compute(&img).unwrap();
        assert!(!kps.is_empty());
        assert_eq!(kps.len(), descs.len());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = BriskConfig { threshold: 0, ..BriskConfig::default() };
        assert!(Brisk::new(cfg).is_err());
    }
}
