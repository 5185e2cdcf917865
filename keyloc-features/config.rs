use keyloc_core::default_threads;
use crate::error::{FeatureError, FeatureResult};

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Keypoint detection and description settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BriskConfig {
    /// Segment-test contrast threshold
    pub threshold: u8,
    /// Pyramid octaves searched, each half the size of the previous
    pub octaves: usize,
    /// Multiplier on the sampling pattern radii
    pub pattern_scale: f32,
    /// Strongest keypoints kept per image
    pub max_keypoints: usize,
    /// Minimum spacing between kept keypoints, in pixels of their pyramid level
    pub nms_radius: f32,
}

impl Default for BriskConfig {
    fn default() -> Self {
        Self {
            threshold: 30,
            octaves: 3,
            pattern_scale: 1.0,
            max_keypoints: 1000,
            nms_radius: 3.0,
        }
    }
}

impl BriskConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> FeatureResult<()> {
        if self.threshold == 0 || self.threshold > 127 {
            return Err(FeatureError::InvalidThreshold(self.threshold));
        }
        if self.octaves == 0 || self.octaves > 8 {
            return Err(FeatureError::InvalidOctaves(self.octaves));
        }
        if !self.pattern_scale.is_finite() || self.pattern_scale <= 0.0 {
            return Err(FeatureError::InvalidPatternScale(self.pattern_scale));
        }
        if !self.nms_radius.is_finite() || self.nms_radius < 0.0 {
            return Err(FeatureError::InvalidNmsRadius(self.nms_radius));
        }
        if self.max_keypoints == 0 {
            return Err(FeatureError::InvalidMaxKeypoints(self.max_keypoints));
        }
        Ok(())
    }
}

/// Descriptor matching settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatcherConfig {
    /// Lowe ratio: keep a match only if best < ratio * second best
    pub ratio: Option<f32>,
    /// Keep a match only if it is also the best match in the reverse direction
    pub cross_check: bool,
    /// Reject matches whose Hamming distance exceeds this
    pub max_distance: Option<u32>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            ratio: Some(0.8),
            cross_check: false,
            max_distance: None,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> FeatureResult<()> {
        if let Some(r) = self.ratio {
            if !(r > 0.0 && r <= 1.0) {
                return Err(FeatureError::InvalidRatio(r));
            }
        }
        Ok(())
    }
}

/// Robust homography estimation settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RansacConfig {
    /// Maximum reprojection error of an inlier, in pixels
    pub reprojection_threshold: f64,
    pub max_iterations: usize,
    /// Probability of drawing at least one outlier-free sample
    pub confidence: f64,
    /// Seed for sample selection; fixed so runs are repeatable
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            reprojection_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            seed: 0x5eed,
        }
    }
}

impl RansacConfig {
    pub fn validate(&self) -> FeatureResult<()> {
        if !(self.reprojection_threshold > 0.0) {
            return Err(FeatureError::InvalidRansac(format!(
                "reprojection threshold {} must be > 0",
                self.reprojection_threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(FeatureError::InvalidRansac("max_iterations must be > 0".to_string()));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(FeatureError::InvalidRansac(format!(
                "confidence {} must be in (0, 1)",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Complete object-localisation configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocaliserConfig {
    /// Draw every detected keypoint, not only matched ones
    pub draw_keypoints: bool,
    /// Draw only RANSAC inliers when a homography was found
    pub inliers_only: bool,
    pub n_threads: usize,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    pub brisk: BriskConfig,
    pub matcher: MatcherConfig,
    pub ransac: RansacConfig,
}

impl Default for LocaliserConfig {
    fn default() -> Self {
        Self {
            draw_keypoints: true,
            inliers_only: true,
            n_threads: default_threads(),
            name: None,
            brisk: BriskConfig::default(),
            matcher: MatcherConfig::default(),
            ransac: RansacConfig::default(),
        }
    }
}

impl LocaliserConfig {
    /// Fast preset: fewer octaves and keypoints, higher contrast threshold
    pub fn fast_preset() -> Self {
        Self {
            brisk: BriskConfig {
                threshold: 45,
                octaves: 2,
                max_keypoints: 400,
                ..BriskConfig::default()
            },
            name: Some("Fast".to_string()),
            ..Self::default()
        }
    }

    /// Quality preset: more keypoints, stricter matching
    pub fn quality_preset() -> Self {
        Self {
            brisk: BriskConfig {
                threshold: 20,
                octaves: 4,
                max_keypoints: 3000,
                nms_radius: 2.0,
                ..BriskConfig::default()
            },
            matcher: MatcherConfig {
                ratio: Some(0.75),
                cross_check: true,
                max_distance: None,
            },
            ransac: RansacConfig {
                reprojection_threshold: 2.0,
                max_iterations: 5000,
                ..RansacConfig::default()
            },
            name: Some("Quality".to_string()),
            ..Self::default()
        }
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "LocaliserConfig{}: threshold={}, octaves={}, max_kp={}, ratio={:?}, cross_check={}, ransac_px={:.1}, threads={}",
            self.name.as_deref().map(|n| format!(" [{}]", n)).unwrap_or_default(),
            self.brisk.threshold, self.brisk.octaves, self.brisk.max_keypoints,
            self.matcher.ratio, self.matcher.cross_check,
            self.ransac.reprojection_threshold, self.n_threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> FeatureResult<()> {
        self.brisk.validate()?;
        self.matcher.validate()?;
        self.ransac.validate()
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(LocaliserConfig::default().validate().is_ok());
        assert!(LocaliserConfig::fast_preset().validate().is_ok());
        assert!(LocaliserConfig::quality_preset().validate().is_ok());
    }

    #[test]
    fn test_invalid_threshold() {
        let mut cfg = BriskConfig::default();
        cfg.threshold = 0;
        assert_eq!(cfg.validate(), Err(FeatureError::InvalidThreshold(0)));
        cfg.threshold = 200;
        assert_eq!(cfg.validate(), Err(FeatureError::InvalidThreshold(200)));
    }

    #[test]
    fn test_invalid_octaves_and_scale() {
        let cfg = BriskConfig { octaves: 0, ..BriskConfig::default() };
        assert_eq!(cfg.validate(), Err(FeatureError::InvalidOctaves(0)));
        let cfg = BriskConfig { pattern_scale: -1.0, ..BriskConfig::default() };
        assert!(matches!(cfg.validate(), Err(FeatureError::InvalidPatternScale(_))));
    }

    #[test]
    fn test_invalid_suppression_and_cap() {
        let cfg = BriskConfig { nms_radius: f32::NAN, ..BriskConfig::default() };
        assert!(matches!(cfg.validate(), Err(FeatureError::InvalidNmsRadius(_))));
        let cfg = BriskConfig { nms_radius: -2.0, ..BriskConfig::default() };
        assert_eq!(cfg.validate(), Err(FeatureError::InvalidNmsRadius(-2.0)));
        let cfg = BriskConfig { nms_radius: 0.0, ..BriskConfig::default() };
        assert!(cfg.validate().is_ok());
        let cfg = BriskConfig { max_keypoints: 0, ..BriskConfig::default() };
        assert_eq!(cfg.validate(), Err(FeatureError::InvalidMaxKeypoints(0)));
    }

    #[test]
    fn test_invalid_ratio() {
        let cfg = MatcherConfig { ratio: Some(1.5), ..MatcherConfig::default() };
        assert!(matches!(cfg.validate(), Err(FeatureError::InvalidRatio(_))));
        let cfg = MatcherConfig { ratio: None, ..MatcherConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_ransac() {
        let cfg = RansacConfig { confidence: 1.0, ..RansacConfig::default() };
        assert!(matches!(cfg.validate(), Err(FeatureError::InvalidRansac(_))));
        let cfg = RansacConfig { max_iterations: 0, ..RansacConfig::default() };
        assert!(matches!(cfg.validate(), Err(FeatureError::InvalidRansac(_))));
    }

    #[test]
    fn test_summary_includes_name() {
        assert!(LocaliserConfig::quality_preset().summary().contains("[Quality]"));
        assert!(!LocaliserConfig::default().summary().contains('['));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_roundtrip_preserves_nested_sections() {
        let cfg = LocaliserConfig::quality_preset();
        let parsed = LocaliserConfig::from_toml(&cfg.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, cfg);
    }
}
