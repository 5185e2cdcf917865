use image::imageops::FilterType;
use keyloc_core::default_threads;
use crate::error::{KeyingError, KeyingResult};

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Interpolation used when scaling the replacement background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Lanczos,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
            ResizeFilter::Bicubic => FilterType::CatmullRom,
            ResizeFilter::Lanczos => FilterType::Lanczos3,
        }
    }
}

/// Complete keying configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KeyingConfig {
    /// Hues either side of the target that still count as the key colour
    pub hue_tolerance: u8,
    /// Side length of the cross-shaped structuring element
    pub kernel_size: u8,
    pub open_passes: u8,
    pub close_passes: u8,
    /// Cleaned mask values above this are keyed out
    pub mask_threshold: u8,
    pub resize_filter: ResizeFilter,
    pub n_threads: usize,
}

impl Default for KeyingConfig {
    fn default() -> Self {
        Self {
            hue_tolerance: 10,
            kernel_size: 5,
            open_passes: 2,
            close_passes: 2,
            mask_threshold: 100,
            resize_filter: ResizeFilter::Bilinear,
            n_threads: default_threads(),
        }
    }
}

impl KeyingConfig {
    /// Preset for noisy footage: a wider band and heavier cleanup
    pub fn noisy_footage_preset() -> Self {
        Self {
            hue_tolerance: 15,
            kernel_size: 7,
            open_passes: 3,
            close_passes: 3,
            ..Self::default()
        }
    }

    /// Preset that skips morphology entirely, keying the raw threshold
    pub fn raw_threshold_preset() -> Self {
        Self {
            open_passes: 0,
            close_passes: 0,
            ..Self::default()
        }
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "KeyingConfig: hue±{}, kernel={}x{} cross, open={}, close={}, threshold={}, filter={:?}, threads={}",
            self.hue_tolerance, self.kernel_size, self.kernel_size, self.open_passes,
            self.close_passes, self.mask_threshold, self.resize_filter, self.n_threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> KeyingResult<()> {
        if self.kernel_size % 2 == 0 || self.kernel_size > 63 {
            return Err(KeyingError::InvalidKernelSize(self.kernel_size));
        }
        if self.hue_tolerance > keyloc_core::HUE_MAX {
            return Err(KeyingError::InvalidHueTolerance(self.hue_tolerance));
        }
        if self.n_threads == 0 {
            return Err(KeyingError::InvalidThreadCount(self.n_threads));
        }
        Ok(())
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
    fn test_default_is_valid() {
        assert!(KeyingConfig::default().validate().is_ok());
        assert!(KeyingConfig::noisy_footage_preset().validate().is_ok());
        assert!(KeyingConfig::raw_threshold_preset().validate().is_ok());
    }

    #[test]
    fn test_rejects_even_kernel() {
        let cfg = KeyingConfig { kernel_size: 4, ..KeyingConfig::default() };
        assert_eq!(cfg.validate(), Err(KeyingError::InvalidKernelSize(4)));
    }

    #[test]
    fn test_rejects_wide_tolerance() {
        let cfg = KeyingConfig { hue_tolerance: 200, ..KeyingConfig::default() };
        assert_eq!(cfg.validate(), Err(KeyingError::InvalidHueTolerance(200)));
    }

    #[test]
    fn test_rejects_zero_threads() {
        let cfg = KeyingConfig { n_threads: 0, ..KeyingConfig::default() };
        assert_eq!(cfg.validate(), Err(KeyingError::InvalidThreadCount(0)));
    }

    #[test]
    fn test_summary_mentions_kernel() {
        assert!(KeyingConfig::default().summary().contains("kernel=5x5"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_partial_document_uses_defaults() {
        let cfg = KeyingConfig::from_toml("hue_tolerance = 12\nresize_filter = \"nearest\"\n").unwrap();
        assert_eq!(cfg.hue_tolerance, 12);
        assert_eq!(cfg.resize_filter, ResizeFilter::Nearest);
        assert_eq!(cfg.kernel_size, 5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_rejects_invalid_kernel() {
        let mut json = KeyingConfig::default().to_json().unwrap();
        json = json.replace("\"kernel_size\": 5", "\"kernel_size\": 6");
        assert!(KeyingConfig::from_json(&json).is_err());
    }
}
