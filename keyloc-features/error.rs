#[derive(Debug, Clone, PartialEq)]
pub enum FeatureError {
    InvalidImageSize { width: u32, height: u32 },
    ImageTooSmall { width: u32, height: u32, min_size: u32 },
    InvalidThreshold(u8),
    InvalidOctaves(usize),
    InvalidPatternScale(f32),
    InvalidNmsRadius(f32),
    InvalidMaxKeypoints(usize),
    InvalidRatio(f32),
    InvalidRansac(String),
    InsufficientMatches { found: usize, required: usize },
    DegenerateGeometry,
}

impl std::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be > 0)", width, height)
            }
            FeatureError::ImageTooSmall { width, height, min_size } => {
                write!(f, "Image {}x{} too small (minimum {}x{})", width, height, min_size, min_size)
            }
            FeatureError::InvalidThreshold(t) => {
                write!(f, "Invalid threshold: {} (must be 1-127)", t)
            }
            FeatureError::InvalidOctaves(n) => {
                write!(f, "Invalid octave count: {} (must be 1-8)", n)
            }
            FeatureError::InvalidPatternScale(s) => {
                write!(f, "Invalid pattern scale: {} (must be finite and > 0)", s)
            }
            FeatureError::InvalidNmsRadius(r) => {
                write!(f, "Invalid suppression radius: {} (must be finite and >= 0)", r)
            }
            FeatureError::InvalidMaxKeypoints(n) => {
                write!(f, "Invalid keypoint cap: {} (must be > 0)", n)
            }
            FeatureError::InvalidRatio(r) => {
                write!(f, "Invalid ratio-test threshold: {} (must be in (0, 1])", r)
            }
            FeatureError::InvalidRansac(reason) => {
                write!(f, "Invalid RANSAC settings: {}", reason)
            }
            FeatureError::InsufficientMatches { found, required } => {
                write!(f, "Not enough matches for a homography: {} (need {})", found, required)
            }
            FeatureError::DegenerateGeometry => {
                write!(f, "Matched points are degenerate; no homography could be estimated")
            }
        }
    }
}

impl std::error::Error for FeatureError {}

pub type FeatureResult<T> = Result<T, FeatureError>;
