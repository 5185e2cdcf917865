//! Binary keypoint features and object localisation.
//!
//! Pipeline: FAST 9-16 corners on an octave pyramid, BRISK-style
//! ring-pattern descriptors, brute-force Hamming matching with a ratio test,
//! and a RANSAC homography that places the object outline in the scene.

pub mod config;
pub mod descriptor;
pub mod detector;
pub mod draw;
pub mod error;
pub mod extractor;
pub mod homography;
pub mod localiser;
pub mod matcher;
pub mod pattern;
pub mod pyramid;

pub use config::{BriskConfig, LocaliserConfig, MatcherConfig, RansacConfig};
pub use descriptor::BriskDescriptor;
pub use detector::{non_maximum_suppression, FastDetector};
pub use error::{FeatureError, FeatureResult};
pub use extractor::Brisk;
pub use homography::{estimate_homography, find_homography, Homography, RansacEstimate};
pub use keyloc_core::{hamming_distance, Descriptor, Keypoint, Match};
pub use localiser::{Localisation, ObjectLocaliser};
pub use matcher::HammingMatcher;
pub use pattern::{BriskPattern, PATTERN_DIAMETER};
pub use pyramid::{ScaleLevel, ScalePyramid};
