#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest hue in the 8-bit HSV convention (degrees / 2)
pub const HUE_MAX: u8 = 180;

/// 8-bit HSV triple: hue in [0, 180), saturation and value in [0, 255]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Inclusive per-channel HSV bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvRange {
    pub const fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    /// Band of `tolerance` hues either side of `target`, clamped to [0, HUE_MAX].
    ///
    /// Saturation and value keep the target's values as lower bounds and are
    /// open up to 255.
    pub fn around_hue(target: Hsv, tolerance: u8) -> Self {
        let lower_h = target.h.saturating_sub(tolerance);
        let upper_h = (target.h as u16 + tolerance as u16).min(HUE_MAX as u16) as u8;
        Self {
            lower: Hsv::new(lower_h, target.s, target.v),
            upper: Hsv::new(upper_h, u8::MAX, u8::MAX),
        }
    }

    #[inline]
    pub fn contains(&self, px: Hsv) -> bool {
        (self.lower.h..=self.upper.h).contains(&px.h)
            && (self.lower.s..=self.upper.s).contains(&px.s)
            && (self.lower.v..=self.upper.v).contains(&px.v)
    }
}

/// Key-point ≙ segment-test corner + orientation (radians), in base-image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the sampling pattern at this keypoint's scale
    pub size: f32,
    pub angle: f32,
    pub response: f32,
    pub octave: usize,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            x,
            y,
            size,
            angle: 0.0,
            response: 0.0,
            octave: 0,
        }
    }
}

/// Number of bytes in a binary descriptor
pub const DESCRIPTOR_BYTES: usize = 64;

/// 512-bit binary descriptor = 64 bytes
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// Correspondence between a query descriptor and a train descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: u32,
}

#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Thread count used when a configuration does not pin one
pub fn default_threads() -> usize {
    num_cpus::get().max(1)
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
