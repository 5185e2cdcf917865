//! Colour keying: HSV range detection and green-screen compositing.
//!
//! Images are `image::RgbImage` in R, G, B byte order; masks are
//! single-channel `image::GrayImage` of the same dimensions, 255 for
//! selected pixels.

pub mod colour;
pub mod compositor;
pub mod config;
pub mod error;
pub mod morphology;

pub use colour::{in_range, invert, rgb_to_hsv, threshold_binary};
pub use compositor::{
    add_saturating, detect_colour, green_screen, masked, ColourDetector, Composite, GreenScreen,
};
pub use config::{KeyingConfig, ResizeFilter};
pub use error::{KeyingError, KeyingResult};
pub use keyloc_core::{Hsv, HsvRange, HUE_MAX};
pub use morphology::{clean_mask, cross_kernel};
