//! Drivers for the green-screen compositor and the object localiser.
//!
//! Both binaries are thin wrappers over [`run_green_screen`] and
//! [`run_object_localiser`]; window output goes through a [`Viewer`].

use std::path::{Path, PathBuf};

use image::RgbImage;
use keyloc_features::FeatureError;
use keyloc_keying::KeyingError;

pub mod keying;
pub mod localise;
pub mod viewer;

pub use keying::{list_frames, load_keying_config, run_green_screen, GreenScreenRun};
pub use localise::{run_object_localiser, LocaliserRun, Outcome};
pub use viewer::{HeadlessViewer, SnapshotViewer, Viewer};

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Image(image::ImageError),
    Keying(KeyingError),
    Features(FeatureError),
    Config(String),
    ThreadPool(rayon::ThreadPoolBuildError),
    Unreadable(PathBuf),
    NoFrames(PathBuf),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Io(e) => write!(f, "I/O error: {}", e),
            AppError::Image(e) => write!(f, "Image error: {}", e),
            AppError::Keying(e) => write!(f, "Keying error: {}", e),
            AppError::Features(e) => write!(f, "Feature error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ThreadPool(e) => write!(f, "Thread pool error: {}", e),
            AppError::Unreadable(path) => write!(f, "Could not open image {}", path.display()),
            AppError::NoFrames(path) => write!(f, "No readable frames in {}", path.display()),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Image(err)
    }
}

impl From<KeyingError> for AppError {
    fn from(err: KeyingError) -> Self {
        AppError::Keying(err)
    }
}

impl From<FeatureError> for AppError {
    fn from(err: FeatureError) -> Self {
        AppError::Features(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for AppError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        AppError::ThreadPool(err)
    }
}

impl From<Box<dyn std::error::Error>> for AppError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Size the global Rayon pool; fails if it was already initialised
pub fn configure_threads(n_threads: usize) -> AppResult<()> {
    keyloc_core::init_thread_pool(n_threads)?;
    log::debug!("using {} worker threads", n_threads);
    Ok(())
}

/// Decode an image as 8-bit RGB.
///
/// `None` when the file is missing, cannot be decoded, or has no pixels.
pub fn read_image<P: AsRef<Path>>(path: P) -> Option<RgbImage> {
    let path = path.as_ref();
    match image::open(path) {
        Ok(img) => {
            let rgb = img.to_rgb8();
            if rgb.width() == 0 || rgb.height() == 0 {
                log::warn!("{} has no pixels", path.display());
                None
            } else {
                Some(rgb)
            }
        }
        Err(e) => {
            log::debug!("failed to read {}: {}", path.display(), e);
            None
        }
    }
}
