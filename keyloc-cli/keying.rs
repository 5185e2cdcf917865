use std::path::{Path, PathBuf};

use image::ImageFormat;
use keyloc_keying::{GreenScreen, Hsv, KeyingConfig};
use log::{info, warn};

use crate::viewer::Viewer;
use crate::{read_image, AppError, AppResult};

pub const MASKED_BACKGROUND_WINDOW: &str = "masked background";
pub const COMPOSITE_WINDOW: &str = "composite";

/// Inputs and outputs of one green-screen run
#[derive(Debug, Clone)]
pub struct GreenScreenRun {
    /// A single frame, or a directory of frames
    pub input: PathBuf,
    pub background: PathBuf,
    pub target: Hsv,
    /// Output file for a single frame, output directory for a frame directory
    pub output: Option<PathBuf>,
    pub config: KeyingConfig,
}

/// Read a TOML keying configuration
#[cfg(feature = "serde")]
pub fn load_keying_config<P: AsRef<Path>>(path: P) -> AppResult<KeyingConfig> {
    Ok(KeyingConfig::load_toml(path)?)
}

#[cfg(not(feature = "serde"))]
pub fn load_keying_config<P: AsRef<Path>>(path: P) -> AppResult<KeyingConfig> {
    Err(AppError::Config(format!(
        "cannot read {}: built without serde support",
        path.as_ref().display()
    )))
}

/// Image files in `dir`, in lexical order of their names
pub fn list_frames<P: AsRef<Path>>(dir: P) -> AppResult<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && ImageFormat::from_path(p).is_ok())
        .collect();
    frames.sort();
    Ok(frames)
}

/// Composite the background into every input frame.
///
/// Returns the number of frames processed. In directory mode unreadable
/// frames are skipped with a warning.
pub fn run_green_screen(run: &GreenScreenRun, viewer: &mut dyn Viewer) -> AppResult<usize> {
    let background = read_image(&run.background).ok_or_else(|| AppError::Unreadable(run.background.clone()))?;
    let screen = GreenScreen::new(run.config.clone())?;
    info!("{}", run.config.summary());

    let batch = run.input.is_dir();
    let frames = if batch {
        let background_file = std::fs::canonicalize(&run.background)?;
        list_frames(&run.input)?
            .into_iter()
            .filter(|p| std::fs::canonicalize(p).map_or(true, |p| p != background_file))
            .collect()
    } else {
        vec![run.input.clone()]
    };
    if batch {
        if let Some(out_dir) = &run.output {
            std::fs::create_dir_all(out_dir)?;
        }
    }

    let mut processed = 0;
    for frame_path in &frames {
        let Some(frame) = read_image(frame_path) else {
            if batch {
                warn!("skipping unreadable frame {}", frame_path.display());
                continue;
            }
            return Err(AppError::Unreadable(frame_path.clone()));
        };

        let composite = screen.apply(&frame, &background, run.target)?;
        info!(
            "{}: keyed {:.1}% of pixels",
            frame_path.display(),
            composite.coverage() * 100.0
        );
        viewer.show(MASKED_BACKGROUND_WINDOW, &composite.masked_background)?;
        viewer.show(COMPOSITE_WINDOW, &composite.image)?;

        if let Some(out) = &run.output {
            let target = match (batch, frame_path.file_name()) {
                (true, Some(name)) => out.join(name),
                _ => out.clone(),
            };
            composite.image.save(&target)?;
        }
        processed += 1;
    }

    if processed == 0 {
        return Err(AppError::NoFrames(run.input.clone()));
    }

    viewer.wait_key()?;
    viewer.destroy_all();
    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_frames_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["frame_10.png", "frame_02.png", "notes.txt", "frame_01.jpg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let frames = list_frames(dir.path()).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["frame_01.jpg", "frame_02.png", "frame_10.png"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_load_keying_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keying.toml");
        std::fs::write(&path, "hue_tolerance = 15\nkernel_size = 3\n").unwrap();
        let cfg = load_keying_config(&path).unwrap();
        assert_eq!(cfg.hue_tolerance, 15);
        assert_eq!(cfg.kernel_size, 3);
        assert_eq!(cfg.open_passes, KeyingConfig::default().open_passes);

        std::fs::write(&path, "kernel_size = 4\n").unwrap();
        assert!(matches!(load_keying_config(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_list_frames_missing_dir() {
        assert!(matches!(list_frames("no/such/dir"), Err(AppError::Io(_))));
    }
}
