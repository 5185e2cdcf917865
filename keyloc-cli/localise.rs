use std::path::{Path, PathBuf};

use keyloc_features::{LocaliserConfig, ObjectLocaliser};
use log::info;

use crate::viewer::Viewer;
use crate::{read_image, AppResult};

pub const OBJECT_IMAGE: &str = "Picture 2.jpg";
pub const SCENE_IMAGE: &str = "Picture 3.jpg";
pub const OUTPUT_IMAGE: &str = "Out 1.jpg";
pub const WINDOW_NAME: &str = "Image";
pub const UNREADABLE_MESSAGE: &str = "Could not open image/s.";

/// How a localiser run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    ImagesUnreadable,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Completed => 0,
            Outcome::ImagesUnreadable => -1,
        }
    }
}

/// Inputs and output of one object-localiser run
#[derive(Debug, Clone)]
pub struct LocaliserRun {
    pub object: PathBuf,
    pub scene: PathBuf,
    pub output: PathBuf,
    pub config: LocaliserConfig,
}

impl LocaliserRun {
    /// Fixed file names resolved against `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            object: dir.join(OBJECT_IMAGE),
            scene: dir.join(SCENE_IMAGE),
            output: dir.join(OUTPUT_IMAGE),
            config: LocaliserConfig::default(),
        }
    }
}

impl Default for LocaliserRun {
    fn default() -> Self {
        Self {
            object: PathBuf::from(OBJECT_IMAGE),
            scene: PathBuf::from(SCENE_IMAGE),
            output: PathBuf::from(OUTPUT_IMAGE),
            config: LocaliserConfig::default(),
        }
    }
}

/// Localise the object in the scene, show and save the annotated result.
///
/// Unreadable inputs print a message and end the run without touching the viewer.
pub fn run_object_localiser(run: &LocaliserRun, viewer: &mut dyn Viewer) -> AppResult<Outcome> {
    let object = read_image(&run.object);
    let scene = read_image(&run.scene);
    let (Some(object), Some(scene)) = (object, scene) else {
        println!("{}", UNREADABLE_MESSAGE);
        return Ok(Outcome::ImagesUnreadable);
    };

    info!("{}", run.config.summary());
    let localiser = ObjectLocaliser::new(run.config.clone())?;
    let output = localiser.brisk(&object, &scene)?;

    viewer.show(WINDOW_NAME, &output)?;
    output.save(&run.output)?;
    info!("wrote {}", run.output.display());

    viewer.wait_key()?;
    viewer.destroy_all();
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Completed.exit_code(), 0);
        assert_eq!(Outcome::ImagesUnreadable.exit_code(), -1);
    }

    #[test]
    fn test_default_paths() {
        let run = LocaliserRun::default();
        assert_eq!(run.object, PathBuf::from("Picture 2.jpg"));
        assert_eq!(run.scene, PathBuf::from("Picture 3.jpg"));
        assert_eq!(run.output, PathBuf::from("Out 1.jpg"));
    }
}
