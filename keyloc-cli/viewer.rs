use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::info;

use crate::AppResult;

/// Named display windows
pub trait Viewer {
    /// Show `img` in the window called `name`, replacing what it showed before
    fn show(&mut self, name: &str, img: &RgbImage) -> AppResult<()>;

    /// Block until the user acknowledges the windows
    fn wait_key(&mut self) -> AppResult<()>;

    fn destroy_all(&mut self);
}

/// Writes each window to `<dir>/<name>.png`
#[derive(Debug, Clone)]
pub struct SnapshotViewer {
    dir: PathBuf,
    open: Vec<String>,
}

impl SnapshotViewer {
    /// The directory is created on the first `show`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf(), open: Vec::new() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", name))
    }

    pub fn open_windows(&self) -> &[String] {
        &self.open
    }
}

impl Viewer for SnapshotViewer {
    fn show(&mut self, name: &str, img: &RgbImage) -> AppResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        img.save(&path)?;
        info!("window \"{}\" -> {}", name, path.display());
        if !self.open.iter().any(|n| n == name) {
            self.open.push(name.to_string());
        }
        Ok(())
    }

    fn wait_key(&mut self) -> AppResult<()> {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return Ok(());
        }
        print!("Press Enter to close {} window(s)... ", self.open.len());
        std::io::stdout().flush()?;
        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        Ok(())
    }

    fn destroy_all(&mut self) {
        self.open.clear();
    }
}

/// Records window activity without displaying anything
#[derive(Debug, Clone, Default)]
pub struct HeadlessViewer {
    /// Window names in the order they were shown, repeats included
    pub shown: Vec<String>,
    /// Last image shown per window
    pub last: Vec<(String, RgbImage)>,
    pub waits: usize,
    pub destroyed: bool,
}

impl HeadlessViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self, name: &str) -> Option<&RgbImage> {
        self.last.iter().find(|(n, _)| n == name).map(|(_, img)| img)
    }
}

impl Viewer for HeadlessViewer {
    fn show(&mut self, name: &str, img: &RgbImage) -> AppResult<()> {
        self.shown.push(name.to_string());
        match self.last.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = img.clone(),
            None => self.last.push((name.to_string(), img.clone())),
        }
        Ok(())
    }

    fn wait_key(&mut self) -> AppResult<()> {
        self.waits += 1;
        Ok(())
    }

    fn destroy_all(&mut self) {
        self.destroyed = true;
    }
}
