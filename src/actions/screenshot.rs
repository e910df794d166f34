//! Screenshot sink: persist the current frame as a timestamped PNG.

use std::path::{Path, PathBuf};

use image::RgbImage;

use super::SinkError;
use crate::camera::Frame;

/// Persist one frame to durable storage, returning the written path.
pub trait ScreenshotSink {
    fn save(&mut self, frame: &Frame) -> Result<PathBuf, SinkError>;
}

/// Writes `screenshot_<YYYYMMDD_HHMMSS>.png` files into a directory.
///
/// Names use wall-clock time at the moment of firing; two saves within the
/// same second overwrite each other (last write wins).
pub struct PngScreenshots {
    dir: PathBuf,
}

impl PngScreenshots {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Where the screenshots go.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Build the timestamped file name for a screenshot taken now.
pub fn screenshot_filename(now: chrono::DateTime<chrono::Local>) -> String {
    format!("screenshot_{}.png", now.format("%Y%m%d_%H%M%S"))
}

impl ScreenshotSink for PngScreenshots {
    fn save(&mut self, frame: &Frame) -> Result<PathBuf, SinkError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(screenshot_filename(chrono::Local::now()));

        let image = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| SinkError::Encode("frame buffer size mismatch".into()))?;
        image
            .save(&path)
            .map_err(|e| SinkError::Encode(e.to_string()))?;

        Ok(path)
    }
}
