//! Action sink boundaries: system volume, key injection, screenshots.
//!
//! Each sink is a narrow trait so the dispatcher can be exercised with
//! recording fakes in tests. Sink failures are reported to the caller, which
//! logs them; they never terminate the stream.

mod keys;
mod screenshot;
mod volume;

pub use keys::{KeySink, SystemKeys};
pub use screenshot::{PngScreenshots, ScreenshotSink};
pub use volume::{SystemVolume, VolumeSink};

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the system action sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Platform(String),
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// The three sinks a streaming session fires into.
pub struct Sinks {
    pub volume: Box<dyn VolumeSink + Send>,
    pub keys: Box<dyn KeySink + Send>,
    pub screenshots: Box<dyn ScreenshotSink + Send>,
}

impl Sinks {
    /// Sinks backed by the real system: OS volume, injected key events, and
    /// PNG files under `screenshot_dir`.
    pub fn system(screenshot_dir: PathBuf) -> Self {
        Self {
            volume: Box::new(SystemVolume::new()),
            keys: Box::new(SystemKeys::new()),
            screenshots: Box::new(PngScreenshots::new(screenshot_dir)),
        }
    }
}
