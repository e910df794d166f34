//! Webcam capture: device enumeration and blocking per-frame acquisition.
//!
//! The streaming session processes frames strictly sequentially, so capture
//! is a blocking [`FrameSource::next_frame`] call on the session thread
//! rather than a background producer. `FrameSource` is the seam between
//! "produce next frame" and the rest of the pipeline; tests drive the
//! pipeline with synthetic sources through it.

mod capture;
mod device;
mod frame_utils;
mod types;

pub use capture::CameraCapture;
pub use device::list_devices;
pub use frame_utils::{convert_to_rgb, mirror_horizontal};
pub use types::{CameraError, CameraInfo, CameraSettings, Frame, FrameFormat, Resolution};

/// Source of frames for a streaming session.
///
/// Implemented by [`CameraCapture`] for real devices and by scripted fixtures
/// in tests. Dropping the source releases the underlying device.
pub trait FrameSource {
    /// Block until the next frame is available.
    ///
    /// An error is fatal to the session: the caller must stop the loop and
    /// drop the source.
    fn next_frame(&mut self) -> Result<Frame, CameraError>;
}
