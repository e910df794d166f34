//! Blocking camera capture handle.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;

use super::device::list_devices;
use super::frame_utils::{convert_to_rgb, mirror_horizontal};
use super::types::{CameraError, CameraSettings, Frame, Resolution};
use super::FrameSource;

/// How many consecutive decode failures to tolerate before giving up on the
/// device. A single corrupt MJPEG frame is normal; a run of them means the
/// stream is dead.
const MAX_DECODE_RETRIES: u32 = 3;

/// Exclusive handle on one camera device for the lifetime of one streaming
/// session.
///
/// Opening acquires the device and starts the stream; dropping the handle
/// stops the stream and releases the device. Frames are read one at a time
/// with [`FrameSource::next_frame`], already converted to RGB and mirrored
/// when `settings.mirror` is set.
pub struct CameraCapture {
    camera: Camera,
    settings: CameraSettings,
    actual_resolution: Resolution,
}

impl CameraCapture {
    /// Open the camera and start streaming.
    ///
    /// The requested resolution is a hint; the device may negotiate a
    /// different size, reported by [`actual_resolution`](Self::actual_resolution).
    ///
    /// # Errors
    /// * `CameraError::DeviceNotFound` - no device at the configured index
    /// * `CameraError::PermissionDenied` - OS denied camera access
    /// * `CameraError::OpenFailed` / `CameraError::StreamFailed` - device errors
    pub fn open(settings: CameraSettings) -> Result<Self, CameraError> {
        let devices = list_devices()?;
        if !devices.iter().any(|d| d.index == settings.device_index) {
            return Err(CameraError::DeviceNotFound(settings.device_index));
        }

        let index = CameraIndex::Index(settings.device_index);
        let mut camera = open_with_fallback(&index, &settings)?;

        camera
            .open_stream()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        let res = camera.resolution();
        let actual_resolution = Resolution {
            width: res.width(),
            height: res.height(),
        };
        if actual_resolution != settings.resolution {
            log::info!(
                "camera negotiated {} (requested {})",
                actual_resolution,
                settings.resolution
            );
        }

        Ok(Self {
            camera,
            settings,
            actual_resolution,
        })
    }

    /// The resolution the device actually negotiated.
    pub fn actual_resolution(&self) -> Resolution {
        self.actual_resolution
    }

    /// Current capture settings.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }
}

impl FrameSource for CameraCapture {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        let mut decode_failures = 0;
        loop {
            let buffer = self
                .camera
                .frame()
                .map_err(|e| CameraError::ReadFailed(e.to_string()))?;

            match convert_to_rgb(&buffer) {
                Some(mut frame) => {
                    if self.settings.mirror {
                        mirror_horizontal(&mut frame);
                    }
                    return Ok(frame);
                }
                None => {
                    decode_failures += 1;
                    if decode_failures >= MAX_DECODE_RETRIES {
                        return Err(CameraError::ReadFailed(format!(
                            "{} consecutive undecodable frames",
                            decode_failures
                        )));
                    }
                }
            }
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("failed to stop camera stream: {}", e);
        }
    }
}

/// Try to open a camera with multiple format fallback strategies.
///
/// Order of preference: NV12 (native on macOS), then MJPEG (widely
/// supported), then whatever highest-resolution format the device offers.
fn open_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    let wanted = nokhwa::utils::Resolution::new(
        settings.resolution.width,
        settings.resolution.height,
    );

    let attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;
    for requested in attempts {
        match Camera::new(index.clone(), requested) {
            Ok(camera) => return Ok(camera),
            Err(e) => last_error = Some(e),
        }
    }

    let e = last_error.expect("at least one format attempt");
    let msg = e.to_string().to_lowercase();
    if msg.contains("permission") || msg.contains("denied") || msg.contains("access") {
        Err(CameraError::PermissionDenied)
    } else {
        Err(CameraError::OpenFailed(e.to_string()))
    }
}
