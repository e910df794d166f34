//! The streaming session: the strictly sequential
//! capture -> detect -> dispatch -> overlay -> encode cycle.
//!
//! A session exclusively owns one camera for its lifetime. It runs on a
//! blocking thread and pushes encoded multipart parts through a bounded
//! channel; the HTTP layer turns the channel into the response body. That
//! channel is the producer/transmit boundary, so a future single-producer
//! fan-out only has to replace the channel wiring, not the loop.

use std::io::Cursor;
use std::time::Instant;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use tokio::sync::mpsc;

use crate::camera::{Frame, FrameSource};
use crate::detect::{HandDetector, HandObservation};
use crate::gesture::{DispatchOutcome, GestureDispatcher};
use crate::overlay::{self, Color};

/// Multipart boundary token used by the video feed.
pub const BOUNDARY: &str = "frame";

/// `Content-Type` of the video feed response.
pub const FEED_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Vertical offset of the hand label above its bounding box.
const HAND_LABEL_OFFSET: i32 = 20;

/// One viewer's streaming session.
///
/// `detector` is optional so a session can keep streaming plain video when
/// the landmark models are unavailable.
pub struct StreamSession<S, D> {
    source: S,
    detector: Option<D>,
    dispatcher: GestureDispatcher,
    jpeg_quality: u8,
}

impl<S: FrameSource, D: HandDetector> StreamSession<S, D> {
    pub fn new(
        source: S,
        detector: Option<D>,
        dispatcher: GestureDispatcher,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            source,
            detector,
            dispatcher,
            jpeg_quality,
        }
    }

    /// Run the capture loop until the camera fails or the client disconnects
    /// (receiver dropped). Consumes the session; the camera is released when
    /// the source drops on return.
    pub fn run(mut self, tx: mpsc::Sender<Bytes>) {
        loop {
            let mut frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    log::error!("camera read failed, ending session: {}", e);
                    break;
                }
            };

            self.annotate(&mut frame);

            let part = match encode_jpeg(&frame, self.jpeg_quality) {
                Ok(jpeg) => multipart_part(&jpeg),
                Err(e) => {
                    log::warn!("failed to encode frame: {}", e);
                    continue;
                }
            };

            if tx.blocking_send(part).is_err() {
                log::info!("client disconnected, ending session");
                break;
            }
        }
    }

    /// Detect hands and draw all per-frame annotations.
    ///
    /// A detection failure only costs this frame its annotations; the
    /// session keeps streaming.
    fn annotate(&mut self, frame: &mut Frame) {
        let hands: Vec<HandObservation> = match self.detector.as_mut() {
            Some(detector) => match detector.detect(frame) {
                Ok(hands) => hands,
                Err(e) => {
                    log::warn!("hand detection failed for this frame: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        for hand in &hands {
            overlay::draw_skeleton(frame, hand, Color::MAGENTA);
            overlay::draw_label(
                frame,
                &format!("{} Hand", hand.handedness),
                hand.bbox.x,
                hand.bbox.y - HAND_LABEL_OFFSET,
                Color::MAGENTA,
            );

            if let DispatchOutcome::Fired(annotation) =
                self.dispatcher.dispatch(hand, frame, Instant::now())
            {
                overlay::draw_label(
                    frame,
                    &annotation.text,
                    annotation.origin.0,
                    annotation.origin.1,
                    annotation.color,
                );
            }
        }
    }
}

/// Encode a frame as JPEG.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), quality);
    encoder.encode(
        &frame.data,
        frame.width,
        frame.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// Frame one JPEG as a multipart part:
/// `--frame\r\nContent-Type: image/jpeg\r\n\r\n<jpeg>\r\n`.
pub fn multipart_part(jpeg: &[u8]) -> Bytes {
    let header = format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", BOUNDARY);
    let mut part = Vec::with_capacity(header.len() + jpeg.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg_magic_bytes() {
        let frame = Frame::blank(16, 16);
        let jpeg = encode_jpeg(&frame, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]); // SOI marker
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]); // EOI marker
    }

    #[test]
    fn test_multipart_part_framing() {
        let part = multipart_part(b"JPEGDATA");
        let expected_prefix = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
        assert!(part.starts_with(expected_prefix));
        assert!(part.ends_with(b"JPEGDATA\r\n"));
    }

    #[test]
    fn test_feed_content_type_names_boundary() {
        assert!(FEED_CONTENT_TYPE.contains(&format!("boundary={}", BOUNDARY)));
    }
}
