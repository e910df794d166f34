//! Frame conversion and transformation utilities.

use nokhwa::pixel_format::RgbFormat;
use std::time::Instant;

use super::types::{Frame, FrameFormat};

/// Convert a nokhwa buffer to an RGB [`Frame`].
///
/// nokhwa's `decode_image` handles whatever the device delivered (MJPEG,
/// YUYV, NV12, ...). Returns `None` on a corrupt or unsupported buffer.
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame {
        data: decoded.into_raw(),
        width: resolution.width(),
        height: resolution.height(),
        format: FrameFormat::Rgb,
        timestamp: Instant::now(),
    })
}

/// Mirror a frame horizontally in place (selfie view).
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let bpp = frame.bytes_per_pixel();
    let row_len = width * bpp;

    for row in frame.data.chunks_exact_mut(row_len) {
        let (mut left, mut right) = (0usize, width - 1);
        while left < right {
            for c in 0..bpp {
                row.swap(left * bpp + c, right * bpp + c);
            }
            left += 1;
            right -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_frame(data: Vec<u8>, width: u32, height: u32) -> Frame {
        Frame {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_mirror_even_width() {
        // Row of 4 pixels A B C D becomes D C B A
        let mut frame = rgb_frame(
            vec![
                1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4, //
            ],
            4,
            1,
        );
        mirror_horizontal(&mut frame);
        assert_eq!(frame.data, vec![4, 4, 4, 3, 3, 3, 2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_mirror_odd_width_keeps_center() {
        let mut frame = rgb_frame(vec![1, 1, 1, 9, 9, 9, 2, 2, 2], 3, 1);
        mirror_horizontal(&mut frame);
        assert_eq!(frame.data, vec![2, 2, 2, 9, 9, 9, 1, 1, 1]);
    }

    #[test]
    fn test_mirror_rows_independent() {
        let mut frame = rgb_frame(
            vec![
                1, 1, 1, 2, 2, 2, // row 0
                3, 3, 3, 4, 4, 4, // row 1
            ],
            2,
            2,
        );
        mirror_horizontal(&mut frame);
        assert_eq!(
            frame.data,
            vec![
                2, 2, 2, 1, 1, 1, //
                4, 4, 4, 3, 3, 3, //
            ]
        );
    }

    #[test]
    fn test_mirror_applied_twice_is_identity() {
        let original = vec![1, 1, 1, 2, 2, 2, 3, 3, 3];
        let mut frame = rgb_frame(original.clone(), 3, 1);
        mirror_horizontal(&mut frame);
        mirror_horizontal(&mut frame);
        assert_eq!(frame.data, original);
    }
}
