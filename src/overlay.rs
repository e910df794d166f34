//! In-place frame annotation: labels, boxes, and hand skeletons.
//!
//! Text uses an embedded 5x7 bitmap font drawn onto a filled label box,
//! white on a colored background. Nothing in the dependency stack rasterizes
//! text on CPU frames, so the glyph table lives here.

use crate::camera::Frame;
use crate::detect::{HandObservation, SKELETON_EDGES};

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const WHITE: Color = Color(255, 255, 255);
    pub const GREEN: Color = Color(0, 255, 0);
    pub const RED: Color = Color(255, 0, 0);
    pub const MAGENTA: Color = Color(255, 0, 255);
}

/// Pixel scale applied to the 5x7 glyphs.
const TEXT_SCALE: u32 = 2;
/// Horizontal advance per glyph in font units (5 columns + 1 gap).
const GLYPH_ADVANCE: u32 = 6;
/// Padding between label text and its background box, in pixels.
const LABEL_PAD: u32 = 6;

/// Set one pixel, ignoring out-of-frame coordinates.
pub fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x >= frame.width as i32 || y >= frame.height as i32 {
        return;
    }
    let idx = ((y as u32 * frame.width + x as u32) * 3) as usize;
    frame.data[idx] = color.0;
    frame.data[idx + 1] = color.1;
    frame.data[idx + 2] = color.2;
}

/// Fill an axis-aligned rectangle, clipped to the frame.
pub fn fill_rect(frame: &mut Frame, x: i32, y: i32, width: u32, height: u32, color: Color) {
    for dy in 0..height as i32 {
        for dx in 0..width as i32 {
            put_pixel(frame, x + dx, y + dy, color);
        }
    }
}

/// Draw a straight line segment (Bresenham), clipped to the frame.
pub fn draw_line(frame: &mut Frame, from: (i32, i32), to: (i32, i32), color: Color) {
    let (mut x, mut y) = from;
    let (x1, y1) = to;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel(frame, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Width in pixels of `text` as rendered by [`draw_text`].
pub fn text_width(text: &str) -> u32 {
    text.chars().count() as u32 * GLYPH_ADVANCE * TEXT_SCALE
}

/// Height in pixels of one rendered text line.
pub fn text_height() -> u32 {
    7 * TEXT_SCALE
}

/// Render `text` with its top-left corner at (x, y). Characters without a
/// glyph render as blanks; lowercase maps to uppercase.
pub fn draw_text(frame: &mut Frame, text: &str, x: i32, y: i32, color: Color) {
    let mut pen_x = x;
    for c in text.chars() {
        if let Some(rows) = glyph(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..5u32 {
                    if bits & (0x10 >> col) != 0 {
                        fill_rect(
                            frame,
                            pen_x + (col * TEXT_SCALE) as i32,
                            y + (row as u32 * TEXT_SCALE) as i32,
                            TEXT_SCALE,
                            TEXT_SCALE,
                            color,
                        );
                    }
                }
            }
        }
        pen_x += (GLYPH_ADVANCE * TEXT_SCALE) as i32;
    }
}

/// Draw white text on a filled background box with its top-left corner near
/// (x, y), nudged back inside the frame when it would overflow.
pub fn draw_label(frame: &mut Frame, text: &str, x: i32, y: i32, background: Color) {
    let box_w = text_width(text) + LABEL_PAD * 2;
    let box_h = text_height() + LABEL_PAD * 2;

    let max_x = frame.width.saturating_sub(box_w) as i32;
    let max_y = frame.height.saturating_sub(box_h) as i32;
    let x = x.clamp(0, max_x.max(0));
    let y = y.clamp(0, max_y.max(0));

    fill_rect(frame, x, y, box_w, box_h, background);
    draw_text(
        frame,
        text,
        x + LABEL_PAD as i32,
        y + LABEL_PAD as i32,
        Color::WHITE,
    );
}

/// Draw the landmark skeleton of one detected hand.
pub fn draw_skeleton(frame: &mut Frame, hand: &HandObservation, color: Color) {
    let w = frame.width as f32;
    let h = frame.height as f32;
    let point = |i: usize| {
        let lm = &hand.landmarks[i];
        ((lm.x * w) as i32, (lm.y * h) as i32)
    };

    for &(a, b) in &SKELETON_EDGES {
        draw_line(frame, point(a), point(b), color);
    }
    for i in 0..hand.landmarks.len() {
        let (x, y) = point(i);
        fill_rect(frame, x - 1, y - 1, 3, 3, Color::WHITE);
    }
}

/// 5x7 glyph bitmaps; each row holds 5 bits, MSB leftmost.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x1B, 0x11],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x06, 0x08, 0x10, 0x1F],
        '3' => [0x1F, 0x01, 0x02, 0x06, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        _ => return None,
    };
    Some(rows)
}
