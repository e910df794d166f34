//! Hand landmark detection boundary.
//!
//! The pipeline only depends on the [`HandDetector`] trait; the production
//! implementation ([`OrtLandmarker`]) runs MediaPipe-compatible ONNX models
//! through ONNX Runtime. Tests substitute scripted detectors.

mod landmarker;

pub use landmarker::{LandmarkerSettings, OrtLandmarker};

use std::fmt;

use thiserror::Error;

use crate::camera::Frame;

/// MediaPipe hand landmark indices (21 points per hand).
#[allow(dead_code)]
pub mod landmark_ids {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Skeleton edges between landmark indices, for overlay drawing.
pub const SKELETON_EDGES: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4), // thumb
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8), // index
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12), // middle
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16), // ring
    (13, 17),
    (17, 18),
    (18, 19),
    (19, 20), // pinky
    (0, 17),  // palm base
];

/// Which hand a detection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// The opposite hand, for mirrored-frame label correction.
    pub fn flipped(self) -> Self {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => write!(f, "Left"),
            Handedness::Right => write!(f, "Right"),
        }
    }
}

/// One hand landmark in coordinates normalized to the frame (0.0..1.0).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth relative to the wrist; unused by gesture logic
    pub z: f32,
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Finger-extension vector: thumb, index, middle, ring, little.
/// `true` means extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    pub const NONE: FingerState = FingerState([false; 5]);
    pub const ALL: FingerState = FingerState([true; 5]);

    /// Number of extended fingers.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&up| up).count()
    }
}

impl fmt::Display for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &up in &self.0 {
            write!(f, "{}", if up { 'T' } else { 'F' })?;
        }
        Ok(())
    }
}

/// One detected hand, rebuilt fresh every frame.
#[derive(Debug, Clone)]
pub struct HandObservation {
    pub handedness: Handedness,
    pub landmarks: [Landmark; 21],
    pub bbox: BoundingBox,
    pub fingers: FingerState,
}

/// Errors from the landmark source.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to initialize detector: {0}")]
    Init(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model returned malformed output: {0}")]
    BadOutput(String),
}

/// Produces hand observations from frames.
///
/// A per-frame error means this frame has no usable detections; the caller
/// logs it and keeps streaming. Implementations must not panic on bad frames.
pub trait HandDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<HandObservation>, DetectError>;
}

/// Derive the finger-extension vector from 21 landmarks.
///
/// Image coordinates have the origin at the top-left, so a fingertip above
/// its PIP joint (smaller y) counts as extended. The thumb extends sideways:
/// with the palm toward the camera in a mirrored frame, a right thumb points
/// left of its IP joint and a left thumb points right.
pub fn fingers_from_landmarks(landmarks: &[Landmark; 21], handedness: Handedness) -> FingerState {
    use landmark_ids::*;

    let thumb = match handedness {
        Handedness::Right => landmarks[THUMB_TIP].x < landmarks[THUMB_IP].x,
        Handedness::Left => landmarks[THUMB_TIP].x > landmarks[THUMB_IP].x,
    };

    let up = |tip: usize, pip: usize| landmarks[tip].y < landmarks[pip].y;

    FingerState([
        thumb,
        up(INDEX_TIP, INDEX_PIP),
        up(MIDDLE_TIP, MIDDLE_PIP),
        up(RING_TIP, RING_PIP),
        up(PINKY_TIP, PINKY_PIP),
    ])
}

/// Bounding box of the landmarks in pixel coordinates, padded a little so
/// the skeleton never touches the border of the box.
pub fn bbox_from_landmarks(landmarks: &[Landmark; 21], width: u32, height: u32) -> BoundingBox {
    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for lm in landmarks {
        min_x = min_x.min(lm.x);
        min_y = min_y.min(lm.y);
        max_x = max_x.max(lm.x);
        max_y = max_y.max(lm.y);
    }

    const PAD: f32 = 0.02;
    let x0 = ((min_x - PAD) * width as f32) as i32;
    let y0 = ((min_y - PAD) * height as f32) as i32;
    let x1 = ((max_x + PAD) * width as f32) as i32;
    let y1 = ((max_y + PAD) * height as f32) as i32;

    BoundingBox {
        x: x0,
        y: y0,
        width: (x1 - x0).max(0) as u32,
        height: (y1 - y0).max(0) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hand() -> [Landmark; 21] {
        // Wrist at the bottom, all fingertips above their PIP joints.
        let mut lms = [Landmark::default(); 21];
        for (i, lm) in lms.iter_mut().enumerate() {
            lm.x = 0.5;
            lm.y = 0.9 - 0.04 * i as f32;
        }
        lms
    }

    #[test]
    fn test_open_palm_all_fingers_up() {
        use landmark_ids::*;
        let mut lms = flat_hand();
        // Right thumb extended: tip left of IP.
        lms[THUMB_TIP].x = 0.3;
        lms[THUMB_IP].x = 0.4;
        let fingers = fingers_from_landmarks(&lms, Handedness::Right);
        assert_eq!(fingers, FingerState::ALL);
        assert_eq!(fingers.count(), 5);
    }

    #[test]
    fn test_thumb_axis_depends_on_handedness() {
        use landmark_ids::*;
        let mut lms = flat_hand();
        lms[THUMB_TIP].x = 0.3;
        lms[THUMB_IP].x = 0.4;
        assert!(fingers_from_landmarks(&lms, Handedness::Right).0[0]);
        assert!(!fingers_from_landmarks(&lms, Handedness::Left).0[0]);
    }

    #[test]
    fn test_curled_fingers_down() {
        use landmark_ids::*;
        let mut lms = flat_hand();
        // Curl index: tip below PIP.
        lms[INDEX_TIP].y = lms[INDEX_PIP].y + 0.1;
        let fingers = fingers_from_landmarks(&lms, Handedness::Left);
        assert!(!fingers.0[1]);
    }

    #[test]
    fn test_finger_state_display() {
        assert_eq!(FingerState([true, false, false, false, true]).to_string(), "TFFFT");
    }

    #[test]
    fn test_bbox_covers_landmarks() {
        let lms = flat_hand();
        let bbox = bbox_from_landmarks(&lms, 100, 100);
        assert!(bbox.width > 0);
        assert!(bbox.height > 0);
        assert!(bbox.y < 20); // topmost fingertip near y=0.1
    }

    #[test]
    fn test_handedness_flip() {
        assert_eq!(Handedness::Left.flipped(), Handedness::Right);
        assert_eq!(Handedness::Right.flipped(), Handedness::Left);
    }
}
