//! Hand landmark detection using ONNX Runtime.
//!
//! Runs MediaPipe-compatible models from the PINTO model zoo: a palm
//! detector proposes hand regions, a landmark model refines each region into
//! 21 points plus presence and handedness scores. If the palm model is
//! missing, the landmark model runs on the full frame (single-hand mode); if
//! the landmark model is missing, construction fails and the caller decides
//! whether to stream without detection.

use std::path::{Path, PathBuf};

use ndarray::Array4;

use super::{
    bbox_from_landmarks, fingers_from_landmarks, DetectError, HandDetector, HandObservation,
    Handedness, Landmark,
};
use crate::camera::Frame;

/// Palm detection model file name.
const PALM_MODEL: &str = "palm_detection_full.onnx";
/// Hand landmark model file name.
const LANDMARK_MODEL: &str = "hand_landmark_full.onnx";

/// Palm detector input edge (square).
const PALM_INPUT: usize = 192;
/// Landmark model input edge (square).
const LANDMARK_INPUT: usize = 224;

/// IoU above which two palm candidates count as the same hand.
const NMS_IOU: f32 = 0.3;
/// Palm boxes cover the palm only; the hand ROI is the box scaled up and
/// shifted toward the fingers.
const ROI_SCALE: f32 = 2.6;
const ROI_SHIFT_Y: f32 = -0.5;

/// Settings for [`OrtLandmarker`].
#[derive(Debug, Clone)]
pub struct LandmarkerSettings {
    /// Directory containing the ONNX models
    pub model_dir: PathBuf,
    /// Minimum detection/presence confidence
    pub min_confidence: f32,
    /// Maximum hands to report per frame
    pub max_hands: usize,
    /// Swap handedness labels to match pre-mirrored frames
    pub flip_handedness: bool,
}

impl Default for LandmarkerSettings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            min_confidence: 0.6,
            max_hands: 2,
            flip_handedness: true,
        }
    }
}

/// A normalized square region of the frame to run the landmark model on.
#[derive(Debug, Clone, Copy)]
struct Roi {
    x: f32,
    y: f32,
    size: f32,
}

impl Roi {
    fn full_frame() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            size: 1.0,
        }
    }
}

/// One decoded palm candidate (normalized coordinates).
#[derive(Debug, Clone, Copy)]
struct PalmBox {
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    score: f32,
}

/// SSD anchor center.
struct Anchor {
    x: f32,
    y: f32,
}

pub struct OrtLandmarker {
    settings: LandmarkerSettings,
    palm: Option<ort::session::Session>,
    landmark: ort::session::Session,
    anchors: Vec<Anchor>,
}

impl OrtLandmarker {
    /// Load models from `settings.model_dir` and initialize ONNX Runtime.
    pub fn new(settings: LandmarkerSettings) -> Result<Self, DetectError> {
        ort::init()
            .with_name("handwave")
            .commit()
            .map_err(|e| DetectError::Init(e.to_string()))?;

        let landmark_path = settings.model_dir.join(LANDMARK_MODEL);
        if !landmark_path.exists() {
            return Err(DetectError::Init(format!(
                "landmark model not found: {}",
                landmark_path.display()
            )));
        }
        let landmark = load_session(&landmark_path)?;
        log::info!("loaded landmark model from {}", landmark_path.display());

        let palm_path = settings.model_dir.join(PALM_MODEL);
        let palm = if palm_path.exists() {
            let session = load_session(&palm_path)?;
            log::info!("loaded palm detection model from {}", palm_path.display());
            Some(session)
        } else {
            log::warn!(
                "palm model not found at {}; running single-hand full-frame detection",
                palm_path.display()
            );
            None
        };

        Ok(Self {
            settings,
            palm,
            landmark,
            anchors: ssd_anchors(),
        })
    }

    fn detect_palms(&mut self, frame: &Frame) -> Result<Vec<Roi>, DetectError> {
        let session = match self.palm.as_mut() {
            Some(s) => s,
            None => return Ok(vec![Roi::full_frame()]),
        };

        let input = sample_region(frame, Roi::full_frame(), PALM_INPUT);
        let outputs = run_session(session, input, PALM_INPUT)?;

        let n = self.anchors.len();
        let boxes = outputs
            .iter()
            .find(|o| o.len() % n == 0 && o.len() / n >= 4 && o.len() > n)
            .ok_or_else(|| DetectError::BadOutput("no palm regressor tensor".into()))?;
        let scores = outputs
            .iter()
            .find(|o| o.len() == n)
            .ok_or_else(|| DetectError::BadOutput("no palm score tensor".into()))?;
        let stride = boxes.len() / n;

        let mut candidates = Vec::new();
        for (i, anchor) in self.anchors.iter().enumerate() {
            let score = sigmoid(scores[i]);
            if score < self.settings.min_confidence {
                continue;
            }
            let raw = &boxes[i * stride..(i + 1) * stride];
            candidates.push(PalmBox {
                cx: anchor.x + raw[0] / PALM_INPUT as f32,
                cy: anchor.y + raw[1] / PALM_INPUT as f32,
                w: raw[2] / PALM_INPUT as f32,
                h: raw[3] / PALM_INPUT as f32,
                score,
            });
        }

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        let kept = non_max_suppression(&candidates, self.settings.max_hands);

        Ok(kept.iter().map(|b| roi_from_palm(b)).collect())
    }

    fn landmarks_in_roi(
        &mut self,
        frame: &Frame,
        roi: Roi,
    ) -> Result<Option<HandObservation>, DetectError> {
        let input = sample_region(frame, roi, LANDMARK_INPUT);
        let outputs = run_session(&mut self.landmark, input, LANDMARK_INPUT)?;

        let coords = outputs
            .iter()
            .find(|o| o.len() == 63)
            .ok_or_else(|| DetectError::BadOutput("no landmark tensor".into()))?;
        let mut scalars = outputs.iter().filter(|o| o.len() == 1);
        let presence = scalars
            .next()
            .map(|o| o[0])
            .ok_or_else(|| DetectError::BadOutput("no presence score".into()))?;
        let handed_score = scalars.next().map(|o| o[0]).unwrap_or(0.5);

        if presence < self.settings.min_confidence {
            return Ok(None);
        }

        let mut landmarks = [Landmark::default(); 21];
        for (i, lm) in landmarks.iter_mut().enumerate() {
            // Model outputs pixel coordinates in the ROI crop.
            let x = coords[i * 3] / LANDMARK_INPUT as f32;
            let y = coords[i * 3 + 1] / LANDMARK_INPUT as f32;
            lm.x = roi.x + x * roi.size;
            lm.y = roi.y + y * roi.size;
            lm.z = coords[i * 3 + 2] / LANDMARK_INPUT as f32;
        }

        let mut handedness = if handed_score > 0.5 {
            Handedness::Right
        } else {
            Handedness::Left
        };
        if self.settings.flip_handedness {
            handedness = handedness.flipped();
        }

        let fingers = fingers_from_landmarks(&landmarks, handedness);
        let bbox = bbox_from_landmarks(&landmarks, frame.width, frame.height);

        Ok(Some(HandObservation {
            handedness,
            landmarks,
            bbox,
            fingers,
        }))
    }
}

impl HandDetector for OrtLandmarker {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<HandObservation>, DetectError> {
        let rois = self.detect_palms(frame)?;

        let mut hands = Vec::new();
        for roi in rois.into_iter().take(self.settings.max_hands) {
            if let Some(obs) = self.landmarks_in_roi(frame, roi)? {
                hands.push(obs);
            }
        }
        Ok(hands)
    }
}

fn load_session(path: &Path) -> Result<ort::session::Session, DetectError> {
    ort::session::Session::builder()
        .map_err(|e| DetectError::Init(e.to_string()))?
        .with_intra_threads(2)
        .map_err(|e| DetectError::Init(e.to_string()))?
        .commit_from_file(path)
        .map_err(|e| DetectError::Init(format!("{}: {}", path.display(), e)))
}

/// Run a session on an NHWC float input and collect every f32 output tensor.
fn run_session(
    session: &mut ort::session::Session,
    input: Vec<f32>,
    edge: usize,
) -> Result<Vec<Vec<f32>>, DetectError> {
    let array = Array4::from_shape_vec((1, edge, edge, 3), input)
        .map_err(|e| DetectError::Inference(e.to_string()))?;
    let tensor = ort::value::Tensor::from_array(array)
        .map_err(|e| DetectError::Inference(e.to_string()))?;

    let outputs = session
        .run(ort::inputs![tensor])
        .map_err(|e| DetectError::Inference(e.to_string()))?;

    let mut collected = Vec::new();
    for (_name, value) in outputs.iter() {
        let (_shape, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectError::BadOutput(e.to_string()))?;
        collected.push(data.to_vec());
    }
    Ok(collected)
}

/// Sample a normalized square region of the frame into an `edge`x`edge` RGB
/// float buffer in [0, 1], NHWC order. Out-of-frame samples are black.
fn sample_region(frame: &Frame, roi: Roi, edge: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; edge * edge * 3];
    let fw = frame.width as f32;
    let fh = frame.height as f32;

    for y in 0..edge {
        for x in 0..edge {
            let src_x = (roi.x + roi.size * (x as f32 + 0.5) / edge as f32) * fw;
            let src_y = (roi.y + roi.size * (y as f32 + 0.5) / edge as f32) * fh;
            if src_x < 0.0 || src_y < 0.0 || src_x >= fw || src_y >= fh {
                continue;
            }
            let src = ((src_y as u32 * frame.width + src_x as u32) * 3) as usize;
            if src + 2 >= frame.data.len() {
                continue;
            }
            let dst = (y * edge + x) * 3;
            out[dst] = frame.data[src] as f32 / 255.0;
            out[dst + 1] = frame.data[src + 1] as f32 / 255.0;
            out[dst + 2] = frame.data[src + 2] as f32 / 255.0;
        }
    }
    out
}

/// SSD anchor grid for the 192x192 full-range palm detector:
/// stride 8 with 2 anchors per cell, stride 16 with 6 per cell (2016 total).
fn ssd_anchors() -> Vec<Anchor> {
    let mut anchors = Vec::with_capacity(2016);
    for (cells, per_cell) in [(PALM_INPUT / 8, 2), (PALM_INPUT / 16, 6)] {
        for gy in 0..cells {
            for gx in 0..cells {
                for _ in 0..per_cell {
                    anchors.push(Anchor {
                        x: (gx as f32 + 0.5) / cells as f32,
                        y: (gy as f32 + 0.5) / cells as f32,
                    });
                }
            }
        }
    }
    anchors
}

fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

fn iou(a: &PalmBox, b: &PalmBox) -> f32 {
    let ax0 = a.cx - a.w / 2.0;
    let ay0 = a.cy - a.h / 2.0;
    let bx0 = b.cx - b.w / 2.0;
    let by0 = b.cy - b.h / 2.0;

    let ix = (ax0 + a.w).min(bx0 + b.w) - ax0.max(bx0);
    let iy = (ay0 + a.h).min(by0 + b.h) - ay0.max(by0);
    if ix <= 0.0 || iy <= 0.0 {
        return 0.0;
    }
    let inter = ix * iy;
    inter / (a.w * a.h + b.w * b.h - inter)
}

/// Keep the highest-scoring candidates, dropping any that overlap an
/// already-kept box. Candidates must arrive sorted by descending score.
fn non_max_suppression(candidates: &[PalmBox], limit: usize) -> Vec<PalmBox> {
    let mut kept: Vec<PalmBox> = Vec::new();
    for candidate in candidates {
        if kept.len() >= limit {
            break;
        }
        if kept.iter().all(|k| iou(k, candidate) < NMS_IOU) {
            kept.push(*candidate);
        }
    }
    kept
}

/// Expand a palm box into the square hand ROI, clamped to the frame.
fn roi_from_palm(palm: &PalmBox) -> Roi {
    let size = (palm.w.max(palm.h) * ROI_SCALE).min(1.0);
    let cy = palm.cy + palm.h * ROI_SHIFT_Y;
    Roi {
        x: (palm.cx - size / 2.0).clamp(0.0, 1.0 - size),
        y: (cy - size / 2.0).clamp(0.0, 1.0 - size),
        size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_count_matches_model() {
        assert_eq!(ssd_anchors().len(), 24 * 24 * 2 + 12 * 12 * 6);
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert!(sigmoid(-10.0) < 0.001);
        assert!(sigmoid(10.0) > 0.999);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_nms_drops_overlapping() {
        let a = PalmBox {
            cx: 0.5,
            cy: 0.5,
            w: 0.2,
            h: 0.2,
            score: 0.9,
        };
        let near_a = PalmBox {
            cx: 0.51,
            cy: 0.5,
            w: 0.2,
            h: 0.2,
            score: 0.8,
        };
        let far = PalmBox {
            cx: 0.1,
            cy: 0.1,
            w: 0.2,
            h: 0.2,
            score: 0.7,
        };
        let kept = non_max_suppression(&[a, near_a, far], 2);
        assert_eq!(kept.len(), 2);
        assert!((kept[1].cx - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_roi_stays_in_frame() {
        let palm = PalmBox {
            cx: 0.95,
            cy: 0.05,
            w: 0.3,
            h: 0.3,
            score: 0.9,
        };
        let roi = roi_from_palm(&palm);
        assert!(roi.x >= 0.0);
        assert!(roi.y >= 0.0);
        assert!(roi.x + roi.size <= 1.0 + 1e-6);
        assert!(roi.y + roi.size <= 1.0 + 1e-6);
    }

    #[test]
    fn test_sample_region_black_outside() {
        let frame = Frame::blank(10, 10);
        let samples = sample_region(
            &frame,
            Roi {
                x: 0.5,
                y: 0.5,
                size: 1.0,
            },
            4,
        );
        assert_eq!(samples.len(), 4 * 4 * 3);
        assert!(samples.iter().all(|&v| v == 0.0));
    }
}
