//! End-to-end tests for the streaming session loop.
//!
//! These drive the capture -> detect -> dispatch -> encode cycle with
//! scripted frame sources, detectors, and recording sinks; no camera,
//! models, or HTTP stack involved.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use handwave::actions::{KeySink, ScreenshotSink, SinkError, Sinks, VolumeSink};
use handwave::camera::{CameraError, Frame, FrameSource};
use handwave::detect::{
    BoundingBox, DetectError, FingerState, HandDetector, HandObservation, Handedness, Landmark,
};
use handwave::gesture::{GestureDispatcher, RuleSet};
use handwave::server::StreamSession;

// ==================== Test Fixtures ====================

/// Frame source playing a fixed script; `None` entries fail the read.
/// Running out of script also fails, ending the session.
struct ScriptedSource {
    frames: VecDeque<Option<Frame>>,
    released: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new(frames: Vec<Option<Frame>>) -> (Self, Arc<AtomicUsize>) {
        let released = Arc::new(AtomicUsize::new(0));
        (
            Self {
                frames: frames.into(),
                released: released.clone(),
            },
            released,
        )
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        match self.frames.pop_front() {
            Some(Some(frame)) => Ok(frame),
            Some(None) => Err(CameraError::ReadFailed("scripted failure".into())),
            None => Err(CameraError::ReadFailed("end of script".into())),
        }
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Detector returning one scripted result per frame.
struct ScriptedDetector {
    results: VecDeque<Result<Vec<HandObservation>, DetectError>>,
}

impl ScriptedDetector {
    fn new(results: Vec<Result<Vec<HandObservation>, DetectError>>) -> Self {
        Self {
            results: results.into(),
        }
    }
}

impl HandDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<HandObservation>, DetectError> {
        self.results.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Default)]
struct Recorded {
    volumes: Vec<f32>,
    keys: Vec<String>,
    screenshots: usize,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Recorded>>);

impl VolumeSink for Recorder {
    fn current(&mut self) -> Result<f32, SinkError> {
        Ok(0.5)
    }
    fn set(&mut self, level: f32) -> Result<(), SinkError> {
        self.0.lock().unwrap().volumes.push(level);
        Ok(())
    }
}

impl KeySink for Recorder {
    fn press(&mut self, key: &str) -> Result<(), SinkError> {
        self.0.lock().unwrap().keys.push(key.to_string());
        Ok(())
    }
}

impl ScreenshotSink for Recorder {
    fn save(&mut self, _frame: &Frame) -> Result<PathBuf, SinkError> {
        self.0.lock().unwrap().screenshots += 1;
        Ok(PathBuf::from("screenshot_test.png"))
    }
}

fn hand(handedness: Handedness, fingers: [bool; 5]) -> HandObservation {
    HandObservation {
        handedness,
        landmarks: [Landmark::default(); 21],
        bbox: BoundingBox {
            x: 10,
            y: 10,
            width: 40,
            height: 40,
        },
        fingers: FingerState(fingers),
    }
}

fn dispatcher(recorder: &Recorder) -> GestureDispatcher {
    let sinks = Sinks {
        volume: Box::new(recorder.clone()),
        keys: Box::new(recorder.clone()),
        screenshots: Box::new(recorder.clone()),
    };
    GestureDispatcher::new(RuleSet::standard(), sinks, 0.5)
}

/// Run a session to completion and collect the emitted parts.
fn run_session(
    source: ScriptedSource,
    detector: Option<ScriptedDetector>,
    dispatcher: GestureDispatcher,
) -> Vec<bytes::Bytes> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    StreamSession::new(source, detector, dispatcher, 80).run(tx);

    let mut parts = Vec::new();
    while let Ok(part) = rx.try_recv() {
        parts.push(part);
    }
    parts
}

// ==================== End-to-End Scenario ====================

#[test]
fn test_three_frame_scenario_fires_volume_then_space() {
    let (source, _) = ScriptedSource::new(vec![
        Some(Frame::blank(64, 64)),
        Some(Frame::blank(64, 64)),
        Some(Frame::blank(64, 64)),
    ]);
    let detector = ScriptedDetector::new(vec![
        Ok(vec![hand(Handedness::Right, [true, false, false, false, false])]),
        Ok(vec![]),
        Ok(vec![hand(Handedness::Left, [true; 5])]),
    ]);
    let recorder = Recorder::default();

    let parts = run_session(source, Some(detector), dispatcher(&recorder));

    // All three frames streamed (the fourth read fails and ends the loop).
    assert_eq!(parts.len(), 3);

    let state = recorder.0.lock().unwrap();
    assert_eq!(state.volumes.len(), 1, "exactly one volume change");
    assert!((state.volumes[0] - 0.51).abs() < 1e-6);
    assert_eq!(state.keys, vec!["space"], "exactly one key press");
    assert_eq!(state.screenshots, 0);
}

#[test]
fn test_both_hands_fire_in_one_frame() {
    let (source, _) = ScriptedSource::new(vec![Some(Frame::blank(64, 64))]);
    let detector = ScriptedDetector::new(vec![Ok(vec![
        hand(Handedness::Right, [true, false, false, false, false]),
        hand(Handedness::Left, [true; 5]),
    ])]);
    let recorder = Recorder::default();

    run_session(source, Some(detector), dispatcher(&recorder));

    let state = recorder.0.lock().unwrap();
    assert_eq!(state.volumes.len(), 1);
    assert_eq!(state.keys.len(), 1);
}

// ==================== Failure Handling ====================

#[test]
fn test_camera_failure_ends_session_and_releases_once() {
    let (source, released) = ScriptedSource::new(vec![
        Some(Frame::blank(32, 32)),
        Some(Frame::blank(32, 32)),
        None, // read failure
        Some(Frame::blank(32, 32)),
    ]);
    let recorder = Recorder::default();

    let parts = run_session(source, None, dispatcher(&recorder));

    // Two parts out, then the failing read terminates the loop; the frame
    // after the failure is never read.
    assert_eq!(parts.len(), 2);
    assert_eq!(released.load(Ordering::SeqCst), 1, "device released exactly once");
}

#[test]
fn test_detector_failure_skips_frame_but_keeps_streaming() {
    let (source, _) = ScriptedSource::new(vec![
        Some(Frame::blank(32, 32)),
        Some(Frame::blank(32, 32)),
        Some(Frame::blank(32, 32)),
    ]);
    let detector = ScriptedDetector::new(vec![
        Ok(vec![]),
        Err(DetectError::Inference("bad frame".into())),
        Ok(vec![]),
    ]);
    let recorder = Recorder::default();

    let parts = run_session(source, Some(detector), dispatcher(&recorder));

    assert_eq!(parts.len(), 3, "a bad detection frame still streams");
}

#[test]
fn test_client_disconnect_ends_session() {
    let (source, released) = ScriptedSource::new(vec![
        Some(Frame::blank(32, 32)),
        Some(Frame::blank(32, 32)),
        Some(Frame::blank(32, 32)),
    ]);
    let recorder = Recorder::default();

    let (tx, rx) = tokio::sync::mpsc::channel(64);
    drop(rx); // client gone before the first part
    StreamSession::new(source, None::<ScriptedDetector>, dispatcher(&recorder), 80).run(tx);

    assert_eq!(released.load(Ordering::SeqCst), 1);
}

// ==================== Wire Format ====================

#[test]
fn test_parts_are_boundary_framed_jpegs() {
    let (source, _) = ScriptedSource::new(vec![Some(Frame::blank(32, 32))]);
    let recorder = Recorder::default();

    let parts = run_session(source, None, dispatcher(&recorder));
    assert_eq!(parts.len(), 1);

    let part = &parts[0];
    let header = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    assert!(part.starts_with(header));
    assert!(part.ends_with(b"\r\n"));

    let jpeg = &part[header.len()..part.len() - 2];
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "JPEG SOI marker");
    assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9], "JPEG EOI marker");
}

#[test]
fn test_annotations_change_the_encoded_frame() {
    // Same source frame with and without a firing hand: the annotated
    // stream part must differ from the plain one.
    let recorder = Recorder::default();

    let (plain_source, _) = ScriptedSource::new(vec![Some(Frame::blank(64, 64))]);
    let plain = run_session(plain_source, None, dispatcher(&recorder));

    let (annotated_source, _) = ScriptedSource::new(vec![Some(Frame::blank(64, 64))]);
    let detector = ScriptedDetector::new(vec![Ok(vec![hand(
        Handedness::Left,
        [true; 5],
    )])]);
    let annotated = run_session(annotated_source, Some(detector), dispatcher(&recorder));

    assert_ne!(plain[0], annotated[0]);
}
