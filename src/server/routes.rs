//! HTTP routes: the viewer page and the multipart video feed.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::stream::{StreamSession, FEED_CONTENT_TYPE};
use crate::actions::Sinks;
use crate::camera::CameraCapture;
use crate::config::Config;
use crate::detect::OrtLandmarker;
use crate::gesture::{GestureDispatcher, RuleSet};

/// Embedded viewer page.
const INDEX_HTML: &str = include_str!("index.html");

/// Queued parts between the session thread and the HTTP response. Small on
/// purpose: the camera paces the loop, the channel only absorbs jitter.
const PART_QUEUE: usize = 4;

/// Volume level assumed when the system mixer cannot be read.
const FALLBACK_VOLUME: f32 = 0.5;

/// Shared read-only state for the handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/video_feed", get(video_feed))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Start one streaming session and hand its parts to the client as a
/// `multipart/x-mixed-replace` body. The session ends when the camera fails
/// or the client goes away; the client only ever sees a terminated stream,
/// never a structured error.
async fn video_feed(State(state): State<AppState>) -> Response {
    let (tx, rx) = mpsc::channel::<Bytes>(PART_QUEUE);

    let config = state.config.clone();
    let spawned = std::thread::Builder::new()
        .name("stream-session".to_string())
        .spawn(move || run_session(&config, tx));
    if let Err(e) = spawned {
        // The receiver sees a closed channel and the client a terminated stream.
        log::error!("couldn't spawn stream session: {}", e);
    }

    let body = Body::from_stream(futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|part| (Ok::<Bytes, Infallible>(part), rx))
    }));

    ([(header::CONTENT_TYPE, FEED_CONTENT_TYPE)], body).into_response()
}

/// Build and run one session on the current (blocking) thread.
///
/// Each viewer connection independently opens the camera; with a second
/// concurrent viewer the open fails (or the platform multiplexes) and that
/// stream simply terminates. Single-operator deployment is the intended use.
fn run_session(config: &Config, tx: mpsc::Sender<Bytes>) {
    let camera = match CameraCapture::open(config.camera_settings()) {
        Ok(camera) => camera,
        Err(e) => {
            log::error!("cannot open camera: {}", e);
            return;
        }
    };

    let detector = match OrtLandmarker::new(config.landmarker_settings()) {
        Ok(detector) => Some(detector),
        Err(e) => {
            log::warn!("hand detection disabled for this session: {}", e);
            None
        }
    };

    let mut sinks = Sinks::system(config.screenshot.dir.clone());
    let initial_volume = match sinks.volume.current() {
        Ok(level) => level,
        Err(e) => {
            log::warn!("couldn't read system volume, assuming {}%: {}", (FALLBACK_VOLUME * 100.0) as u32, e);
            FALLBACK_VOLUME
        }
    };
    log::info!("session volume: {}%", (initial_volume * 100.0).round() as u32);

    let dispatcher = GestureDispatcher::new(RuleSet::standard(), sinks, initial_volume);

    StreamSession::new(camera, detector, dispatcher, config.stream.jpeg_quality).run(tx);
}
