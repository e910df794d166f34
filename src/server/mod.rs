//! HTTP surface: axum server hosting the viewer page and the video feed.

mod routes;
mod stream;

pub use routes::{create_router, AppState};
pub use stream::{encode_jpeg, multipart_part, StreamSession, BOUNDARY, FEED_CONTENT_TYPE};

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;

/// Run the HTTP server until the shutdown signal fires.
pub async fn run_server(
    config: Arc<Config>,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let addr: SocketAddr = config.server.bind_addr().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let app = create_router(AppState { config });

    log::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            log::info!("server shutting down");
        })
        .await
}
