//! Kiosk HTTP server
//!
//! Routes:
//!
//! - `GET /` - kiosk page showing the LED matrix (or a login link)
//! - `GET /login` - starts the PKCE login
//! - `GET /callback` - OAuth redirect target
//! - `GET /matrix.png` - current frame
//! - `GET /api/status` - JSON status

use crate::pipeline::{CycleStats, NowPlayingCycle};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use ledmatrix::{LedShape, MatrixConfig, SharedSurface};
use ledspotify::{SessionAuth, TokenStore};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>LED Matrix</title>
<style>
  html, body { margin: 0; height: 100%; background: #000; color: #ccc; font-family: sans-serif; }
  body { display: flex; align-items: center; justify-content: center; }
  img { width: min(100vw, 100vh); height: min(100vw, 100vh); image-rendering: pixelated; }
  a { color: #1db954; font-size: 1.5em; }
</style>
</head>
<body>
__BODY__
</body>
</html>
"#;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub surface: SharedSurface,
    pub tokens: Arc<TokenStore>,
    /// `None` when no client id is configured
    pub session: Option<SessionAuth>,
    pub cycle: Arc<NowPlayingCycle>,
    pub settings: MatrixConfig,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /api/status`
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub authenticated: bool,
    pub login_available: bool,
    pub matrix_size: u32,
    pub canvas_size: u32,
    pub led_shape: LedShape,
    pub poll_interval_ms: u64,
    #[serde(flatten)]
    pub stats: CycleStats,
}

/// Builds the kiosk router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/matrix.png", get(matrix_png))
        .route("/api/status", get(status))
        .with_state(state)
}

fn page(body: &str) -> Html<String> {
    Html(PAGE_TEMPLATE.replace("__BODY__", body))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    if state.tokens.is_authenticated() {
        let interval = state.settings.poll_interval_ms;
        page(&format!(
            r#"<img id="matrix" src="/matrix.png" alt="LED matrix">
<script>
  setInterval(() => {{
    document.getElementById("matrix").src = "/matrix.png?t=" + Date.now();
  }}, {interval});
</script>"#
        ))
    } else if state.session.is_some() {
        page(r#"<a href="/login">Log in with Spotify</a>"#)
    } else {
        page("<p>Set <code>spotify.client_id</code> in config.yaml to enable login.</p>")
    }
}

async fn login(State(state): State<AppState>) -> Response {
    let Some(session) = &state.session else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            page("<p>Login is not configured.</p>"),
        )
            .into_response();
    };

    match session.begin_login() {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => {
            error!("Cannot build authorize URL: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, page("<p>Login failed.</p>")).into_response()
        }
    }
}

async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(err) = params.error {
        warn!(error = %err, "Authorization denied");
        return (
            StatusCode::BAD_REQUEST,
            page(&format!("<p>Authorization failed: {}</p>", escape(&err))),
        )
            .into_response();
    }

    let (Some(code), Some(session)) = (params.code, &state.session) else {
        return (
            StatusCode::BAD_REQUEST,
            page("<p>Missing authorization code.</p>"),
        )
            .into_response();
    };

    match session.on_authenticated(&code).await {
        Ok(_) => {
            info!("✅ Logged in, redirecting to the kiosk page");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            warn!("Token exchange failed: {}", e);
            (
                StatusCode::BAD_REQUEST,
                page(&format!("<p>Login failed: {}</p>", escape(&e.to_string()))),
            )
                .into_response()
        }
    }
}

/// Copies the current frame and encodes it off the async runtime
///
/// The surface lock is released before this returns.
fn encode_frame(surface: &SharedSurface) -> JoinHandle<ledmatrix::Result<Vec<u8>>> {
    let frame = surface.read().unwrap_or_else(|e| e.into_inner()).clone();
    tokio::task::spawn_blocking(move || frame.encode_png())
}

async fn matrix_png(State(state): State<AppState>) -> Response {
    let encoded = match encode_frame(&state.surface).await {
        Ok(encoded) => encoded,
        Err(e) => {
            error!("PNG encoding task failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match encoded {
        Ok(png) => (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            png,
        )
            .into_response(),
        Err(e) => {
            error!("PNG encoding failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport {
        authenticated: state.tokens.is_authenticated(),
        login_available: state.session.is_some(),
        matrix_size: state.settings.matrix_size,
        canvas_size: state.settings.canvas_size,
        led_shape: state.settings.led_shape,
        poll_interval_ms: state.settings.poll_interval_ms,
        stats: state.cycle.stats(),
    })
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// HTTP server for the kiosk page
pub struct KioskServer {
    addr: SocketAddr,
    router: Router,
    join_handle: Option<JoinHandle<()>>,
}

impl KioskServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            router: router(state),
            join_handle: None,
        }
    }

    /// Binds and starts serving until `shutdown` is cancelled
    ///
    /// Returns the bound address (useful with port 0).
    pub async fn start(&mut self, shutdown: CancellationToken) -> std::io::Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let local = listener.local_addr()?;
        info!("Kiosk server listening on http://{}", local);

        let router = self.router.clone();
        self.join_handle = Some(tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = served {
                error!("Kiosk server error: {}", e);
            }
        }));
        Ok(local)
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>&\"</b>"), "&lt;b&gt;&amp;&quot;&lt;/b&gt;");
    }

    #[tokio::test]
    async fn test_encode_frame_releases_surface() {
        let surface = ledmatrix::DisplaySurface::shared(600);
        let pending = encode_frame(&surface);

        // Le rendu suivant n'attend pas l'encodage
        surface
            .try_write()
            .unwrap()
            .clear(ledmatrix::Rgb::new(0, 0, 255));

        let png = pending.await.unwrap().unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (600, 600));
        assert_eq!(img.get_pixel(300, 300).0, [0, 0, 0]);
    }

    #[test]
    fn test_page_template() {
        let html = page("<p>hi</p>").0;
        assert!(html.contains("<p>hi</p>"));
        assert!(!html.contains("__BODY__"));
    }
}
