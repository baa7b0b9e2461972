use anyhow::Context;
use ledconfig::get_config;
use ledkiosk::logging::init_logging;
use ledkiosk::{AppState, KioskServer, NowPlayingCycle, PollScheduler};
use ledmatrix::{DisplaySurface, HttpSampler, MatrixConfigExt, MatrixRenderer};
use ledspotify::{SessionAuth, SpotifyConfigExt, SpotifyFetcher, TokenStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_config();
    init_logging(&config);

    // ========== PHASE 1 : Configuration ==========
    let settings = config
        .matrix_settings()
        .context("invalid display configuration")?;
    let timeout = config.get_request_timeout()?;
    info!(
        matrix_size = settings.matrix_size,
        canvas_size = settings.canvas_size,
        led_shape = %settings.led_shape,
        poll_interval_ms = settings.poll_interval_ms,
        "🟥 LED matrix configured"
    );

    // ========== PHASE 2 : Spotify ==========
    let spotify = config.build_spotify_client(timeout)?;
    let http = spotify.http_client().clone();

    let mut store = match config.get_spotify_access_token()? {
        Some(token) => {
            info!("Using access token from configuration");
            TokenStore::with_token(token)
        }
        None => TokenStore::new(),
    };
    if let Some(refresh_token) = config.get_spotify_refresh_token()? {
        store = store.with_refresh_token(refresh_token);
    }
    let tokens = Arc::new(store.with_persistence(config.clone()));

    let session = if config.get_spotify_client_id()?.is_empty() {
        warn!("⚠️ spotify.client_id is not set, login is disabled");
        None
    } else {
        let auth = config.build_auth_client(http.clone())?;
        info!(redirect_uri = auth.redirect_uri(), "Spotify login enabled");
        Some(SessionAuth::new(auth, tokens.clone()))
    };

    // ========== PHASE 3 : Pipeline ==========
    let mut fetcher = SpotifyFetcher::new(spotify, tokens.clone());
    if let Some(session) = &session {
        fetcher = fetcher.with_refresh(session.clone());
    }
    let fetcher = Arc::new(fetcher);
    let sampler = Arc::new(HttpSampler::with_client(
        http,
        settings.matrix_size,
        settings.resample_filter,
    ));
    let surface = DisplaySurface::shared(settings.canvas_size);
    let cycle = Arc::new(
        NowPlayingCycle::new(
            fetcher,
            sampler,
            MatrixRenderer::new(&settings),
            surface.clone(),
        )
        .with_terminal_preview(settings.terminal_preview),
    );
    let mut scheduler = PollScheduler::new(cycle.clone(), settings.poll_interval());

    // ========== PHASE 4 : Serveur HTTP ==========
    let shutdown = CancellationToken::new();
    let state = AppState {
        surface,
        tokens,
        session,
        cycle,
        settings,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], config.get_http_port()));
    let mut server = KioskServer::new(addr, state);
    server
        .start(shutdown.clone())
        .await
        .with_context(|| format!("cannot bind {addr}"))?;

    scheduler.start();

    info!("✅ Kiosk ready at {}", config.get_base_url());
    info!("Press Ctrl+C to stop...");

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C reçu, arrêt gracieux");

    scheduler.stop();
    shutdown.cancel();
    server.wait().await;

    Ok(())
}
