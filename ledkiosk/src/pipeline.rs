//! One poll cycle: fetch → sample → render

use crate::error::CycleError;
use async_trait::async_trait;
use ledmatrix::{ArtworkSampler, ColorGrid, MatrixRenderer, SharedSurface, preview};
use ledspotify::{NowPlayingSource, TrackInfo, TrackSnapshot};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Work done on every scheduler tick
#[async_trait]
pub trait Cycle: Send + Sync {
    async fn run_cycle(&self) -> Result<CycleOutcome, CycleError>;
}

/// How a successful cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// A new frame was drawn
    Rendered,
    /// The artwork grid matched the frame on display
    Unchanged,
    NoActiveSession,
    NothingPlaying,
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Rendered => "rendered",
            CycleOutcome::Unchanged => "unchanged",
            CycleOutcome::NoActiveSession => "no_active_session",
            CycleOutcome::NothingPlaying => "nothing_playing",
        }
    }
}

/// Counters exposed on `/api/status`
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleStats {
    pub cycles: u64,
    pub last_outcome: Option<&'static str>,
    pub now_playing: Option<TrackInfo>,
}

#[derive(Debug, Default)]
struct CycleState {
    last_grid: Option<ColorGrid>,
    stats: CycleStats,
}

/// The kiosk's cycle: query the player, sample the artwork, draw the LEDs
///
/// Only a `Playing` snapshot reaches the sampler and the renderer; every
/// other outcome leaves the surface as it was.
pub struct NowPlayingCycle {
    source: Arc<dyn NowPlayingSource>,
    sampler: Arc<dyn ArtworkSampler>,
    renderer: MatrixRenderer,
    surface: SharedSurface,
    terminal_preview: bool,
    state: Mutex<CycleState>,
}

impl NowPlayingCycle {
    pub fn new(
        source: Arc<dyn NowPlayingSource>,
        sampler: Arc<dyn ArtworkSampler>,
        renderer: MatrixRenderer,
        surface: SharedSurface,
    ) -> Self {
        Self {
            source,
            sampler,
            renderer,
            surface,
            terminal_preview: false,
            state: Mutex::new(CycleState::default()),
        }
    }

    /// Dump every new grid as text at `debug` level
    pub fn with_terminal_preview(mut self, enabled: bool) -> Self {
        self.terminal_preview = enabled;
        self
    }

    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    pub fn stats(&self) -> CycleStats {
        self.state().stats.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, CycleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn process(&self, snapshot: TrackSnapshot) -> Result<CycleOutcome, CycleError> {
        match snapshot {
            TrackSnapshot::NoActiveSession => Ok(CycleOutcome::NoActiveSession),
            TrackSnapshot::NothingPlaying => Ok(CycleOutcome::NothingPlaying),
            TrackSnapshot::FetchError { cause } => Err(CycleError::Fetch(cause)),
            TrackSnapshot::Playing { artwork_url, track } => {
                if let Some(track) = track {
                    self.note_track(track);
                }

                let grid = self
                    .sampler
                    .sample(&artwork_url)
                    .await
                    .map_err(CycleError::Sample)?;

                if self.state().last_grid.as_ref() == Some(&grid) {
                    return Ok(CycleOutcome::Unchanged);
                }

                if self.terminal_preview {
                    debug!("\n{}", preview::ascii(&grid));
                }

                {
                    let mut surface = self.surface.write().unwrap_or_else(|e| e.into_inner());
                    self.renderer
                        .render(&grid, &mut surface)
                        .map_err(CycleError::Render)?;
                }

                debug!(artwork = %artwork_url, "Frame rendered");
                self.state().last_grid = Some(grid);
                Ok(CycleOutcome::Rendered)
            }
        }
    }

    fn note_track(&self, track: TrackInfo) {
        let mut state = self.state();
        let changed = state
            .stats
            .now_playing
            .as_ref()
            .is_none_or(|current| current.id != track.id);

        if changed {
            info!("🎵 Now playing: {}", track.display());
        } else {
            debug!(track = %track.display(), "Same track");
        }
        state.stats.now_playing = Some(track);
    }
}

#[async_trait]
impl Cycle for NowPlayingCycle {
    async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let snapshot = self.source.now_playing().await;
        debug!(snapshot = snapshot.label(), "Playback state");

        let result = self.process(snapshot).await;

        let mut state = self.state();
        state.stats.cycles += 1;
        state.stats.last_outcome = Some(match &result {
            Ok(outcome) => outcome.label(),
            Err(e) => e.label(),
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledmatrix::{DisplaySurface, LedShape, MatrixConfig, Rgb};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedSource(Mutex<VecDeque<TrackSnapshot>>);

    impl ScriptedSource {
        fn new(snapshots: Vec<TrackSnapshot>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(snapshots.into())))
        }
    }

    #[async_trait]
    impl NowPlayingSource for ScriptedSource {
        async fn now_playing(&self) -> TrackSnapshot {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(TrackSnapshot::NothingPlaying)
        }
    }

    /// Renvoie une grille unie dont la couleur dépend de l'URL
    struct FakeSampler {
        size: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ArtworkSampler for FakeSampler {
        async fn sample(&self, url: &str) -> ledmatrix::Result<ColorGrid> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let color = match url {
                "red" => Rgb::new(255, 0, 0),
                "blue" => Rgb::new(0, 0, 255),
                _ => return Err(ledmatrix::Error::Status(404)),
            };
            Ok(ColorGrid::filled(self.size, color))
        }
    }

    fn playing(url: &str, id: &str) -> TrackSnapshot {
        TrackSnapshot::Playing {
            artwork_url: url.to_string(),
            track: Some(TrackInfo {
                id: id.to_string(),
                name: format!("Track {id}"),
                artists: vec!["Artist".to_string()],
            }),
        }
    }

    fn cycle(snapshots: Vec<TrackSnapshot>) -> (NowPlayingCycle, Arc<FakeSampler>) {
        let settings = MatrixConfig {
            canvas_size: 10,
            matrix_size: 2,
            led_shape: LedShape::Square,
            ..Default::default()
        };
        let sampler = Arc::new(FakeSampler {
            size: 2,
            calls: AtomicUsize::new(0),
        });
        let cycle = NowPlayingCycle::new(
            ScriptedSource::new(snapshots),
            sampler.clone(),
            MatrixRenderer::new(&settings),
            DisplaySurface::shared(settings.canvas_size),
        );
        (cycle, sampler)
    }

    fn pixel(cycle: &NowPlayingCycle, x: u32, y: u32) -> Rgb {
        cycle.surface().read().unwrap().pixel(x, y)
    }

    #[tokio::test]
    async fn test_red_artwork_scenario() {
        let (cycle, _) = cycle(vec![playing("red", "a")]);
        assert_eq!(cycle.run_cycle().await.unwrap(), CycleOutcome::Rendered);

        for y in 0..10 {
            for x in 0..10 {
                let inside = (1..=3).contains(&(x % 5)) && (1..=3).contains(&(y % 5));
                let expected = if inside {
                    Rgb::new(255, 0, 0)
                } else {
                    Rgb::BLACK
                };
                assert_eq!(pixel(&cycle, x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[tokio::test]
    async fn test_nothing_playing_keeps_prior_frame() {
        let (cycle, sampler) = cycle(vec![
            playing("red", "a"),
            TrackSnapshot::NothingPlaying,
            TrackSnapshot::NoActiveSession,
        ]);
        cycle.run_cycle().await.unwrap();
        assert_eq!(
            cycle.run_cycle().await.unwrap(),
            CycleOutcome::NothingPlaying
        );
        assert_eq!(
            cycle.run_cycle().await.unwrap(),
            CycleOutcome::NoActiveSession
        );

        assert_eq!(sampler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(pixel(&cycle, 2, 2), Rgb::new(255, 0, 0));
    }

    #[tokio::test]
    async fn test_fetch_error_skips_sampler() {
        let (cycle, sampler) = cycle(vec![TrackSnapshot::FetchError {
            cause: ledspotify::Error::api(500, "boom"),
        }]);
        let err = cycle.run_cycle().await.unwrap_err();
        assert!(matches!(err, CycleError::Fetch(_)));
        assert_eq!(sampler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(cycle.stats().last_outcome, Some("fetch_error"));
    }

    #[tokio::test]
    async fn test_sample_error_keeps_frame() {
        let (cycle, _) = cycle(vec![playing("red", "a"), playing("missing", "b")]);
        cycle.run_cycle().await.unwrap();

        let err = cycle.run_cycle().await.unwrap_err();
        assert!(matches!(err, CycleError::Sample(_)));
        assert_eq!(pixel(&cycle, 2, 2), Rgb::new(255, 0, 0));
        assert_eq!(cycle.stats().last_outcome, Some("image_load_error"));
    }

    #[tokio::test]
    async fn test_identical_grid_is_not_redrawn() {
        let (cycle, _) = cycle(vec![
            playing("red", "a"),
            playing("red", "a"),
            playing("blue", "b"),
        ]);
        assert_eq!(cycle.run_cycle().await.unwrap(), CycleOutcome::Rendered);
        assert_eq!(cycle.run_cycle().await.unwrap(), CycleOutcome::Unchanged);
        assert_eq!(cycle.run_cycle().await.unwrap(), CycleOutcome::Rendered);
        assert_eq!(pixel(&cycle, 2, 2), Rgb::new(0, 0, 255));

        let stats = cycle.stats();
        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.now_playing.unwrap().id, "b");
    }
}
