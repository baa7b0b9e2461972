//! # ledkiosk - Now-playing album art on a simulated LED matrix
//!
//! Wires the pieces together:
//!
//! - [`pipeline`]: one cycle, fetch → sample → render
//! - [`scheduler`]: runs the cycle at a fixed delay
//! - [`server`]: kiosk page, login flow and the rendered frame over HTTP
//! - [`logging`]: tracing subscriber configured from `ledconfig`

pub mod error;
pub mod logging;
pub mod pipeline;
pub mod scheduler;
pub mod server;

pub use error::CycleError;
pub use pipeline::{Cycle, CycleOutcome, CycleStats, NowPlayingCycle};
pub use scheduler::PollScheduler;
pub use server::{AppState, KioskServer};
