//! Fire-and-forget notifications toward a presentation layer.
//!
//! The core never waits on these callbacks and ignores anything they might
//! want to report back; rendering is entirely outside this crate.

use log::info;

/// Receiver for presentation-level game events.
///
/// All methods default to no-ops so implementations only override what
/// they render.
pub trait Presentation: Send {
    fn on_player_joined(&mut self, _id: &str) {}
    fn on_player_left(&mut self, _id: &str) {}
    fn on_ball_moved(&mut self, _x: f32, _y: f32) {}
    fn on_player_moved(&mut self, _id: &str, _x: f32, _y: f32) {}
}

/// Presentation sink that discards every event.
#[derive(Debug, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {}

/// Presentation sink that logs joins and leaves. Used by the server binary
/// where no real renderer is attached.
#[derive(Debug, Default)]
pub struct LogPresentation;

impl Presentation for LogPresentation {
    fn on_player_joined(&mut self, id: &str) {
        info!("Player {} joined the arena", id);
    }

    fn on_player_left(&mut self, id: &str) {
        info!("Player {} left the arena", id);
    }
}
