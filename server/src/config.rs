//! Runtime tuning for the simulation and collision engine.
//!
//! Every value here is set from the command line in `main`; the defaults
//! come from the constants in `shared`.

use crate::collision::HitParams;

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Arena width in units. The arena is `[0, width] x [0, height]`.
    pub arena_width: f32,
    pub arena_height: f32,
    pub ball_radius: f32,
    pub player_radius: f32,
    /// Per-axis ball speed in units per tick. Only the sign ever changes.
    pub ball_speed: f32,
    /// Number of circumference samples per hit test.
    pub hit_sample_count: u32,
    /// Slack added to the bounding reject before the angular sweep runs.
    pub coarse_hit_margin: f32,
    /// Tolerance of the per-sample boundary proximity test.
    pub fine_hit_margin: f32,
    /// Ticks a player stays ineligible after deflecting the ball.
    pub cooldown_ticks: u32,
    /// Legacy physics: flip velocity once per hitting player instead of
    /// once per tick, so two simultaneous hits cancel out.
    pub per_hit_flip: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            arena_width: shared::ARENA_WIDTH,
            arena_height: shared::ARENA_HEIGHT,
            ball_radius: shared::BALL_RADIUS,
            player_radius: shared::PLAYER_RADIUS,
            ball_speed: shared::BALL_SPEED,
            hit_sample_count: shared::HIT_SAMPLE_COUNT,
            coarse_hit_margin: shared::COARSE_HIT_MARGIN,
            fine_hit_margin: shared::FINE_HIT_MARGIN,
            cooldown_ticks: shared::HIT_COOLDOWN_TICKS,
            per_hit_flip: false,
        }
    }
}

impl GameConfig {
    pub fn hit_params(&self) -> HitParams {
        HitParams {
            sample_count: self.hit_sample_count,
            coarse_margin: self.coarse_hit_margin,
            fine_margin: self.fine_hit_margin,
        }
    }
}
