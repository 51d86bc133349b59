//! Authoritative ball simulation.
//!
//! `GameState::step` is the whole per-tick pipeline: cooldown bookkeeping,
//! ball advance, hit checks against every eligible player, velocity
//! resolution and wall reflection. It runs on a single task; nothing else
//! mutates the ball.

use crate::collision::{test_hit, HitParams};
use crate::config::GameConfig;
use crate::registry::PlayerRegistry;
use log::debug;
use shared::Vec2;

#[derive(Debug, Clone, Copy)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

/// What a single tick produced, for broadcast and presentation fan-out.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub ball_pos: Vec2,
    /// Players who deflected the ball this tick, in check order.
    pub hitters: Vec<String>,
}

pub struct GameState {
    pub tick: u64,
    pub ball: Ball,
    pub registry: PlayerRegistry,
    config: GameConfig,
    hit_params: HitParams,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        let registry = PlayerRegistry::new(
            config.arena_width,
            config.arena_height,
            config.cooldown_ticks,
        );
        // Ball starts at (100, 100) drifting down-right.
        let ball = Ball {
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::new(config.ball_speed, config.ball_speed),
            radius: config.ball_radius,
        };
        let hit_params = config.hit_params();

        Self {
            tick: 0,
            ball,
            registry,
            config,
            hit_params,
        }
    }

    /// Advances the simulation by one tick and returns the authoritative
    /// result. A player that vanished mid-tick simply fails the lookup and
    /// is skipped; nothing here can abort a tick.
    pub fn step(&mut self) -> TickOutcome {
        self.registry.tick_cooldowns();

        self.ball.pos.x += self.ball.vel.x;
        self.ball.pos.y += self.ball.vel.y;

        // Every eligible hit this tick is recorded, but by default the
        // velocity flips at most once so simultaneous deflections cannot
        // cancel each other out. `per_hit_flip` restores the legacy
        // flip-per-hit behavior.
        let mut hitters = Vec::new();
        for id in self.registry.eligible_for_hit_check() {
            let Some(player) = self.registry.get(&id) else {
                continue;
            };
            if test_hit(
                self.ball.pos,
                self.ball.radius,
                player.pos,
                self.config.player_radius,
                &self.hit_params,
            ) {
                hitters.push(id);
            }
        }

        for id in &hitters {
            debug!("Ball deflected by player {}", id);
            self.registry.record_hit(id);
        }

        let flips = if self.config.per_hit_flip {
            hitters.len()
        } else {
            usize::from(!hitters.is_empty())
        };
        if flips % 2 == 1 {
            self.ball.vel.x = -self.ball.vel.x;
            self.ball.vel.y = -self.ball.vel.y;
        }

        self.reflect_off_walls();

        self.tick += 1;
        TickOutcome {
            ball_pos: self.ball.pos,
            hitters,
        }
    }

    /// Bounces the ball off the arena edges and clamps it back inside.
    /// Runs after collision resolution; each axis only flips when the ball
    /// is still heading out, so a collision flip is never undone.
    fn reflect_off_walls(&mut self) {
        let ball = &mut self.ball;
        let (min_x, max_x) = (ball.radius, self.config.arena_width - ball.radius);
        let (min_y, max_y) = (ball.radius, self.config.arena_height - ball.radius);

        if (ball.pos.x >= max_x && ball.vel.x > 0.0) || (ball.pos.x <= min_x && ball.vel.x < 0.0) {
            ball.vel.x = -ball.vel.x;
        }
        if (ball.pos.y >= max_y && ball.vel.y > 0.0) || (ball.pos.y <= min_y && ball.vel.y < 0.0) {
            ball.vel.y = -ball.vel.y;
        }

        ball.pos.x = ball.pos.x.clamp(min_x, max_x);
        ball.pos.y = ball.pos.y.clamp(min_y, max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn game() -> GameState {
        GameState::new(GameConfig::default())
    }

    fn place_player(game: &mut GameState, id: &str, x: f32, y: f32) {
        game.registry.add_player(id);
        assert!(game.registry.update_position(id, x, y));
    }

    #[test]
    fn test_ball_advances_by_velocity() {
        let mut g = game();
        let outcome = g.step();
        assert_approx_eq!(outcome.ball_pos.x, 103.0, 1e-4);
        assert_approx_eq!(outcome.ball_pos.y, 103.0, 1e-4);
        assert_eq!(g.tick, 1);
    }

    #[test]
    fn test_hit_flips_both_velocity_components_once() {
        let mut g = game();
        place_player(&mut g, "a", 108.0, 108.0);

        let outcome = g.step();
        assert_eq!(outcome.hitters, vec!["a".to_string()]);
        assert_approx_eq!(g.ball.vel.x, -3.0, 1e-4);
        assert_approx_eq!(g.ball.vel.y, -3.0, 1e-4);
    }

    #[test]
    fn test_simultaneous_hits_flip_once_by_default() {
        let mut g = game();
        place_player(&mut g, "a", 108.0, 108.0);
        place_player(&mut g, "b", 98.0, 98.0);

        let outcome = g.step();
        assert_eq!(outcome.hitters.len(), 2);
        // One net flip, not two.
        assert_approx_eq!(g.ball.vel.x, -3.0, 1e-4);
        assert_approx_eq!(g.ball.vel.y, -3.0, 1e-4);
    }

    #[test]
    fn test_per_hit_flip_mode_lets_simultaneous_hits_cancel() {
        let config = GameConfig {
            per_hit_flip: true,
            ..GameConfig::default()
        };
        let mut g = GameState::new(config);
        place_player(&mut g, "a", 108.0, 108.0);
        place_player(&mut g, "b", 98.0, 98.0);

        let outcome = g.step();
        assert_eq!(outcome.hitters.len(), 2);
        // Two flips compose back to the original direction.
        assert_approx_eq!(g.ball.vel.x, 3.0, 1e-4);
        assert_approx_eq!(g.ball.vel.y, 3.0, 1e-4);
    }

    #[test]
    fn test_hitter_enters_cooldown_and_cannot_rehit() {
        let mut g = game();
        place_player(&mut g, "a", 108.0, 108.0);

        let first = g.step();
        assert_eq!(first.hitters.len(), 1);

        // Park the ball on top of the player again; the cooldown must keep
        // the player out of the hit check.
        g.ball.pos = Vec2::new(100.0, 100.0);
        g.ball.vel = Vec2::new(0.0, 0.0);
        let second = g.step();
        assert!(second.hitters.is_empty());
    }

    #[test]
    fn test_removed_player_is_never_a_ghost_target() {
        let mut g = game();
        place_player(&mut g, "a", 108.0, 108.0);
        g.registry.remove_player("a");

        let outcome = g.step();
        assert!(outcome.hitters.is_empty());
        assert_approx_eq!(g.ball.vel.x, 3.0, 1e-4);
    }

    #[test]
    fn test_right_wall_reflection_flips_dx_and_clamps() {
        let mut g = game();
        g.ball.pos = Vec2::new(395.0, 200.0);
        g.ball.vel = Vec2::new(3.0, 0.0);

        let outcome = g.step();
        assert_approx_eq!(g.ball.vel.x, -3.0, 1e-4);
        assert!(outcome.ball_pos.x <= 390.0);
    }

    #[test]
    fn test_left_and_top_walls_reflect_independently() {
        let mut g = game();
        g.ball.pos = Vec2::new(11.0, 11.0);
        g.ball.vel = Vec2::new(-3.0, -3.0);

        g.step();
        assert_approx_eq!(g.ball.vel.x, 3.0, 1e-4);
        assert_approx_eq!(g.ball.vel.y, 3.0, 1e-4);
        assert!(g.ball.pos.x >= 10.0);
        assert!(g.ball.pos.y >= 10.0);
    }

    #[test]
    fn test_ball_stays_in_bounds_over_many_ticks() {
        let mut g = game();
        for _ in 0..10_000 {
            let outcome = g.step();
            assert!((10.0..=390.0).contains(&outcome.ball_pos.x));
            assert!((10.0..=390.0).contains(&outcome.ball_pos.y));
        }
    }

    #[test]
    fn test_corner_hit_does_not_push_ball_out() {
        let mut g = game();
        // Player glued to the ball in the corner: the collision flip and
        // the wall reflection both fire in the same tick.
        g.ball.pos = Vec2::new(388.0, 388.0);
        g.ball.vel = Vec2::new(3.0, 3.0);
        place_player(&mut g, "a", 380.0, 380.0);

        let outcome = g.step();
        assert!((10.0..=390.0).contains(&outcome.ball_pos.x));
        assert!((10.0..=390.0).contains(&outcome.ball_pos.y));
    }
}
