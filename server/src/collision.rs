//! Circle-vs-circle hit testing for the ball against player avatars.
//!
//! The test is a two-stage approximation rather than exact intersection
//! math: a cheap per-axis bounding reject first, then a sweep over evenly
//! spaced circumference angles. At sample angle theta the ball boundary
//! point at theta is paired with the player boundary point at theta + pi,
//! the pair that coincides when the two circles are tangent. Each boundary
//! point is tested against the other circle's disc grown by a fine margin,
//! which catches both tangency and the deep overlaps a teleporting avatar
//! can produce. The sweep stops at the first matching sample, so results
//! are deterministic for identical inputs.

use shared::Vec2;
use std::f32::consts::PI;

/// Tuning for [`test_hit`]. See [`crate::config::GameConfig`].
#[derive(Debug, Clone, Copy)]
pub struct HitParams {
    pub sample_count: u32,
    pub coarse_margin: f32,
    pub fine_margin: f32,
}

/// Returns true when the ball and a player avatar are touching.
///
/// Degenerate geometry (non-finite coordinates, non-positive radii) never
/// registers a hit.
pub fn test_hit(
    ball_pos: Vec2,
    ball_radius: f32,
    player_pos: Vec2,
    player_radius: f32,
    params: &HitParams,
) -> bool {
    if !ball_pos.is_finite() || !player_pos.is_finite() {
        return false;
    }
    if !(ball_radius > 0.0) || !(player_radius > 0.0) || params.sample_count == 0 {
        return false;
    }

    // Coarse reject: Chebyshev distance between centers against the sum of
    // radii plus slack. Distant players never reach the angular sweep.
    let reach = ball_radius + player_radius + params.coarse_margin;
    if (ball_pos.x - player_pos.x).abs() > reach || (ball_pos.y - player_pos.y).abs() > reach {
        return false;
    }

    let step = (2.0 * PI) / params.sample_count as f32;
    let ball_limit_sq = (ball_radius + params.fine_margin).powi(2);
    let player_limit_sq = (player_radius + params.fine_margin).powi(2);

    for i in 0..params.sample_count {
        let theta = step * i as f32;
        let (sin, cos) = theta.sin_cos();

        // Ball boundary point facing theta against the player's disc.
        let bx = ball_pos.x + ball_radius * cos;
        let by = ball_pos.y + ball_radius * sin;
        if dist_sq(bx, by, player_pos) <= player_limit_sq {
            return true;
        }

        // Mirror: player boundary point facing theta + pi against the ball.
        let px = player_pos.x - player_radius * cos;
        let py = player_pos.y - player_radius * sin;
        if dist_sq(px, py, ball_pos) <= ball_limit_sq {
            return true;
        }
    }

    false
}

fn dist_sq(x: f32, y: f32, to: Vec2) -> f32 {
    let dx = x - to.x;
    let dy = y - to.y;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> HitParams {
        HitParams {
            sample_count: 100,
            coarse_margin: 10.0,
            fine_margin: 2.0,
        }
    }

    #[test]
    fn test_overlapping_circles_hit() {
        // Ball radius 10 at (100,100), player radius 15 at (108,108): the
        // discs overlap well inside the coarse margin.
        let hit = test_hit(
            Vec2::new(100.0, 100.0),
            10.0,
            Vec2::new(108.0, 108.0),
            15.0,
            &default_params(),
        );
        assert!(hit);
    }

    #[test]
    fn test_tangent_circles_hit() {
        // Centers exactly sum-of-radii apart along the x axis.
        let hit = test_hit(
            Vec2::new(100.0, 100.0),
            10.0,
            Vec2::new(125.0, 100.0),
            15.0,
            &default_params(),
        );
        assert!(hit);
    }

    #[test]
    fn test_distant_player_rejected_by_coarse_test() {
        let hit = test_hit(
            Vec2::new(100.0, 100.0),
            10.0,
            Vec2::new(300.0, 300.0),
            15.0,
            &default_params(),
        );
        assert!(!hit);
    }

    #[test]
    fn test_near_miss_inside_coarse_margin() {
        // Passes the coarse test (gap 5 < margin 10) but the boundaries
        // stay further apart than the fine margin.
        let hit = test_hit(
            Vec2::new(100.0, 100.0),
            10.0,
            Vec2::new(130.0, 100.0),
            15.0,
            &default_params(),
        );
        assert!(!hit);
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let params = default_params();
        let ball = Vec2::new(100.0, 100.0);
        let player = Vec2::new(117.7, 117.7);
        let first = test_hit(ball, 10.0, player, 15.0, &params);
        for _ in 0..50 {
            assert_eq!(test_hit(ball, 10.0, player, 15.0, &params), first);
        }
    }

    #[test]
    fn test_degenerate_inputs_never_hit() {
        let params = default_params();
        let ball = Vec2::new(100.0, 100.0);

        assert!(!test_hit(Vec2::new(f32::NAN, 100.0), 10.0, ball, 15.0, &params));
        assert!(!test_hit(ball, 10.0, Vec2::new(100.0, f32::INFINITY), 15.0, &params));
        assert!(!test_hit(ball, 0.0, ball, 15.0, &params));
        assert!(!test_hit(ball, 10.0, ball, -1.0, &params));
    }

    #[test]
    fn test_fewer_samples_still_detect_overlap() {
        let params = HitParams {
            sample_count: 16,
            coarse_margin: 10.0,
            fine_margin: 2.0,
        };
        let hit = test_hit(
            Vec2::new(100.0, 100.0),
            10.0,
            Vec2::new(108.0, 108.0),
            15.0,
            &params,
        );
        assert!(hit);
    }
}
