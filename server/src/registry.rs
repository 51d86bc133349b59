//! Player registry and per-player hit-cooldown state machine.
//!
//! The registry is owned by the simulation task; connection handlers never
//! touch it directly. A player entry exists exactly as long as its
//! connection does. Cooldown is an explicit tick counter rather than the
//! implicit "ball drifted out of range" behavior: a player who deflects
//! the ball is `Cooling` for a configured number of ticks and becomes
//! `Ready` again exactly once.

use log::{debug, info, warn};
use rand::Rng;
use shared::Vec2;
use std::collections::HashMap;

/// Hit eligibility of a single player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitState {
    Ready,
    Cooling { remaining_ticks: u32 },
}

/// A connected player's avatar as the simulation sees it.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub pos: Vec2,
    pub hit_state: HitState,
}

/// All currently connected players, keyed by their stable connection id.
pub struct PlayerRegistry {
    players: HashMap<String, Player>,
    arena_width: f32,
    arena_height: f32,
    cooldown_ticks: u32,
}

impl PlayerRegistry {
    pub fn new(arena_width: f32, arena_height: f32, cooldown_ticks: u32) -> Self {
        Self {
            players: HashMap::new(),
            arena_width,
            arena_height,
            cooldown_ticks,
        }
    }

    /// Adds a player at a random position inside the arena, immediately
    /// eligible to hit. A duplicate id silently replaces the old entry;
    /// the new connection owns the id.
    pub fn add_player(&mut self, id: &str) {
        let mut rng = rand::thread_rng();
        let pos = Vec2::new(
            rng.gen_range(0.0..self.arena_width),
            rng.gen_range(0.0..self.arena_height),
        );

        if self.players.contains_key(id) {
            warn!("Player {} rejoined, replacing existing entry", id);
        }
        info!("Added player {} at ({:.1}, {:.1})", id, pos.x, pos.y);

        self.players.insert(
            id.to_string(),
            Player {
                id: id.to_string(),
                pos,
                hit_state: HitState::Ready,
            },
        );
    }

    /// Evicts a player. Unknown ids are a logged no-op; the eviction takes
    /// effect before the next tick's collision checks.
    pub fn remove_player(&mut self, id: &str) {
        if self.players.remove(id).is_some() {
            info!("Removed player {}", id);
        } else {
            debug!("Ignoring removal of unknown player {}", id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Starts the cooldown for a player who just deflected the ball.
    /// Unknown ids are tolerated: the player may have left mid-tick.
    pub fn record_hit(&mut self, id: &str) {
        if let Some(player) = self.players.get_mut(id) {
            player.hit_state = if self.cooldown_ticks == 0 {
                HitState::Ready
            } else {
                HitState::Cooling {
                    remaining_ticks: self.cooldown_ticks,
                }
            };
        }
    }

    /// Advances every cooling player by one tick. Called once at the start
    /// of each simulation tick, so re-enabling happens exactly once.
    pub fn tick_cooldowns(&mut self) {
        for player in self.players.values_mut() {
            if let HitState::Cooling { remaining_ticks } = player.hit_state {
                player.hit_state = if remaining_ticks <= 1 {
                    HitState::Ready
                } else {
                    HitState::Cooling {
                        remaining_ticks: remaining_ticks - 1,
                    }
                };
            }
        }
    }

    /// Ids of players whose cooldown allows a new deflection this tick.
    pub fn eligible_for_hit_check(&self) -> Vec<String> {
        self.players
            .values()
            .filter(|p| p.hit_state == HitState::Ready)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Applies a client-reported avatar position after bounds sanity
    /// checks. Non-finite or out-of-arena coordinates are dropped and the
    /// last known good position is kept. Returns true when the update
    /// applied.
    pub fn update_position(&mut self, id: &str, x: f32, y: f32) -> bool {
        let pos = Vec2::new(x, y);
        if !pos.is_finite()
            || !(0.0..=self.arena_width).contains(&x)
            || !(0.0..=self.arena_height).contains(&y)
        {
            warn!("Dropping invalid position ({}, {}) for player {}", x, y, id);
            return false;
        }

        match self.players.get_mut(id) {
            Some(player) => {
                player.pos = pos;
                true
            }
            None => {
                debug!("Ignoring move for unknown player {}", id);
                false
            }
        }
    }
}
