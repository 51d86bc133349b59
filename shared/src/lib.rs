use serde::{Deserialize, Serialize};

// Default tuning used by the server binary and the tests. The running
// server takes all of these from its command line instead.
pub const ARENA_WIDTH: f32 = 400.0;
pub const ARENA_HEIGHT: f32 = 400.0;
pub const BALL_RADIUS: f32 = 10.0;
pub const PLAYER_RADIUS: f32 = 15.0;
pub const BALL_SPEED: f32 = 3.0;
pub const TICK_INTERVAL_MS: u64 = 20;
pub const HIT_SAMPLE_COUNT: u32 = 100;
pub const COARSE_HIT_MARGIN: f32 = 10.0;
pub const FINE_HIT_MARGIN: f32 = 2.0;
pub const HIT_COOLDOWN_TICKS: u32 = 25;

/// A point or displacement in arena coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Wire messages exchanged between clients and the server, bincode-encoded
/// one packet per UDP datagram.
///
/// Clients send `Join`, `Move` and `Leave`. The server broadcasts `BallPos`
/// every tick and relays `PlayerJoined` / `PlayerLeft` / `PlayerMoved` so
/// every client can render all avatars.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Join {
        id: String,
    },
    Move {
        id: String,
        x: f32,
        y: f32,
    },
    Leave {
        id: String,
    },

    BallPos {
        x: f32,
        y: f32,
    },
    PlayerJoined {
        id: String,
    },
    PlayerLeft {
        id: String,
    },
    PlayerMoved {
        id: String,
        x: f32,
        y: f32,
    },
}
