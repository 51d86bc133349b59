use clap::Parser;
use server::config::GameConfig;
use server::events::LogPresentation;
use server::network::Server;
use std::time::Duration;

/// Authoritative dodgeball game server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Simulation tick interval in milliseconds
    #[clap(short, long, default_value_t = shared::TICK_INTERVAL_MS)]
    tick_ms: u64,
    /// Arena width in units
    #[clap(long, default_value_t = shared::ARENA_WIDTH)]
    arena_width: f32,
    /// Arena height in units
    #[clap(long, default_value_t = shared::ARENA_HEIGHT)]
    arena_height: f32,
    /// Ball radius
    #[clap(long, default_value_t = shared::BALL_RADIUS)]
    ball_radius: f32,
    /// Player avatar radius
    #[clap(long, default_value_t = shared::PLAYER_RADIUS)]
    player_radius: f32,
    /// Per-axis ball speed in units per tick
    #[clap(long, default_value_t = shared::BALL_SPEED)]
    ball_speed: f32,
    /// Circumference samples per hit test
    #[clap(long, default_value_t = shared::HIT_SAMPLE_COUNT)]
    hit_samples: u32,
    /// Coarse bounding-reject margin
    #[clap(long, default_value_t = shared::COARSE_HIT_MARGIN)]
    coarse_margin: f32,
    /// Fine boundary-proximity margin
    #[clap(long, default_value_t = shared::FINE_HIT_MARGIN)]
    fine_margin: f32,
    /// Ticks a player stays ineligible after a deflection
    #[clap(long, default_value_t = shared::HIT_COOLDOWN_TICKS)]
    cooldown_ticks: u32,
    /// Flip velocity once per hitting player (legacy physics) instead of
    /// once per tick
    #[clap(long)]
    per_hit_flip: bool,
    /// Seconds of silence before a client is dropped
    #[clap(long, default_value = "5")]
    client_timeout: u64,
    /// Maximum number of concurrent clients
    #[clap(long, default_value = "32")]
    max_clients: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = GameConfig {
        arena_width: args.arena_width,
        arena_height: args.arena_height,
        ball_radius: args.ball_radius,
        player_radius: args.player_radius,
        ball_speed: args.ball_speed,
        hit_sample_count: args.hit_samples,
        coarse_hit_margin: args.coarse_margin,
        fine_hit_margin: args.fine_margin,
        cooldown_ticks: args.cooldown_ticks,
        per_hit_flip: args.per_hit_flip,
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(
        &address,
        Duration::from_millis(args.tick_ms),
        Duration::from_secs(args.client_timeout),
        args.max_clients,
        config,
        Box::new(LogPresentation),
    )
    .await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
