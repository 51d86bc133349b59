//! Headless console client for exercising a running server end to end:
//! joins, orbits its avatar around the arena center for a few seconds
//! while printing everything the server broadcasts, then leaves.

use bincode::{deserialize, serialize};
use shared::Packet;
use std::f32::consts::PI;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    let server_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string())
        .parse::<SocketAddr>()?;
    let id = format!("test-client-{}", std::process::id());

    println!("Joining {} as {}", server_addr, id);
    let join = serialize(&Packet::Join { id: id.clone() })?;
    socket.send_to(&join, server_addr).await?;

    let mut buf = [0u8; 2048];

    // Orbit the arena center, reporting the avatar position every 100ms
    // and draining broadcasts in between.
    for step in 0..100u32 {
        let angle = step as f32 * (2.0 * PI / 50.0);
        let x = 200.0 + 120.0 * angle.cos();
        let y = 200.0 + 120.0 * angle.sin();

        let mv = serialize(&Packet::Move {
            id: id.clone(),
            x,
            y,
        })?;
        socket.send_to(&mv, server_addr).await?;

        loop {
            match timeout(Duration::from_millis(20), socket.recv_from(&mut buf)).await {
                Ok(Ok((len, _))) => match deserialize::<Packet>(&buf[0..len]) {
                    Ok(Packet::BallPos { x, y }) => {
                        println!("Ball at ({:.1}, {:.1})", x, y);
                    }
                    Ok(Packet::PlayerJoined { id }) => println!("Player joined: {}", id),
                    Ok(Packet::PlayerLeft { id }) => println!("Player left: {}", id),
                    Ok(Packet::PlayerMoved { id, x, y }) => {
                        println!("Player {} moved to ({:.1}, {:.1})", id, x, y);
                    }
                    Ok(other) => println!("Unexpected packet: {:?}", other),
                    Err(e) => println!("Failed to deserialize broadcast: {}", e),
                },
                Ok(Err(e)) => {
                    println!("Error receiving broadcast: {}", e);
                    break;
                }
                Err(_) => break,
            }
        }

        sleep(Duration::from_millis(100)).await;
    }

    println!("Leaving");
    let leave = serialize(&Packet::Leave { id })?;
    socket.send_to(&leave, server_addr).await?;

    Ok(())
}
