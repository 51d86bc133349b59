//! UDP broadcast server coordinating connections and the simulation tick.
//!
//! Three tasks plus the main loop: a receiver that decodes datagrams into
//! channel messages, a sender that drains the outbound queue so a slow
//! client can never stall the tick, and a timeout sweeper that turns
//! silent connections into leaves. All registry and ball mutation happens
//! on the main loop task; inbound `Move` updates are queued and drained at
//! the top of the next tick so every position change has a deterministic
//! application point.

use crate::config::GameConfig;
use crate::events::Presentation;
use crate::game::GameState;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::Packet;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        id: String,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<String>,
    },
}

#[derive(Debug, Clone, Copy)]
struct ClientConn {
    addr: SocketAddr,
    last_seen: Instant,
}

/// Tracks which connection owns which player id.
///
/// Shared between the main loop, the sender task and the timeout sweeper,
/// so it lives behind an `RwLock`. Holds no simulation state.
pub struct ConnectionTable {
    clients: HashMap<String, ClientConn>,
    max_clients: usize,
}

impl ConnectionTable {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    /// Registers a connection. A known id is rebound to the new address;
    /// a new id is rejected when the table is full.
    pub fn insert(&mut self, id: &str, addr: SocketAddr) -> bool {
        if !self.clients.contains_key(id) && self.clients.len() >= self.max_clients {
            return false;
        }
        self.clients.insert(
            id.to_string(),
            ClientConn {
                addr,
                last_seen: Instant::now(),
            },
        );
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.clients.remove(id).is_some()
    }

    /// True when `addr` is the registered source for `id`. Packets from
    /// anywhere else claiming that id are dropped by the caller.
    pub fn owns(&self, id: &str, addr: SocketAddr) -> bool {
        self.clients.get(id).map(|c| c.addr) == Some(addr)
    }

    pub fn touch(&mut self, id: &str) {
        if let Some(client) = self.clients.get_mut(id) {
            client.last_seen = Instant::now();
        }
    }

    /// Removes and returns every client that has been silent longer than
    /// `timeout`.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<String> {
        let timed_out: Vec<String> = self
            .clients
            .iter()
            .filter(|(_, client)| client.last_seen.elapsed() > timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &timed_out {
            self.clients.remove(id);
        }
        timed_out
    }

    pub fn addrs(&self) -> Vec<(String, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (id.clone(), client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Main server coordinating networking and the ball simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    connections: Arc<RwLock<ConnectionTable>>,
    game: GameState,
    tick_duration: Duration,
    client_timeout: Duration,
    /// Inbound avatar moves held until the next tick.
    pending_moves: Vec<(String, f32, f32)>,
    presentation: Box<dyn Presentation>,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        client_timeout: Duration,
        max_clients: usize,
        config: GameConfig,
        presentation: Box<dyn Presentation>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            connections: Arc::new(RwLock::new(ConnectionTable::new(max_clients))),
            game: GameState::new(config),
            tick_duration,
            client_timeout,
            pending_moves: Vec::new(),
            presentation,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Address the socket actually bound to; useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.socket.local_addr()
    }

    /// Spawns the task that continuously listens for incoming datagrams
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Dropping undecodable datagram from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that processes the outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let connections = Arc::clone(&self.connections);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let connections_guard = connections.read().await;
                            connections_guard.addrs()
                        };

                        for (id, addr) in client_addrs {
                            if Some(&id) == exclude.as_ref() {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns the task that sweeps for silent connections
    fn spawn_timeout_checker(&self) {
        let connections = Arc::clone(&self.connections);
        let server_tx = self.server_tx.clone();
        let timeout = self.client_timeout;

        tokio::spawn(async move {
            let mut sweep_interval = interval(Duration::from_secs(1));

            loop {
                sweep_interval.tick().await;

                let timed_out = {
                    let mut connections_guard = connections.write().await;
                    connections_guard.check_timeouts(timeout)
                };

                for id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn broadcast_packet(&self, packet: Packet, exclude: Option<String>) {
        if let Err(e) = self
            .game_tx
            .send(GameMessage::BroadcastPacket { packet, exclude })
        {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Processes one inbound packet on the main loop task
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Join { id } => {
                let accepted = {
                    let mut connections = self.connections.write().await;
                    connections.insert(&id, addr)
                };

                if !accepted {
                    warn!("Arena full, ignoring join of {} from {}", id, addr);
                    return;
                }

                info!("Client {} joined from {}", id, addr);
                self.game.registry.add_player(&id);
                self.broadcast_packet(Packet::PlayerJoined { id: id.clone() }, Some(id.clone()));
                self.presentation.on_player_joined(&id);
            }

            Packet::Move { id, x, y } => {
                let known = {
                    let mut connections = self.connections.write().await;
                    let owns = connections.owns(&id, addr);
                    if owns {
                        connections.touch(&id);
                    }
                    owns
                };

                if known {
                    // Applied at the top of the next tick, not inline.
                    self.pending_moves.push((id, x, y));
                } else {
                    warn!("Dropping move for {} from unregistered {}", id, addr);
                }
            }

            Packet::Leave { id } => {
                let owned = {
                    let connections = self.connections.read().await;
                    connections.owns(&id, addr)
                };

                if owned {
                    let mut connections = self.connections.write().await;
                    connections.remove(&id);
                    drop(connections);
                    self.handle_leave(&id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Registry eviction plus fan-out shared by explicit leaves, timeouts
    /// and send failures. The connection entry is already gone.
    fn handle_leave(&mut self, id: &str) {
        info!("Client {} left", id);
        self.game.registry.remove_player(id);
        self.pending_moves.retain(|(moved, _, _)| moved != id);
        self.broadcast_packet(
            Packet::PlayerLeft { id: id.to_string() },
            Some(id.to_string()),
        );
        self.presentation.on_player_left(id);
    }

    /// Runs one simulation tick: drain queued moves, step the ball, fan
    /// out the authoritative position.
    async fn run_tick(&mut self) {
        for (id, x, y) in std::mem::take(&mut self.pending_moves) {
            if self.game.registry.update_position(&id, x, y) {
                self.broadcast_packet(
                    Packet::PlayerMoved {
                        id: id.clone(),
                        x,
                        y,
                    },
                    Some(id.clone()),
                );
                self.presentation.on_player_moved(&id, x, y);
            }
        }

        let outcome = self.game.step();

        let client_count = {
            let connections = self.connections.read().await;
            connections.len()
        };
        if client_count > 0 {
            self.broadcast_packet(
                Packet::BallPos {
                    x: outcome.ball_pos.x,
                    y: outcome.ball_pos.y,
                },
                None,
            );
        }

        self.presentation
            .on_ball_moved(outcome.ball_pos.x, outcome.ball_pos.y);

        // Periodic cadence monitoring
        if self.game.tick % 500 == 0 {
            debug!(
                "Tick {}: {} clients, {} players, ball at ({:.1}, {:.1})",
                self.game.tick,
                client_count,
                self.game.registry.len(),
                outcome.ball_pos.x,
                outcome.ball_pos.y
            );
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { id }) => {
                            warn!("Client {} timed out", id);
                            self.handle_leave(&id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.run_tick().await;
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn test_addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080)
    }

    fn test_addr2() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8081)
    }

    #[test]
    fn test_connection_table_insert_and_remove() {
        let mut table = ConnectionTable::new(4);

        assert!(table.insert("a", test_addr()));
        assert_eq!(table.len(), 1);
        assert!(table.owns("a", test_addr()));

        assert!(table.remove("a"));
        assert!(table.is_empty());
        assert!(!table.remove("a"));
    }

    #[test]
    fn test_connection_table_capacity() {
        let mut table = ConnectionTable::new(1);

        assert!(table.insert("a", test_addr()));
        assert!(!table.insert("b", test_addr2()));

        // Rebinding a known id is always allowed.
        assert!(table.insert("a", test_addr2()));
        assert_eq!(table.len(), 1);
        assert!(table.owns("a", test_addr2()));
        assert!(!table.owns("a", test_addr()));
    }

    #[test]
    fn test_connection_table_rejects_spoofed_addr() {
        let mut table = ConnectionTable::new(4);
        table.insert("a", test_addr());

        assert!(!table.owns("a", test_addr2()));
        assert!(!table.owns("ghost", test_addr()));
    }

    #[test]
    fn test_connection_table_timeouts() {
        let mut table = ConnectionTable::new(4);
        table.insert("a", test_addr());
        table.insert("b", test_addr2());

        // Nothing has timed out yet.
        assert!(table.check_timeouts(Duration::from_secs(5)).is_empty());

        // Backdate one client past the timeout.
        table.clients.get_mut("a").unwrap().last_seen =
            Instant::now() - Duration::from_secs(10);

        let timed_out = table.check_timeouts(Duration::from_secs(5));
        assert_eq!(timed_out, vec!["a".to_string()]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_touch_resets_timeout_clock() {
        let mut table = ConnectionTable::new(4);
        table.insert("a", test_addr());
        table.clients.get_mut("a").unwrap().last_seen =
            Instant::now() - Duration::from_secs(10);

        table.touch("a");
        assert!(table.check_timeouts(Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_broadcast_addrs_cover_all_clients() {
        let mut table = ConnectionTable::new(4);
        table.insert("a", test_addr());
        table.insert("b", test_addr2());

        let mut addrs = table.addrs();
        addrs.sort_by(|(a, _), (b, _)| a.cmp(b));
        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[0], ("a".to_string(), test_addr()));
        assert_eq!(addrs[1], ("b".to_string(), test_addr2()));
    }

    #[test]
    fn test_server_message_creation() {
        let packet = Packet::Join {
            id: "a".to_string(),
        };
        let addr = test_addr();

        let msg = ServerMessage::PacketReceived {
            packet: packet.clone(),
            addr,
        };

        match msg {
            ServerMessage::PacketReceived { packet: p, addr: a } => {
                assert_eq!(a, addr);
                match p {
                    Packet::Join { id } => assert_eq!(id, "a"),
                    _ => panic!("Unexpected packet type"),
                }
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_game_message_broadcast_exclude() {
        let msg = GameMessage::BroadcastPacket {
            packet: Packet::BallPos { x: 1.0, y: 2.0 },
            exclude: Some("a".to_string()),
        };

        match msg {
            GameMessage::BroadcastPacket { exclude, .. } => {
                assert_eq!(exclude.as_deref(), Some("a"));
            }
            _ => panic!("Unexpected message type"),
        }
    }
}
