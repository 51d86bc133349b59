//! # Dodgeball Server Library
//!
//! Authoritative server core for a real-time multiplayer "dodge the ball"
//! arcade game. A single simulated ball bounces inside a rectangular
//! arena; remote players steer circular avatars to deflect it. This crate
//! owns the ball, decides every collision outcome, and keeps all connected
//! clients synchronized at a fixed tick rate.
//!
//! ## Architecture
//!
//! Two timing domains, connected by channels:
//!
//! - The **simulation tick** runs on the main loop task at a fixed
//!   interval. Each tick advances the ball, tests it against every
//!   cooldown-eligible player, resolves deflections and wall reflections,
//!   and hands the new authoritative position to the broadcast queue.
//! - The **network tasks** service an arbitrary number of concurrent UDP
//!   clients: a receiver decodes inbound `Join`/`Move`/`Leave` datagrams
//!   into channel messages, a sender drains the outbound queue so a slow
//!   client never blocks a tick, and a sweeper converts silent connections
//!   into leaves.
//!
//! The player registry and ball state are owned exclusively by the main
//! loop task; inbound position updates are queued and drained once per
//! tick, which gives every update a deterministic application point and
//! keeps collision tests free of torn reads.
//!
//! ## Module Organization
//!
//! - [`collision`] — sampled circle-vs-circle hit testing with a coarse
//!   bounding reject, tunable sample count and margins.
//! - [`registry`] — connected players and their explicit tick-counter hit
//!   cooldowns.
//! - [`game`] — the per-tick simulation pipeline and wall reflection.
//! - [`network`] — UDP connection tracking, ingestion and per-tick
//!   broadcast fan-out.
//! - [`config`] — all tunables, populated from the command line.
//! - [`events`] — fire-and-forget notifications toward a presentation
//!   layer; the core never waits on a renderer.
//!
//! ## Error Philosophy
//!
//! Nothing in this core is fatal to the process. Connection faults become
//! leaves, unknown-id operations are logged no-ops, and degenerate client
//! positions are dropped at the boundary. The tick loop keeps running
//! regardless of any single connection's state.

pub mod collision;
pub mod config;
pub mod events;
pub mod game;
pub mod network;
pub mod registry;
