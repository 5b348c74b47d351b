//! # Paddle Duel Server Library
//!
//! This library provides the authoritative server for the two-player paddle
//! game. It owns the only true copy of the ball, decides when lives are lost
//! and when the match ends, and replicates every change to the connected
//! clients as typed protocol messages.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The ball is moved, bounced off the walls and deflected by the paddles on
//! the server only. Clients mirror it from `UpdateBall` messages. Paddle
//! positions are the one exception: each client moves its own paddle and
//! reports it, and the server trusts the reported position.
//!
//! ### Player Roster
//! Tracks the (at most two) registered players:
//! - Slot assignment in arrival order and spawn placement
//! - Rejection of registrations once the room is full
//! - Deferred, batched cleanup of dropped connections
//!
//! ### State Broadcasting
//! Every tick the server flushes pending removals, advances the ball and
//! sends the resulting deltas: life losses, the end of the match, paddle
//! sound cues and the ball itself.
//!
//! ## Architecture Design
//!
//! ### Single Consumer Loop
//! Connection tasks decode frames and push events into one channel. The main
//! loop is the only consumer and the only owner of the match state, so the
//! game data needs no locks. Messages are handled as they arrive while the
//! simulation runs on a fixed tick.
//!
//! ### TCP Transport
//! Each connection is a TCP stream carrying length-prefixed frames. TCP's
//! in-order delivery is what guarantees that a player is announced before it
//! is updated and that the ball is added before it is synced.
//!
//! ## Module Organization
//!
//! ### Roster Module (`roster`)
//! The id-indexed player arena with slot and capacity rules.
//!
//! ### Match State Module (`match_state`)
//! Message routing, the per-tick step and the broadcast rules. Produces
//! `Outbound` messages instead of writing to sockets, which keeps it
//! testable on its own.
//!
//! ### Network Module (`network`)
//! Listener, per-connection reader and writer tasks, and the main loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     // 60Hz = ~16.67ms per tick
//!     let mut server = Server::new("127.0.0.1:60000", Duration::from_millis(16)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Trust Boundary
//!
//! Client-reported paddle positions are applied without validation; a client
//! can only move its own paddle, but it can move it anywhere.

pub mod match_state;
pub mod network;
pub mod roster;
