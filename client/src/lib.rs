//! # Paddle Duel Client Library
//!
//! This library provides the client side of the two-player paddle game: the
//! match state machine, the background connection, keyboard sampling and
//! drawing. It also hosts the offline Breakout mode, which runs the shared
//! local simulation without a server.
//!
//! ## Architecture Overview
//!
//! The server owns the ball and the match outcome. The client owns exactly
//! one thing, the position of its own paddle, and mirrors everything else.
//!
//! ### Local Paddle Prediction
//! Paddle input is applied to the local mirror immediately and reported to
//! the server in the same frame. The server trusts the reported position and
//! relays it to the opponent, so the own paddle never waits on a round trip.
//!
//! ### Server-Owned Ball
//! Ball positions come from `UpdateBall` messages only. The single exception
//! is cosmetic: while the ball is stuck it is drawn on slot One's paddle,
//! which is where the server will have it too.
//!
//! ### Frame Loop and Transport
//! macroquad owns the main thread. Each connection runs a small tokio
//! runtime on a background thread; decoded messages are queued to the frame
//! loop and drained once per frame.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! `ClientSession`, the state machine from the menu through lobby, ready,
//! active and ended. Consumes messages and input; emits `Command`s. No I/O.
//!
//! ### Network Module (`network`)
//! `Connection`: background TCP connection with a thread-safe inbound queue.
//!
//! ### Input Module (`input`)
//! Keyboard sampling with press-edge detection for launch and confirm.
//!
//! ### Rendering Module (`rendering`)
//! Draws the session or the local Breakout game with macroquad.
//!
//! ### App Module (`app`)
//! The online and offline frame loops that tie the modules together.
//!
//! ## Usage Example
//!
//! ```rust
//! use client::session::{ClientSession, ClientState, Command};
//! use shared::{Message, Viewport};
//!
//! let mut session = ClientSession::new(Viewport::new(800.0, 600.0));
//! let commands = session.connect("127.0.0.1:60000");
//! assert_eq!(commands, vec![Command::Connect("127.0.0.1:60000".to_string())]);
//!
//! // The server accepted the transport; the session asks to register.
//! let commands = session.handle_message(Message::ClientAccepted);
//! assert_eq!(session.state(), ClientState::Lobby);
//! assert!(matches!(commands[..], [Command::Send(Message::Register(_))]));
//! ```

pub mod app;
pub mod input;
pub mod network;
pub mod rendering;
pub mod session;
