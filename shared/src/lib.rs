//! Types and simulation rules shared by the paddle duel server and client.
//!
//! The server runs the authoritative simulation with these modules; clients use
//! the same physics to predict their own paddle and to run the offline
//! Breakout mode. The `protocol` module defines the messages exchanged between
//! the two and the frame codec that carries them.

pub mod breakout;
pub mod collision;
pub mod entity;
pub mod math;
pub mod physics;
pub mod powerup;
pub mod protocol;

pub use collision::{Collision, Direction, Rect};
pub use entity::{Ball, BallDesc, PlayerDesc, Slot, Viewport};
pub use math::Vec2;
pub use physics::{PaddleDirection, PaddleInput, WallContact};
pub use protocol::{Message, MessageId, ProtocolError, RegisterRequest};

pub const PLAYER_SIZE: Vec2 = Vec2::new(100.0, 20.0);
pub const PADDLE_SPEED: f32 = 500.0;
pub const INITIAL_BALL_VELOCITY: Vec2 = Vec2::new(100.0, -350.0);
pub const BALL_RADIUS: f32 = 12.5;
pub const INITIAL_LIVES: u32 = 3;
pub const MAX_PLAYERS: usize = 2;
/// Scales how strongly the strike offset on a paddle steers the ball.
pub const BOUNCE_STRENGTH: f32 = 2.0;
