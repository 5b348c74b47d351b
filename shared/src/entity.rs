//! Entity descriptors shared by the server simulation and the clients.
//!
//! Players and the ball are plain typed structs joined by id. `PlayerDesc`
//! and `BallDesc` double as the wire payloads of the protocol.

use crate::collision::Rect;
use crate::math::Vec2;
use crate::{INITIAL_LIVES, PLAYER_SIZE};
use serde::{Deserialize, Serialize};

/// Match role of a player, independent of its connection id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Slot {
    #[default]
    None,
    /// Bottom paddle, first accepted registrant. The ball sticks to this paddle.
    One,
    /// Top paddle, second accepted registrant.
    Two,
}

impl Slot {
    pub fn opponent(self) -> Slot {
        match self {
            Slot::One => Slot::Two,
            Slot::Two => Slot::One,
            Slot::None => Slot::None,
        }
    }
}

/// Screen dimensions reported by a client when it registers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(800.0, 600.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDesc {
    pub unique_id: u32,
    pub lives: u32,
    /// Top-left corner of the paddle.
    pub position: Vec2,
    pub size: Vec2,
    pub slot: Slot,
    pub viewport: Viewport,
}

impl PlayerDesc {
    pub fn new(unique_id: u32, position: Vec2, viewport: Viewport) -> Self {
        Self {
            unique_id,
            lives: INITIAL_LIVES,
            position,
            size: PLAYER_SIZE,
            slot: Slot::None,
            viewport,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallDesc {
    pub radius: f32,
    pub stuck: bool,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
}

/// The authoritative ball.
///
/// `position` is the top-left of the ball's bounding box, so the centre sits
/// at `position + radius` on both axes. The `sticky` and `pass_through`
/// modifiers are simulation-only and never leave the owning process.
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub radius: f32,
    pub stuck: bool,
    pub sticky: bool,
    pub pass_through: bool,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
}

impl Ball {
    pub fn new(position: Vec2, radius: f32, velocity: Vec2) -> Self {
        Self {
            radius,
            stuck: true,
            sticky: false,
            pass_through: false,
            position,
            velocity,
            size: Vec2::splat(radius * 2.0),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.position + Vec2::splat(self.radius)
    }

    pub fn desc(&self) -> BallDesc {
        BallDesc {
            radius: self.radius,
            stuck: self.stuck,
            position: self.position,
            velocity: self.velocity,
            size: self.size,
        }
    }
}

impl From<BallDesc> for Ball {
    fn from(desc: BallDesc) -> Self {
        Self {
            radius: desc.radius,
            stuck: desc.stuck,
            sticky: false,
            pass_through: false,
            position: desc.position,
            velocity: desc.velocity,
            size: desc.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_opponent() {
        assert_eq!(Slot::One.opponent(), Slot::Two);
        assert_eq!(Slot::Two.opponent(), Slot::One);
        assert_eq!(Slot::None.opponent(), Slot::None);
    }

    #[test]
    fn test_slots_order_by_arrival() {
        assert!(Slot::None < Slot::One);
        assert!(Slot::One < Slot::Two);
    }

    #[test]
    fn test_player_defaults() {
        let player = PlayerDesc::new(7, Vec2::new(350.0, 580.0), Viewport::default());
        assert_eq!(player.unique_id, 7);
        assert_eq!(player.lives, INITIAL_LIVES);
        assert_eq!(player.size, PLAYER_SIZE);
        assert_eq!(player.slot, Slot::None);
        assert_eq!(player.center(), Vec2::new(400.0, 590.0));
    }

    #[test]
    fn test_ball_size_follows_radius() {
        let ball = Ball::new(Vec2::new(10.0, 20.0), 12.5, Vec2::new(100.0, -350.0));
        assert_eq!(ball.size, Vec2::splat(25.0));
        assert_eq!(ball.center(), Vec2::new(22.5, 32.5));
        assert!(ball.stuck);
        assert!(!ball.sticky);
        assert!(!ball.pass_through);
    }

    #[test]
    fn test_ball_desc_drops_modifiers() {
        let mut ball = Ball::new(Vec2::ZERO, 12.5, Vec2::new(1.0, 1.0));
        ball.sticky = true;
        ball.pass_through = true;

        let mirrored = Ball::from(ball.desc());
        assert_eq!(mirrored.position, ball.position);
        assert_eq!(mirrored.velocity, ball.velocity);
        assert!(!mirrored.sticky);
        assert!(!mirrored.pass_through);
    }
}
