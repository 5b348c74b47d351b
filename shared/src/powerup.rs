//! Power-ups of the local Breakout mode: spawn table, activation and expiry.

use crate::collision::Rect;
use crate::entity::{Ball, PlayerDesc};
use crate::math::Vec2;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub type Tint = [f32; 3];

pub const WHITE: Tint = [1.0, 1.0, 1.0];
pub const POWERUP_SIZE: Vec2 = Vec2::new(60.0, 20.0);
pub const POWERUP_VELOCITY: Vec2 = Vec2::new(0.0, 150.0);
pub const SPEED_MULTIPLIER: f32 = 1.2;
pub const PAD_SIZE_INCREASE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    Speed,
    Sticky,
    PassThrough,
    PadSizeIncrease,
    Confuse,
    Chaos,
}

/// Static properties of a power-up kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerUpProperties {
    /// Spawns with a chance of one in `spawn_chance` per destroyed brick.
    pub spawn_chance: u32,
    /// Seconds the effect lasts once picked up; 0 means it never expires.
    pub duration: f32,
    pub tint: Tint,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::Speed,
        PowerUpKind::Sticky,
        PowerUpKind::PassThrough,
        PowerUpKind::PadSizeIncrease,
        PowerUpKind::Confuse,
        PowerUpKind::Chaos,
    ];

    pub fn properties(self) -> PowerUpProperties {
        match self {
            PowerUpKind::Speed => PowerUpProperties {
                spawn_chance: 75,
                duration: 0.0,
                tint: [0.5, 0.5, 1.0],
            },
            PowerUpKind::Sticky => PowerUpProperties {
                spawn_chance: 75,
                duration: 20.0,
                tint: [1.0, 0.5, 1.0],
            },
            PowerUpKind::PassThrough => PowerUpProperties {
                spawn_chance: 75,
                duration: 10.0,
                tint: [0.5, 1.0, 0.5],
            },
            PowerUpKind::PadSizeIncrease => PowerUpProperties {
                spawn_chance: 75,
                duration: 0.0,
                tint: [1.0, 0.6, 0.4],
            },
            PowerUpKind::Confuse => PowerUpProperties {
                spawn_chance: 15,
                duration: 15.0,
                tint: [1.0, 0.3, 0.3],
            },
            PowerUpKind::Chaos => PowerUpProperties {
                spawn_chance: 15,
                duration: 15.0,
                tint: [0.9, 0.25, 0.25],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub color: Tint,
    pub duration: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
    /// Picked up or fallen off screen; no longer drawn or collected.
    pub destroyed: bool,
    /// Effect currently applied.
    pub activated: bool,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, position: Vec2) -> Self {
        let props = kind.properties();
        Self {
            kind,
            color: props.tint,
            duration: props.duration,
            position,
            velocity: POWERUP_VELOCITY,
            size: POWERUP_SIZE,
            destroyed: false,
            activated: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn is_infinite(&self) -> bool {
        self.duration == 0.0
    }
}

/// Screen effects and tints driven by active power-ups.
#[derive(Debug, Clone, PartialEq)]
pub struct Effects {
    pub confuse: bool,
    pub chaos: bool,
    pub shake_time: f32,
    pub paddle_tint: Tint,
    pub ball_tint: Tint,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            confuse: false,
            chaos: false,
            shake_time: 0.0,
            paddle_tint: WHITE,
            ball_tint: WHITE,
        }
    }
}

impl Effects {
    pub fn reset(&mut self) {
        *self = Effects::default();
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_time > 0.0
    }
}

/// Rolls every kind independently for a brick destroyed at `position`.
pub fn roll_spawns<R: Rng + ?Sized>(rng: &mut R, position: Vec2) -> Vec<PowerUp> {
    PowerUpKind::ALL
        .iter()
        .filter(|kind| rng.gen_range(0..kind.properties().spawn_chance) == 0)
        .map(|kind| PowerUp::new(*kind, position))
        .collect()
}

pub fn activate(
    kind: PowerUpKind,
    ball: &mut Ball,
    paddle: &mut PlayerDesc,
    effects: &mut Effects,
) {
    debug!("Activating power-up {:?}", kind);
    match kind {
        PowerUpKind::Speed => ball.velocity *= SPEED_MULTIPLIER,
        PowerUpKind::Sticky => {
            ball.sticky = true;
            effects.paddle_tint = [1.0, 0.5, 1.0];
        }
        PowerUpKind::PassThrough => {
            ball.pass_through = true;
            effects.ball_tint = [1.0, 0.5, 0.5];
        }
        PowerUpKind::PadSizeIncrease => paddle.size.x += PAD_SIZE_INCREASE,
        PowerUpKind::Confuse => {
            if !effects.chaos {
                effects.confuse = true;
            }
        }
        PowerUpKind::Chaos => {
            if !effects.confuse {
                effects.chaos = true;
            }
        }
    }
}

fn deactivate(kind: PowerUpKind, ball: &mut Ball, effects: &mut Effects) {
    debug!("Power-up {:?} expired", kind);
    match kind {
        PowerUpKind::Sticky => {
            ball.sticky = false;
            effects.paddle_tint = WHITE;
        }
        PowerUpKind::PassThrough => {
            ball.pass_through = false;
            effects.ball_tint = WHITE;
        }
        PowerUpKind::Confuse => effects.confuse = false,
        PowerUpKind::Chaos => effects.chaos = false,
        PowerUpKind::Speed | PowerUpKind::PadSizeIncrease => {}
    }
}

/// Moves power-ups, counts down active ones and drops finished entries.
///
/// An expiring effect is only cleared when no other active power-up of the
/// same kind still holds it.
pub fn update_powerups(
    powerups: &mut Vec<PowerUp>,
    dt: f32,
    ball: &mut Ball,
    effects: &mut Effects,
) {
    let mut expired = Vec::new();

    for powerup in powerups.iter_mut() {
        powerup.position += powerup.velocity * dt;
        if powerup.activated && !powerup.is_infinite() {
            powerup.duration -= dt;
            if powerup.duration <= 0.0 {
                powerup.activated = false;
                expired.push(powerup.kind);
            }
        }
    }

    for kind in expired {
        let still_active = powerups.iter().any(|p| p.activated && p.kind == kind);
        if !still_active {
            deactivate(kind, ball, effects);
        }
    }

    powerups.retain(|p| !(p.destroyed && !p.activated));
}
