//! Single-player Breakout mode.
//!
//! Runs entirely on the client with the same physics and collision code as the
//! online match, plus bricks and power-ups.

use crate::collision::{aabb_overlap, collide, resolve_obstacle, resolve_paddle, Rect};
use crate::entity::{Ball, PlayerDesc, Slot, Viewport};
use crate::math::Vec2;
use crate::physics::{move_paddle, stuck_ball_position, PaddleInput};
use crate::powerup::{
    activate, roll_spawns, update_powerups, Effects, PowerUp, PowerUpKind, Tint,
};
use crate::{BALL_RADIUS, INITIAL_BALL_VELOCITY, INITIAL_LIVES, PLAYER_SIZE};
use log::{debug, info};
use rand::Rng;

pub const SHAKE_DURATION: f32 = 0.05;
const SOLID_TINT: Tint = [0.8, 0.8, 0.7];

#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub rect: Rect,
    pub color: Tint,
    pub solid: bool,
    pub destroyed: bool,
}

fn tile_color(code: u32) -> Tint {
    match code {
        2 => [0.2, 0.6, 1.0],
        3 => [0.0, 0.7, 0.0],
        4 => [0.8, 0.8, 0.4],
        5 => [1.0, 0.5, 0.0],
        _ => [1.0, 1.0, 1.0],
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level {
    pub bricks: Vec<Brick>,
}

impl Level {
    /// Lays a tile grid out over a `width` x `height` area.
    ///
    /// Code 0 is empty, 1 an indestructible brick and anything higher a
    /// destructible brick coloured by its code.
    pub fn from_tiles(tiles: &[Vec<u32>], width: f32, height: f32) -> Self {
        let rows = tiles.len();
        let columns = tiles.first().map_or(0, Vec::len);
        if rows == 0 || columns == 0 {
            return Level::default();
        }

        let unit = Vec2::new(width / columns as f32, height / rows as f32);
        let mut bricks = Vec::new();

        for (y, row) in tiles.iter().enumerate() {
            for (x, &code) in row.iter().enumerate().take(columns) {
                if code == 0 {
                    continue;
                }
                let position = Vec2::new(unit.x * x as f32, unit.y * y as f32);
                let solid = code == 1;
                bricks.push(Brick {
                    rect: Rect::new(position, unit),
                    color: if solid { SOLID_TINT } else { tile_color(code) },
                    solid,
                    destroyed: false,
                });
            }
        }

        Level { bricks }
    }

    /// True once every destructible brick is gone.
    pub fn is_completed(&self) -> bool {
        self.bricks.iter().all(|brick| brick.solid || brick.destroyed)
    }

    pub fn remaining(&self) -> usize {
        self.bricks
            .iter()
            .filter(|brick| !brick.solid && !brick.destroyed)
            .count()
    }
}

pub fn standard_tiles() -> Vec<Vec<u32>> {
    vec![
        vec![5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5],
        vec![5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5],
        vec![4, 4, 4, 4, 4, 0, 0, 0, 0, 0, 4, 4, 4, 4, 4],
        vec![4, 1, 4, 1, 4, 0, 0, 1, 0, 0, 4, 1, 4, 1, 4],
        vec![3, 3, 3, 3, 3, 0, 0, 0, 0, 0, 3, 3, 3, 3, 3],
        vec![3, 3, 1, 3, 3, 3, 3, 3, 3, 3, 3, 3, 1, 3, 3],
        vec![2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2],
        vec![2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2],
    ]
}

/// Things that happened during one `LocalGame::update`, for sound and effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalEvent {
    BrickDestroyed,
    SolidHit,
    PowerUpSpawned(PowerUpKind),
    PowerUpActivated(PowerUpKind),
    PaddleHit,
    BallLost { lives_left: u32 },
    GameOver,
    LevelCompleted,
}

pub struct LocalGame {
    pub viewport: Viewport,
    pub player: PlayerDesc,
    pub ball: Ball,
    pub level: Level,
    pub powerups: Vec<PowerUp>,
    pub effects: Effects,
    tiles: Vec<Vec<u32>>,
}

fn spawn_position(viewport: Viewport) -> Vec2 {
    Vec2::new(
        viewport.width / 2.0 - PLAYER_SIZE.x / 2.0,
        viewport.height - PLAYER_SIZE.y,
    )
}

impl LocalGame {
    pub fn new(viewport: Viewport, tiles: Vec<Vec<u32>>) -> Self {
        let mut player = PlayerDesc::new(0, spawn_position(viewport), viewport);
        player.slot = Slot::One;
        let ball = Ball::new(
            stuck_ball_position(&player, BALL_RADIUS),
            BALL_RADIUS,
            INITIAL_BALL_VELOCITY,
        );
        let level = Level::from_tiles(&tiles, viewport.width, viewport.height / 2.0);

        Self {
            viewport,
            player,
            ball,
            level,
            powerups: Vec::new(),
            effects: Effects::default(),
            tiles,
        }
    }

    /// Moves the paddle, dragging a stuck ball along, and launches on request.
    pub fn process_input(&mut self, input: PaddleInput, dt: f32) {
        if let Some(direction) = input.direction() {
            let before = self.player.position.x;
            if move_paddle(&mut self.player, direction, dt) && self.ball.stuck {
                self.ball.position.x += self.player.position.x - before;
            }
        }
        if input.launch && self.ball.stuck {
            self.ball.stuck = false;
        }
    }

    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> Vec<LocalEvent> {
        let mut events = Vec::new();
        let contact = self.ball.step(dt, self.viewport);

        self.collide_bricks(rng, &mut events);
        self.collect_powerups(&mut events);

        if !self.ball.stuck {
            if let Some(_hit) = collide(&self.ball, &self.player.rect()) {
                resolve_paddle(&mut self.ball, &self.player);
                events.push(LocalEvent::PaddleHit);
            }
        }

        update_powerups(&mut self.powerups, dt, &mut self.ball, &mut self.effects);

        if self.effects.shake_time > 0.0 {
            self.effects.shake_time = (self.effects.shake_time - dt).max(0.0);
        }

        if contact.bottom {
            self.player.lives = self.player.lives.saturating_sub(1);
            if self.player.lives == 0 {
                info!("Out of lives, restarting level");
                events.push(LocalEvent::GameOver);
                self.reset_level();
                self.player.lives = INITIAL_LIVES;
            } else {
                events.push(LocalEvent::BallLost {
                    lives_left: self.player.lives,
                });
            }
            self.reset_player();
        } else if self.level.is_completed() {
            info!("Level completed");
            events.push(LocalEvent::LevelCompleted);
            self.reset_level();
            self.reset_player();
        }

        events
    }

    fn collide_bricks<R: Rng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<LocalEvent>) {
        for brick in self.level.bricks.iter_mut().filter(|b| !b.destroyed) {
            let Some(collision) = collide(&self.ball, &brick.rect) else {
                continue;
            };

            if brick.solid {
                self.effects.shake_time = SHAKE_DURATION;
                events.push(LocalEvent::SolidHit);
            } else {
                brick.destroyed = true;
                events.push(LocalEvent::BrickDestroyed);
                for powerup in roll_spawns(rng, brick.rect.position) {
                    debug!("Spawned power-up {:?}", powerup.kind);
                    events.push(LocalEvent::PowerUpSpawned(powerup.kind));
                    self.powerups.push(powerup);
                }
            }

            resolve_obstacle(&mut self.ball, &collision, brick.solid);
        }
    }

    fn collect_powerups(&mut self, events: &mut Vec<LocalEvent>) {
        let paddle = self.player.rect();
        for powerup in self.powerups.iter_mut().filter(|p| !p.destroyed) {
            if powerup.position.y >= self.viewport.height {
                powerup.destroyed = true;
            }
            if aabb_overlap(&paddle, &powerup.rect()) {
                activate(powerup.kind, &mut self.ball, &mut self.player, &mut self.effects);
                powerup.destroyed = true;
                powerup.activated = true;
                events.push(LocalEvent::PowerUpActivated(powerup.kind));
            }
        }
    }

    pub fn reset_level(&mut self) {
        self.level = Level::from_tiles(
            &self.tiles,
            self.viewport.width,
            self.viewport.height / 2.0,
        );
    }

    /// Puts paddle and ball back to their start and drops every power-up.
    pub fn reset_player(&mut self) {
        self.player.size = PLAYER_SIZE;
        self.player.position = spawn_position(self.viewport);
        let position = stuck_ball_position(&self.player, BALL_RADIUS);
        self.ball.reset(position, INITIAL_BALL_VELOCITY);
        self.powerups.clear();
        self.effects.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn game(tiles: Vec<Vec<u32>>) -> LocalGame {
        LocalGame::new(Viewport::default(), tiles)
    }

    fn launch_from(game: &mut LocalGame, position: Vec2, velocity: Vec2) {
        game.ball.position = position;
        game.ball.velocity = velocity;
        game.ball.stuck = false;
    }

    #[test]
    fn test_level_layout() {
        let level = Level::from_tiles(&[vec![1, 0, 2], vec![3, 4, 5]], 600.0, 150.0);
        assert_eq!(level.bricks.len(), 5);

        let solid = &level.bricks[0];
        assert!(solid.solid);
        assert_eq!(solid.rect, Rect::new(Vec2::ZERO, Vec2::new(200.0, 75.0)));

        let last = &level.bricks[4];
        assert_eq!(last.rect.position, Vec2::new(400.0, 75.0));
        assert_eq!(last.color, [1.0, 0.5, 0.0]);
        assert_eq!(level.remaining(), 4);
    }

    #[test]
    fn test_empty_tiles_give_completed_level() {
        let level = Level::from_tiles(&[], 800.0, 300.0);
        assert!(level.bricks.is_empty());
        assert!(level.is_completed());
    }

    #[test]
    fn test_completion_ignores_solid_bricks() {
        let mut level = Level::from_tiles(&[vec![1, 2]], 800.0, 300.0);
        assert!(!level.is_completed());
        level.bricks[1].destroyed = true;
        assert!(level.is_completed());
    }

    #[test]
    fn test_stuck_ball_moves_with_paddle_until_launch() {
        let mut game = game(standard_tiles());
        let start = game.ball.position;

        let right = PaddleInput {
            right: true,
            ..Default::default()
        };
        game.process_input(right, 0.1);
        assert_eq!(game.ball.position.x, start.x + 50.0);
        assert!(game.ball.stuck);

        let launch = PaddleInput {
            launch: true,
            ..Default::default()
        };
        game.process_input(launch, 0.1);
        assert!(!game.ball.stuck);
    }

    #[test]
    fn test_destructible_brick_is_destroyed() {
        let mut game = game(vec![vec![2, 2, 1]]);
        let mut rng = StdRng::seed_from_u64(1);
        launch_from(&mut game, Vec2::new(100.0, 300.0), Vec2::new(0.0, -350.0));

        let events = game.update(0.016, &mut rng);

        assert!(events.contains(&LocalEvent::BrickDestroyed));
        assert!(game.level.bricks[0].destroyed);
        assert!(!game.level.bricks[1].destroyed);
        assert!(game.ball.velocity.y > 0.0);
    }

    #[test]
    fn test_solid_brick_shakes_screen() {
        let mut game = game(vec![vec![2, 2, 1]]);
        let mut rng = StdRng::seed_from_u64(1);
        launch_from(&mut game, Vec2::new(600.0, 300.0), Vec2::new(0.0, -350.0));

        let events = game.update(0.016, &mut rng);

        assert!(events.contains(&LocalEvent::SolidHit));
        assert!(!game.level.bricks[2].destroyed);
        assert!(game.effects.is_shaking());
        assert!(game.ball.velocity.y > 0.0);
    }

    #[test]
    fn test_pass_through_keeps_heading() {
        let mut game = game(vec![vec![2, 2, 1]]);
        let mut rng = StdRng::seed_from_u64(1);
        launch_from(&mut game, Vec2::new(100.0, 300.0), Vec2::new(0.0, -350.0));
        game.ball.pass_through = true;

        game.update(0.016, &mut rng);

        assert!(game.level.bricks[0].destroyed);
        assert_eq!(game.ball.velocity, Vec2::new(0.0, -350.0));
    }

    #[test]
    fn test_losing_ball_costs_a_life() {
        let mut game = game(vec![vec![2]]);
        let mut rng = StdRng::seed_from_u64(1);
        launch_from(&mut game, Vec2::new(100.0, 570.0), Vec2::new(0.0, 350.0));

        let events = game.update(0.1, &mut rng);

        assert_eq!(events, vec![LocalEvent::BallLost { lives_left: 2 }]);
        assert_eq!(game.player.lives, 2);
        assert!(game.ball.stuck);
        assert_eq!(game.ball.position, stuck_ball_position(&game.player, BALL_RADIUS));
    }

    #[test]
    fn test_last_life_restarts_level() {
        let mut game = game(vec![vec![2, 2]]);
        let mut rng = StdRng::seed_from_u64(1);
        game.level.bricks[0].destroyed = true;
        game.player.lives = 1;
        launch_from(&mut game, Vec2::new(100.0, 570.0), Vec2::new(0.0, 350.0));

        let events = game.update(0.1, &mut rng);

        assert!(events.contains(&LocalEvent::GameOver));
        assert_eq!(game.player.lives, INITIAL_LIVES);
        assert!(!game.level.bricks[0].destroyed);
    }

    #[test]
    fn test_powerup_pickup_activates() {
        let mut game = game(vec![vec![2]]);
        let mut rng = StdRng::seed_from_u64(1);
        game.powerups
            .push(PowerUp::new(PowerUpKind::PadSizeIncrease, Vec2::new(360.0, 570.0)));

        let events = game.update(0.016, &mut rng);

        assert!(events.contains(&LocalEvent::PowerUpActivated(PowerUpKind::PadSizeIncrease)));
        assert_eq!(game.player.size.x, PLAYER_SIZE.x + 50.0);
        assert!(game.powerups[0].activated);
    }

    #[test]
    fn test_powerup_past_bottom_is_dropped() {
        let mut game = game(vec![vec![2]]);
        let mut rng = StdRng::seed_from_u64(1);
        game.powerups
            .push(PowerUp::new(PowerUpKind::Speed, Vec2::new(0.0, 610.0)));

        game.update(0.016, &mut rng);
        assert!(game.powerups.is_empty());
    }
}
