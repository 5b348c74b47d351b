//! Circle-versus-rectangle collision detection and resolution.

use crate::entity::{Ball, PlayerDesc, Slot};
use crate::math::Vec2;
use crate::{BOUNCE_STRENGTH, INITIAL_BALL_VELOCITY};

/// Axis-aligned rectangle given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.half_extents()
    }
}

/// Face of the rectangle the ball hit, seen from the ball.
///
/// `Up` means the closest point lies below the ball centre, so the ball came
/// down onto the rectangle's top face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

const COMPASS: [(Direction, Vec2); 4] = [
    (Direction::Up, Vec2::new(0.0, 1.0)),
    (Direction::Right, Vec2::new(1.0, 0.0)),
    (Direction::Down, Vec2::new(0.0, -1.0)),
    (Direction::Left, Vec2::new(-1.0, 0.0)),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub direction: Direction,
    /// Vector from the ball centre to the closest point on the rectangle.
    pub difference: Vec2,
}

impl Collision {
    pub fn is_horizontal(&self) -> bool {
        matches!(self.direction, Direction::Left | Direction::Right)
    }
}

/// Classifies a vector by the compass direction it points closest to.
///
/// Only the direction of `target` matters. Ties go to the earlier entry of
/// up, right, down, left; a zero vector reports `Up`.
pub fn vector_direction(target: Vec2) -> Direction {
    let normalized = target.normalize();
    let mut best = Direction::Up;
    let mut max = 0.0;

    for (direction, axis) in COMPASS {
        let dot = normalized.dot(axis);
        if dot > max {
            max = dot;
            best = direction;
        }
    }
    best
}

/// Tests the ball against a rectangle.
///
/// The vector between both centres is clamped to the rectangle's half extents
/// to find the rectangle point closest to the ball. The ball hits when that
/// point lies within its radius.
pub fn collide(ball: &Ball, rect: &Rect) -> Option<Collision> {
    let center = ball.center();
    let half_extents = rect.half_extents();
    let rect_center = rect.center();

    let clamped = (center - rect_center).clamp(-half_extents, half_extents);
    let closest = rect_center + clamped;
    let difference = closest - center;

    if difference.length() <= ball.radius {
        Some(Collision {
            direction: vector_direction(difference),
            difference,
        })
    } else {
        None
    }
}

/// Overlap depth along the axis of the hit face.
pub fn penetration(ball: &Ball, collision: &Collision) -> f32 {
    if collision.is_horizontal() {
        ball.radius - collision.difference.x.abs()
    } else {
        ball.radius - collision.difference.y.abs()
    }
}

/// Bounces the ball off an obstacle and pushes it out of the overlap.
///
/// Returns false without touching the ball when pass-through is active and the
/// obstacle is not solid.
pub fn resolve_obstacle(ball: &mut Ball, collision: &Collision, solid: bool) -> bool {
    if ball.pass_through && !solid {
        return false;
    }

    let depth = penetration(ball, collision);
    match collision.direction {
        Direction::Left => {
            ball.velocity.x = -ball.velocity.x;
            ball.position.x += depth;
        }
        Direction::Right => {
            ball.velocity.x = -ball.velocity.x;
            ball.position.x -= depth;
        }
        Direction::Up => {
            ball.velocity.y = -ball.velocity.y;
            ball.position.y -= depth;
        }
        Direction::Down => {
            ball.velocity.y = -ball.velocity.y;
            ball.position.y += depth;
        }
    }
    true
}

/// Re-aims the ball after it struck a paddle.
///
/// The horizontal exit velocity scales with how far from the paddle centre the
/// ball landed, the vertical velocity points away from the paddle (up for slot
/// One at the bottom, down for slot Two at the top), and the result keeps the
/// incoming speed. A sticky ball is re-attached instead of released.
///
/// Returns false for a stuck ball, which paddles ignore.
pub fn resolve_paddle(ball: &mut Ball, paddle: &PlayerDesc) -> bool {
    if ball.stuck {
        return false;
    }

    let center_board = paddle.position.x + paddle.size.x / 2.0;
    let distance = ball.position.x + ball.radius - center_board;
    let percentage = distance / (paddle.size.x / 2.0);

    let old_speed = ball.velocity.length();
    ball.velocity.x = INITIAL_BALL_VELOCITY.x * percentage * BOUNCE_STRENGTH;
    ball.velocity.y = match paddle.slot {
        Slot::Two => ball.velocity.y.abs(),
        Slot::One | Slot::None => -ball.velocity.y.abs(),
    };
    ball.velocity = ball.velocity.normalize() * old_speed;

    ball.stuck = ball.sticky;
    true
}

/// Plain rectangle overlap test, edges touching count as overlap.
pub fn aabb_overlap(a: &Rect, b: &Rect) -> bool {
    let overlap_x =
        a.position.x + a.size.x >= b.position.x && b.position.x + b.size.x >= a.position.x;
    let overlap_y =
        a.position.y + a.size.y >= b.position.y && b.position.y + b.size.y >= a.position.y;
    overlap_x && overlap_y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Viewport;
    use crate::BALL_RADIUS;
    use assert_approx_eq::assert_approx_eq;

    fn ball_at(position: Vec2, velocity: Vec2) -> Ball {
        let mut ball = Ball::new(position, BALL_RADIUS, velocity);
        ball.stuck = false;
        ball
    }

    fn brick() -> Rect {
        Rect::new(Vec2::new(100.0, 100.0), Vec2::new(80.0, 20.0))
    }

    #[test]
    fn test_no_collision_when_far() {
        let ball = ball_at(Vec2::new(400.0, 400.0), Vec2::ZERO);
        assert!(collide(&ball, &brick()).is_none());
    }

    #[test]
    fn test_hit_from_above() {
        // Centre 10 units above the top face.
        let ball = ball_at(Vec2::new(127.5, 77.5), Vec2::new(0.0, 100.0));
        let collision = collide(&ball, &brick()).expect("ball overlaps brick");
        assert_eq!(collision.direction, Direction::Up);
        assert_approx_eq!(collision.difference.y, 10.0, 1e-4);
        assert_approx_eq!(penetration(&ball, &collision), 2.5, 1e-4);
    }

    #[test]
    fn test_boundary_distance_equals_radius_is_a_hit() {
        // Centre exactly one radius above the top face.
        let ball = ball_at(Vec2::new(127.5, 75.0), Vec2::new(0.0, 100.0));
        let collision = collide(&ball, &brick()).expect("touching counts as a hit");
        assert_eq!(collision.difference, Vec2::new(0.0, 12.5));
        assert_eq!(penetration(&ball, &collision), 0.0);

        let ball = ball_at(Vec2::new(127.5, 74.9), Vec2::new(0.0, 100.0));
        assert!(collide(&ball, &brick()).is_none());
    }

    #[test]
    fn test_hit_from_the_left() {
        // Centre 5 units left of the left face.
        let ball = ball_at(Vec2::new(82.5, 97.5), Vec2::new(100.0, 0.0));
        let collision = collide(&ball, &brick()).expect("ball overlaps brick");
        assert_eq!(collision.direction, Direction::Right);

        let mut resolved = ball.clone();
        assert!(resolve_obstacle(&mut resolved, &collision, true));
        assert_eq!(resolved.velocity.x, -100.0);
        assert_approx_eq!(resolved.position.x, 82.5 - 7.5, 1e-4);
    }

    #[test]
    fn test_direction_classification() {
        assert_eq!(vector_direction(Vec2::new(0.0, 3.0)), Direction::Up);
        assert_eq!(vector_direction(Vec2::new(2.0, 0.1)), Direction::Right);
        assert_eq!(vector_direction(Vec2::new(0.0, -1.0)), Direction::Down);
        assert_eq!(vector_direction(Vec2::new(-4.0, 1.0)), Direction::Left);
    }

    #[test]
    fn test_direction_ties_favour_first_axis() {
        assert_eq!(vector_direction(Vec2::new(1.0, 1.0)), Direction::Up);
        assert_eq!(vector_direction(Vec2::new(1.0, -1.0)), Direction::Right);
        assert_eq!(vector_direction(Vec2::new(-1.0, -1.0)), Direction::Down);
        assert_eq!(vector_direction(Vec2::ZERO), Direction::Up);
    }

    #[test]
    fn test_direction_is_scale_invariant() {
        let samples = [
            Vec2::new(0.3, 0.7),
            Vec2::new(-5.0, 2.0),
            Vec2::new(1.0, -9.0),
            Vec2::new(-0.01, -0.02),
        ];
        for v in samples {
            let expected = vector_direction(v);
            for scale in [0.001, 0.5, 2.0, 1000.0] {
                assert_eq!(vector_direction(v * scale), expected, "{:?} * {}", v, scale);
            }
        }
    }

    #[test]
    fn test_pass_through_ignores_non_solid() {
        let ball = ball_at(Vec2::new(127.5, 77.5), Vec2::new(0.0, 100.0));
        let collision = collide(&ball, &brick()).expect("ball overlaps brick");

        let mut passing = ball.clone();
        passing.pass_through = true;
        assert!(!resolve_obstacle(&mut passing, &collision, false));
        assert_eq!(passing, {
            let mut unchanged = ball.clone();
            unchanged.pass_through = true;
            unchanged
        });

        assert!(resolve_obstacle(&mut passing, &collision, true));
        assert_eq!(passing.velocity.y, -100.0);
        assert_approx_eq!(passing.position.y, 75.0, 1e-4);
    }

    #[test]
    fn test_paddle_bounce_preserves_speed() {
        let paddle = {
            let mut p = PlayerDesc::new(1, Vec2::new(350.0, 580.0), Viewport::default());
            p.slot = Slot::One;
            p
        };

        for offset in [-62.5, -40.0, -10.0, 0.0, 12.5, 33.0, 87.5] {
            let mut ball = ball_at(Vec2::new(350.0 + offset, 560.0), Vec2::new(120.0, 340.0));
            let before = ball.velocity.length();

            assert!(resolve_paddle(&mut ball, &paddle));
            assert_approx_eq!(ball.velocity.length(), before, 1e-3);
            assert!(ball.velocity.y < 0.0, "slot One sends the ball upwards");
        }
    }

    #[test]
    fn test_paddle_bounce_direction_by_slot() {
        let mut paddle = PlayerDesc::new(2, Vec2::new(350.0, 0.0), Viewport::default());
        paddle.slot = Slot::Two;

        let mut ball = ball_at(Vec2::new(387.5, 15.0), Vec2::new(0.0, -350.0));
        assert!(resolve_paddle(&mut ball, &paddle));
        assert!(ball.velocity.y > 0.0);
        // Struck dead centre, so no horizontal component.
        assert_approx_eq!(ball.velocity.x, 0.0, 1e-4);
    }

    #[test]
    fn test_paddle_offset_steers_ball() {
        let mut paddle = PlayerDesc::new(1, Vec2::new(350.0, 580.0), Viewport::default());
        paddle.slot = Slot::One;

        let mut right = ball_at(Vec2::new(420.0, 560.0), Vec2::new(0.0, 350.0));
        resolve_paddle(&mut right, &paddle);
        assert!(right.velocity.x > 0.0);

        let mut left = ball_at(Vec2::new(340.0, 560.0), Vec2::new(0.0, 350.0));
        resolve_paddle(&mut left, &paddle);
        assert!(left.velocity.x < 0.0);
    }

    #[test]
    fn test_sticky_paddle_reattaches() {
        let mut paddle = PlayerDesc::new(1, Vec2::new(350.0, 580.0), Viewport::default());
        paddle.slot = Slot::One;

        let mut ball = ball_at(Vec2::new(390.0, 560.0), Vec2::new(0.0, 350.0));
        ball.sticky = true;
        assert!(resolve_paddle(&mut ball, &paddle));
        assert!(ball.stuck);

        assert!(!resolve_paddle(&mut ball, &paddle));
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Rect::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let touching = Rect::new(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        let apart = Rect::new(Vec2::new(10.5, 0.0), Vec2::new(10.0, 10.0));
        assert!(aabb_overlap(&a, &touching));
        assert!(!aabb_overlap(&a, &apart));
    }
}
