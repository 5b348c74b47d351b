use crate::entity::{Ball, PlayerDesc, Viewport};
use crate::math::Vec2;
use crate::PADDLE_SPEED;

/// Walls the ball touched during a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContact {
    pub left: bool,
    pub right: bool,
    /// Slot Two's boundary.
    pub top: bool,
    /// Slot One's boundary.
    pub bottom: bool,
}

impl WallContact {
    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddleDirection {
    Left,
    Right,
}

/// Paddle controls sampled for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaddleInput {
    pub left: bool,
    pub right: bool,
    pub launch: bool,
}

impl PaddleInput {
    /// Resolves the held keys into a direction; opposing keys cancel out.
    pub fn direction(&self) -> Option<PaddleDirection> {
        match (self.left, self.right) {
            (true, false) => Some(PaddleDirection::Left),
            (false, true) => Some(PaddleDirection::Right),
            _ => None,
        }
    }
}

impl Ball {
    /// Advances the ball and reflects it off the viewport edges.
    ///
    /// A stuck ball does not move. On each axis, once the leading edge reaches
    /// the boundary the velocity component is negated and the position clamped
    /// back onto the boundary.
    pub fn step(&mut self, dt: f32, viewport: Viewport) -> WallContact {
        let mut contact = WallContact::default();
        if self.stuck {
            return contact;
        }

        self.position += self.velocity * dt;

        if self.position.x <= 0.0 {
            self.velocity.x = -self.velocity.x;
            self.position.x = 0.0;
            contact.left = true;
        } else if self.position.x + self.size.x >= viewport.width {
            self.velocity.x = -self.velocity.x;
            self.position.x = viewport.width - self.size.x;
            contact.right = true;
        }

        if self.position.y <= 0.0 {
            self.velocity.y = -self.velocity.y;
            self.position.y = 0.0;
            contact.top = true;
        } else if self.position.y + self.size.y >= viewport.height {
            self.velocity.y = -self.velocity.y;
            self.position.y = viewport.height - self.size.y;
            contact.bottom = true;
        }

        contact
    }

    /// Re-attaches the ball at `position` and clears every modifier.
    pub fn reset(&mut self, position: Vec2, velocity: Vec2) {
        self.position = position;
        self.velocity = velocity;
        self.stuck = true;
        self.sticky = false;
        self.pass_through = false;
    }

    pub fn follow_paddle(&mut self, paddle: &PlayerDesc) {
        self.position = stuck_ball_position(paddle, self.radius);
    }
}

/// Where a stuck ball rests relative to its paddle: half a paddle width minus
/// the radius right of the paddle centre, two radii above the paddle top.
pub fn stuck_ball_position(paddle: &PlayerDesc, radius: f32) -> Vec2 {
    let center_x = paddle.position.x + paddle.size.x / 2.0;
    Vec2::new(
        center_x + paddle.size.x / 2.0 - radius,
        paddle.position.y - radius * 2.0,
    )
}

/// Moves a paddle horizontally, keeping it inside its viewport.
///
/// Returns true if the paddle actually moved.
pub fn move_paddle(paddle: &mut PlayerDesc, direction: PaddleDirection, dt: f32) -> bool {
    let before = paddle.position.x;
    let delta = PADDLE_SPEED * dt;
    let max_x = (paddle.viewport.width - paddle.size.x).max(0.0);

    let target = match direction {
        PaddleDirection::Left => before - delta,
        PaddleDirection::Right => before + delta,
    };
    paddle.position.x = target.clamp(0.0, max_x);

    paddle.position.x != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BALL_RADIUS, INITIAL_BALL_VELOCITY};
    use assert_approx_eq::assert_approx_eq;

    fn free_ball(position: Vec2, velocity: Vec2) -> Ball {
        let mut ball = Ball::new(position, BALL_RADIUS, velocity);
        ball.stuck = false;
        ball
    }

    #[test]
    fn test_stuck_ball_does_not_move() {
        let mut ball = Ball::new(Vec2::new(100.0, 100.0), BALL_RADIUS, INITIAL_BALL_VELOCITY);
        let contact = ball.step(1.0, Viewport::default());
        assert_eq!(ball.position, Vec2::new(100.0, 100.0));
        assert!(!contact.any());
    }

    #[test]
    fn test_free_ball_integrates_velocity() {
        let mut ball = free_ball(Vec2::new(100.0, 100.0), Vec2::new(100.0, -50.0));
        let contact = ball.step(0.5, Viewport::default());
        assert_approx_eq!(ball.position.x, 150.0, 1e-4);
        assert_approx_eq!(ball.position.y, 75.0, 1e-4);
        assert!(!contact.any());
    }

    #[test]
    fn test_reflection_is_idempotent_at_left_boundary() {
        let mut ball = free_ball(Vec2::new(0.0, 300.0), Vec2::new(-100.0, 0.0));
        let contact = ball.step(0.0, Viewport::default());
        assert_eq!(ball.position.x, 0.0);
        assert_eq!(ball.velocity.x, 100.0);
        assert!(contact.left);
    }

    #[test]
    fn test_reflection_clamps_right_and_bottom() {
        let viewport = Viewport::default();
        let mut ball = free_ball(Vec2::new(790.0, 590.0), Vec2::new(100.0, 100.0));
        let contact = ball.step(0.1, viewport);

        assert_eq!(ball.position.x, viewport.width - ball.size.x);
        assert_eq!(ball.position.y, viewport.height - ball.size.y);
        assert_eq!(ball.velocity, Vec2::new(-100.0, -100.0));
        assert!(contact.right);
        assert!(contact.bottom);
        assert!(!contact.top);
    }

    #[test]
    fn test_reflection_at_top() {
        let mut ball = free_ball(Vec2::new(300.0, 5.0), Vec2::new(0.0, -350.0));
        let contact = ball.step(0.1, Viewport::default());
        assert_eq!(ball.position.y, 0.0);
        assert_eq!(ball.velocity.y, 350.0);
        assert!(contact.top);
    }

    #[test]
    fn test_stuck_ball_position_relative_to_paddle() {
        let paddle = PlayerDesc::new(1, Vec2::new(350.0, 580.0), Viewport::default());
        let position = stuck_ball_position(&paddle, BALL_RADIUS);
        assert_eq!(position, Vec2::new(437.5, 555.0));
    }

    #[test]
    fn test_move_paddle_clamps_to_viewport() {
        let mut paddle = PlayerDesc::new(1, Vec2::new(10.0, 580.0), Viewport::default());

        assert!(move_paddle(&mut paddle, PaddleDirection::Left, 1.0));
        assert_eq!(paddle.position.x, 0.0);
        assert!(!move_paddle(&mut paddle, PaddleDirection::Left, 1.0));

        assert!(move_paddle(&mut paddle, PaddleDirection::Right, 10.0));
        assert_eq!(paddle.position.x, 700.0);
    }

    #[test]
    fn test_move_paddle_speed() {
        let mut paddle = PlayerDesc::new(1, Vec2::new(350.0, 580.0), Viewport::default());
        move_paddle(&mut paddle, PaddleDirection::Right, 0.1);
        assert_approx_eq!(paddle.position.x, 350.0 + PADDLE_SPEED * 0.1, 1e-3);
    }

    #[test]
    fn test_input_direction() {
        let both = PaddleInput {
            left: true,
            right: true,
            launch: false,
        };
        assert_eq!(both.direction(), None);
        assert_eq!(
            PaddleInput {
                left: true,
                ..Default::default()
            }
            .direction(),
            Some(PaddleDirection::Left)
        );
    }

    #[test]
    fn test_reset_restores_stuck_ball() {
        let mut ball = free_ball(Vec2::new(1.0, 1.0), Vec2::new(5.0, 5.0));
        ball.sticky = true;
        ball.pass_through = true;

        ball.reset(Vec2::new(50.0, 60.0), INITIAL_BALL_VELOCITY);
        assert!(ball.stuck);
        assert!(!ball.sticky);
        assert!(!ball.pass_through);
        assert_eq!(ball.velocity, INITIAL_BALL_VELOCITY);
    }
}
