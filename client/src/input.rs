//! Keyboard sampling with edge detection

use macroquad::prelude::*;
use shared::PaddleInput;

/// Raw key levels for one frame, before edge detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyLevels {
    pub left: bool,
    pub right: bool,
    pub launch: bool,
    pub confirm: bool,
    pub quit: bool,
}

/// What the frame loop acts on this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Movement is level-triggered; `launch` fires once per key press.
    pub paddle: PaddleInput,
    pub confirm: bool,
    pub quit: bool,
}

/// Turns held keys into per-frame paddle input and menu actions
pub struct InputManager {
    // Previous frame key states for edge detection
    prev_launch: bool,
    prev_confirm: bool,
    prev_quit: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            prev_launch: false,
            prev_confirm: false,
            prev_quit: false,
        }
    }

    /// Samples the keyboard (A/D or arrows to move, Space to launch,
    /// Enter to confirm, Escape to quit).
    pub fn sample(&mut self) -> FrameInput {
        let levels = KeyLevels {
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            launch: is_key_down(KeyCode::Space),
            confirm: is_key_down(KeyCode::Enter),
            quit: is_key_down(KeyCode::Escape),
        };
        self.apply(levels)
    }

    pub fn apply(&mut self, levels: KeyLevels) -> FrameInput {
        let input = FrameInput {
            paddle: PaddleInput {
                left: levels.left,
                right: levels.right,
                launch: levels.launch && !self.prev_launch,
            },
            confirm: levels.confirm && !self.prev_confirm,
            quit: levels.quit && !self.prev_quit,
        };

        self.prev_launch = levels.launch;
        self.prev_confirm = levels.confirm;
        self.prev_quit = levels.quit;

        input
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_is_level_triggered() {
        let mut input = InputManager::new();
        let held = KeyLevels {
            left: true,
            ..Default::default()
        };

        assert!(input.apply(held).paddle.left);
        assert!(input.apply(held).paddle.left);
    }

    #[test]
    fn test_launch_and_confirm_fire_once() {
        let mut input = InputManager::new();
        let held = KeyLevels {
            launch: true,
            confirm: true,
            ..Default::default()
        };

        let first = input.apply(held);
        assert!(first.paddle.launch);
        assert!(first.confirm);

        let second = input.apply(held);
        assert!(!second.paddle.launch);
        assert!(!second.confirm);

        input.apply(KeyLevels::default());
        assert!(input.apply(held).confirm);
    }
}
