use crate::session::{ClientSession, ClientState};
use macroquad::prelude::*;
use shared::breakout::LocalGame;
use shared::powerup::{Effects, Tint};
use shared::{Ball, PlayerDesc, Slot};

const BACKGROUND: Color = Color::new(0.1, 0.1, 0.1, 1.0);
const CONFUSED_BACKGROUND: Color = Color::new(0.9, 0.9, 0.9, 1.0);
const OPPONENT: Color = Color::new(1.0, 0.27, 0.27, 1.0);
const BAR_OFF: Color = Color::new(0.2, 0.2, 0.2, 1.0);

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub local_id: Option<u32>,
    pub ping_ms: Option<u64>,
    pub player_count: usize,
}

pub fn tint_color(tint: Tint) -> Color {
    Color::new(tint[0], tint[1], tint[2], 1.0)
}

/// Screen offset applied to the whole scene while an effect distorts it
pub fn effect_offset(effects: &Effects, time: f32) -> Vec2 {
    let mut offset = Vec2::ZERO;
    if effects.is_shaking() {
        offset.x += (time * 60.0).cos() * 2.0;
        offset.y += (time * 80.0).cos() * 2.0;
    }
    if effects.chaos {
        offset.x += (time * 3.0).sin() * 8.0;
        offset.y += (time * 2.0).cos() * 8.0;
    }
    offset
}

/// Overlay text for states that wait on the user or the server
pub fn state_caption(state: ClientState, ready_sent: bool) -> Option<String> {
    match state {
        ClientState::MainMenu | ClientState::Active => None,
        ClientState::Connecting => Some("Connecting...".to_string()),
        ClientState::Lobby => Some("Joining match...".to_string()),
        ClientState::Ready if ready_sent => Some("Waiting for opponent".to_string()),
        ClientState::Ready => Some("Press Enter when ready".to_string()),
        ClientState::Ended { winner } => Some(format!(
            "Player {} wins! Press Enter",
            match winner {
                Slot::One => "1",
                Slot::Two => "2",
                Slot::None => "?",
            }
        )),
    }
}

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn render_menu(&mut self, server: &str, notice: Option<&str>) {
        clear_background(BACKGROUND);

        self.draw_centered("PADDLE DUEL", self.height / 3.0, 48.0, WHITE);
        self.draw_centered(
            &format!("Enter: join {}", server),
            self.height / 2.0,
            24.0,
            LIGHTGRAY,
        );
        self.draw_centered("Escape: quit", self.height / 2.0 + 30.0, 24.0, LIGHTGRAY);

        if let Some(notice) = notice {
            self.draw_centered(notice, self.height * 0.75, 24.0, OPPONENT);
        }
    }

    pub fn render_session(&mut self, session: &ClientSession, server: &str) {
        if session.state() == ClientState::MainMenu {
            self.render_menu(server, session.notice());
            return;
        }

        clear_background(BACKGROUND);

        for player in session.players() {
            let color = if Some(player.unique_id) == session.local_id() {
                GREEN
            } else {
                OPPONENT
            };
            self.draw_paddle(player, color, Vec2::ZERO);
        }

        if let Some(ball) = session.ball() {
            self.draw_ball(ball, WHITE, Vec2::ZERO);
        }

        self.draw_lives(&session.players());

        if let Some(caption) = state_caption(session.state(), session.is_ready_sent()) {
            self.draw_centered(&caption, self.height / 2.0, 32.0, WHITE);
        }

        self.draw_ui(UiConfig {
            local_id: session.local_id(),
            ping_ms: session.ping_ms(),
            player_count: session.players().len(),
        });
    }

    pub fn render_local(&mut self, game: &LocalGame) {
        let effects = &game.effects;
        clear_background(if effects.confuse {
            CONFUSED_BACKGROUND
        } else {
            BACKGROUND
        });
        let offset = effect_offset(effects, get_time() as f32);

        for brick in game.level.bricks.iter().filter(|b| !b.destroyed) {
            let rect = &brick.rect;
            draw_rectangle(
                rect.position.x + offset.x,
                rect.position.y + offset.y,
                rect.size.x,
                rect.size.y,
                tint_color(brick.color),
            );
            if brick.solid {
                draw_rectangle_lines(
                    rect.position.x + offset.x,
                    rect.position.y + offset.y,
                    rect.size.x,
                    rect.size.y,
                    2.0,
                    DARKGRAY,
                );
            }
        }

        for powerup in game.powerups.iter().filter(|p| !p.destroyed) {
            draw_rectangle(
                powerup.position.x + offset.x,
                powerup.position.y + offset.y,
                powerup.size.x,
                powerup.size.y,
                tint_color(powerup.color),
            );
        }

        self.draw_paddle(&game.player, tint_color(effects.paddle_tint), offset);
        self.draw_ball(&game.ball, tint_color(effects.ball_tint), offset);

        let status = format!(
            "Lives: {}  Bricks: {}",
            game.player.lives,
            game.level.remaining()
        );
        draw_text(&status, 10.0, self.height - 10.0, 20.0, GRAY);
    }

    fn draw_paddle(&mut self, player: &PlayerDesc, color: Color, offset: Vec2) {
        let x = player.position.x + offset.x;
        let y = player.position.y + offset.y;
        draw_rectangle(x, y, player.size.x, player.size.y, color);
        draw_rectangle_lines(x, y, player.size.x, player.size.y, 2.0, WHITE);
    }

    fn draw_ball(&mut self, ball: &Ball, color: Color, offset: Vec2) {
        let center = ball.center();
        draw_circle(center.x + offset.x, center.y + offset.y, ball.radius, color);
    }

    fn draw_lives(&mut self, players: &[&PlayerDesc]) {
        for player in players {
            let y = match player.slot {
                Slot::Two => 40.0,
                _ => self.height - 40.0,
            };
            let text = format!("Lives: {}", player.lives);
            draw_text(&text, self.width - 110.0, y, 20.0, WHITE);
        }
    }

    fn draw_centered(&mut self, text: &str, y: f32, size: f32, color: Color) {
        let dimensions = measure_text(text, None, size as u16, 1.0);
        draw_text(text, (self.width - dimensions.width) / 2.0, y, size, color);
    }

    fn draw_ui(&mut self, config: UiConfig) {
        let y_start = 10.0;

        let connection_color = if config.local_id.is_some() {
            GREEN
        } else {
            RED
        };
        draw_rectangle(10.0, y_start, 8.0, 8.0, connection_color);
        draw_text("CON", 20.0, y_start + 8.0, 12.0, WHITE);

        let ping_y = y_start + 15.0;
        let ping = config.ping_ms.unwrap_or(0);
        let ping_bars = ((ping / 20).min(10)) as i32;

        for i in 0..10i32 {
            let bar_color = if i < ping_bars {
                if ping < 50 {
                    GREEN
                } else if ping < 100 {
                    YELLOW
                } else {
                    RED
                }
            } else {
                BAR_OFF
            };

            draw_rectangle(10.0 + (i as f32) * 3.0, ping_y, 2.0, 8.0, bar_color);
        }

        let ping_text = match config.ping_ms {
            Some(ms) => format!("{}ms", ms),
            None => "--".to_string(),
        };
        draw_text(&ping_text, 45.0, ping_y + 8.0, 12.0, WHITE);

        let player_text = format!("{} players", config.player_count);
        draw_text(&player_text, 10.0, ping_y + 23.0, 12.0, WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tint_color() {
        let color = tint_color([1.0, 0.5, 0.25]);
        assert_eq!((color.r, color.g, color.b, color.a), (1.0, 0.5, 0.25, 1.0));
    }

    #[test]
    fn test_effect_offset_idle() {
        assert_eq!(effect_offset(&Effects::default(), 1.5), Vec2::ZERO);
    }

    #[test]
    fn test_effect_offset_chaos_moves_scene() {
        let effects = Effects {
            chaos: true,
            ..Default::default()
        };
        assert_ne!(effect_offset(&effects, 0.4), Vec2::ZERO);
    }

    #[test]
    fn test_state_captions() {
        assert_eq!(state_caption(ClientState::Active, true), None);
        assert_eq!(
            state_caption(ClientState::Ready, false).as_deref(),
            Some("Press Enter when ready")
        );
        assert_eq!(
            state_caption(ClientState::Ready, true).as_deref(),
            Some("Waiting for opponent")
        );
        assert_eq!(
            state_caption(ClientState::Ended { winner: Slot::Two }, true).as_deref(),
            Some("Player 2 wins! Press Enter")
        );
    }
}
