//! Client-side match state machine
//!
//! `ClientSession` decides which mode the client is in and how local input is
//! blended with what the server sends. It never touches the network or the
//! screen: inbound messages go in, `Command`s for the frame loop come out.

use log::{debug, info, warn};
use shared::physics::{move_paddle, stuck_ball_position};
use shared::{
    Ball, Message, PaddleInput, PlayerDesc, RegisterRequest, Slot, Vec2, Viewport, PLAYER_SIZE,
};
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    MainMenu,
    Connecting,
    /// Connected and registering; waiting for our own player to be echoed.
    Lobby,
    /// Registered; waiting for the local ready acknowledgment and the server.
    Ready,
    Active,
    Ended { winner: Slot },
}

/// Side effects requested by the session, carried out by the frame loop
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect(String),
    Send(Message),
    Disconnect,
    PlaySound,
}

pub struct ClientSession {
    state: ClientState,
    viewport: Viewport,
    local_id: Option<u32>,
    players: HashMap<u32, PlayerDesc>,
    ball: Option<Ball>,
    ready_sent: bool,
    server_active: bool,
    notice: Option<String>,
    ping_ms: Option<u64>,
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

impl ClientSession {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: ClientState::MainMenu,
            viewport,
            local_id: None,
            players: HashMap::new(),
            ball: None,
            ready_sent: false,
            server_active: false,
            notice: None,
            ping_ms: None,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// User-visible message explaining the last return to the menu
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn local_id(&self) -> Option<u32> {
        self.local_id
    }

    pub fn local_player(&self) -> Option<&PlayerDesc> {
        self.local_id.and_then(|id| self.players.get(&id))
    }

    pub fn opponent(&self) -> Option<&PlayerDesc> {
        self.players
            .values()
            .find(|player| Some(player.unique_id) != self.local_id)
    }

    /// Mirrored players ordered by slot
    pub fn players(&self) -> Vec<&PlayerDesc> {
        let mut players: Vec<&PlayerDesc> = self.players.values().collect();
        players.sort_by_key(|player| player.slot);
        players
    }

    pub fn ball(&self) -> Option<&Ball> {
        self.ball.as_ref()
    }

    pub fn ping_ms(&self) -> Option<u64> {
        self.ping_ms
    }

    pub fn is_ready_sent(&self) -> bool {
        self.ready_sent
    }

    pub fn connect(&mut self, address: &str) -> Vec<Command> {
        if self.state != ClientState::MainMenu {
            return Vec::new();
        }
        info!("Connecting to {}", address);
        self.notice = None;
        self.state = ClientState::Connecting;
        vec![Command::Connect(address.to_string())]
    }

    fn register_request(&self) -> RegisterRequest {
        RegisterRequest {
            position: Vec2::new(
                self.viewport.width / 2.0 - PLAYER_SIZE.x / 2.0,
                self.viewport.height - PLAYER_SIZE.y,
            ),
            viewport: self.viewport,
        }
    }

    /// Drops the mirrored match and goes back to the menu.
    fn return_to_menu(&mut self, notice: Option<String>) {
        self.state = ClientState::MainMenu;
        self.local_id = None;
        self.players.clear();
        self.ball = None;
        self.ready_sent = false;
        self.server_active = false;
        self.ping_ms = None;
        self.notice = notice;
    }

    pub fn handle_message(&mut self, message: Message) -> Vec<Command> {
        if self.state == ClientState::MainMenu {
            debug!("Ignoring {:?} while in the menu", message.id());
            return Vec::new();
        }

        match message {
            Message::ClientAccepted => {
                if self.state == ClientState::Connecting {
                    self.state = ClientState::Lobby;
                    return vec![Command::Send(Message::Register(self.register_request()))];
                }
            }
            Message::ServerFull => {
                if self.state != ClientState::Active {
                    warn!("Server is full");
                    self.return_to_menu(Some("Server is full".to_string()));
                    return vec![Command::Disconnect];
                }
            }
            Message::AssignId(id) => {
                info!("Assigned player id {}", id);
                self.local_id = Some(id);
            }
            Message::AddPlayer(desc) => {
                let own = Some(desc.unique_id) == self.local_id;
                self.players.insert(desc.unique_id, desc);
                if own && self.state == ClientState::Lobby {
                    self.state = ClientState::Ready;
                }
            }
            Message::RemovePlayer(id) => {
                self.players.remove(&id);
                if Some(id) != self.local_id {
                    // The server drops the ball and every ready flag with the opponent.
                    self.ball = None;
                    if self.state == ClientState::Ready {
                        self.ready_sent = false;
                        self.server_active = false;
                    }
                }
            }
            Message::UpdatePlayer(desc) => {
                if Some(desc.unique_id) == self.local_id {
                    return Vec::new();
                }
                if let Some(player) = self.players.get_mut(&desc.unique_id) {
                    *player = desc;
                }
            }
            Message::ReduceLives(desc) => {
                if let Some(player) = self.players.get_mut(&desc.unique_id) {
                    player.lives = desc.lives;
                }
            }
            Message::AddBall(desc) => self.ball = Some(Ball::from(desc)),
            Message::UpdateBall(desc) => {
                if self.ball.is_some() {
                    self.ball = Some(Ball::from(desc));
                }
            }
            Message::GameActive => {
                self.server_active = true;
                self.try_activate();
            }
            Message::GameEnds { winner } => {
                if matches!(self.state, ClientState::Ready | ClientState::Active) {
                    info!("Match over, slot {:?} wins", winner);
                    self.state = ClientState::Ended { winner };
                }
            }
            Message::PlayPadSound => return vec![Command::PlaySound],
            Message::ServerPing { timestamp } => {
                self.ping_ms = Some(now_millis().saturating_sub(timestamp));
            }
            other => warn!("Unexpected {:?} from server", other.id()),
        }
        Vec::new()
    }

    fn try_activate(&mut self) {
        if self.state == ClientState::Ready && self.ready_sent && self.server_active {
            info!("Match is active");
            self.state = ClientState::Active;
        }
    }

    pub fn acknowledge_ready(&mut self) -> Vec<Command> {
        if self.state != ClientState::Ready || self.ready_sent {
            return Vec::new();
        }
        self.ready_sent = true;
        self.try_activate();
        vec![Command::Send(Message::PlayerReady)]
    }

    pub fn acknowledge_end(&mut self) -> Vec<Command> {
        if !matches!(self.state, ClientState::Ended { .. }) {
            return Vec::new();
        }
        self.return_to_menu(None);
        vec![Command::Disconnect]
    }

    pub fn on_connection_lost(&mut self, reason: &str) {
        if self.state == ClientState::MainMenu {
            return;
        }
        warn!("Connection lost: {}", reason);
        self.return_to_menu(Some(format!("Disconnected: {}", reason)));
    }

    /// Periodic ping used for the latency display
    pub fn ping_request(&self) -> Option<Command> {
        match self.state {
            ClientState::MainMenu | ClientState::Connecting => None,
            _ => Some(Command::Send(Message::ServerPing {
                timestamp: now_millis(),
            })),
        }
    }

    /// Applies one frame of local input.
    ///
    /// The own paddle is predicted locally and reported right away; a stuck
    /// ball is placed on slot One's paddle as the server would.
    pub fn update(&mut self, dt: f32, input: PaddleInput) -> Vec<Command> {
        if !matches!(self.state, ClientState::Ready | ClientState::Active) {
            return Vec::new();
        }
        let mut commands = Vec::new();

        let local = self.local_id.and_then(|id| self.players.get_mut(&id));
        if let (Some(player), Some(direction)) = (local, input.direction()) {
            if move_paddle(player, direction, dt) {
                commands.push(Command::Send(Message::UpdatePlayer(player.clone())));
            }
        }

        let anchor = self
            .players
            .values()
            .find(|player| player.slot == Slot::One)
            .cloned();
        if let (Some(ball), Some(paddle)) = (self.ball.as_mut(), anchor) {
            if ball.stuck {
                ball.position = stuck_ball_position(&paddle, ball.radius);
            }
        }

        let launch_allowed = self.state == ClientState::Active
            && self.local_player().map(|p| p.slot) == Some(Slot::One)
            && self.ball.as_ref().map_or(false, |ball| ball.stuck);
        if input.launch && launch_allowed {
            commands.push(Command::Send(Message::LaunchBall));
        }

        commands
    }
}
