//! Authoritative match simulation and message routing
//!
//! `MatchState` is owned by the server loop alone. Every entry point returns
//! the messages it wants delivered as `Outbound` values; the network layer only
//! resolves targets to connections. This keeps the whole match testable without
//! sockets.

use crate::roster::{RegisterError, Roster};
use log::{debug, info, warn};
use shared::collision::{collide, resolve_paddle};
use shared::physics::stuck_ball_position;
use shared::{
    Ball, Message, PlayerDesc, RegisterRequest, Slot, Viewport, BALL_RADIUS,
    INITIAL_BALL_VELOCITY,
};

/// Who receives an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    One(u32),
    AllExcept(u32),
}

impl Target {
    pub fn includes(&self, connection_id: u32) -> bool {
        match self {
            Target::All => true,
            Target::One(id) => *id == connection_id,
            Target::AllExcept(id) => *id != connection_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub target: Target,
    pub message: Message,
}

impl Outbound {
    pub fn to(connection_id: u32, message: Message) -> Self {
        Self {
            target: Target::One(connection_id),
            message,
        }
    }

    pub fn all(message: Message) -> Self {
        Self {
            target: Target::All,
            message,
        }
    }

    pub fn all_except(connection_id: u32, message: Message) -> Self {
        Self {
            target: Target::AllExcept(connection_id),
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    WaitingForPlayers,
    /// Both slots filled and the ball exists; waiting for both ready signals.
    AwaitingReady,
    Active,
    Ended,
}

pub struct MatchState {
    roster: Roster,
    ball: Option<Ball>,
    phase: MatchPhase,
    tick: u64,
    pending_life_losses: Vec<u32>,
    pending_pad_sound: bool,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    pub fn new() -> Self {
        Self {
            roster: Roster::default(),
            ball: None,
            phase: MatchPhase::WaitingForPlayers,
            tick: 0,
            pending_life_losses: Vec::new(),
            pending_pad_sound: false,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ball(&self) -> Option<&Ball> {
        self.ball.as_ref()
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn on_connect(&mut self, connection_id: u32) -> Vec<Outbound> {
        info!("Connection {} accepted", connection_id);
        vec![Outbound::to(connection_id, Message::ClientAccepted)]
    }

    /// Flags the connection's player for removal on the next flush.
    pub fn on_disconnect(&mut self, connection_id: u32) {
        if self.roster.mark_disconnected(connection_id) {
            debug!("Player {} scheduled for removal", connection_id);
        }
    }

    pub fn handle_message(&mut self, connection_id: u32, message: Message) -> Vec<Outbound> {
        match message {
            Message::ServerPing { timestamp } => {
                vec![Outbound::to(connection_id, Message::ServerPing { timestamp })]
            }
            Message::Register(request) => self.register(connection_id, &request),
            Message::Unregister => match self.roster.unregister(connection_id) {
                Some(desc) => self.after_removal(&desc),
                None => Vec::new(),
            },
            Message::UpdatePlayer(desc) => self.update_player(connection_id, &desc),
            Message::LaunchBall => {
                self.launch_ball(connection_id);
                Vec::new()
            }
            Message::PlayerReady => self.player_ready(connection_id),
            other => {
                warn!(
                    "Ignoring unexpected {:?} from connection {}",
                    other.id(),
                    connection_id
                );
                Vec::new()
            }
        }
    }

    fn register(&mut self, connection_id: u32, request: &RegisterRequest) -> Vec<Outbound> {
        // A departed player's match must be settled before its slot is reused.
        let mut outbound = self.flush_removals();

        let desc = match self.roster.register(connection_id, request) {
            Ok(desc) => desc,
            Err(RegisterError::ServerFull) => {
                info!("Rejecting connection {}: server full", connection_id);
                outbound.push(Outbound::to(connection_id, Message::ServerFull));
                return outbound;
            }
            Err(e) => {
                warn!("Rejecting registration: {}", e);
                return outbound;
            }
        };

        outbound.push(Outbound::to(connection_id, Message::AssignId(connection_id)));
        for existing in self.roster.players() {
            if existing.unique_id != connection_id {
                outbound.push(Outbound::to(connection_id, Message::AddPlayer(existing)));
            }
        }
        outbound.push(Outbound::all(Message::AddPlayer(desc)));

        if self.roster.is_full() {
            if let Some(ball) = self.spawn_ball() {
                outbound.push(Outbound::all(Message::AddBall(ball.desc())));
            }
        }
        outbound
    }

    fn spawn_ball(&mut self) -> Option<&Ball> {
        let paddle = self.roster.by_slot(Slot::One)?;
        let position = stuck_ball_position(paddle, BALL_RADIUS);
        info!("Room full, ball spawned at ({}, {})", position.x, position.y);

        self.roster.clear_ready();
        self.roster.restore_lives();
        self.pending_life_losses.clear();
        self.phase = MatchPhase::AwaitingReady;
        self.ball = Some(Ball::new(position, BALL_RADIUS, INITIAL_BALL_VELOCITY));
        self.ball.as_ref()
    }

    /// Client-reported paddle positions are trusted as sent; only the sender's
    /// own player can be updated.
    fn update_player(&mut self, connection_id: u32, desc: &PlayerDesc) -> Vec<Outbound> {
        if desc.unique_id != connection_id {
            warn!(
                "Connection {} tried to move player {}",
                connection_id, desc.unique_id
            );
            return Vec::new();
        }
        let Some(player) = self.roster.get_mut(connection_id) else {
            return Vec::new();
        };

        player.position = desc.position;
        debug!(
            "Player {} moved to ({}, {})",
            connection_id, desc.position.x, desc.position.y
        );
        vec![Outbound::all_except(
            connection_id,
            Message::UpdatePlayer(player.clone()),
        )]
    }

    fn launch_ball(&mut self, connection_id: u32) {
        if self.phase != MatchPhase::Active || self.roster.get(connection_id).is_none() {
            return;
        }
        if let Some(ball) = self.ball.as_mut().filter(|ball| ball.stuck) {
            ball.stuck = false;
            info!("Player {} launched the ball", connection_id);
        }
    }

    fn player_ready(&mut self, connection_id: u32) -> Vec<Outbound> {
        if !self.roster.set_ready(connection_id) {
            return Vec::new();
        }
        debug!("Player {} is ready", connection_id);

        if self.phase == MatchPhase::AwaitingReady && self.roster.all_ready() && self.ball.is_some()
        {
            info!("Match started");
            self.phase = MatchPhase::Active;
            return vec![Outbound::all(Message::GameActive)];
        }
        Vec::new()
    }

    /// Removes every player whose connection dropped since the last flush and
    /// announces them together.
    pub fn flush_removals(&mut self) -> Vec<Outbound> {
        let mut outbound = Vec::new();
        for desc in self.roster.drain_removals() {
            outbound.extend(self.after_removal(&desc));
        }
        outbound
    }

    fn after_removal(&mut self, desc: &PlayerDesc) -> Vec<Outbound> {
        let mut outbound = vec![Outbound::all(Message::RemovePlayer(desc.unique_id))];

        if self.roster.is_full() {
            return outbound;
        }

        self.ball = None;
        self.pending_life_losses.clear();
        self.pending_pad_sound = false;
        self.roster.clear_ready();

        let remaining = self.roster.players().into_iter().next();
        match (self.phase, remaining) {
            (MatchPhase::Active, Some(winner)) => {
                info!(
                    "Player {} left mid-match, slot {:?} wins",
                    desc.unique_id, winner.slot
                );
                outbound.push(Outbound::all(Message::GameEnds {
                    winner: winner.slot,
                }));
                self.phase = MatchPhase::Ended;
            }
            _ => self.phase = MatchPhase::WaitingForPlayers,
        }
        outbound
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Does nothing before the ball exists. A stuck ball rides on slot One's
    /// paddle; a free ball only moves while the match is active.
    pub fn step(&mut self, dt: f32) {
        self.tick += 1;
        let viewport = self.viewport();

        let Some(ball) = self.ball.as_mut() else {
            return;
        };

        if ball.stuck {
            if let Some(paddle) = self.roster.by_slot(Slot::One) {
                ball.follow_paddle(paddle);
            }
            return;
        }
        if self.phase != MatchPhase::Active {
            return;
        }

        let contact = ball.step(dt, viewport);

        for slot in [Slot::One, Slot::Two] {
            if let Some(paddle) = self.roster.by_slot(slot) {
                if collide(ball, &paddle.rect()).is_some() && resolve_paddle(ball, paddle) {
                    self.pending_pad_sound = true;
                }
            }
        }

        if contact.bottom {
            self.lose_life(Slot::One);
        } else if contact.top {
            self.lose_life(Slot::Two);
        }
    }

    fn lose_life(&mut self, slot: Slot) {
        let Some(player) = self.roster.by_slot_mut(slot) else {
            return;
        };
        player.lives = player.lives.saturating_sub(1);
        info!("Player {} lost a life, {} left", player.unique_id, player.lives);
        self.pending_life_losses.push(player.unique_id);

        let anchor = self
            .roster
            .by_slot(Slot::One)
            .map(|paddle| stuck_ball_position(paddle, BALL_RADIUS));
        if let (Some(ball), Some(position)) = (self.ball.as_mut(), anchor) {
            ball.reset(position, INITIAL_BALL_VELOCITY);
        }
    }

    /// Emits the per-tick state deltas: life losses (or the match end), the
    /// paddle sound cue and the ball.
    pub fn broadcast_game_state(&mut self) -> Vec<Outbound> {
        let mut outbound = Vec::new();

        for id in std::mem::take(&mut self.pending_life_losses) {
            let Some(player) = self.roster.get(id) else {
                continue;
            };
            if player.lives == 0 {
                let winner = player.slot.opponent();
                info!("Match over, slot {:?} wins", winner);
                outbound.push(Outbound::all(Message::GameEnds { winner }));
                self.phase = MatchPhase::Ended;
                self.ball = None;
                break;
            }
            outbound.push(Outbound::all(Message::ReduceLives(player.clone())));
        }

        if std::mem::take(&mut self.pending_pad_sound) {
            outbound.push(Outbound::all(Message::PlayPadSound));
        }

        if self.phase != MatchPhase::Ended {
            if let Some(ball) = &self.ball {
                outbound.push(Outbound::all(Message::UpdateBall(ball.desc())));
            }
        }
        outbound
    }

    /// Viewport of the bottom player, which the ball bounces inside.
    pub fn viewport(&self) -> Viewport {
        self.roster
            .by_slot(Slot::One)
            .map(|paddle| paddle.viewport)
            .unwrap_or_default()
    }
}
