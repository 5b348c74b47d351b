//! Frame loops for online play and the local Breakout mode

use crate::input::InputManager;
use crate::network::{Connection, NetworkEvent};
use crate::rendering::Renderer;
use crate::session::{ClientSession, ClientState, Command};
use log::{debug, info, warn};
use macroquad::prelude::{get_frame_time, next_frame};
use shared::breakout::{standard_tiles, LocalEvent, LocalGame};
use shared::Viewport;
use std::time::{Duration, Instant};

const PING_INTERVAL: Duration = Duration::from_secs(1);

/// Online client: one session, at most one live connection.
pub struct OnlineApp {
    server: String,
    session: ClientSession,
    connection: Option<Connection>,
    input: InputManager,
    renderer: Renderer,
    last_ping: Instant,
}

impl OnlineApp {
    pub fn new(server: &str, width: usize, height: usize) -> Self {
        Self {
            server: server.to_string(),
            session: ClientSession::new(Viewport::new(width as f32, height as f32)),
            connection: None,
            input: InputManager::new(),
            renderer: Renderer::new(width, height),
            last_ping: Instant::now(),
        }
    }

    pub async fn run(&mut self) {
        loop {
            let dt = get_frame_time();
            let frame = self.input.sample();
            if frame.quit {
                break;
            }

            let mut commands = Vec::new();
            if frame.confirm {
                commands.extend(match self.session.state() {
                    ClientState::MainMenu => self.session.connect(&self.server),
                    ClientState::Ready => self.session.acknowledge_ready(),
                    ClientState::Ended { .. } => self.session.acknowledge_end(),
                    _ => Vec::new(),
                });
            }
            self.execute(commands);

            self.pump_network();

            let commands = self.session.update(dt, frame.paddle);
            self.execute(commands);

            if self.last_ping.elapsed() >= PING_INTERVAL {
                self.last_ping = Instant::now();
                if let Some(command) = self.session.ping_request() {
                    self.execute(vec![command]);
                }
            }

            self.renderer.render_session(&self.session, &self.server);
            next_frame().await;
        }

        if let Some(connection) = self.connection.take() {
            connection.send(shared::Message::Unregister);
            // Waits for the writer to flush and the server to hang up.
            connection.close();
        }
        info!("Client exiting");
    }

    fn pump_network(&mut self) {
        let events = match &self.connection {
            Some(connection) => connection.poll(),
            None => return,
        };

        for event in events {
            match event {
                NetworkEvent::Connected => debug!("Transport connected"),
                NetworkEvent::Message(message) => {
                    let commands = self.session.handle_message(message);
                    self.execute(commands);
                }
                NetworkEvent::Disconnected(reason) => {
                    self.connection = None;
                    self.session.on_connection_lost(&reason);
                    break;
                }
            }
        }
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Connect(address) => {
                    self.connection = Some(Connection::open(&address));
                }
                Command::Send(message) => match &self.connection {
                    Some(connection) => {
                        if !connection.send(message) {
                            warn!("Connection closed, message dropped");
                        }
                    }
                    None => debug!("No connection for {:?}", message.id()),
                },
                Command::Disconnect => {
                    // Dropping the sender closes the write half; the
                    // background thread exits once the server hangs up.
                    self.connection = None;
                }
                Command::PlaySound => debug!("Pad hit"),
            }
        }
    }
}

/// Single-player Breakout against the shared local simulation.
pub async fn run_offline(width: usize, height: usize) {
    let mut game = LocalGame::new(
        Viewport::new(width as f32, height as f32),
        standard_tiles(),
    );
    let mut input = InputManager::new();
    let mut renderer = Renderer::new(width, height);
    let mut rng = rand::thread_rng();

    loop {
        let dt = get_frame_time();
        let frame = input.sample();
        if frame.quit {
            break;
        }

        game.process_input(frame.paddle, dt);
        for event in game.update(dt, &mut rng) {
            match event {
                LocalEvent::GameOver => info!("Game over, starting again"),
                LocalEvent::LevelCompleted => info!("Level completed"),
                LocalEvent::BallLost { lives_left } => {
                    info!("Ball lost, {} lives left", lives_left)
                }
                other => debug!("{:?}", other),
            }
        }

        renderer.render_local(&game);
        next_frame().await;
    }
}
