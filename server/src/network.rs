//! Server network layer handling TCP connections and game loop coordination

use crate::match_state::{MatchState, Outbound};
use log::{debug, error, info, warn};
use shared::protocol::{read_message, write_message};
use shared::Message;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// Upper bound of events handled per wake-up before the tick gets a turn
pub const MAX_EVENTS_PER_WAKE: usize = 64;
/// Longest simulation step, so a stalled loop cannot tunnel the ball
pub const MAX_STEP: f32 = 0.05;

pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Events sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerEvent {
    Connected {
        connection_id: u32,
        outbound: mpsc::UnboundedSender<Message>,
    },
    Message {
        connection_id: u32,
        message: Message,
    },
    Disconnected {
        connection_id: u32,
    },
    Shutdown,
}

/// Cloneable handle for stopping a running server
#[derive(Clone)]
pub struct ServerHandle {
    events: mpsc::UnboundedSender<ServerEvent>,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        if let Err(e) = self.events.send(ServerEvent::Shutdown) {
            debug!("Server already stopped: {}", e);
        }
    }
}

/// Main server owning the match and every connection's outbound queue
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    tick_duration: Duration,
    match_state: MatchState,
    connections: HashMap<u32, mpsc::UnboundedSender<Message>>,

    // Many connection tasks produce, the main loop consumes
    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn new(addr: &str, tick_duration: Duration) -> ServerResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            tick_duration,
            match_state: MatchState::new(),
            connections: HashMap::new(),
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            events: self.event_tx.clone(),
        }
    }

    /// Spawns task that accepts connections and starts their reader and writer
    fn spawn_acceptor(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let events = self.event_tx.clone();

        tokio::spawn(async move {
            let mut next_connection_id: u32 = 1;

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let connection_id = next_connection_id;
                        next_connection_id = next_connection_id.wrapping_add(1);
                        info!("Connection {} opened from {}", connection_id, addr);

                        if !spawn_connection(connection_id, stream, &events) {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Queues each outbound message on every connection its target includes
    fn dispatch(&self, outbound: Vec<Outbound>) {
        for Outbound { target, message } in outbound {
            for (connection_id, sender) in &self.connections {
                if !target.includes(*connection_id) {
                    continue;
                }
                if let Err(e) = sender.send(message.clone()) {
                    debug!("Connection {} is closing: {}", connection_id, e);
                }
            }
        }
    }

    /// Applies one event; returns false when the loop should stop
    fn handle_event(&mut self, event: ServerEvent) -> bool {
        match event {
            ServerEvent::Connected {
                connection_id,
                outbound,
            } => {
                self.connections.insert(connection_id, outbound);
                let replies = self.match_state.on_connect(connection_id);
                self.dispatch(replies);
            }
            ServerEvent::Message {
                connection_id,
                message,
            } => {
                let replies = self.match_state.handle_message(connection_id, message);
                self.dispatch(replies);
            }
            ServerEvent::Disconnected { connection_id } => {
                info!("Connection {} closed", connection_id);
                self.connections.remove(&connection_id);
                self.match_state.on_disconnect(connection_id);
            }
            ServerEvent::Shutdown => {
                info!("Server shutting down");
                return false;
            }
        }
        true
    }

    /// Runs one simulation tick: removals, physics, state broadcast
    fn tick(&mut self, dt: f32) {
        let removals = self.match_state.flush_removals();
        self.dispatch(removals);

        self.match_state.step(dt);

        let state = self.match_state.broadcast_game_state();
        self.dispatch(state);

        if self.match_state.tick() % 600 == 0 && !self.connections.is_empty() {
            debug!(
                "Tick {}: {} connections, {} players, {:?}",
                self.match_state.tick(),
                self.connections.len(),
                self.match_state.roster().len(),
                self.match_state.phase()
            );
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> ServerResult<()> {
        self.spawn_acceptor();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    if !self.handle_event(event) {
                        break;
                    }

                    // Drain a bounded batch so a flood cannot starve the tick
                    let mut handled = 1;
                    while handled < MAX_EVENTS_PER_WAKE {
                        let Ok(event) = self.event_rx.try_recv() else {
                            break;
                        };
                        if !self.handle_event(event) {
                            return Ok(());
                        }
                        handled += 1;
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32().min(MAX_STEP);
                    last_tick = now;

                    self.tick(dt);
                },
            }
        }

        Ok(())
    }
}

/// Registers a connection with the main loop and starts its tasks.
///
/// Returns false once the main loop is gone.
fn spawn_connection(
    connection_id: u32,
    stream: TcpStream,
    events: &mpsc::UnboundedSender<ServerEvent>,
) -> bool {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY on connection {}: {}", connection_id, e);
    }
    let (reader, writer) = stream.into_split();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let connected = ServerEvent::Connected {
        connection_id,
        outbound: outbound_tx,
    };
    if let Err(e) = events.send(connected) {
        error!("Failed to register connection with main loop: {}", e);
        return false;
    }

    tokio::spawn(write_loop(connection_id, writer, outbound_rx));
    tokio::spawn(read_loop(connection_id, reader, events.clone()));
    true
}

async fn read_loop(
    connection_id: u32,
    mut reader: OwnedReadHalf,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    loop {
        match read_message(&mut reader).await {
            Ok(Some(message)) => {
                let event = ServerEvent::Message {
                    connection_id,
                    message,
                };
                if events.send(event).is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) if e.is_recoverable() => {
                warn!("Dropping frame from connection {}: {}", connection_id, e);
            }
            Err(e) => {
                warn!("Connection {} failed: {}", connection_id, e);
                break;
            }
        }
    }

    if let Err(e) = events.send(ServerEvent::Disconnected { connection_id }) {
        debug!("Main loop gone before disconnect of {}: {}", connection_id, e);
    }
}

async fn write_loop(
    connection_id: u32,
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = outbound.recv().await {
        if let Err(e) = write_message(&mut writer, &message).await {
            warn!("Failed to send to connection {}: {}", connection_id, e);
            break;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of connection {} failed: {}", connection_id, e);
    }
}
