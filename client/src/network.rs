//! Background TCP connection for the frame loop
//!
//! The macroquad frame loop can't await sockets, so each connection runs a
//! current-thread tokio runtime on its own OS thread. Decoded messages come
//! back through a std channel that the frame loop drains once per frame.

use log::{debug, info, warn};
use shared::protocol::{read_message, write_message};
use shared::Message;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

type ConnectionResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    Connected,
    Message(Message),
    /// Terminal; nothing follows on this connection.
    Disconnected(String),
}

pub struct Connection {
    outbound: UnboundedSender<Message>,
    inbound: Receiver<NetworkEvent>,
    thread: Option<JoinHandle<()>>,
}

impl Connection {
    /// Starts connecting in the background. Failures arrive as
    /// `NetworkEvent::Disconnected`.
    pub fn open(address: &str) -> Self {
        let (outbound, outbound_rx) = unbounded_channel();
        let (inbound_tx, inbound) = mpsc::channel();
        let address = address.to_string();

        let thread = thread::Builder::new()
            .name("connection".to_string())
            .spawn(move || run_connection(address, outbound_rx, inbound_tx));

        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to start connection thread: {}", e);
                None
            }
        };

        Self {
            outbound,
            inbound,
            thread,
        }
    }

    /// Queues a message for the writer task; false once the connection is gone.
    pub fn send(&self, message: Message) -> bool {
        self.outbound.send(message).is_ok()
    }

    /// Drains every event that arrived since the last call.
    pub fn poll(&self) -> Vec<NetworkEvent> {
        let mut events = Vec::new();
        loop {
            match self.inbound.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.thread.is_none() {
                        events.push(NetworkEvent::Disconnected(
                            "connection thread unavailable".to_string(),
                        ));
                    }
                    break;
                }
            }
        }
        events
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<NetworkEvent> {
        match self.inbound.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Closes the write side and waits for the server to hang up.
    pub fn close(self) {
        let Connection {
            outbound,
            inbound,
            thread,
        } = self;
        drop(outbound);
        if let Some(handle) = thread {
            if handle.join().is_err() {
                warn!("Connection thread panicked");
            }
        }
        // Kept open until the join so the reader never sees a closed queue.
        drop(inbound);
    }
}

fn run_connection(
    address: String,
    outbound_rx: UnboundedReceiver<Message>,
    inbound_tx: Sender<NetworkEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            if inbound_tx.send(NetworkEvent::Disconnected(e.to_string())).is_err() {
                debug!("Frame loop already gone");
            }
            return;
        }
    };

    runtime.block_on(async move {
        let reason = match connection_loop(&address, outbound_rx, &inbound_tx).await {
            Ok(()) => "connection closed by server".to_string(),
            Err(e) => e.to_string(),
        };
        info!("Disconnected from {}: {}", address, reason);
        if inbound_tx.send(NetworkEvent::Disconnected(reason)).is_err() {
            debug!("Frame loop already gone");
        }
    });
}

async fn connection_loop(
    address: &str,
    mut outbound_rx: UnboundedReceiver<Message>,
    inbound_tx: &Sender<NetworkEvent>,
) -> ConnectionResult<()> {
    let stream = TcpStream::connect(address).await?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", address);

    let (mut reader, mut writer) = stream.into_split();
    inbound_tx.send(NetworkEvent::Connected)?;

    tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if let Err(e) = write_message(&mut writer, &message).await {
                warn!("Failed to send {:?}: {}", message.id(), e);
                break;
            }
        }
        if let Err(e) = writer.shutdown().await {
            debug!("Shutdown of write half failed: {}", e);
        }
    });

    loop {
        match read_message(&mut reader).await {
            Ok(Some(message)) => {
                if inbound_tx.send(NetworkEvent::Message(message)).is_err() {
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            Err(e) if e.is_recoverable() => warn!("Skipping bad frame: {}", e),
            Err(e) => return Err(e.into()),
        }
    }
}
