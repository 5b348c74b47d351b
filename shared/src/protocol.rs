//! Message protocol spoken between server and clients.
//!
//! Every message travels as a frame: a little-endian `u32` message id, a
//! little-endian `u32` body length and a bincode encoded body. Messages without
//! a payload have an empty body. A reader that meets an id it does not know
//! skips the body, so the stream stays aligned for the next frame.

use crate::entity::{BallDesc, PlayerDesc, Slot, Viewport};
use crate::math::Vec2;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const HEADER_LEN: usize = 8;
pub const MAX_BODY_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unknown message id {0}")]
    UnknownMessageId(u32),
    #[error("frame body of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),
    #[error("payload codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    /// Whether the connection can keep reading after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnknownMessageId(_) | ProtocolError::Codec(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageId {
    ServerPing = 0,
    ServerFull = 1,
    ClientAccepted = 2,
    AssignId = 3,
    Register = 4,
    Unregister = 5,
    AddPlayer = 6,
    RemovePlayer = 7,
    UpdatePlayer = 8,
    LaunchBall = 9,
    PlayerReady = 10,
    ReduceLives = 11,
    GameActive = 12,
    GameEnds = 13,
    PlayPadSound = 14,
    AddBall = 15,
    UpdateBall = 16,
}

impl TryFrom<u32> for MessageId {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        let id = match value {
            0 => MessageId::ServerPing,
            1 => MessageId::ServerFull,
            2 => MessageId::ClientAccepted,
            3 => MessageId::AssignId,
            4 => MessageId::Register,
            5 => MessageId::Unregister,
            6 => MessageId::AddPlayer,
            7 => MessageId::RemovePlayer,
            8 => MessageId::UpdatePlayer,
            9 => MessageId::LaunchBall,
            10 => MessageId::PlayerReady,
            11 => MessageId::ReduceLives,
            12 => MessageId::GameActive,
            13 => MessageId::GameEnds,
            14 => MessageId::PlayPadSound,
            15 => MessageId::AddBall,
            16 => MessageId::UpdateBall,
            other => return Err(ProtocolError::UnknownMessageId(other)),
        };
        Ok(id)
    }
}

/// What a client asks for when it registers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub position: Vec2,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Round-trip timing request, echoed back unchanged by the server.
    ServerPing { timestamp: u64 },
    ServerFull,
    ClientAccepted,
    AssignId(u32),
    Register(RegisterRequest),
    Unregister,
    AddPlayer(PlayerDesc),
    RemovePlayer(u32),
    UpdatePlayer(PlayerDesc),
    LaunchBall,
    PlayerReady,
    /// Carries the player with lives already decremented.
    ReduceLives(PlayerDesc),
    GameActive,
    GameEnds { winner: Slot },
    PlayPadSound,
    AddBall(BallDesc),
    UpdateBall(BallDesc),
}

impl Message {
    pub fn id(&self) -> MessageId {
        match self {
            Message::ServerPing { .. } => MessageId::ServerPing,
            Message::ServerFull => MessageId::ServerFull,
            Message::ClientAccepted => MessageId::ClientAccepted,
            Message::AssignId(_) => MessageId::AssignId,
            Message::Register(_) => MessageId::Register,
            Message::Unregister => MessageId::Unregister,
            Message::AddPlayer(_) => MessageId::AddPlayer,
            Message::RemovePlayer(_) => MessageId::RemovePlayer,
            Message::UpdatePlayer(_) => MessageId::UpdatePlayer,
            Message::LaunchBall => MessageId::LaunchBall,
            Message::PlayerReady => MessageId::PlayerReady,
            Message::ReduceLives(_) => MessageId::ReduceLives,
            Message::GameActive => MessageId::GameActive,
            Message::GameEnds { .. } => MessageId::GameEnds,
            Message::PlayPadSound => MessageId::PlayPadSound,
            Message::AddBall(_) => MessageId::AddBall,
            Message::UpdateBall(_) => MessageId::UpdateBall,
        }
    }

    fn encode_body(&self) -> Result<Vec<u8>, ProtocolError> {
        let body = match self {
            Message::ServerPing { timestamp } => bincode::serialize(timestamp)?,
            Message::AssignId(id) | Message::RemovePlayer(id) => bincode::serialize(id)?,
            Message::Register(request) => bincode::serialize(request)?,
            Message::AddPlayer(desc) | Message::UpdatePlayer(desc) | Message::ReduceLives(desc) => {
                bincode::serialize(desc)?
            }
            Message::GameEnds { winner } => bincode::serialize(winner)?,
            Message::AddBall(desc) | Message::UpdateBall(desc) => bincode::serialize(desc)?,
            Message::ServerFull
            | Message::ClientAccepted
            | Message::Unregister
            | Message::LaunchBall
            | Message::PlayerReady
            | Message::GameActive
            | Message::PlayPadSound => Vec::new(),
        };
        Ok(body)
    }

    /// Serializes the message into a complete frame, header included.
    pub fn encode_frame(&self) -> Result<Vec<u8>, ProtocolError> {
        let body = self.encode_body()?;
        if body.len() > MAX_BODY_SIZE {
            return Err(ProtocolError::FrameTooLarge(body.len()));
        }

        let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
        frame.extend_from_slice(&(self.id() as u32).to_le_bytes());
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    pub fn decode(id: u32, body: &[u8]) -> Result<Message, ProtocolError> {
        let message = match MessageId::try_from(id)? {
            MessageId::ServerPing => Message::ServerPing {
                timestamp: bincode::deserialize(body)?,
            },
            MessageId::ServerFull => Message::ServerFull,
            MessageId::ClientAccepted => Message::ClientAccepted,
            MessageId::AssignId => Message::AssignId(bincode::deserialize(body)?),
            MessageId::Register => Message::Register(bincode::deserialize(body)?),
            MessageId::Unregister => Message::Unregister,
            MessageId::AddPlayer => Message::AddPlayer(bincode::deserialize(body)?),
            MessageId::RemovePlayer => Message::RemovePlayer(bincode::deserialize(body)?),
            MessageId::UpdatePlayer => Message::UpdatePlayer(bincode::deserialize(body)?),
            MessageId::LaunchBall => Message::LaunchBall,
            MessageId::PlayerReady => Message::PlayerReady,
            MessageId::ReduceLives => Message::ReduceLives(bincode::deserialize(body)?),
            MessageId::GameActive => Message::GameActive,
            MessageId::GameEnds => Message::GameEnds {
                winner: bincode::deserialize(body)?,
            },
            MessageId::PlayPadSound => Message::PlayPadSound,
            MessageId::AddBall => Message::AddBall(bincode::deserialize(body)?),
            MessageId::UpdateBall => Message::UpdateBall(bincode::deserialize(body)?),
        };
        Ok(message)
    }
}

/// Reads one frame.
///
/// Returns `Ok(None)` when the stream ends cleanly between frames. Unknown ids
/// and undecodable bodies are reported after the whole frame was consumed, so
/// the caller may keep reading.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Message>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let id = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len > MAX_BODY_SIZE {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;

    Message::decode(id, &body).map(Some)
}

pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let frame = message.encode_frame()?;
    writer.write_all(&frame).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    fn player() -> PlayerDesc {
        let mut desc = PlayerDesc::new(4, Vec2::new(350.0, 580.0), Viewport::default());
        desc.slot = Slot::One;
        desc
    }

    fn raw_frame(id: u32, body: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&id.to_le_bytes());
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(body);
        frame
    }

    #[test]
    fn test_header_layout() {
        let frame = Message::AssignId(7).encode_frame().unwrap();
        assert_eq!(&frame[0..4], &3u32.to_le_bytes());
        assert_eq!(&frame[4..8], &4u32.to_le_bytes());
        assert_eq!(&frame[8..], &7u32.to_le_bytes());
    }

    #[test]
    fn test_unit_messages_have_empty_body() {
        for message in [Message::ServerFull, Message::LaunchBall, Message::GameActive] {
            let frame = message.encode_frame().unwrap();
            assert_eq!(frame.len(), HEADER_LEN);
        }
    }

    #[test]
    fn test_message_ids_are_stable() {
        let request = RegisterRequest {
            position: Vec2::ZERO,
            viewport: Viewport::default(),
        };
        let ball = crate::entity::Ball::new(Vec2::ZERO, 1.0, Vec2::ZERO);

        assert_eq!(Message::ServerPing { timestamp: 1 }.id() as u32, 0);
        assert_eq!(Message::Register(request).id() as u32, 4);
        assert_eq!(Message::UpdateBall(ball.desc()).id() as u32, 16);
        assert!(matches!(
            MessageId::try_from(17),
            Err(ProtocolError::UnknownMessageId(17))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let err = Message::decode(MessageId::AddPlayer as u32, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, ProtocolError::Codec(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_read_message() {
        let frame = Message::AddPlayer(player()).encode_frame().unwrap();
        let mut mock = Builder::new().read(&frame).build();

        let message = read_message(&mut mock).await.unwrap();
        assert_eq!(message, Some(Message::AddPlayer(player())));
    }

    #[tokio::test]
    async fn test_read_message_split_across_reads() {
        let frame = Message::GameEnds { winner: Slot::Two }.encode_frame().unwrap();
        let mut mock = Builder::new()
            .read(&frame[..3])
            .read(&frame[3..9])
            .read(&frame[9..])
            .build();

        let message = read_message(&mut mock).await.unwrap();
        assert_eq!(message, Some(Message::GameEnds { winner: Slot::Two }));
    }

    #[tokio::test]
    async fn test_clean_eof_returns_none() {
        let mut mock = Builder::new().build();
        assert!(read_message(&mut mock).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_truncated_body_is_an_error() {
        let frame = Message::AssignId(9).encode_frame().unwrap();
        let mut mock = Builder::new().read(&frame[..10]).build();

        let err = read_message(&mut mock).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_unknown_id_is_skipped() {
        let mut bytes = raw_frame(99, &[1, 2, 3, 4, 5]);
        bytes.extend(Message::PlayerReady.encode_frame().unwrap());
        let mut mock = Builder::new().read(&bytes).build();

        let err = read_message(&mut mock).await.unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMessageId(99)));
        assert!(err.is_recoverable());

        let next = read_message(&mut mock).await.unwrap();
        assert_eq!(next, Some(Message::PlayerReady));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let mut header = Vec::new();
        header.extend_from_slice(&(MessageId::UpdateBall as u32).to_le_bytes());
        header.extend_from_slice(&((MAX_BODY_SIZE + 1) as u32).to_le_bytes());
        let mut mock = Builder::new().read(&header).build();

        let err = read_message(&mut mock).await.unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_write_message() {
        let message = Message::RemovePlayer(12);
        let expected = message.encode_frame().unwrap();
        let mut mock = Builder::new().write(&expected).build();

        write_message(&mut mock, &message).await.unwrap();
    }
}
