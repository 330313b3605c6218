use anyhow::{Context, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Single-byte override understood by the controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCommand {
    /// Fake daylight and open the door.
    Up,
    /// Fake night and close the door.
    Down,
}

impl DoorCommand {
    pub fn as_byte(self) -> u8 {
        match self {
            DoorCommand::Up => b'U',
            DoorCommand::Down => b'D',
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "U" | "u" | "up" => Some(DoorCommand::Up),
            "D" | "d" | "down" => Some(DoorCommand::Down),
            _ => None,
        }
    }
}

/// Write the command byte verbatim. Fire and forget: the controller only
/// acknowledges with a free-text message on its telemetry stream.
pub async fn send_command<W>(writer: &mut W, command: DoorCommand) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(&[command.as_byte()])
        .await
        .with_context(|| format!("failed to send {command:?}"))?;
    writer.flush().await.context("failed to flush command")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_writes_one_byte() {
        let mut out: Vec<u8> = Vec::new();
        send_command(&mut out, DoorCommand::Up).await.unwrap();
        send_command(&mut out, DoorCommand::Down).await.unwrap();
        assert_eq!(out, b"UD");
    }

    #[test]
    fn test_parse() {
        assert_eq!(DoorCommand::parse("up"), Some(DoorCommand::Up));
        assert_eq!(DoorCommand::parse("D\n"), Some(DoorCommand::Down));
        assert_eq!(DoorCommand::parse("x"), None);
    }
}
