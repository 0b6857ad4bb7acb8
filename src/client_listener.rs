use std::io::ErrorKind;

use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc::Sender;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::Event;
use crate::message_parsing::parse_message;

/// RFC 1459 caps a message at 512 bytes including its terminator. A larger
/// residue with no terminator in sight means the peer is flooding, and the
/// connection is dropped without a reply.
pub const MAX_RESIDUAL_BYTES: usize = 512;

/// Reassembles an arbitrary byte stream into whole IRC lines.
///
/// A line ends at the first LF; an immediately preceding CR belongs to the
/// terminator and is stripped. Doing it this way splits CRLF- and bare-LF-
/// terminated lines correctly in whatever order they arrive in one read.
pub struct LineBuffer {
    data: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer { data: Vec::new() }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Pops the next complete line, without its terminator. Empty lines are
    /// yielded as empty strings and dropped by the caller.
    pub fn take_line(&mut self) -> Option<String> {
        let newline = self.data.iter().position(|&byte| byte == b'\n')?;
        let mut line: Vec<u8> = self.data.drain(..=newline).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// True once the residual (terminator-less) bytes exceed the flood cap.
    pub fn is_overflowing(&self) -> bool {
        self.data.len() > MAX_RESIDUAL_BYTES
    }
}

/// Read half of one connection: drains the socket into the reassembler and
/// forwards every parsed line to the message handler. Ends on EOF, a read
/// error, or a flooding peer — each of which is announced as a disconnect.
pub async fn run_listener(
    connection_id: Uuid,
    mut read_half: OwnedReadHalf,
    event_sender: Sender<Event>,
) {
    let mut buffer = LineBuffer::new();
    let mut read_buf = [0u8; 512];

    loop {
        let bytes_read = match read_half.read(&mut read_buf).await {
            Ok(0) => break,
            Ok(bytes_read) => bytes_read,
            Err(e) if e.kind() == ErrorKind::Interrupted || e.kind() == ErrorKind::WouldBlock => {
                continue;
            }
            Err(e) => {
                debug!(%connection_id, error = %e, "read failed");
                break;
            }
        };

        buffer.append(&read_buf[..bytes_read]);

        while let Some(line) = buffer.take_line() {
            if line.is_empty() {
                continue;
            }

            let message = parse_message(&line);
            if message.command.is_empty() {
                continue;
            }

            if event_sender
                .send(Event::message(connection_id, message))
                .await
                .is_err()
            {
                // The message handler is gone; nothing left to read for.
                return;
            }
        }

        if buffer.is_overflowing() {
            warn!(%connection_id, "input buffer exceeded {MAX_RESIDUAL_BYTES} bytes without a terminator");
            break;
        }
    }

    let _ = event_sender.send(Event::disconnected(connection_id)).await;
}

#[test]
fn take_line_crlfterminated_returnscontent() {
    let mut buffer = LineBuffer::new();
    buffer.append(b"NICK bob\r\n");
    assert_eq!(Some("NICK bob".to_string()), buffer.take_line());
    assert_eq!(None, buffer.take_line());
}

#[test]
fn take_line_barelfterminated_returnscontent() {
    let mut buffer = LineBuffer::new();
    buffer.append(b"NICK bob\n");
    assert_eq!(Some("NICK bob".to_string()), buffer.take_line());
}

#[test]
fn take_line_mixedterminators_splitsboth() {
    let mut buffer = LineBuffer::new();
    buffer.append(b"NICK bob\nUSER bob 0 * :Bob\r\n");
    assert_eq!(Some("NICK bob".to_string()), buffer.take_line());
    assert_eq!(Some("USER bob 0 * :Bob".to_string()), buffer.take_line());
    assert_eq!(None, buffer.take_line());
}

#[test]
fn take_line_crlfbeforebarelf_splitsboth() {
    let mut buffer = LineBuffer::new();
    buffer.append(b"PASS secret\r\nQUIT\n");
    assert_eq!(Some("PASS secret".to_string()), buffer.take_line());
    assert_eq!(Some("QUIT".to_string()), buffer.take_line());
}

#[test]
fn take_line_partialline_waitsformore() {
    let mut buffer = LineBuffer::new();
    buffer.append(b"NICK bo");
    assert_eq!(None, buffer.take_line());

    buffer.append(b"b\r\n");
    assert_eq!(Some("NICK bob".to_string()), buffer.take_line());
}

#[test]
fn take_line_emptyline_yieldsemptystring() {
    let mut buffer = LineBuffer::new();
    buffer.append(b"\r\n\r\nNICK bob\r\n");
    assert_eq!(Some(String::new()), buffer.take_line());
    assert_eq!(Some(String::new()), buffer.take_line());
    assert_eq!(Some("NICK bob".to_string()), buffer.take_line());
}

#[test]
fn take_line_maximumlengthline_isprocessed() {
    // 510 content bytes plus CRLF is exactly the RFC 1459 limit.
    let content = "a".repeat(510);
    let mut buffer = LineBuffer::new();
    buffer.append(content.as_bytes());
    buffer.append(b"\r\n");
    assert_eq!(Some(content), buffer.take_line());
    assert!(!buffer.is_overflowing());
}

#[test]
fn is_overflowing_atcap_isfalse() {
    let mut buffer = LineBuffer::new();
    buffer.append(&[b'a'; 512]);
    assert!(!buffer.is_overflowing());
}

#[test]
fn is_overflowing_overcap_istrue() {
    let mut buffer = LineBuffer::new();
    buffer.append(&[b'a'; 513]);
    assert_eq!(None, buffer.take_line());
    assert!(buffer.is_overflowing());
}

#[test]
fn is_overflowing_aftertakinglines_onlycountsresidue() {
    let mut buffer = LineBuffer::new();
    buffer.append("a".repeat(500).as_bytes());
    buffer.append(b"\r\n");
    buffer.append(&[b'b'; 100]);
    while buffer.take_line().is_some() {}
    assert!(!buffer.is_overflowing());
}
