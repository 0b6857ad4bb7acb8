use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::message_parsing::IrcMessage;
use crate::replies::Reply;

/// Handle for queueing replies onto one connection's writer task. Dropping
/// the last clone is what ultimately closes the client socket.
#[derive(Debug, Clone)]
pub struct ReplySender(pub mpsc::Sender<Reply>);

/// Everything the message handler ever learns arrives as one of these,
/// serialized through a single queue.
#[derive(Debug)]
pub struct Event {
    pub connection_id: Uuid,
    pub kind: EventKind,
}

#[derive(Debug)]
pub enum EventKind {
    /// A connection was accepted; `sender` is its outbound queue.
    Connected { sender: ReplySender, host: String },
    /// One complete, parsed line from the connection.
    Message(IrcMessage),
    /// EOF, a read error, or an input-buffer overflow ended the connection.
    Disconnected,
}

impl Event {
    pub fn connected(connection_id: Uuid, sender: ReplySender, host: String) -> Self {
        Event {
            connection_id,
            kind: EventKind::Connected { sender, host },
        }
    }

    pub fn message(connection_id: Uuid, message: IrcMessage) -> Self {
        Event {
            connection_id,
            kind: EventKind::Message(message),
        }
    }

    pub fn disconnected(connection_id: Uuid) -> Self {
        Event {
            connection_id,
            kind: EventKind::Disconnected,
        }
    }
}

/// Seam over the event queue so tests can drive the message handler with a
/// canned sequence instead of a live channel.
#[async_trait]
pub trait ReceiverWrapper<T> {
    async fn receive(&mut self) -> Option<T>;
}

#[async_trait]
impl<T> ReceiverWrapper<T> for mpsc::Receiver<T>
where
    T: Send,
{
    async fn receive(&mut self) -> Option<T> {
        self.recv().await
    }
}

#[cfg(test)]
pub struct FakeEventReceiver<T>
where
    T: Send + Sync,
{
    pub faked_events: std::collections::VecDeque<T>,
    pub receive_count: usize,
}

#[cfg(test)]
#[async_trait]
impl<T> ReceiverWrapper<T> for FakeEventReceiver<T>
where
    T: Send + Sync,
{
    async fn receive(&mut self) -> Option<T> {
        self.receive_count += 1;
        self.faked_events.pop_front()
    }
}
