use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};

use chrono::Utc;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::{info, warn};
use uuid::Uuid;

use crate::client_listener;
use crate::client_sender;
use crate::context::ServerContext;
use crate::error::Error;
use crate::events::{Event, ReplySender};
use crate::message_handler;
use crate::result::Result;
use crate::settings::Settings;

pub const SERVER_NAME: &str = "ircserv.local";

const EVENT_QUEUE_CAPACITY: usize = 512;
const REPLY_QUEUE_CAPACITY: usize = 512;
const LISTEN_BACKLOG: u32 = 10;

/// Binds the listener and runs the two long-lived halves of the server: the
/// accept loop feeding connections in, and the message handler owning all
/// state. Returns when shutdown is requested or the listener dies.
pub async fn run(settings: &Settings, shutdown_receiver: Receiver<()>) -> Result<()> {
    let server_context = ServerContext {
        start_time: Utc::now(),
        server_host: SERVER_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        password: settings.password.clone(),
    };

    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.port));
    let listener = bind(address).map_err(|source| Error::Bind {
        port: settings.port,
        source,
    })?;
    info!(%address, "listening");

    let (event_sender, mut event_receiver) = mpsc::channel(EVENT_QUEUE_CAPACITY);

    tokio::select! {
        result = accept_loop(listener, event_sender) => result,
        result = message_handler::run(&server_context, &mut event_receiver, shutdown_receiver) => result,
    }
}

async fn accept_loop(listener: TcpListener, event_sender: Sender<Event>) -> Result<()> {
    loop {
        let (stream, address) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) if is_transient(&e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
            Err(e) => return Err(Error::Listener(e)),
        };

        let connection_id = Uuid::new_v4();
        let host = address.ip().to_string();
        let (reply_sender, reply_receiver) = mpsc::channel(REPLY_QUEUE_CAPACITY);
        let (read_half, write_half) = stream.into_split();

        let connected = Event::connected(connection_id, ReplySender(reply_sender), host);
        if event_sender.send(connected).await.is_err() {
            // The message handler is shutting down.
            return Ok(());
        }

        let listener_task = tokio::spawn(client_listener::run_listener(
            connection_id,
            read_half,
            event_sender.clone(),
        ));

        // The writer lives until the handler drops this connection's reply
        // sender or the peer stops accepting writes. Whichever it was, the
        // reader has nothing left to feed, so it is stopped and the handler
        // told (a second disconnect for the same id is simply dropped).
        let supervisor_sender = event_sender.clone();
        tokio::spawn(async move {
            client_sender::run_sender(reply_receiver, write_half).await;
            listener_task.abort();
            let _ = supervisor_sender
                .send(Event::disconnected(connection_id))
                .await;
        });
    }
}

fn bind(address: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(address)?;
    socket.listen(LISTEN_BACKLOG)
}

fn is_transient(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
            | ErrorKind::Interrupted
            | ErrorKind::WouldBlock
    )
}
