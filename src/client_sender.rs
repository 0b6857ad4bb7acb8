use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::Receiver;
use tracing::trace;

use crate::replies::Reply;

/// Write half of one connection: serializes queued replies with CRLF until
/// the message handler drops the sending side or the peer stops accepting
/// writes, then shuts the socket down.
pub async fn run_sender(mut receiver: Receiver<Reply>, mut write_half: OwnedWriteHalf) {
    while let Some(reply) = receiver.recv().await {
        let mut line = reply.to_string();
        trace!(%line, "sending");
        line.push_str("\r\n");

        if write_half.write_all(line.as_bytes()).await.is_err() {
            break;
        }
    }

    let _ = write_half.shutdown().await;
}
