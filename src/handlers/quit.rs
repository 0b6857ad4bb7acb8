use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use crate::context::{ChannelContext, ConnectionContext};
use crate::replies::{Reply, ReplyMap};

/// QUIT carries an optional reason, but departure is announced with the
/// canned one either way; the command only triggers the removal path.
pub fn handle_quit(
    connection_id: Uuid,
    connections: &mut HashMap<Uuid, ConnectionContext>,
    channels: &mut HashMap<String, ChannelContext>,
) -> Option<ReplyMap> {
    remove_client(connection_id, connections, channels)
}

/// Convergence point for every disconnect: QUIT, EOF, read errors and
/// input-buffer overflow all end here. Channel members learn of the
/// departure (when the client was registered), memberships are dropped,
/// channels left empty are deleted, and the client record is released.
/// The caller drops the reply sender, which closes the socket.
pub fn remove_client(
    connection_id: Uuid,
    connections: &mut HashMap<Uuid, ConnectionContext>,
    channels: &mut HashMap<String, ChannelContext>,
) -> Option<ReplyMap> {
    let conn_context = connections.remove(&connection_id)?;
    info!(%connection_id, nick = conn_context.nick_or_star(), "client disconnected");

    let quit = Reply::Quit {
        client: conn_context.prefix(),
        reason: "Client disconnected".to_string(),
    };

    let mut map: ReplyMap = HashMap::new();
    channels.retain(|_, channel| {
        if !channel.is_member(connection_id) {
            return true;
        }

        if conn_context.registered {
            for member in &channel.members {
                if *member != connection_id {
                    map.entry(*member).or_default().push(quit.clone());
                }
            }
        }

        channel.remove_member(connection_id);
        !channel.members.is_empty()
    });

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}
