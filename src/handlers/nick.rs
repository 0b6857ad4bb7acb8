use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};
use crate::util;

use super::{complete_registration, reply_to};

pub fn handle_nick(
    server_context: &ServerContext,
    connection_id: Uuid,
    params: &[String],
    connections: &mut HashMap<Uuid, ConnectionContext>,
) -> Option<ReplyMap> {
    let server_host = server_context.server_host.clone();
    let nick = connections.get(&connection_id)?.nick_or_star().to_string();

    let Some(new_nick) = params.first() else {
        return Some(reply_to(
            connection_id,
            Reply::ErrNoNicknameGiven { server_host, nick },
        ));
    };

    if !util::is_valid_nickname(new_nick) {
        return Some(reply_to(
            connection_id,
            Reply::ErrErroneousNickname {
                server_host,
                nick,
                new_nick: new_nick.clone(),
            },
        ));
    }

    // Uniqueness across every connected client, checked before any mutation.
    // Re-claiming one's own nickname is allowed.
    let in_use = connections.values().any(|other| {
        other.connection_id != connection_id && other.nick.as_deref() == Some(new_nick.as_str())
    });
    if in_use {
        return Some(reply_to(
            connection_id,
            Reply::ErrNicknameInUse {
                server_host,
                nick,
                new_nick: new_nick.clone(),
            },
        ));
    }

    let (was_registered, client) = {
        let conn_context = connections.get_mut(&connection_id)?;
        let was_registered = conn_context.registered;
        conn_context.nick = Some(new_nick.clone());
        (was_registered, conn_context.prefix())
    };

    if was_registered {
        // A rename is announced to every other registered client.
        let mut map: ReplyMap = HashMap::new();
        for other in connections.values() {
            if other.connection_id == connection_id || !other.registered {
                continue;
            }

            map.entry(other.connection_id).or_default().push(Reply::Nick {
                client: client.clone(),
                new_nick: new_nick.clone(),
            });
        }

        return if map.is_empty() { None } else { Some(map) };
    }

    let conn_context = connections.get_mut(&connection_id)?;
    let replies = complete_registration(server_context, conn_context)?;
    let mut map = HashMap::new();
    map.insert(connection_id, replies);
    Some(map)
}
