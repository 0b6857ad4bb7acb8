pub mod invite;
pub mod join;
pub mod kick;
pub mod mode;
pub mod nick;
pub mod part;
pub mod pass;
pub mod privmsg;
pub mod quit;
pub mod topic;
pub mod user;

use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};

/// A reply map addressing a single connection.
pub(crate) fn reply_to(connection_id: Uuid, reply: Reply) -> ReplyMap {
    let mut map = HashMap::new();
    map.insert(connection_id, vec![reply]);
    map
}

/// The 001/002/003/004 quartet, in that order.
pub(crate) fn welcome_burst(
    server_context: &ServerContext,
    conn_context: &ConnectionContext,
) -> Vec<Reply> {
    let server_host = server_context.server_host.clone();
    let nick = conn_context.nick.clone().unwrap_or_default();

    vec![
        Reply::Welcome {
            server_host: server_host.clone(),
            nick: nick.clone(),
            client: conn_context.prefix(),
        },
        Reply::YourHost {
            server_host: server_host.clone(),
            nick: nick.clone(),
            version: server_context.version.clone(),
        },
        Reply::Created {
            server_host: server_host.clone(),
            nick: nick.clone(),
            created_at: server_context.start_time,
        },
        Reply::MyInfo {
            server_host,
            nick,
            version: server_context.version.clone(),
        },
    ]
}

/// Recomputes the registered predicate after a PASS, NICK or USER mutation.
/// The welcome burst fires on the rising edge, exactly once per connection.
pub(crate) fn complete_registration(
    server_context: &ServerContext,
    conn_context: &mut ConnectionContext,
) -> Option<Vec<Reply>> {
    if !conn_context.try_register() || conn_context.welcome_sent {
        return None;
    }

    conn_context.welcome_sent = true;
    Some(welcome_burst(server_context, conn_context))
}

/// Case-sensitive nickname lookup across every connected client.
pub(crate) fn find_by_nick<'a>(
    connections: &'a HashMap<Uuid, ConnectionContext>,
    nick: &str,
) -> Option<&'a ConnectionContext> {
    connections
        .values()
        .find(|other| other.nick.as_deref() == Some(nick))
}
