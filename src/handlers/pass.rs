use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};

use super::{complete_registration, reply_to};

/// A wrong password earns a 464 but keeps the connection open so the client
/// can retry. Only a correct PASS flips the authenticated flag.
pub fn handle_pass(
    server_context: &ServerContext,
    connection_id: Uuid,
    params: &[String],
    connections: &mut HashMap<Uuid, ConnectionContext>,
) -> Option<ReplyMap> {
    let conn_context = connections.get_mut(&connection_id)?;
    let server_host = server_context.server_host.clone();

    if conn_context.registered {
        return Some(reply_to(
            connection_id,
            Reply::ErrAlreadyRegistered {
                server_host,
                nick: conn_context.nick_or_star().to_string(),
            },
        ));
    }

    if params.len() != 1 {
        return Some(reply_to(
            connection_id,
            Reply::ErrNeedMoreParams {
                server_host,
                nick: conn_context.nick_or_star().to_string(),
                command: "PASS".to_string(),
            },
        ));
    }

    if params[0] != server_context.password {
        return Some(reply_to(
            connection_id,
            Reply::ErrPasswdMismatch {
                server_host,
                nick: conn_context.nick_or_star().to_string(),
            },
        ));
    }

    conn_context.authenticated = true;

    // NICK and USER may already have landed; authentication can be the
    // mutation that completes registration.
    let replies = complete_registration(server_context, conn_context)?;
    let mut map = HashMap::new();
    map.insert(connection_id, replies);
    Some(map)
}
