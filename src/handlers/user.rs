use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};

use super::{complete_registration, reply_to};

pub fn handle_user(
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

    if params.len() < 4 {
        return Some(reply_to(
            connection_id,
            Reply::ErrNeedMoreParams {
                server_host,
                nick: conn_context.nick_or_star().to_string(),
                command: "USER".to_string(),
            },
        ));
    }

    // Parameters 1 (mode) and 2 (unused) are accepted and ignored.
    conn_context.user = Some(params[0].clone());
    conn_context.real_name = Some(params[3].clone());

    let replies = complete_registration(server_context, conn_context)?;
    let mut map = HashMap::new();
    map.insert(connection_id, replies);
    Some(map)
}
