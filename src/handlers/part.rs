use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ChannelContext, ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};

use super::reply_to;

pub fn handle_part(
    server_context: &ServerContext,
    connection_id: Uuid,
    params: &[String],
    connections: &HashMap<Uuid, ConnectionContext>,
    channels: &mut HashMap<String, ChannelContext>,
) -> Option<ReplyMap> {
    let conn_context = connections.get(&connection_id)?;
    let server_host = server_context.server_host.clone();
    let nick = conn_context.nick_or_star().to_string();

    let Some(channel_name) = params.first() else {
        return Some(reply_to(
            connection_id,
            Reply::ErrNeedMoreParams {
                server_host,
                nick,
                command: "PART".to_string(),
            },
        ));
    };

    let not_on_channel = reply_to(
        connection_id,
        Reply::ErrNotOnChannel {
            server_host: server_host.clone(),
            nick: nick.clone(),
            channel: channel_name.clone(),
        },
    );

    let Some(channel) = channels.get_mut(channel_name) else {
        return Some(not_on_channel);
    };
    if !channel.is_member(connection_id) {
        return Some(not_on_channel);
    }

    // Everyone on the channel sees the departure, the departing client
    // included.
    let mut map: ReplyMap = HashMap::new();
    let part = Reply::Part {
        client: conn_context.prefix(),
        channel: channel_name.clone(),
        reason: params.get(1).cloned(),
    };
    for member in &channel.members {
        map.entry(*member).or_default().push(part.clone());
    }

    channel.remove_member(connection_id);
    if channel.members.is_empty() {
        channels.remove(channel_name);
    }

    Some(map)
}
