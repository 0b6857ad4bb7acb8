use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ChannelContext, ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};

use super::{find_by_nick, reply_to};

pub fn handle_kick(
    server_context: &ServerContext,
    connection_id: Uuid,
    params: &[String],
    connections: &HashMap<Uuid, ConnectionContext>,
    channels: &mut HashMap<String, ChannelContext>,
) -> Option<ReplyMap> {
    let conn_context = connections.get(&connection_id)?;
    let server_host = server_context.server_host.clone();
    let nick = conn_context.nick_or_star().to_string();

    let [channel_name, target_nick, ..] = params else {
        return Some(reply_to(
            connection_id,
            Reply::ErrNeedMoreParams {
                server_host,
                nick,
                command: "KICK".to_string(),
            },
        ));
    };
    let reason = params.get(2).cloned().unwrap_or_else(|| nick.clone());

    let Some(channel) = channels.get_mut(channel_name) else {
        return Some(reply_to(
            connection_id,
            Reply::ErrNoSuchChannel {
                server_host,
                nick,
                channel: channel_name.clone(),
            },
        ));
    };

    if !channel.is_member(connection_id) {
        return Some(reply_to(
            connection_id,
            Reply::ErrNotOnChannel {
                server_host,
                nick,
                channel: channel_name.clone(),
            },
        ));
    }

    if !channel.is_operator(connection_id) {
        return Some(reply_to(
            connection_id,
            Reply::ErrChanOPrivsNeeded {
                server_host,
                nick,
                channel: channel_name.clone(),
            },
        ));
    }

    // An unknown nickname and a known one that is not on the channel get the
    // same answer.
    let target = find_by_nick(connections, target_nick)
        .filter(|target| channel.is_member(target.connection_id));
    let Some(target) = target else {
        return Some(reply_to(
            connection_id,
            Reply::ErrUserNotInChannel {
                server_host,
                nick,
                target: target_nick.clone(),
                channel: channel_name.clone(),
            },
        ));
    };

    let mut map: ReplyMap = HashMap::new();
    let kick = Reply::Kick {
        client: conn_context.prefix(),
        channel: channel_name.clone(),
        target: target_nick.clone(),
        reason,
    };
    for member in &channel.members {
        map.entry(*member).or_default().push(kick.clone());
    }

    channel.remove_member(target.connection_id);
    if channel.members.is_empty() {
        channels.remove(channel_name);
    }

    Some(map)
}
