use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ChannelContext, ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};

use super::{find_by_nick, reply_to};

/// Marks the target eligible to bypass invite-only and relays the INVITE.
/// The mark lasts until the target's next successful JOIN of the channel.
pub fn handle_invite(
    server_context: &ServerContext,
    connection_id: Uuid,
    params: &[String],
    connections: &HashMap<Uuid, ConnectionContext>,
    channels: &mut HashMap<String, ChannelContext>,
) -> Option<ReplyMap> {
    let conn_context = connections.get(&connection_id)?;
    let server_host = server_context.server_host.clone();
    let nick = conn_context.nick_or_star().to_string();

    let [target_nick, channel_name, ..] = params else {
        return Some(reply_to(
            connection_id,
            Reply::ErrNeedMoreParams {
                server_host,
                nick,
                command: "INVITE".to_string(),
            },
        ));
    };

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

    let Some(target) = find_by_nick(connections, target_nick) else {
        return Some(reply_to(
            connection_id,
            Reply::ErrNoSuchNick {
                server_host,
                nick,
                target: target_nick.clone(),
            },
        ));
    };

    if channel.is_member(target.connection_id) {
        return Some(reply_to(
            connection_id,
            Reply::ErrUserOnChannel {
                server_host,
                nick,
                target: target_nick.clone(),
                channel: channel_name.clone(),
            },
        ));
    }

    channel.invited.insert(target.connection_id);

    Some(reply_to(
        target.connection_id,
        Reply::Invite {
            client: conn_context.prefix(),
            nick: target_nick.clone(),
            channel: channel_name.clone(),
        },
    ))
}
