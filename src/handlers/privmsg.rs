use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ChannelContext, ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};

use super::{find_by_nick, reply_to};

/// Delivers to a channel (everyone but the sender) or a single nickname.
/// PRIVMSG is never echoed back to its sender.
pub fn handle_privmsg(
    server_context: &ServerContext,
    connection_id: Uuid,
    params: &[String],
    connections: &HashMap<Uuid, ConnectionContext>,
    channels: &HashMap<String, ChannelContext>,
) -> Option<ReplyMap> {
    let conn_context = connections.get(&connection_id)?;
    let server_host = server_context.server_host.clone();
    let nick = conn_context.nick_or_star().to_string();

    let (target, text) = match params {
        [] => {
            return Some(reply_to(
                connection_id,
                Reply::ErrNoRecipient { server_host, nick },
            ));
        }
        [_target] => {
            return Some(reply_to(
                connection_id,
                Reply::ErrNoTextToSend { server_host, nick },
            ));
        }
        [target, text, ..] => (target, text),
    };

    let mut map: ReplyMap = HashMap::new();
    let privmsg = Reply::PrivMsg {
        client: conn_context.prefix(),
        target: target.clone(),
        message: text.clone(),
    };

    if target.starts_with('#') {
        let Some(channel) = channels.get(target) else {
            return Some(reply_to(
                connection_id,
                Reply::ErrNoSuchChannel {
                    server_host,
                    nick,
                    channel: target.clone(),
                },
            ));
        };

        if !channel.is_member(connection_id) {
            return Some(reply_to(
                connection_id,
                Reply::ErrCannotSendToChan {
                    server_host,
                    nick,
                    channel: target.clone(),
                },
            ));
        }

        for member in &channel.members {
            if *member == connection_id {
                continue;
            }
            map.insert(*member, vec![privmsg.clone()]);
        }
    } else {
        let Some(other) = find_by_nick(connections, target) else {
            return Some(reply_to(
                connection_id,
                Reply::ErrNoSuchNick {
                    server_host,
                    nick,
                    target: target.clone(),
                },
            ));
        };

        map.insert(other.connection_id, vec![privmsg]);
    }

    Some(map)
}
