use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ChannelContext, ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};
use crate::util;

use super::reply_to;

pub fn handle_join(
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
                command: "JOIN".to_string(),
            },
        ));
    };
    let key = params.get(1).map(String::as_str).unwrap_or("");

    if !util::is_valid_channel_name(channel_name) {
        return Some(reply_to(
            connection_id,
            Reply::ErrNoSuchChannel {
                server_host,
                nick,
                channel: channel_name.clone(),
            },
        ));
    }

    let newly_created = !channels.contains_key(channel_name);
    let channel = channels.entry(channel_name.clone()).or_default();

    if channel.is_member(connection_id) {
        return None;
    }

    // Admission checks, in order: invite-only, key, limit. A fresh channel
    // has none of them set and always admits its creator.
    if channel.invite_only && !channel.invited.contains(&connection_id) {
        return Some(reply_to(
            connection_id,
            Reply::ErrInviteOnlyChan {
                server_host,
                nick,
                channel: channel_name.clone(),
            },
        ));
    }

    if let Some(channel_key) = &channel.key {
        if channel_key != key {
            return Some(reply_to(
                connection_id,
                Reply::ErrBadChannelKey {
                    server_host,
                    nick,
                    channel: channel_name.clone(),
                },
            ));
        }
    }

    if let Some(limit) = channel.user_limit {
        if channel.members.len() >= limit {
            return Some(reply_to(
                connection_id,
                Reply::ErrChannelIsFull {
                    server_host,
                    nick,
                    channel: channel_name.clone(),
                },
            ));
        }
    }

    channel.add_member(connection_id);
    channel.invited.remove(&connection_id);
    if newly_created {
        channel.operators.insert(connection_id);
    }

    let mut map: ReplyMap = HashMap::new();
    let join = Reply::Join {
        client: conn_context.prefix(),
        channel: channel_name.clone(),
    };
    for member in &channel.members {
        map.entry(*member).or_default().push(join.clone());
    }

    let own_replies = map.entry(connection_id).or_default();
    if let Some(topic) = &channel.topic {
        own_replies.push(Reply::Topic {
            server_host: server_host.clone(),
            nick: nick.clone(),
            channel: channel_name.clone(),
            topic: topic.clone(),
        });
    }

    let members = channel
        .members
        .iter()
        .filter_map(|member| connections.get(member).and_then(|c| c.nick.clone()))
        .collect();
    own_replies.push(Reply::NamReply {
        server_host: server_host.clone(),
        nick: nick.clone(),
        channel: channel_name.clone(),
        members,
    });
    own_replies.push(Reply::EndOfNames {
        server_host,
        nick,
        channel: channel_name.clone(),
    });

    Some(map)
}
