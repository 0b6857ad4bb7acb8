use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ChannelContext, ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};

use super::reply_to;

pub fn handle_topic(
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
                command: "TOPIC".to_string(),
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

    let Some(new_topic) = params.get(1) else {
        // Query form: 332 when a topic is set, silence otherwise.
        let topic = channel.topic.as_ref()?;
        return Some(reply_to(
            connection_id,
            Reply::Topic {
                server_host,
                nick,
                channel: channel_name.clone(),
                topic: topic.clone(),
            },
        ));
    };

    if channel.topic_restricted && !channel.is_operator(connection_id) {
        return Some(reply_to(
            connection_id,
            Reply::ErrChanOPrivsNeeded {
                server_host,
                nick,
                channel: channel_name.clone(),
            },
        ));
    }

    // An empty topic clears it; the change is still announced.
    channel.topic = if new_topic.is_empty() {
        None
    } else {
        Some(new_topic.clone())
    };

    let mut map: ReplyMap = HashMap::new();
    let changed = Reply::TopicChanged {
        client: conn_context.prefix(),
        channel: channel_name.clone(),
        topic: new_topic.clone(),
    };
    for member in &channel.members {
        map.entry(*member).or_default().push(changed.clone());
    }

    Some(map)
}
