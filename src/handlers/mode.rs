use std::collections::HashMap;

use uuid::Uuid;

use crate::context::{ChannelContext, ConnectionContext, ServerContext};
use crate::replies::{Reply, ReplyMap};

use super::{find_by_nick, reply_to};

pub fn handle_mode(
    server_context: &ServerContext,
    connection_id: Uuid,
    params: &[String],
    connections: &HashMap<Uuid, ConnectionContext>,
    channels: &mut HashMap<String, ChannelContext>,
) -> Option<ReplyMap> {
    let conn_context = connections.get(&connection_id)?;
    let server_host = server_context.server_host.clone();
    let nick = conn_context.nick_or_star().to_string();

    let Some(target) = params.first() else {
        return Some(reply_to(
            connection_id,
            Reply::ErrNeedMoreParams {
                server_host,
                nick,
                command: "MODE".to_string(),
            },
        ));
    };

    // User modes are not supported.
    if !target.starts_with('#') {
        return None;
    }

    let Some(channel) = channels.get_mut(target) else {
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
            Reply::ErrNotOnChannel {
                server_host,
                nick,
                channel: target.clone(),
            },
        ));
    }

    if params.len() == 1 {
        return Some(reply_to(
            connection_id,
            Reply::ChannelModeIs {
                server_host,
                nick,
                channel: target.clone(),
                mode_string: channel.mode_string(),
            },
        ));
    }

    if !channel.is_operator(connection_id) {
        return Some(reply_to(
            connection_id,
            Reply::ErrChanOPrivsNeeded {
                server_host,
                nick,
                channel: target.clone(),
            },
        ));
    }

    apply_modes(channel, &params[1], &params[2..], connections);

    // The change is relayed exactly as typed, arguments included. Invalid
    // or unknown letters were already dropped silently above.
    let mut map: ReplyMap = HashMap::new();
    let mode = Reply::Mode {
        client: conn_context.prefix(),
        channel: target.clone(),
        modes: params[1..].join(" "),
    };
    for member in &channel.members {
        map.entry(*member).or_default().push(mode.clone());
    }

    Some(map)
}

/// Walks the mode string left to right, consuming one trailing argument per
/// letter that takes one. Clearing forms (`-k`, `-l`) consume none.
fn apply_modes(
    channel: &mut ChannelContext,
    mode_string: &str,
    arguments: &[String],
    connections: &HashMap<Uuid, ConnectionContext>,
) {
    let mut adding = true;
    let mut arguments = arguments.iter();

    for letter in mode_string.chars() {
        match letter {
            '+' => adding = true,
            '-' => adding = false,
            'i' => channel.invite_only = adding,
            't' => channel.topic_restricted = adding,
            'k' => {
                if adding {
                    if let Some(key) = arguments.next() {
                        channel.key = Some(key.clone());
                    }
                } else {
                    channel.key = None;
                }
            }
            'l' => {
                if adding {
                    if let Some(raw_limit) = arguments.next() {
                        match raw_limit.parse::<usize>() {
                            Ok(limit) if limit > 0 => channel.user_limit = Some(limit),
                            _ => {}
                        }
                    }
                } else {
                    channel.user_limit = None;
                }
            }
            'o' => {
                if let Some(target_nick) = arguments.next() {
                    let target = find_by_nick(connections, target_nick)
                        .filter(|target| channel.is_member(target.connection_id));
                    if let Some(target) = target {
                        if adding {
                            channel.operators.insert(target.connection_id);
                        } else {
                            channel.operators.remove(&target.connection_id);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}
