use std::collections::HashMap;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Replies fanned out by one dispatched command, keyed by the connection
/// that should receive them.
pub type ReplyMap = HashMap<Uuid, Vec<Reply>>;

/// Every line this server ever writes to a client: the numeric replies it
/// uses (and no others), plus the messages it relays between clients.
/// `client` fields carry the originating `nick!user@host` prefix.
#[derive(Clone)]
pub enum Reply {
    Welcome {
        server_host: String,
        nick: String,
        client: String,
    },
    YourHost {
        server_host: String,
        nick: String,
        version: String,
    },
    Created {
        server_host: String,
        nick: String,
        created_at: DateTime<Utc>,
    },
    MyInfo {
        server_host: String,
        nick: String,
        version: String,
    },
    ChannelModeIs {
        server_host: String,
        nick: String,
        channel: String,
        mode_string: String,
    },
    Topic {
        server_host: String,
        nick: String,
        channel: String,
        topic: String,
    },
    NamReply {
        server_host: String,
        nick: String,
        channel: String,
        members: Vec<String>,
    },
    EndOfNames {
        server_host: String,
        nick: String,
        channel: String,
    },
    ErrNoSuchNick {
        server_host: String,
        nick: String,
        target: String,
    },
    ErrNoSuchChannel {
        server_host: String,
        nick: String,
        channel: String,
    },
    ErrCannotSendToChan {
        server_host: String,
        nick: String,
        channel: String,
    },
    ErrNoRecipient {
        server_host: String,
        nick: String,
    },
    ErrNoTextToSend {
        server_host: String,
        nick: String,
    },
    ErrUnknownCommand {
        server_host: String,
        nick: String,
        command: String,
    },
    ErrNoNicknameGiven {
        server_host: String,
        nick: String,
    },
    ErrErroneousNickname {
        server_host: String,
        nick: String,
        new_nick: String,
    },
    ErrNicknameInUse {
        server_host: String,
        nick: String,
        new_nick: String,
    },
    ErrUserNotInChannel {
        server_host: String,
        nick: String,
        target: String,
        channel: String,
    },
    ErrNotOnChannel {
        server_host: String,
        nick: String,
        channel: String,
    },
    ErrUserOnChannel {
        server_host: String,
        nick: String,
        target: String,
        channel: String,
    },
    ErrNeedMoreParams {
        server_host: String,
        nick: String,
        command: String,
    },
    ErrAlreadyRegistered {
        server_host: String,
        nick: String,
    },
    ErrPasswdMismatch {
        server_host: String,
        nick: String,
    },
    ErrChannelIsFull {
        server_host: String,
        nick: String,
        channel: String,
    },
    ErrInviteOnlyChan {
        server_host: String,
        nick: String,
        channel: String,
    },
    ErrBadChannelKey {
        server_host: String,
        nick: String,
        channel: String,
    },
    ErrChanOPrivsNeeded {
        server_host: String,
        nick: String,
        channel: String,
    },
    Join {
        client: String,
        channel: String,
    },
    Part {
        client: String,
        channel: String,
        reason: Option<String>,
    },
    PrivMsg {
        client: String,
        target: String,
        message: String,
    },
    Kick {
        client: String,
        channel: String,
        target: String,
        reason: String,
    },
    Invite {
        client: String,
        nick: String,
        channel: String,
    },
    TopicChanged {
        client: String,
        channel: String,
        topic: String,
    },
    Nick {
        client: String,
        new_nick: String,
    },
    Mode {
        client: String,
        channel: String,
        modes: String,
    },
    Quit {
        client: String,
        reason: String,
    },
}

impl Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Welcome {
                server_host,
                nick,
                client,
            } => write!(
                f,
                ":{} 001 {} :Welcome to the Internet Relay Network {}",
                server_host, nick, client
            ),
            Reply::YourHost {
                server_host,
                nick,
                version,
            } => write!(
                f,
                ":{} 002 {} :Your host is {}, running version {}",
                server_host, nick, server_host, version
            ),
            Reply::Created {
                server_host,
                nick,
                created_at,
            } => write!(
                f,
                ":{} 003 {} :This server was created {}",
                server_host, nick, created_at
            ),
            Reply::MyInfo {
                server_host,
                nick,
                version,
            } => write!(
                f,
                ":{} 004 {} {} {} o itklno",
                server_host, nick, server_host, version
            ),
            Reply::ChannelModeIs {
                server_host,
                nick,
                channel,
                mode_string,
            } => write!(
                f,
                ":{} 324 {} {} {}",
                server_host, nick, channel, mode_string
            ),
            Reply::Topic {
                server_host,
                nick,
                channel,
                topic,
            } => write!(f, ":{} 332 {} {} :{}", server_host, nick, channel, topic),
            Reply::NamReply {
                server_host,
                nick,
                channel,
                members,
            } => write!(
                f,
                ":{} 353 {} = {} :{}",
                server_host,
                nick,
                channel,
                members.join(" ")
            ),
            Reply::EndOfNames {
                server_host,
                nick,
                channel,
            } => write!(
                f,
                ":{} 366 {} {} :End of /NAMES list",
                server_host, nick, channel
            ),
            Reply::ErrNoSuchNick {
                server_host,
                nick,
                target,
            } => write!(
                f,
                ":{} 401 {} {} :No such nick/channel",
                server_host, nick, target
            ),
            Reply::ErrNoSuchChannel {
                server_host,
                nick,
                channel,
            } => write!(
                f,
                ":{} 403 {} {} :No such channel",
                server_host, nick, channel
            ),
            Reply::ErrCannotSendToChan {
                server_host,
                nick,
                channel,
            } => write!(
                f,
                ":{} 404 {} {} :Cannot send to channel",
                server_host, nick, channel
            ),
            Reply::ErrNoRecipient { server_host, nick } => write!(
                f,
                ":{} 411 {} :No recipient given (PRIVMSG)",
                server_host, nick
            ),
            Reply::ErrNoTextToSend { server_host, nick } => {
                write!(f, ":{} 412 {} :No text to send", server_host, nick)
            }
            Reply::ErrUnknownCommand {
                server_host,
                nick,
                command,
            } => write!(
                f,
                ":{} 421 {} {} :Unknown command",
                server_host, nick, command
            ),
            Reply::ErrNoNicknameGiven { server_host, nick } => {
                write!(f, ":{} 431 {} :No nickname given", server_host, nick)
            }
            Reply::ErrErroneousNickname {
                server_host,
                nick,
                new_nick,
            } => write!(
                f,
                ":{} 432 {} {} :Erroneous nickname",
                server_host, nick, new_nick
            ),
            Reply::ErrNicknameInUse {
                server_host,
                nick,
                new_nick,
            } => write!(
                f,
                ":{} 433 {} {} :Nickname is already in use",
                server_host, nick, new_nick
            ),
            Reply::ErrUserNotInChannel {
                server_host,
                nick,
                target,
                channel,
            } => write!(
                f,
                ":{} 441 {} {} {} :They aren't on that channel",
                server_host, nick, target, channel
            ),
            Reply::ErrNotOnChannel {
                server_host,
                nick,
                channel,
            } => write!(
                f,
                ":{} 442 {} {} :You're not on that channel",
                server_host, nick, channel
            ),
            Reply::ErrUserOnChannel {
                server_host,
                nick,
                target,
                channel,
            } => write!(
                f,
                ":{} 443 {} {} {} :is already on channel",
                server_host, nick, target, channel
            ),
            Reply::ErrNeedMoreParams {
                server_host,
                nick,
                command,
            } => write!(
                f,
                ":{} 461 {} {} :Not enough parameters",
                server_host, nick, command
            ),
            Reply::ErrAlreadyRegistered { server_host, nick } => {
                write!(f, ":{} 462 {} :You may not reregister", server_host, nick)
            }
            Reply::ErrPasswdMismatch { server_host, nick } => {
                write!(f, ":{} 464 {} :Password incorrect", server_host, nick)
            }
            Reply::ErrChannelIsFull {
                server_host,
                nick,
                channel,
            } => write!(
                f,
                ":{} 471 {} {} :Cannot join channel (+l)",
                server_host, nick, channel
            ),
            Reply::ErrInviteOnlyChan {
                server_host,
                nick,
                channel,
            } => write!(
                f,
                ":{} 473 {} {} :Cannot join channel (+i)",
                server_host, nick, channel
            ),
            Reply::ErrBadChannelKey {
                server_host,
                nick,
                channel,
            } => write!(
                f,
                ":{} 475 {} {} :Cannot join channel (+k)",
                server_host, nick, channel
            ),
            Reply::ErrChanOPrivsNeeded {
                server_host,
                nick,
                channel,
            } => write!(
                f,
                ":{} 482 {} {} :You're not channel operator",
                server_host, nick, channel
            ),
            Reply::Join { client, channel } => write!(f, ":{} JOIN {}", client, channel),
            Reply::Part {
                client,
                channel,
                reason,
            } => match reason {
                Some(reason) => write!(f, ":{} PART {} :{}", client, channel, reason),
                None => write!(f, ":{} PART {}", client, channel),
            },
            Reply::PrivMsg {
                client,
                target,
                message,
            } => write!(f, ":{} PRIVMSG {} :{}", client, target, message),
            Reply::Kick {
                client,
                channel,
                target,
                reason,
            } => write!(f, ":{} KICK {} {} :{}", client, channel, target, reason),
            Reply::Invite {
                client,
                nick,
                channel,
            } => write!(f, ":{} INVITE {} {}", client, nick, channel),
            Reply::TopicChanged {
                client,
                channel,
                topic,
            } => write!(f, ":{} TOPIC {} :{}", client, channel, topic),
            Reply::Nick { client, new_nick } => write!(f, ":{} NICK {}", client, new_nick),
            Reply::Mode {
                client,
                channel,
                modes,
            } => write!(f, ":{} MODE {} {}", client, channel, modes),
            Reply::Quit { client, reason } => write!(f, ":{} QUIT :{}", client, reason),
        }
    }
}

#[test]
fn welcome_prints_correctly() {
    let reply = Reply::Welcome {
        server_host: "ircserv.local".to_string(),
        nick: "bob".to_string(),
        client: "bob!rob@10.0.0.7".to_string(),
    };
    let expected = ":ircserv.local 001 bob :Welcome to the Internet Relay Network bob!rob@10.0.0.7";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn yourhost_prints_correctly() {
    let reply = Reply::YourHost {
        server_host: "ircserv.local".to_string(),
        nick: "bob".to_string(),
        version: "0.1.0".to_string(),
    };
    let expected = ":ircserv.local 002 bob :Your host is ircserv.local, running version 0.1.0";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn created_prints_correctly() {
    let now = Utc::now();
    let reply = Reply::Created {
        server_host: "ircserv.local".to_string(),
        nick: "bob".to_string(),
        created_at: now,
    };
    let expected = format!(":ircserv.local 003 bob :This server was created {}", now);
    assert_eq!(expected, reply.to_string());
}

#[test]
fn myinfo_prints_correctly() {
    let reply = Reply::MyInfo {
        server_host: "ircserv.local".to_string(),
        nick: "bob".to_string(),
        version: "0.1.0".to_string(),
    };
    let expected = ":ircserv.local 004 bob ircserv.local 0.1.0 o itklno";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn channelmodeis_prints_correctly() {
    let reply = Reply::ChannelModeIs {
        server_host: "ircserv.local".to_string(),
        nick: "bob".to_string(),
        channel: "#general".to_string(),
        mode_string: "+ik sekrit".to_string(),
    };
    let expected = ":ircserv.local 324 bob #general +ik sekrit";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn namreply_joins_members_with_spaces() {
    let reply = Reply::NamReply {
        server_host: "ircserv.local".to_string(),
        nick: "bob".to_string(),
        channel: "#general".to_string(),
        members: vec!["bob".to_string(), "carol".to_string()],
    };
    let expected = ":ircserv.local 353 bob = #general :bob carol";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn endofnames_prints_correctly() {
    let reply = Reply::EndOfNames {
        server_host: "ircserv.local".to_string(),
        nick: "bob".to_string(),
        channel: "#general".to_string(),
    };
    let expected = ":ircserv.local 366 bob #general :End of /NAMES list";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn unknowncommand_echoes_the_token_verbatim() {
    let reply = Reply::ErrUnknownCommand {
        server_host: "ircserv.local".to_string(),
        nick: "bob".to_string(),
        command: "join".to_string(),
    };
    let expected = ":ircserv.local 421 bob join :Unknown command";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn nicknameinuse_addresses_unregistered_client_as_star() {
    let reply = Reply::ErrNicknameInUse {
        server_host: "ircserv.local".to_string(),
        nick: "*".to_string(),
        new_nick: "bob".to_string(),
    };
    let expected = ":ircserv.local 433 * bob :Nickname is already in use";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn usernotinchannel_prints_target_then_channel() {
    let reply = Reply::ErrUserNotInChannel {
        server_host: "ircserv.local".to_string(),
        nick: "bob".to_string(),
        target: "carol".to_string(),
        channel: "#general".to_string(),
    };
    let expected = ":ircserv.local 441 bob carol #general :They aren't on that channel";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn needmoreparams_names_the_command() {
    let reply = Reply::ErrNeedMoreParams {
        server_host: "ircserv.local".to_string(),
        nick: "*".to_string(),
        command: "USER".to_string(),
    };
    let expected = ":ircserv.local 461 * USER :Not enough parameters";
    assert_eq!(expected, reply.to_string());
}

#[test]
fn part_without_reason_omits_trailing() {
    let reply = Reply::Part {
        client: "bob!rob@10.0.0.7".to_string(),
        channel: "#general".to_string(),
        reason: None,
    };
    assert_eq!(":bob!rob@10.0.0.7 PART #general", reply.to_string());
}

#[test]
fn part_with_reason_appends_trailing() {
    let reply = Reply::Part {
        client: "bob!rob@10.0.0.7".to_string(),
        channel: "#general".to_string(),
        reason: Some("gone fishing".to_string()),
    };
    assert_eq!(
        ":bob!rob@10.0.0.7 PART #general :gone fishing",
        reply.to_string()
    );
}

#[test]
fn privmsg_prints_correctly() {
    let reply = Reply::PrivMsg {
        client: "bob!rob@10.0.0.7".to_string(),
        target: "#general".to_string(),
        message: "hello".to_string(),
    };
    assert_eq!(
        ":bob!rob@10.0.0.7 PRIVMSG #general :hello",
        reply.to_string()
    );
}

#[test]
fn kick_prints_correctly() {
    let reply = Reply::Kick {
        client: "bob!rob@10.0.0.7".to_string(),
        channel: "#general".to_string(),
        target: "carol".to_string(),
        reason: "bob".to_string(),
    };
    assert_eq!(
        ":bob!rob@10.0.0.7 KICK #general carol :bob",
        reply.to_string()
    );
}

#[test]
fn invite_prints_correctly() {
    let reply = Reply::Invite {
        client: "bob!rob@10.0.0.7".to_string(),
        nick: "carol".to_string(),
        channel: "#general".to_string(),
    };
    assert_eq!(":bob!rob@10.0.0.7 INVITE carol #general", reply.to_string());
}

#[test]
fn mode_prints_the_raw_change() {
    let reply = Reply::Mode {
        client: "bob!rob@10.0.0.7".to_string(),
        channel: "#general".to_string(),
        modes: "+kl sekrit 12".to_string(),
    };
    assert_eq!(
        ":bob!rob@10.0.0.7 MODE #general +kl sekrit 12",
        reply.to_string()
    );
}

#[test]
fn quit_prints_correctly() {
    let reply = Reply::Quit {
        client: "bob!rob@10.0.0.7".to_string(),
        reason: "Client disconnected".to_string(),
    };
    assert_eq!(
        ":bob!rob@10.0.0.7 QUIT :Client disconnected",
        reply.to_string()
    );
}
