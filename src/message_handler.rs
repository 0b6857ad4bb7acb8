use std::collections::HashMap;

use tokio::sync::mpsc::Receiver;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::{ChannelContext, ConnectionContext, ServerContext};
use crate::events::{Event, EventKind, ReceiverWrapper, ReplySender};
use crate::handlers::{
    self, invite, join, kick, mode, nick, part, pass, privmsg, quit, topic, user,
};
use crate::message_parsing::IrcMessage;
use crate::replies::{Reply, ReplyMap};
use crate::result::Result;

/// The message handler owns every client and channel record. All mutations
/// happen here, one event at a time, so lines from one client are processed
/// in arrival order and each broadcast is fully enqueued before the next
/// command runs.
pub async fn run<T>(
    server_context: &ServerContext,
    receiver_channel: &mut T,
    mut shutdown_receiver: Receiver<()>,
) -> Result<()>
where
    T: ReceiverWrapper<Event>,
{
    let mut connections: HashMap<Uuid, ConnectionContext> = HashMap::new();
    let mut sender_channels: HashMap<Uuid, ReplySender> = HashMap::new();
    let mut channels: HashMap<String, ChannelContext> = HashMap::new();

    loop {
        let event = tokio::select! {
            received = receiver_channel.receive() => match received {
                Some(event) => event,
                None => break,
            },
            _ = shutdown_receiver.recv() => break,
        };

        let connection_id = event.connection_id;
        let replies = match event.kind {
            EventKind::Connected { sender, host } => {
                info!(%connection_id, %host, "client connected");
                connections.insert(connection_id, ConnectionContext::new(connection_id, host));
                sender_channels.insert(connection_id, sender);
                None
            }
            EventKind::Disconnected => {
                let replies = quit::remove_client(connection_id, &mut connections, &mut channels);
                sender_channels.remove(&connection_id);
                replies
            }
            EventKind::Message(message) => {
                if connections.contains_key(&connection_id) {
                    dispatch(
                        server_context,
                        connection_id,
                        message,
                        &mut connections,
                        &mut channels,
                        &mut sender_channels,
                    )
                } else {
                    // A QUIT or an overflow removed this connection while
                    // its reader still had lines in flight.
                    debug!(%connection_id, command = %message.command, "line for a removed connection");
                    None
                }
            }
        };

        if let Some(replies) = replies {
            send_replies(replies, &sender_channels).await;
        }
    }

    // Graceful teardown: dropping the reply senders closes every client
    // socket, and the channel registry dies with this scope.
    info!(
        clients = connections.len(),
        channels = channels.len(),
        "message handler stopped"
    );
    Ok(())
}

/// The command table. Tokens are matched exactly — this server speaks
/// uppercase only, so `join` is as unknown as `FROBNICATE`.
fn dispatch(
    server_context: &ServerContext,
    connection_id: Uuid,
    message: IrcMessage,
    connections: &mut HashMap<Uuid, ConnectionContext>,
    channels: &mut HashMap<String, ChannelContext>,
    sender_channels: &mut HashMap<Uuid, ReplySender>,
) -> Option<ReplyMap> {
    let registered = connections
        .get(&connection_id)
        .is_some_and(|conn| conn.registered);
    let params = &message.params;

    match message.command.as_str() {
        "PASS" => pass::handle_pass(server_context, connection_id, params, connections),
        "NICK" => nick::handle_nick(server_context, connection_id, params, connections),
        "USER" => user::handle_user(server_context, connection_id, params, connections),
        "QUIT" => {
            let replies = quit::handle_quit(connection_id, connections, channels);
            sender_channels.remove(&connection_id);
            replies
        }
        "JOIN" if registered => {
            join::handle_join(server_context, connection_id, params, connections, channels)
        }
        "PART" if registered => {
            part::handle_part(server_context, connection_id, params, connections, channels)
        }
        "PRIVMSG" if registered => {
            privmsg::handle_privmsg(server_context, connection_id, params, connections, channels)
        }
        "KICK" if registered => {
            kick::handle_kick(server_context, connection_id, params, connections, channels)
        }
        "INVITE" if registered => {
            invite::handle_invite(server_context, connection_id, params, connections, channels)
        }
        "TOPIC" if registered => {
            topic::handle_topic(server_context, connection_id, params, connections, channels)
        }
        "MODE" if registered => {
            mode::handle_mode(server_context, connection_id, params, connections, channels)
        }
        // Known commands before registration: no action, no reply.
        "JOIN" | "PART" | "PRIVMSG" | "KICK" | "INVITE" | "TOPIC" | "MODE" => None,
        _ => {
            let nick = connections.get(&connection_id)?.nick_or_star().to_string();
            Some(handlers::reply_to(
                connection_id,
                Reply::ErrUnknownCommand {
                    server_host: server_context.server_host.clone(),
                    nick,
                    command: message.command,
                },
            ))
        }
    }
}

async fn send_replies(
    replies_per_connection: ReplyMap,
    sender_channels: &HashMap<Uuid, ReplySender>,
) {
    for (connection_id, replies) in replies_per_connection {
        let Some(sender) = sender_channels.get(&connection_id) else {
            debug!(%connection_id, "no reply channel for connection");
            continue;
        };

        for reply in replies {
            if sender.0.send(reply).await.is_err() {
                debug!(%connection_id, "reply channel closed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use chrono::Utc;
    use tokio::sync::mpsc;

    use super::*;
    use crate::events::FakeEventReceiver;
    use crate::message_parsing::parse_message;

    struct TestClient {
        connection_id: Uuid,
        receiver: mpsc::Receiver<Reply>,
    }

    fn connect(events: &mut VecDeque<Event>) -> TestClient {
        let (sender, receiver) = mpsc::channel(100);
        let connection_id = Uuid::new_v4();
        events.push_back(Event::connected(
            connection_id,
            ReplySender(sender),
            "127.0.0.1".to_string(),
        ));
        TestClient {
            connection_id,
            receiver,
        }
    }

    fn send(events: &mut VecDeque<Event>, client: &TestClient, raw: &str) {
        events.push_back(Event::message(client.connection_id, parse_message(raw)));
    }

    fn register(events: &mut VecDeque<Event>, client: &TestClient, nick: &str) {
        send(events, client, "PASS right");
        send(events, client, &format!("NICK {}", nick));
        send(events, client, &format!("USER {} 0 * :{}", nick, nick));
    }

    async fn run_events(events: VecDeque<Event>) -> usize {
        let context = ServerContext {
            start_time: Utc::now(),
            server_host: "ircserv.local".to_string(),
            version: "0.1.0".to_string(),
            password: "right".to_string(),
        };
        let mut receiver = FakeEventReceiver {
            faked_events: events,
            receive_count: 0,
        };
        let (_shutdown_sender, shutdown_receiver) = mpsc::channel(1);
        run(&context, &mut receiver, shutdown_receiver)
            .await
            .unwrap();
        receiver.receive_count
    }

    fn drain(client: &mut TestClient) -> Vec<String> {
        let mut lines = vec![];
        while let Ok(reply) = client.receiver.try_recv() {
            lines.push(reply.to_string());
        }
        lines
    }

    #[tokio::test]
    async fn dispatcher_wrongthenrightpassword_sends464thenwelcomeburst() {
        let mut events = VecDeque::new();
        let mut alice = connect(&mut events);
        send(&mut events, &alice, "PASS wrong");
        send(&mut events, &alice, "PASS right");
        send(&mut events, &alice, "NICK a");
        send(&mut events, &alice, "USER a 0 * :A");

        // One Connected event, four lines, and the final empty receive.
        assert_eq!(6, run_events(events).await);

        let lines = drain(&mut alice);
        assert_eq!(5, lines.len());
        assert_eq!(":ircserv.local 464 * :Password incorrect", lines[0]);
        assert_eq!(
            ":ircserv.local 001 a :Welcome to the Internet Relay Network a!a@127.0.0.1",
            lines[1]
        );
        assert!(lines[2].starts_with(":ircserv.local 002 a :Your host is ircserv.local"));
        assert!(lines[3].starts_with(":ircserv.local 003 a :This server was created "));
        assert!(lines[4].starts_with(":ircserv.local 004 a ircserv.local "));
    }

    #[tokio::test]
    async fn dispatcher_passnickuserinanyorder_registersonpass() {
        let mut events = VecDeque::new();
        let mut alice = connect(&mut events);
        send(&mut events, &alice, "NICK a");
        send(&mut events, &alice, "USER a 0 * :A");
        send(&mut events, &alice, "PASS right");

        run_events(events).await;

        let lines = drain(&mut alice);
        assert_eq!(4, lines.len());
        assert!(lines[0].starts_with(":ircserv.local 001 a "));
    }

    #[tokio::test]
    async fn dispatcher_lowercasecommand_isunknown() {
        let mut events = VecDeque::new();
        let mut alice = connect(&mut events);
        register(&mut events, &alice, "a");
        send(&mut events, &alice, "join #x");

        run_events(events).await;

        let lines = drain(&mut alice);
        assert_eq!(
            Some(&":ircserv.local 421 a join :Unknown command".to_string()),
            lines.last()
        );
    }

    #[tokio::test]
    async fn dispatcher_nicknamecollision_rejectedwith433() {
        let mut events = VecDeque::new();
        let bob = connect(&mut events);
        register(&mut events, &bob, "bob");

        let mut intruder = connect(&mut events);
        send(&mut events, &intruder, "PASS right");
        send(&mut events, &intruder, "NICK bob");

        run_events(events).await;

        let lines = drain(&mut intruder);
        assert_eq!(
            vec![":ircserv.local 433 * bob :Nickname is already in use".to_string()],
            lines
        );
    }

    #[tokio::test]
    async fn dispatcher_rejectednick_clientcanstillregister() {
        let mut events = VecDeque::new();
        let bob = connect(&mut events);
        register(&mut events, &bob, "bob");

        let mut carol = connect(&mut events);
        send(&mut events, &carol, "PASS right");
        send(&mut events, &carol, "NICK bob");
        send(&mut events, &carol, "NICK carol");
        send(&mut events, &carol, "USER carol 0 * :Carol");

        run_events(events).await;

        let lines = drain(&mut carol);
        assert!(lines[0].contains(" 433 "));
        assert!(lines[1].starts_with(":ircserv.local 001 carol "));
    }

    #[tokio::test]
    async fn dispatcher_invalidnickname_rejectedwith432() {
        let mut events = VecDeque::new();
        let mut alice = connect(&mut events);
        send(&mut events, &alice, "PASS right");
        send(&mut events, &alice, "NICK 9lives");

        run_events(events).await;

        let lines = drain(&mut alice);
        assert_eq!(
            vec![":ircserv.local 432 * 9lives :Erroneous nickname".to_string()],
            lines
        );
    }

    #[tokio::test]
    async fn dispatcher_beforeregistration_channelcommandsaresilentlyignored() {
        let mut events = VecDeque::new();
        let mut alice = connect(&mut events);
        send(&mut events, &alice, "PASS right");
        send(&mut events, &alice, "JOIN #p");
        send(&mut events, &alice, "PRIVMSG #p :hello");
        send(&mut events, &alice, "TOPIC #p");
        send(&mut events, &alice, "MODE #p");

        run_events(events).await;

        assert!(drain(&mut alice).is_empty());
    }

    #[tokio::test]
    async fn dispatcher_joinfreshchannel_joinerbecomesoperator() {
        let mut events = VecDeque::new();
        let mut bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #p");
        // Only an operator may set modes; this succeeding proves the grant.
        send(&mut events, &bob, "MODE #p +t");

        run_events(events).await;

        let lines = drain(&mut bob);
        assert!(lines.contains(&":bob!bob@127.0.0.1 JOIN #p".to_string()));
        assert!(lines.contains(&":ircserv.local 353 bob = #p :bob".to_string()));
        assert!(lines.contains(&":ircserv.local 366 bob #p :End of /NAMES list".to_string()));
        assert_eq!(
            Some(&":bob!bob@127.0.0.1 MODE #p +t".to_string()),
            lines.last()
        );
    }

    #[tokio::test]
    async fn dispatcher_inviteonlychannel_invitebypassesrestriction() {
        let mut events = VecDeque::new();
        let bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #p");
        send(&mut events, &bob, "MODE #p +i");
        send(&mut events, &bob, "TOPIC #p :the plan");

        let mut carol = connect(&mut events);
        register(&mut events, &carol, "carol");
        send(&mut events, &carol, "JOIN #p");
        send(&mut events, &bob, "INVITE carol #p");
        send(&mut events, &carol, "JOIN #p");

        run_events(events).await;

        let lines = drain(&mut carol);
        assert!(lines.contains(&":ircserv.local 473 carol #p :Cannot join channel (+i)".to_string()));
        assert!(lines.contains(&":bob!bob@127.0.0.1 INVITE carol #p".to_string()));
        assert!(lines.contains(&":carol!carol@127.0.0.1 JOIN #p".to_string()));
        assert!(lines.contains(&":ircserv.local 332 carol #p :the plan".to_string()));
        assert!(lines.contains(&":ircserv.local 353 carol = #p :bob carol".to_string()));
        assert!(lines.contains(&":ircserv.local 366 carol #p :End of /NAMES list".to_string()));
    }

    #[tokio::test]
    async fn dispatcher_keyedchannel_wrongkeyrejected() {
        let mut events = VecDeque::new();
        let bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #p");
        send(&mut events, &bob, "MODE #p +k sekrit");

        let mut carol = connect(&mut events);
        register(&mut events, &carol, "carol");
        send(&mut events, &carol, "JOIN #p");
        send(&mut events, &carol, "JOIN #p sekrit");
        send(&mut events, &carol, "MODE #p");

        run_events(events).await;

        let lines = drain(&mut carol);
        assert!(lines.contains(&":ircserv.local 475 carol #p :Cannot join channel (+k)".to_string()));
        assert!(lines.contains(&":carol!carol@127.0.0.1 JOIN #p".to_string()));
        assert!(lines.contains(&":ircserv.local 324 carol #p +k sekrit".to_string()));
    }

    #[tokio::test]
    async fn dispatcher_fullchannel_rejectedwith471() {
        let mut events = VecDeque::new();
        let bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #p");
        send(&mut events, &bob, "MODE #p +l 1");

        let mut carol = connect(&mut events);
        register(&mut events, &carol, "carol");
        send(&mut events, &carol, "JOIN #p");

        run_events(events).await;

        let lines = drain(&mut carol);
        assert_eq!(
            Some(&":ircserv.local 471 carol #p :Cannot join channel (+l)".to_string()),
            lines.last()
        );
    }

    #[tokio::test]
    async fn dispatcher_kickwithoutoperator_rejectedwith482() {
        let mut events = VecDeque::new();
        let mut bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #p");

        let mut carol = connect(&mut events);
        register(&mut events, &carol, "carol");
        send(&mut events, &carol, "JOIN #p");
        send(&mut events, &carol, "KICK #p bob");

        run_events(events).await;

        let carol_lines = drain(&mut carol);
        assert_eq!(
            Some(&":ircserv.local 482 carol #p :You're not channel operator".to_string()),
            carol_lines.last()
        );
        assert!(!drain(&mut bob).iter().any(|line| line.contains(" KICK ")));
    }

    #[tokio::test]
    async fn dispatcher_kickbyoperator_removestargetfromchannel() {
        let mut events = VecDeque::new();
        let bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #p");

        let mut carol = connect(&mut events);
        register(&mut events, &carol, "carol");
        send(&mut events, &carol, "JOIN #p");

        send(&mut events, &bob, "KICK #p carol :flooding");
        send(&mut events, &carol, "PRIVMSG #p :still here?");

        run_events(events).await;

        let lines = drain(&mut carol);
        assert!(lines.contains(&":bob!bob@127.0.0.1 KICK #p carol :flooding".to_string()));
        assert_eq!(
            Some(&":ircserv.local 404 carol #p :Cannot send to channel".to_string()),
            lines.last()
        );
    }

    #[tokio::test]
    async fn dispatcher_lastmemberparts_channelisdeleted() {
        let mut events = VecDeque::new();
        let mut bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #p");
        send(&mut events, &bob, "PART #p");
        send(&mut events, &bob, "MODE #p");

        run_events(events).await;

        let lines = drain(&mut bob);
        assert!(lines.contains(&":bob!bob@127.0.0.1 PART #p".to_string()));
        assert_eq!(
            Some(&":ircserv.local 403 bob #p :No such channel".to_string()),
            lines.last()
        );
    }

    #[tokio::test]
    async fn dispatcher_privmsgtonick_deliveredonlytothetarget() {
        let mut events = VecDeque::new();
        let mut alice = connect(&mut events);
        register(&mut events, &alice, "alice");
        let mut bob = connect(&mut events);
        register(&mut events, &bob, "bob");

        send(&mut events, &alice, "PRIVMSG bob :psst");

        run_events(events).await;

        let bob_lines = drain(&mut bob);
        assert!(bob_lines.contains(&":alice!alice@127.0.0.1 PRIVMSG bob :psst".to_string()));
        assert!(!drain(&mut alice).iter().any(|line| line.contains("PRIVMSG")));
    }

    #[tokio::test]
    async fn dispatcher_privmsgtochannel_excludesthesender() {
        let mut events = VecDeque::new();
        let mut alice = connect(&mut events);
        register(&mut events, &alice, "alice");
        send(&mut events, &alice, "JOIN #c");
        let mut bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #c");

        send(&mut events, &alice, "PRIVMSG #c :hello all");

        run_events(events).await;

        assert!(drain(&mut bob).contains(&":alice!alice@127.0.0.1 PRIVMSG #c :hello all".to_string()));
        assert!(!drain(&mut alice).iter().any(|line| line.contains("PRIVMSG")));
    }

    #[tokio::test]
    async fn dispatcher_privmsgmissingparams_numberedreplies() {
        let mut events = VecDeque::new();
        let mut alice = connect(&mut events);
        register(&mut events, &alice, "alice");
        send(&mut events, &alice, "PRIVMSG");
        send(&mut events, &alice, "PRIVMSG bob");
        send(&mut events, &alice, "PRIVMSG ghost :anyone?");

        run_events(events).await;

        let lines = drain(&mut alice);
        let len = lines.len();
        assert_eq!(
            ":ircserv.local 411 alice :No recipient given (PRIVMSG)",
            lines[len - 3]
        );
        assert_eq!(":ircserv.local 412 alice :No text to send", lines[len - 2]);
        assert_eq!(
            ":ircserv.local 401 alice ghost :No such nick/channel",
            lines[len - 1]
        );
    }

    #[tokio::test]
    async fn dispatcher_registerednickchange_broadcasttootherclients() {
        let mut events = VecDeque::new();
        let mut alice = connect(&mut events);
        register(&mut events, &alice, "alice");
        let mut bob = connect(&mut events);
        register(&mut events, &bob, "bob");

        send(&mut events, &alice, "NICK alicia");

        run_events(events).await;

        assert!(drain(&mut bob).contains(&":alicia!alice@127.0.0.1 NICK alicia".to_string()));
        assert!(!drain(&mut alice).iter().any(|line| line.contains("NICK")));
    }

    #[tokio::test]
    async fn dispatcher_topicrestrictedchannel_nonoperatorcannotset() {
        let mut events = VecDeque::new();
        let mut bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #c");
        send(&mut events, &bob, "MODE #c +t");

        let mut carol = connect(&mut events);
        register(&mut events, &carol, "carol");
        send(&mut events, &carol, "JOIN #c");
        send(&mut events, &carol, "TOPIC #c :hostile takeover");
        send(&mut events, &bob, "TOPIC #c :the plan");

        run_events(events).await;

        let carol_lines = drain(&mut carol);
        assert!(carol_lines
            .contains(&":ircserv.local 482 carol #c :You're not channel operator".to_string()));
        assert!(carol_lines.contains(&":bob!bob@127.0.0.1 TOPIC #c :the plan".to_string()));
        assert!(drain(&mut bob).contains(&":bob!bob@127.0.0.1 TOPIC #c :the plan".to_string()));
    }

    #[tokio::test]
    async fn dispatcher_quit_broadcastscannedreasontochannels() {
        let mut events = VecDeque::new();
        let alice = connect(&mut events);
        register(&mut events, &alice, "alice");
        send(&mut events, &alice, "JOIN #c");
        let mut bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #c");

        send(&mut events, &alice, "QUIT :off to bed");
        send(&mut events, &alice, "PRIVMSG #c :ghost line");

        run_events(events).await;

        let bob_lines = drain(&mut bob);
        assert!(bob_lines.contains(&":alice!alice@127.0.0.1 QUIT :Client disconnected".to_string()));
        // Lines after QUIT are dropped: nothing was relayed for the ghost.
        assert!(!bob_lines.iter().any(|line| line.contains("ghost line")));
    }

    #[tokio::test]
    async fn dispatcher_disconnect_behaveslikequit() {
        let mut events = VecDeque::new();
        let alice = connect(&mut events);
        register(&mut events, &alice, "alice");
        send(&mut events, &alice, "JOIN #c");
        let mut bob = connect(&mut events);
        register(&mut events, &bob, "bob");
        send(&mut events, &bob, "JOIN #c");

        events.push_back(Event::disconnected(alice.connection_id));
        send(&mut events, &bob, "MODE #c");

        run_events(events).await;

        let bob_lines = drain(&mut bob);
        assert!(bob_lines.contains(&":alice!alice@127.0.0.1 QUIT :Client disconnected".to_string()));
        // The channel survives with bob in it.
        assert!(bob_lines.contains(&":ircserv.local 324 bob #c +".to_string()));
    }

    #[tokio::test]
    async fn dispatcher_unregisteredquit_isquiet() {
        let mut events = VecDeque::new();
        let alice = connect(&mut events);
        register(&mut events, &alice, "alice");
        send(&mut events, &alice, "JOIN #c");

        let mut ghost = connect(&mut events);
        send(&mut events, &ghost, "PASS right");
        events.push_back(Event::disconnected(ghost.connection_id));

        run_events(events).await;

        assert!(drain(&mut ghost).is_empty());
    }
}
