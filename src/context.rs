use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Clone)]
pub struct ServerContext {
    pub start_time: DateTime<Utc>,
    pub server_host: String,
    pub version: String,
    pub password: String,
}

/// Per-connection state, owned by the message handler and mutated only on
/// behalf of lines arriving from that same connection.
pub struct ConnectionContext {
    pub connection_id: Uuid,
    pub host: String,
    pub authenticated: bool,
    pub registered: bool,
    pub welcome_sent: bool,
    pub nick: Option<String>,
    pub user: Option<String>,
    pub real_name: Option<String>,
}

impl ConnectionContext {
    pub fn new(connection_id: Uuid, host: String) -> Self {
        ConnectionContext {
            connection_id,
            host,
            authenticated: false,
            registered: false,
            welcome_sent: false,
            nick: None,
            user: None,
            real_name: None,
        }
    }

    /// The `nick!user@host` source this connection's messages are relayed
    /// under once it is registered.
    pub fn prefix(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nick.as_deref().unwrap_or(""),
            self.user.as_deref().unwrap_or(""),
            self.host
        )
    }

    /// Numeric replies address a client by nickname, or `*` before one is set.
    pub fn nick_or_star(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    /// Recomputes the registered predicate. Returns true on the rising edge,
    /// which is the one moment the welcome burst may be sent.
    pub fn try_register(&mut self) -> bool {
        if self.registered || !self.authenticated || self.nick.is_none() || self.user.is_none() {
            return false;
        }

        self.registered = true;
        true
    }
}

#[derive(Default)]
pub struct ChannelContext {
    /// Insertion order is retained so the NAMES listing is stable.
    pub members: Vec<Uuid>,
    pub operators: HashSet<Uuid>,
    pub invited: HashSet<Uuid>,
    pub topic: Option<String>,
    pub invite_only: bool,
    pub topic_restricted: bool,
    pub key: Option<String>,
    pub user_limit: Option<usize>,
}

impl ChannelContext {
    pub fn is_member(&self, connection_id: Uuid) -> bool {
        self.members.contains(&connection_id)
    }

    pub fn is_operator(&self, connection_id: Uuid) -> bool {
        self.operators.contains(&connection_id)
    }

    pub fn add_member(&mut self, connection_id: Uuid) {
        if !self.is_member(connection_id) {
            self.members.push(connection_id);
        }
    }

    /// Drops a member along with any operator grant it held.
    pub fn remove_member(&mut self, connection_id: Uuid) {
        self.members.retain(|member| *member != connection_id);
        self.operators.remove(&connection_id);
    }

    /// The `+flags [args…]` summary used by RPL_CHANNELMODEIS.
    pub fn mode_string(&self) -> String {
        let mut flags = String::from("+");
        let mut arguments: Vec<String> = Vec::new();

        if self.invite_only {
            flags.push('i');
        }
        if self.topic_restricted {
            flags.push('t');
        }
        if let Some(key) = &self.key {
            flags.push('k');
            arguments.push(key.clone());
        }
        if let Some(limit) = self.user_limit {
            flags.push('l');
            arguments.push(limit.to_string());
        }

        if arguments.is_empty() {
            flags
        } else {
            format!("{} {}", flags, arguments.join(" "))
        }
    }
}
