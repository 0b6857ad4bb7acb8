use std::fmt;

/*
<message>  ::= [':' <prefix> <SPACE> ] <command> <params> <crlf>
<prefix>   ::= <servername> | <nick> [ '!' <user> ] [ '@' <host> ]
<command>  ::= <letter> { <letter> } | <number> <number> <number>
<SPACE>    ::= ' ' { ' ' }
<params>   ::= <SPACE> [ ':' <trailing> | <middle> <params> ]

After extracting the parameter list, all parameters are equal, whether
matched by <middle> or <trailing>. <trailing> is just a syntactic trick to
allow SPACE within a parameter.
*/

/// One wire message, split but not validated. Validation (and the numeric
/// reply a violation deserves) belongs to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

/// Splits a line into prefix, command and parameters.
///
/// Total over any input: there is no error case, only an empty command,
/// which callers drop. The command token is kept exactly as the peer sent
/// it — the dispatcher matches uppercase names only, so `join` is an
/// unknown command rather than an alias for `JOIN`.
pub fn parse_message(line: &str) -> IrcMessage {
    let mut rest = line;

    let prefix = if let Some(after_colon) = rest.strip_prefix(':') {
        match after_colon.find(' ') {
            Some(space) => {
                rest = &after_colon[space + 1..];
                Some(after_colon[..space].to_string())
            }
            None => {
                // A prefix with nothing after it carries no command at all.
                return IrcMessage {
                    prefix: Some(after_colon.to_string()),
                    command: String::new(),
                    params: Vec::new(),
                };
            }
        }
    } else {
        None
    };

    let rest = rest.trim_start_matches(' ');
    let (command, mut rest) = match rest.find(' ') {
        Some(space) => (rest[..space].to_string(), &rest[space + 1..]),
        None => (rest.to_string(), ""),
    };

    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_string());
            break;
        }

        match rest.find(' ') {
            Some(space) => {
                params.push(rest[..space].to_string());
                rest = &rest[space + 1..];
            }
            None => {
                params.push(rest.to_string());
                break;
            }
        }
    }

    IrcMessage {
        prefix,
        command,
        params,
    }
}

impl fmt::Display for IrcMessage {
    /// Wire rendering, without the terminator. The last parameter is always
    /// written with a leading colon; that form is always legal and survives
    /// spaces and empty strings, so `parse_message` maps it straight back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        write!(f, "{}", self.command)?;

        if let Some((trailing, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {}", param)?;
            }
            write!(f, " :{}", trailing)?;
        }

        Ok(())
    }
}
