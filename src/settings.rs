use crate::error::Error;
use crate::result::Result;

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub password: String,
}

impl Settings {
    /// Builds settings from the process arguments, validating the port range
    /// and the password shape before the server ever touches a socket.
    pub fn from_args<I>(mut args: I) -> Result<Self>
    where
        I: Iterator<Item = String>,
    {
        let _program = args.next();

        let (port, password) = match (args.next(), args.next(), args.next()) {
            (Some(port), Some(password), None) => (port, password),
            _ => return Err(Error::Usage),
        };

        let port: u16 = port.parse().map_err(|_| Error::InvalidPort)?;
        if port < 1024 {
            return Err(Error::InvalidPort);
        }

        if password.is_empty()
            || password.len() > 50
            || password.chars().any(char::is_whitespace)
        {
            return Err(Error::InvalidPassword);
        }

        Ok(Settings { port, password })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args<'a>(raw: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
        std::iter::once("ircserv".to_string()).chain(raw.iter().map(|s| s.to_string()))
    }

    #[test]
    fn from_args_validinvocation_parses() {
        let settings = Settings::from_args(args(&["6667", "hunter2"])).unwrap();
        assert_eq!(6667, settings.port);
        assert_eq!("hunter2", settings.password);
    }

    #[test]
    fn from_args_missingpassword_isusageerror() {
        assert!(matches!(
            Settings::from_args(args(&["6667"])),
            Err(Error::Usage)
        ));
    }

    #[test]
    fn from_args_extraargument_isusageerror() {
        assert!(matches!(
            Settings::from_args(args(&["6667", "hunter2", "extra"])),
            Err(Error::Usage)
        ));
    }

    #[test]
    fn from_args_nonnumericport_isrejected() {
        assert!(matches!(
            Settings::from_args(args(&["sixes", "hunter2"])),
            Err(Error::InvalidPort)
        ));
    }

    #[test]
    fn from_args_privilegedport_isrejected() {
        assert!(matches!(
            Settings::from_args(args(&["80", "hunter2"])),
            Err(Error::InvalidPort)
        ));
    }

    #[test]
    fn from_args_portoverflow_isrejected() {
        assert!(matches!(
            Settings::from_args(args(&["70000", "hunter2"])),
            Err(Error::InvalidPort)
        ));
    }

    #[test]
    fn from_args_emptypassword_isrejected() {
        assert!(matches!(
            Settings::from_args(args(&["6667", ""])),
            Err(Error::InvalidPassword)
        ));
    }

    #[test]
    fn from_args_whitespacepassword_isrejected() {
        assert!(matches!(
            Settings::from_args(args(&["6667", "hunter two"])),
            Err(Error::InvalidPassword)
        ));
    }

    #[test]
    fn from_args_overlongpassword_isrejected() {
        let long = "a".repeat(51);
        assert!(matches!(
            Settings::from_args(args(&["6667", &long])),
            Err(Error::InvalidPassword)
        ));
    }
}
