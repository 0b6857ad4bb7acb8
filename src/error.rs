use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("expected exactly two arguments: <port> <password>")]
    Usage,
    #[error("port must be an integer between 1024 and 65535")]
    InvalidPort,
    #[error("password must be 1 to 50 characters with no whitespace")]
    InvalidPassword,
    #[error("unable to bind to port {port}: {source}")]
    Bind { port: u16, source: io::Error },
    #[error("listener failed: {0}")]
    Listener(#[source] io::Error),
}
