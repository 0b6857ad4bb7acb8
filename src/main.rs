mod client_listener;
mod client_sender;
mod context;
mod error;
mod events;
mod handlers;
mod message_handler;
mod message_parsing;
mod replies;
mod result;
mod server;
mod settings;
mod util;

use std::env;
use std::process::ExitCode;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{error, info};

use settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let settings = match Settings::from_args(env::args()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: ircserv <port> <password>");
            return ExitCode::FAILURE;
        }
    };

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!(error = %e, "unable to install the SIGTERM handler");
            return ExitCode::FAILURE;
        }
    };

    let (shutdown_sender, shutdown_receiver) = mpsc::channel::<()>(1);
    let mut server_task =
        tokio::spawn(async move { server::run(&settings, shutdown_receiver).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupt received, shutting down"),
        _ = sigterm.recv() => info!("termination requested, shutting down"),
        result = &mut server_task => return exit_code(result),
    }

    if shutdown_sender.send(()).await.is_err() {
        error!("unable to propagate the shutdown signal");
    }

    exit_code(server_task.await)
}

fn exit_code(result: std::result::Result<result::Result<()>, JoinError>) -> ExitCode {
    match result {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!(error = %e, "server terminated");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "server task failed");
            ExitCode::FAILURE
        }
    }
}
