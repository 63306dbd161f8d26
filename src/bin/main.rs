//! openv CLI

use std::process::ExitCode;
use clap::Parser;
use op_env::cli::{self, Cli};
use op_env::error::report;
use op_env::{logger, Controller, DockerGateway};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %report(&e), "Command failed");
            eprintln!("{}", report(&e));
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> op_env::Result<()> {
    let Some(action) = cli.action() else {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    };

    let config = cli.config()?;
    tracing::debug!(
        nodes = config.nodes,
        engine_version = config.engine_version.as_deref().unwrap_or("default"),
        plane_version = %config.plane.version,
        "Configuration resolved"
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let gateway = DockerGateway::connect()?;
    let mut controller = Controller::new(gateway, config.plane);
    cli::execute(action, &mut controller, &cancel).await
}
