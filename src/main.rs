//! xmms2-mpris entry point.
//!
//! Loads configuration, connects to the XMMS2 daemon and exports it on the
//! session bus until the daemon goes away or the process is interrupted.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use xmms2_mpris::{
    Result,
    cli::Cli,
    config::Config,
    mpris::MprisServer,
    services::{bridge::BridgeService, xmms2::Xmms2Client},
    tracing_config,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("xmms2-mpris: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match tracing_config::init(&config.general) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("xmms2-mpris: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "bridge failed");
            eprintln!("xmms2-mpris: {e}");
            ExitCode::FAILURE
        }
    }
}

#[instrument(skip_all)]
async fn run(config: Config) -> Result<()> {
    let ipc_path = config.daemon.resolved_ipc_path();
    let client = Xmms2Client::connect(&ipc_path, &config.daemon.client_name).await?;

    let (service, signals) =
        BridgeService::new(Arc::new(client.clone()), config.mpris.app_identity());
    let server = MprisServer::start(
        &config.mpris.bus_suffix,
        service.exporter(),
        service.commands(),
        signals,
    )
    .await?;

    tokio::spawn(stop_on_signal(service.shutdown_token()));

    info!(bus_name = server.bus_name(), "bridge running");
    let result = service.run().await;

    server.finish().await;
    client.close();

    result?;
    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM
async fn stop_on_signal(shutdown: CancellationToken) {
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "cannot listen for SIGINT");
                return;
            }
            info!("interrupted");
        }
        () = terminate => info!("terminated"),
        () = shutdown.cancelled() => return,
    }

    shutdown.cancel();
}
