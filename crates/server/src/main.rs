use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use fulfillment_server::config::FulfillmentConfig;

/// Commit fulfillment worker.
#[derive(Parser, Debug)]
#[command(
    name = "fulfillment-server",
    about = "Consumes commit requests, commits reservations and publishes replies"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "fulfillment.toml")]
    config: String,

    /// Override the source identifier sent as `AIT-ID`.
    #[arg(long)]
    source_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config_found = Path::new(&cli.config).exists();
    let mut config = FulfillmentConfig::load(Path::new(&cli.config))?;
    if let Some(source_id) = cli.source_id {
        config.source_id = source_id;
    }
    config.validate()?;

    fulfillment_server::telemetry::init(&config.logging);

    if !config_found {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    let controller = Arc::new(fulfillment_server::app::build_controller(&config)?);
    info!(
        source_id = %config.source_id,
        url = %config.commit.url,
        reply_topic = %config.kafka.reply_topic,
        "fulfillment controller ready"
    );

    let cancel = CancellationToken::new();
    let tracker = TaskTracker::new();
    fulfillment_server::app::spawn_listeners(&config, &controller, &tracker, &cancel)?;
    tracker.close();

    let signalled = tokio::select! {
        () = shutdown_signal() => true,
        () = cancel.cancelled() => false,
    };
    if signalled {
        info!("shutdown signal received, draining listeners");
    } else {
        error!("a listener stopped, draining the others");
    }
    cancel.cancel();
    tracker.wait().await;

    let metrics = controller.metrics().snapshot();
    info!(
        received = metrics.received,
        succeeded = metrics.succeeded,
        malformed = metrics.malformed,
        internal_error = metrics.internal_error,
        nacked_invoke = metrics.nacked_invoke,
        nacked_publish = metrics.nacked_publish,
        "fulfillment-server shut down"
    );

    if !signalled {
        return Err("listener stopped before shutdown was requested".into());
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
