use frpsctl::api::{ControlServer, PKG_NAME, VERSION};
use frpsctl::config::Config;
use frpsctl::paths::{self, PathSet, SystemRegistry};
use frpsctl::process::SystemProcessHost;
use frpsctl::service::ControlService;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frpsctl=debug".parse().expect("valid log directive")),
        )
        .init();

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let config = Config::load_or_default(config_path.as_deref()).map_err(|e| {
        error!(path = ?config_path, error = %e, "Failed to load configuration");
        e
    })?;

    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Using default configuration"),
    }

    // Discover the frps install once; the result never changes afterwards
    let frps_paths = paths::resolve(&config.discovery, &SystemRegistry);

    print_startup_banner(&config, &frps_paths);

    let service = Arc::new(ControlService::from_config(
        &config,
        frps_paths,
        Arc::new(SystemProcessHost),
    ));

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let bind_addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .map_err(|e| {
            error!(bind = %config.server.bind, port = config.server.port, error = %e, "Invalid bind address");
            anyhow::anyhow!("Invalid bind address: {}", e)
        })?;

    let server = ControlServer::bind(bind_addr, service, shutdown_rx).await?;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!(error = %e, "Control server error");
        }
    });

    // Wait for shutdown signal (Ctrl+C or SIGTERM)
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), shutting down...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down...");
    }

    // Signal shutdown; frps itself is left running
    let _ = shutdown_tx.send(true);

    if tokio::time::timeout(Duration::from_secs(5), server_handle)
        .await
        .is_err()
    {
        warn!("Control server did not stop within 5 seconds");
    }

    info!("Shutdown complete");
    Ok(())
}

fn print_startup_banner(config: &Config, frps_paths: &PathSet) {
    info!(name = PKG_NAME, version = VERSION, "Starting frps control panel");
    info!(
        bind = %config.server.bind,
        port = config.server.port,
        "Server configuration"
    );
    info!(
        executable_names = ?config.discovery.executable_names,
        version_timeout_secs = config.process.version_timeout_secs,
        "Process settings"
    );
    if frps_paths.is_complete() {
        info!(
            config = ?frps_paths.config,
            executable = ?frps_paths.executable,
            log = ?frps_paths.log,
            "frps install found"
        );
    } else {
        warn!(
            config = ?frps_paths.config,
            executable = ?frps_paths.executable,
            "frps install incomplete; start and config operations will report not found"
        );
    }
}
