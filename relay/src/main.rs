//! Twilio Relay - webhook receiver and forwarder.
//!
//! This binary:
//! - Receives Twilio message webhooks
//! - Returns empty TwiML immediately
//! - Forwards each message to the downstream application without blocking
//!
//! The process refuses to start without `MAIN_APP_URL` and `MAIN_APP_API_KEY`.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::config::parse_flag;
use relay::{router, AppState, Config, Forwarder};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging comes up before config so a config failure is still logged;
    // DEBUG is read directly for the default filter level.
    let debug_default = std::env::var("DEBUG")
        .map(|v| parse_flag(&v))
        .unwrap_or(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug_default { "debug" } else { "info" })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "config_invalid");
            return Err(e).context("Invalid configuration");
        }
    };
    info!(
        port = config.port,
        main_app_url = %config.main_app_url,
        api_key_configured = !config.main_app_api_key.is_empty(),
        debug = config.debug,
        forward_timeout_ms = config.forward_timeout.as_millis() as u64,
        "config_loaded"
    );

    let forwarder = Forwarder::new(&config)?;
    info!(endpoint = %forwarder.endpoint(), "forwarder_created");

    let port = config.port;
    let app = router(AppState::new(config, forwarder));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "sigint_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
