//! hola server
//!
//! - `GET /`        : 200 ms of simulated work, instrumented
//! - `GET /metrics` : Prometheus scrape endpoint
//!
//! Listens on `0.0.0.0:5000`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hola_core::error::{HolaError, Result};
use hola_server::{app_state::AppState, router, LISTEN};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "hola-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let state = AppState::new()?;
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(LISTEN)
        .await
        .map_err(|e| HolaError::io(format!("bind {LISTEN}"), e))?;

    tracing::info!(listen = LISTEN, "hola-server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HolaError::io("serve", e))?;

    tracing::info!("hola-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
