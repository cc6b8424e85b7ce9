mod app;
mod db;
mod prelude;
mod utils;
mod views;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context as _;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use utils::config::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::tracing::init()?;

    // Load the server config
    let file = std::env::args().nth(1).context("usage: hooklogic <config.toml>")?;
    let config = Config::load(&file).await?;

    let state = app::init(config.clone()).await?;
    let app = app::build(&state)?.into_make_service_with_connect_info::<SocketAddr>();

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    tracing::info!("Live at {}", config.net.addr);
    match &config.net.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .with_context(|| format!("loading tls cert={:?} key={:?}", tls.cert, tls.key))?;
            axum_server::bind_rustls(config.net.addr, rustls).handle(handle).serve(app).await?;
        }
        None => axum_server::bind(config.net.addr).handle(handle).serve(app).await?,
    }

    // Don't drop notifications for submissions we already acknowledged
    state.mailer.drain().await;
    tracing::info!("Shut down");

    Ok(())
}

/// Stop accepting connections on Ctrl+C or SIGTERM, giving in-flight requests a moment to finish.
async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
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

    tracing::info!("Shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
