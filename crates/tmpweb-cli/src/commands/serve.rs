//! Serve command implementation.

use crate::cli::ServeArgs;
use crate::output::OutputFormatter;
use crate::server::AppState;
use crate::server::create_router;
use anyhow::Context;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tmpweb_core::SiteLifecycle;

pub async fn execute(
    args: &ServeArgs,
    lifecycle: Arc<SiteLifecycle>,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let app = create_router(AppState::new(lifecycle));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "listening");
    formatter.format_listening(local_addr)?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::SignalKind;
        use tokio::signal::unix::signal;
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
