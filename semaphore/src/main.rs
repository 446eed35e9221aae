//! Semaphore server entry point — config, logging, bind, graceful shutdown.

use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use semaphore::{app, state::build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("semaphore=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════════════╗
  ║           SEMAPHORE — Signal Server                   ║
  ║  Store · Reconcile · Dispatch Gate                    ║
  ╚═══════════════════════════════════════════════════════╝"#);

    // ── 3. Shared state + router ──────────────────────────────────────────────
    let state = build_state();
    let app = app(state);

    // ── 4. Bind & serve ───────────────────────────────────────────────────────
    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8888".to_string())
        .parse()?;

    info!(?addr, "🚀 Semaphore server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // In-flight handlers finish before the process exits; no partial writes.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Semaphore server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received interrupt signal — shutting down");
}
