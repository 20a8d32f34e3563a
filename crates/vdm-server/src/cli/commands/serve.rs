//! `vdm serve` – run the HTTP binding.

use std::sync::Arc;

use anyhow::{Context, Result};
use vdm_core::config::VdmConfig;

use super::build_orchestrator;
use crate::server::{self, AppState};

pub async fn run_serve(cfg: &VdmConfig, addr_override: Option<String>) -> Result<()> {
    let orchestrator = build_orchestrator(cfg)?;

    // Sweep leftovers (expired artifacts, stale .part files) from earlier runs.
    let evicted = orchestrator.store().evict_expired()?;
    if evicted > 0 {
        tracing::info!(evicted, "evicted expired artifacts at startup");
    }

    let app = server::router(Arc::new(AppState {
        orchestrator,
        buffer_bytes: cfg.stream_buffer_bytes,
    }));

    let addr = addr_override.unwrap_or_else(|| cfg.listen_addr.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "vdm server listening");
    println!("vdm listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
