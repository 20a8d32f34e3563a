//! `vdm fetch <url>` – one-shot client over either transport binding.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use vdm_core::config::VdmConfig;
use vdm_core::session::{ClientSession, ReadyOutcome};
use vdm_core::transport::{DirectTransport, HttpTransport, Transport};

use super::build_orchestrator;

pub async fn run_fetch(
    cfg: &VdmConfig,
    url: &str,
    remote: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    match remote {
        Some(base) => {
            let transport = HttpTransport::new(&base)?;
            run_session(url, &transport, out, None).await
        }
        None => {
            let orchestrator = build_orchestrator(cfg)?;
            let transport = DirectTransport::new(Arc::clone(&orchestrator));
            let store = orchestrator.store().clone();
            run_session(url, &transport, out, Some(store)).await
        }
    }
}

async fn run_session<T: Transport>(
    url: &str,
    transport: &T,
    out: Option<PathBuf>,
    store: Option<vdm_core::store::ArtifactStore>,
) -> Result<()> {
    let mut session = ClientSession::new();
    session.submit(url, transport).await;

    if let Some(message) = session.error_message() {
        anyhow::bail!("{message}");
    }

    match session.ready() {
        Some(ReadyOutcome::Link {
            download_url,
            title,
        }) => {
            println!("Title: {title}");
            println!("Download URL: {download_url}");
            let file_name = download_url.rsplit('/').next().unwrap_or_default();
            if let Some(path) = store.as_ref().and_then(|s| s.resolve(file_name)) {
                println!("Stored at: {}", path.display());
            }
        }
        Some(ReadyOutcome::Blob(blob)) => {
            let dir = match out {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            let path = dir.join(blob.file_name());
            blob.save_to(&path).await?;
            println!("Saved {} ({} bytes)", path.display(), blob.len());
        }
        None => anyhow::bail!("no outcome for submission"),
    }

    session.reset();
    Ok(())
}
