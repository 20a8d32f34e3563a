mod evict;
mod fetch;
mod serve;

pub use evict::run_evict;
pub use fetch::run_fetch;
pub use serve::run_serve;

use std::sync::Arc;

use anyhow::Result;
use vdm_core::config::VdmConfig;
use vdm_core::control::FetchControl;
use vdm_core::extract::YtdlpExtractor;
use vdm_core::orchestrator::Orchestrator;
use vdm_core::store::ArtifactStore;

/// Wire an orchestrator from the loaded configuration.
pub(crate) fn build_orchestrator(cfg: &VdmConfig) -> Result<Arc<Orchestrator<YtdlpExtractor>>> {
    let store = ArtifactStore::new(cfg.downloads_dir()?, cfg.retention_policy())?;
    let extractor = match &cfg.extractor {
        Some(e) => YtdlpExtractor::with_bin(
            e.bin.clone().unwrap_or_else(|| "yt-dlp".into()),
            e.extra_args.clone(),
        ),
        None => YtdlpExtractor::new(),
    };
    Ok(Arc::new(Orchestrator::new(
        extractor,
        store,
        Arc::new(FetchControl::new()),
        cfg.fetch_timeout(),
    )))
}
