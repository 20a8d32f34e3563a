//! `vdm evict` – one retention sweep over the artifact directory.

use anyhow::Result;
use vdm_core::config::VdmConfig;
use vdm_core::store::ArtifactStore;

pub fn run_evict(cfg: &VdmConfig) -> Result<()> {
    let store = ArtifactStore::new(cfg.downloads_dir()?, cfg.retention_policy())?;
    let removed = store.evict_expired()?;
    if removed == 0 && cfg.retention.is_none() {
        println!("No retention TTL configured; nothing evicted.");
    } else {
        println!("Evicted {removed} artifact(s).");
    }
    Ok(())
}
