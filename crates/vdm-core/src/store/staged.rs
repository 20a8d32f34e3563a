//! In-flight artifact writer (`.part` file until finalized).

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::model::DownloadArtifact;

/// An artifact being written. Exactly one of `finalize` or `discard` should
/// be called; dropping without either leaves a `.part` file for the
/// retention sweep to pick up.
pub struct StagedArtifact {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
    file_name: String,
    written: u64,
}

impl StagedArtifact {
    pub(super) async fn create(final_path: PathBuf, file_name: String) -> Result<Self> {
        let temp_path = super::temp_path(&final_path);
        let file = File::create(&temp_path)
            .await
            .with_context(|| format!("failed to create staging file: {}", temp_path.display()))?;
        Ok(Self {
            file,
            temp_path,
            final_path,
            file_name,
            written: 0,
        })
    }

    /// Append a chunk to the staging file.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush, sync, and rename into place. After this the artifact is
    /// visible under its final name.
    pub async fn finalize(mut self) -> Result<DownloadArtifact> {
        self.file.flush().await.context("staging flush failed")?;
        self.file.sync_all().await.context("staging sync failed")?;
        drop(self.file);
        tokio::fs::rename(&self.temp_path, &self.final_path)
            .await
            .with_context(|| {
                format!(
                    "failed to finalize artifact: {} -> {}",
                    self.temp_path.display(),
                    self.final_path.display()
                )
            })?;
        Ok(DownloadArtifact {
            file_name: self.file_name,
            byte_len: self.written,
        })
    }

    /// Abandon the artifact and remove the staging file.
    pub async fn discard(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.temp_path).await {
            tracing::debug!(path = %self.temp_path.display(), error = %e, "staging cleanup failed");
        }
    }
}
