//! Artifact store: staged writes, atomic finalize, retention.
//!
//! Artifacts are written to `<name>.part` and renamed into place only once
//! the stream has been drained completely, so a partially fetched file is
//! never visible under its final name. The store is an explicit dependency
//! of the orchestrator; retention is a policy it is constructed with, not
//! ambient directory state.

mod staged;

pub use staged::StagedArtifact;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

/// Temporary suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// How long finalized artifacts are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionPolicy {
    /// Artifacts (and stale `.part` files) older than this are evicted.
    /// `None` keeps everything forever.
    pub ttl: Option<Duration>,
}

/// Directory of download artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    policy: RetentionPolicy,
}

impl ArtifactStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, policy: RetentionPolicy) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create artifact dir: {}", root.display()))?;
        Ok(Self { root, policy })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Begin writing an artifact. Bytes go to `<file_name>.part` until
    /// `finalize` renames it into place.
    pub async fn stage(&self, file_name: &str) -> Result<StagedArtifact> {
        if !is_safe_name(file_name) {
            anyhow::bail!("unsafe artifact name: {file_name:?}");
        }
        let final_path = self.root.join(file_name);
        StagedArtifact::create(final_path, file_name.to_string()).await
    }

    /// Path of a finalized artifact, or `None` if the name is unsafe,
    /// still staged, or absent.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        if !is_safe_name(file_name) || file_name.ends_with(TEMP_SUFFIX) {
            return None;
        }
        let path = self.root.join(file_name);
        path.is_file().then_some(path)
    }

    /// Remove everything older than the retention TTL (by mtime), including
    /// stale `.part` files left by crashed requests. Returns the number of
    /// files removed. No-op when the policy keeps artifacts forever.
    pub fn evict_expired(&self) -> Result<usize> {
        let Some(ttl) = self.policy.ttl else {
            return Ok(0);
        };

        let mut removed = 0;
        for entry in std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to read artifact dir: {}", self.root.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let expired = entry
                .metadata()?
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .map(|age| age > ttl)
                .unwrap_or(false);
            if expired {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => {
                        tracing::debug!(path = %entry.path().display(), "evicted artifact");
                        removed += 1;
                    }
                    Err(e) => {
                        tracing::warn!(path = %entry.path().display(), error = %e, "eviction failed")
                    }
                }
            }
        }
        Ok(removed)
    }
}

/// Staging path for a final path: appends `.part`.
pub(crate) fn temp_path(final_path: &Path) -> PathBuf {
    let mut p = final_path.as_os_str().to_owned();
    p.push(TEMP_SUFFIX);
    PathBuf::from(p)
}

/// A name is safe when it stays inside the store root: a single normal
/// path component, no separators, no leading dot.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir, ttl: Option<Duration>) -> ArtifactStore {
        ArtifactStore::new(dir.path(), RetentionPolicy { ttl }).unwrap()
    }

    #[tokio::test]
    async fn stage_write_finalize_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir, None);

        let mut staged = s.stage("abc-1.mp4").await.unwrap();
        staged.write_chunk(b"hello ").await.unwrap();
        staged.write_chunk(b"world").await.unwrap();
        let artifact = staged.finalize().await.unwrap();

        assert_eq!(artifact.file_name, "abc-1.mp4");
        assert_eq!(artifact.byte_len, 11);
        let path = s.resolve("abc-1.mp4").expect("finalized artifact resolves");
        assert_eq!(std::fs::read(path).unwrap(), b"hello world");
        assert!(!dir.path().join("abc-1.mp4.part").exists());
    }

    #[tokio::test]
    async fn staged_artifact_not_resolvable_until_finalized() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir, None);

        let mut staged = s.stage("abc-2.mp4").await.unwrap();
        staged.write_chunk(b"partial").await.unwrap();
        assert!(s.resolve("abc-2.mp4").is_none());
        assert!(s.resolve("abc-2.mp4.part").is_none());
        staged.discard().await;
    }

    #[tokio::test]
    async fn discard_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir, None);

        let mut staged = s.stage("abc-3.mp4").await.unwrap();
        staged.write_chunk(b"doomed").await.unwrap();
        staged.discard().await;

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unsafe_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir, None);

        assert!(s.stage("../escape.mp4").await.is_err());
        assert!(s.stage("a/b.mp4").await.is_err());
        assert!(s.stage("").await.is_err());
        assert!(s.resolve("../../etc/passwd").is_none());
    }

    #[tokio::test]
    async fn evict_removes_only_expired() {
        let dir = tempfile::tempdir().unwrap();

        let keep_all = store(&dir, None);
        let mut staged = keep_all.stage("old.mp4").await.unwrap();
        staged.write_chunk(b"x").await.unwrap();
        staged.finalize().await.unwrap();

        assert_eq!(keep_all.evict_expired().unwrap(), 0);

        let long_ttl = store(&dir, Some(Duration::from_secs(3600)));
        assert_eq!(long_ttl.evict_expired().unwrap(), 0);
        assert!(long_ttl.resolve("old.mp4").is_some());

        // Make sure the file's age is measurably above zero.
        std::thread::sleep(Duration::from_millis(20));
        let zero_ttl = store(&dir, Some(Duration::ZERO));
        assert_eq!(zero_ttl.evict_expired().unwrap(), 1);
        assert!(zero_ttl.resolve("old.mp4").is_none());
    }
}
