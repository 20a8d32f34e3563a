//! Fetch orchestration: validate, extract, persist, map errors.
//!
//! The sequence runs under a single deadline; the stream is copied into the
//! artifact store chunk by chunk, so memory use is bounded by the chunk
//! size rather than the file size. Every extractor failure is converted to
//! a `FetchError` here; nothing propagates past this boundary.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::{timeout_at, Instant};

use crate::control::{AbortToken, FetchControl};
use crate::error::FetchError;
use crate::extract::{ExtractError, Extractor, FormatSelector};
use crate::model::{DownloadRequest, FetchSuccess, Outcome};
use crate::naming;
use crate::store::ArtifactStore;

/// Public route finalized artifacts are served under.
pub const DOWNLOADS_ROUTE: &str = "/downloads";

/// Sequences a fetch request from URL to finalized artifact.
pub struct Orchestrator<E> {
    extractor: E,
    store: ArtifactStore,
    control: Arc<FetchControl>,
    deadline: Duration,
}

impl<E: Extractor> Orchestrator<E> {
    pub fn new(
        extractor: E,
        store: ArtifactStore,
        control: Arc<FetchControl>,
        deadline: Duration,
    ) -> Self {
        Self {
            extractor,
            store,
            control,
            deadline,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn control(&self) -> &Arc<FetchControl> {
        &self.control
    }

    /// Direct-call binding contract: exactly one of success or error.
    pub async fn handle(&self, request: &DownloadRequest) -> Outcome {
        Outcome::from_result(self.try_handle(request).await)
    }

    /// Like `handle`, but keeps the error kind for callers that need a
    /// status code.
    pub async fn try_handle(&self, request: &DownloadRequest) -> Result<FetchSuccess, FetchError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(FetchError::MissingUrl);
        }
        if !self.extractor.validate(url) {
            return Err(FetchError::UnsupportedUrl);
        }

        let (id, token) = self.control.register();
        let result = self.run(url, &token).await;
        self.control.unregister(id);

        if let Err(e) = &result {
            tracing::warn!(%url, error = %e, "fetch failed");
        }
        result
    }

    async fn run(&self, url: &str, token: &AbortToken) -> Result<FetchSuccess, FetchError> {
        let deadline = Instant::now() + self.deadline;

        let meta = timeout_at(deadline, self.extractor.metadata(url))
            .await
            .map_err(|_| FetchError::TimedOut)?
            .map_err(to_fetch_error)?;

        let mut stream = timeout_at(deadline, self.extractor.open_stream(url, FormatSelector::Best))
            .await
            .map_err(|_| FetchError::TimedOut)?
            .map_err(to_fetch_error)?;

        let file_name = naming::unique_artifact_name(&meta.id);
        let mut staged = self
            .store
            .stage(&file_name)
            .await
            .map_err(FetchError::Internal)?;

        loop {
            let next = match timeout_at(deadline, stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    staged.discard().await;
                    return Err(FetchError::TimedOut);
                }
            };

            if token.is_aborted() {
                staged.discard().await;
                return Err(FetchError::Cancelled);
            }

            match next {
                None => break,
                Some(Ok(chunk)) => {
                    if let Err(e) = staged.write_chunk(&chunk).await {
                        staged.discard().await;
                        return Err(FetchError::Internal(
                            anyhow::Error::new(e).context("artifact write failed"),
                        ));
                    }
                }
                Some(Err(e)) => {
                    staged.discard().await;
                    return Err(FetchError::ExtractionFailed(e.to_string()));
                }
            }
        }

        let artifact = staged.finalize().await.map_err(FetchError::Internal)?;
        tracing::info!(
            %url,
            video_id = %meta.id,
            file = %artifact.file_name,
            bytes = artifact.byte_len,
            "fetch complete"
        );

        Ok(FetchSuccess {
            download_url: format!("{}/{}", DOWNLOADS_ROUTE, artifact.file_name),
            title: meta.title,
            artifact,
        })
    }
}

fn to_fetch_error(e: ExtractError) -> FetchError {
    match e {
        ExtractError::Unsupported => FetchError::UnsupportedUrl,
        other => FetchError::ExtractionFailed(other.to_string()),
    }
}
