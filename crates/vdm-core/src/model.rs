//! Request/response data model shared by both transport bindings.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// MIME type of every artifact we produce.
pub const MP4_MIME: &str = "video/mp4";

/// A single user submission. Immutable once created.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Metadata reported by the extractor for a video URL.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
}

/// A finalized file in the artifact store.
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    /// Unique name under the store root (`<videoId>-<uuid>.mp4`).
    pub file_name: String,
    pub byte_len: u64,
}

/// Successful fetch: where the file can be picked up and what it is called.
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    /// Relative public path the artifact is served at (`/downloads/<file>`).
    pub download_url: String,
    /// Video title as reported by the extractor.
    pub title: String,
    pub artifact: DownloadArtifact,
}

/// Outcome of a fetch request in the direct-call binding.
///
/// Serializes to the wire shape of the original contract: either
/// `{"downloadUrl": ..., "title": ...}` or `{"error": ...}`, never both.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Success {
        #[serde(rename = "downloadUrl")]
        download_url: String,
        title: String,
    },
    Error {
        error: String,
    },
}

impl Outcome {
    pub fn from_result(result: Result<FetchSuccess, FetchError>) -> Self {
        match result {
            Ok(s) => Outcome::Success {
                download_url: s.download_url,
                title: s.title,
            },
            Err(e) => Outcome::Error {
                error: e.user_message().to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}
