//! Extractor contract: turn a video URL into metadata and a byte stream.
//!
//! The orchestrator only depends on this trait. The one concrete adapter
//! shells out to yt-dlp; tests plug in stubs.

mod ytdlp;

pub use ytdlp::YtdlpExtractor;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::model::VideoMetadata;

/// Media bytes as produced by the extractor, chunk by chunk.
pub type MediaStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Format selection policy. Interpretation is delegated entirely to the
/// adapter; the orchestrator always asks for `Best`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatSelector {
    /// Highest-quality format that carries both audio and video.
    #[default]
    Best,
}

/// Failure reported by an extractor implementation.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// URL is syntactically valid but not something this extractor handles.
    #[error("URL not supported")]
    Unsupported,

    /// The external tool ran but did not produce a usable result.
    #[error("extractor failed: {0}")]
    Failed(String),

    /// Spawning or talking to the external tool failed.
    #[error("extractor I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// External video-extraction capability.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Cheap syntactic/host check. Never performs I/O.
    fn validate(&self, url: &str) -> bool;

    /// Resolve id and title for a URL.
    async fn metadata(&self, url: &str) -> Result<VideoMetadata, ExtractError>;

    /// Open a byte stream for the chosen format.
    async fn open_stream(
        &self,
        url: &str,
        selector: FormatSelector,
    ) -> Result<MediaStream, ExtractError>;
}
