//! Fetch error taxonomy.
//!
//! Every failure of a fetch request is mapped to one of these kinds at the
//! orchestrator boundary; nothing from the extractor propagates past it.
//! Callers get a fixed human-readable message and an HTTP status, never
//! internal detail.

use thiserror::Error;

/// Error outcome of a fetch request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request carried an empty or whitespace-only URL.
    #[error("no video URL provided")]
    MissingUrl,

    /// The URL failed the extractor's cheap syntactic check.
    #[error("URL not supported by the extractor")]
    UnsupportedUrl,

    /// The extractor accepted the URL but metadata lookup or streaming failed.
    /// The payload is logged, not shown to the user.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// The extract-and-persist sequence exceeded the configured deadline.
    #[error("fetch deadline exceeded")]
    TimedOut,

    /// The request's abort token was set while the stream was draining.
    #[error("fetch cancelled")]
    Cancelled,

    /// Anything else (artifact store I/O, staging failures).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl FetchError {
    /// Message surfaced to the user. Fixed per kind; no internal detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::MissingUrl => "Please provide a video URL",
            FetchError::UnsupportedUrl => {
                "Unsupported video URL. Currently only YouTube videos are supported."
            }
            FetchError::ExtractionFailed(_) => {
                "Failed to process video. Please check the URL and try again."
            }
            FetchError::TimedOut => "The video took too long to process. Please try again.",
            FetchError::Cancelled => "The request was cancelled.",
            FetchError::Internal(_) => "An error occurred while processing your request.",
        }
    }

    /// HTTP status for the JSON error body in the HTTP binding.
    pub fn http_status(&self) -> u16 {
        match self {
            FetchError::MissingUrl | FetchError::UnsupportedUrl => 400,
            FetchError::TimedOut => 504,
            FetchError::ExtractionFailed(_) | FetchError::Cancelled | FetchError::Internal(_) => {
                500
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        assert_eq!(FetchError::MissingUrl.http_status(), 400);
        assert_eq!(FetchError::UnsupportedUrl.http_status(), 400);
    }

    #[test]
    fn extraction_errors_are_server_errors() {
        assert_eq!(FetchError::ExtractionFailed("boom".into()).http_status(), 500);
        assert_eq!(FetchError::TimedOut.http_status(), 504);
    }

    #[test]
    fn messages_hide_internal_detail() {
        let err = FetchError::ExtractionFailed("yt-dlp exited with 1".into());
        assert!(!err.user_message().contains("yt-dlp"));
    }
}
