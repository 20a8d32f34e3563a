//! Client-side session state machine.
//!
//! One machine, two transport bindings: the session does not know whether
//! its transport calls the orchestrator in-process or a remote server over
//! HTTP. States: Idle -> Submitting -> {Ready, Failed} -> Idle.
//!
//! The blob handle held in `Ready` is released exactly once: `release`
//! consumes the handle, and both `reset` and a new submission take it out
//! of the state before anything else happens.

pub mod reply;

use std::path::Path;

use crate::transport::{Delivery, Transport};

/// Message shown when submit is attempted with an empty URL. The request
/// is never issued in that case.
pub const EMPTY_URL_MESSAGE: &str = "Please enter a video URL";

/// Downloaded bytes held client-side, the object-URL analogue.
///
/// Owning the handle is owning the bytes; releasing consumes the handle, so
/// a double release is unrepresentable.
#[derive(Debug)]
pub struct BlobHandle {
    file_name: String,
    data: Vec<u8>,
}

impl BlobHandle {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Write the blob out to `path` (CLI client's "Download Now").
    pub async fn save_to(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, &self.data).await
    }

    /// Drop the held bytes.
    pub fn release(self) {
        tracing::debug!(file = %self.file_name, bytes = self.data.len(), "blob released");
    }
}

/// What a successful submission produced.
#[derive(Debug)]
pub enum ReadyOutcome {
    /// Direct binding: a link into the server's public download area.
    Link { download_url: String, title: String },
    /// HTTP binding: the bytes themselves.
    Blob(BlobHandle),
}

/// Session phase. At most one outcome is observable at any time.
#[derive(Debug)]
pub enum Phase {
    Idle,
    Submitting,
    Ready(ReadyOutcome),
    Failed(String),
}

/// Drives one user interaction: collect URL, submit, render outcome, reset.
#[derive(Debug, Default)]
pub struct ClientSession {
    phase: Phase,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Submitting)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn ready(&self) -> Option<&ReadyOutcome> {
        match &self.phase {
            Phase::Ready(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Submit a URL through `transport`.
    ///
    /// Guards: refused while a submission is in flight; an empty URL fails
    /// locally without issuing a request. Any prior outcome (and blob) is
    /// cleared before the request goes out.
    pub async fn submit<T: Transport>(&mut self, url: &str, transport: &T) -> &Phase {
        if self.is_loading() {
            return &self.phase;
        }
        if url.trim().is_empty() {
            self.clear_outcome();
            self.phase = Phase::Failed(EMPTY_URL_MESSAGE.to_string());
            return &self.phase;
        }

        self.clear_outcome();
        self.phase = Phase::Submitting;

        self.phase = match transport.submit(url).await {
            Ok(Delivery::Link {
                download_url,
                title,
            }) => Phase::Ready(ReadyOutcome::Link {
                download_url,
                title,
            }),
            Ok(Delivery::Payload(blob)) => Phase::Ready(ReadyOutcome::Blob(blob)),
            Err(e) => Phase::Failed(e.message),
        };
        &self.phase
    }

    /// Back to Idle, releasing any held blob. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.clear_outcome();
    }

    fn clear_outcome(&mut self) {
        if let Phase::Ready(ReadyOutcome::Blob(blob)) =
            std::mem::replace(&mut self.phase, Phase::Idle)
        {
            blob.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::transport::TransportError;

    enum Scripted {
        Ok(fn() -> Delivery),
        Err(&'static str),
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn submit(&self, _url: &str) -> Result<Delivery, TransportError> {
            match self {
                Scripted::Ok(make) => Ok(make()),
                Scripted::Err(msg) => Err(TransportError::new(*msg)),
            }
        }
    }

    fn blob_delivery() -> Delivery {
        Delivery::Payload(BlobHandle::new("Sample.mp4", b"0123456789".to_vec()))
    }

    fn link_delivery() -> Delivery {
        Delivery::Link {
            download_url: "/downloads/abc-1.mp4".into(),
            title: "Sample".into(),
        }
    }

    #[tokio::test]
    async fn empty_url_fails_locally() {
        let mut session = ClientSession::new();
        session.submit("  ", &Scripted::Err("should not be called")).await;
        assert_eq!(session.error_message(), Some(EMPTY_URL_MESSAGE));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn success_reaches_ready_with_link() {
        let mut session = ClientSession::new();
        session.submit("https://youtu.be/abc", &Scripted::Ok(link_delivery)).await;
        match session.ready() {
            Some(ReadyOutcome::Link { download_url, title }) => {
                assert_eq!(download_url, "/downloads/abc-1.mp4");
                assert_eq!(title, "Sample");
            }
            other => panic!("expected link outcome, got {other:?}"),
        }
        assert!(session.error_message().is_none());
    }

    #[tokio::test]
    async fn failure_reaches_failed_with_message() {
        let mut session = ClientSession::new();
        session.submit("https://youtu.be/abc", &Scripted::Err("boom")).await;
        assert_eq!(session.error_message(), Some("boom"));
        assert!(session.ready().is_none());
    }

    #[tokio::test]
    async fn resubmit_clears_previous_outcome_first() {
        let mut session = ClientSession::new();
        session.submit("https://youtu.be/abc", &Scripted::Ok(blob_delivery)).await;
        assert!(session.ready().is_some());

        // Second submission fails; only the new outcome is observable.
        session.submit("https://youtu.be/abc", &Scripted::Err("boom")).await;
        assert!(session.ready().is_none());
        assert_eq!(session.error_message(), Some("boom"));
    }

    #[tokio::test]
    async fn reset_releases_blob_and_is_idempotent() {
        let mut session = ClientSession::new();
        session.submit("https://youtu.be/abc", &Scripted::Ok(blob_delivery)).await;
        assert!(session.ready().is_some());

        session.reset();
        assert!(matches!(session.phase(), Phase::Idle));
        // Repeated reset has no blob left to release.
        session.reset();
        session.reset();
        assert!(matches!(session.phase(), Phase::Idle));
    }

    #[tokio::test]
    async fn at_most_one_outcome_visible() {
        let mut session = ClientSession::new();
        session.submit("https://youtu.be/abc", &Scripted::Err("first")).await;
        session.submit("https://youtu.be/abc", &Scripted::Ok(blob_delivery)).await;
        assert!(session.error_message().is_none());
        assert!(session.ready().is_some());
    }
}
