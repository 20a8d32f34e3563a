//! Transport bindings the client session submits through.
//!
//! `DirectTransport` calls the orchestrator in-process and hands back a
//! link into the public download area. `HttpTransport` talks to a remote
//! vdm server and hands back the bytes themselves, dispatching on the
//! response's content type.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::FetchError;
use crate::extract::Extractor;
use crate::model::DownloadRequest;
use crate::orchestrator::Orchestrator;
use crate::session::reply::{classify, ServerReply};
use crate::session::BlobHandle;

/// User-facing failure of a submission.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<FetchError> for TransportError {
    fn from(e: FetchError) -> Self {
        Self::new(e.user_message())
    }
}

/// What a successful submission delivers to the session.
#[derive(Debug)]
pub enum Delivery {
    /// Relative public path plus title (direct binding).
    Link { download_url: String, title: String },
    /// The downloaded bytes (HTTP binding).
    Payload(BlobHandle),
}

/// A way for the client session to reach the orchestrator.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, url: &str) -> Result<Delivery, TransportError>;
}

/// In-process binding: session and orchestrator share a trust boundary.
pub struct DirectTransport<E> {
    orchestrator: Arc<Orchestrator<E>>,
}

impl<E> DirectTransport<E> {
    pub fn new(orchestrator: Arc<Orchestrator<E>>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl<E: Extractor> Transport for DirectTransport<E> {
    async fn submit(&self, url: &str) -> Result<Delivery, TransportError> {
        let success = self
            .orchestrator
            .try_handle(&DownloadRequest::new(url))
            .await?;
        Ok(Delivery::Link {
            download_url: success.download_url,
            title: success.title,
        })
    }
}

/// Remote binding: submits the URL to a vdm server's `/download` endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpTransport {
    /// `base` is the server origin, e.g. `http://127.0.0.1:8080`.
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let base: reqwest::Url = base.parse()?;
        let endpoint = base.join("/download")?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, url: &str) -> Result<Delivery, TransportError> {
        let mut endpoint = self.endpoint.clone();
        endpoint.query_pairs_mut().append_pair("url", url);

        let response = self.client.get(endpoint).send().await.map_err(|e| {
            tracing::warn!(error = %e, "download request failed");
            TransportError::new("An unexpected error occurred. Please try again.")
        })?;

        let status = response.status().as_u16();
        let content_type = header_string(&response, reqwest::header::CONTENT_TYPE);
        let content_disposition = header_string(&response, reqwest::header::CONTENT_DISPOSITION);

        let body = response.bytes().await.map_err(|e| {
            tracing::warn!(error = %e, "download body read failed");
            TransportError::new("An unexpected error occurred. Please try again.")
        })?;

        match classify(
            status,
            content_type.as_deref(),
            content_disposition.as_deref(),
            body,
        ) {
            ServerReply::Error { message } => Err(TransportError::new(message)),
            ServerReply::Payload { file_name, body } => {
                Ok(Delivery::Payload(BlobHandle::new(file_name, body.to_vec())))
            }
        }
    }
}

fn header_string(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
