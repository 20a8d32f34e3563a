//! HTTP binding over the fetch orchestrator.
//!
//! Error outcomes are JSON `{error}` with a 4xx/5xx status; success is the
//! binary file itself with download headers set, streamed from the artifact
//! store with a bounded read buffer. The response content type is the
//! signal callers dispatch on.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use vdm_core::error::FetchError;
use vdm_core::extract::Extractor;
use vdm_core::model::{DownloadRequest, FetchSuccess, MP4_MIME};
use vdm_core::naming;
use vdm_core::orchestrator::Orchestrator;

/// Shared server state.
pub struct AppState<E> {
    pub orchestrator: Arc<Orchestrator<E>>,
    /// Read buffer when streaming artifact bytes into a response.
    pub buffer_bytes: usize,
}

pub fn router<E: Extractor + 'static>(state: Arc<AppState<E>>) -> Router {
    Router::new()
        .route("/download", get(download_query::<E>))
        .route("/", post(download_form::<E>))
        .route("/downloads/:file_name", get(serve_artifact::<E>))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DownloadParams {
    #[serde(default)]
    url: String,
}

async fn download_query<E: Extractor + 'static>(
    State(state): State<Arc<AppState<E>>>,
    Query(params): Query<DownloadParams>,
) -> Response {
    fetch_response(&state, &params.url).await
}

async fn download_form<E: Extractor + 'static>(
    State(state): State<Arc<AppState<E>>>,
    Form(params): Form<DownloadParams>,
) -> Response {
    fetch_response(&state, &params.url).await
}

async fn fetch_response<E: Extractor>(state: &AppState<E>, url: &str) -> Response {
    match state
        .orchestrator
        .try_handle(&DownloadRequest::new(url))
        .await
    {
        Ok(success) => binary_response(state, success).await,
        Err(e) => error_response(&e),
    }
}

async fn binary_response<E: Extractor>(state: &AppState<E>, success: FetchSuccess) -> Response {
    let Some(path) = state
        .orchestrator
        .store()
        .resolve(&success.artifact.file_name)
    else {
        tracing::error!(file = %success.artifact.file_name, "finalized artifact not resolvable");
        return error_response(&FetchError::Internal(anyhow::anyhow!("artifact missing")));
    };

    stream_file(
        path,
        state.buffer_bytes,
        naming::content_disposition_value(&success.title),
    )
    .await
}

async fn serve_artifact<E: Extractor + 'static>(
    State(state): State<Arc<AppState<E>>>,
    Path(file_name): Path<String>,
) -> Response {
    let Some(path) = state.orchestrator.store().resolve(&file_name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Artifact not found" })),
        )
            .into_response();
    };

    let disposition = format!("attachment; filename=\"{file_name}\"");
    stream_file(path, state.buffer_bytes, disposition).await
}

async fn stream_file(path: PathBuf, buffer_bytes: usize, disposition: String) -> Response {
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "artifact open failed");
            return error_response(&FetchError::Internal(e.into()));
        }
    };

    // Stat the handle we will stream from, so the length always matches.
    let byte_len = match file.metadata().await {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "artifact stat failed");
            return error_response(&FetchError::Internal(e.into()));
        }
    };

    let stream = ReaderStream::with_capacity(file, buffer_bytes);
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, MP4_MIME)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, byte_len)
        .body(Body::from_stream(stream));

    match response {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "response build failed");
            error_response(&FetchError::Internal(e.into()))
        }
    }
}

fn error_response(e: &FetchError) -> Response {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(serde_json::json!({ "error": e.user_message() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::StreamExt;

    use vdm_core::control::FetchControl;
    use vdm_core::extract::{ExtractError, FormatSelector, MediaStream};
    use vdm_core::model::VideoMetadata;
    use vdm_core::session::{ClientSession, ReadyOutcome};
    use vdm_core::store::{ArtifactStore, RetentionPolicy};
    use vdm_core::transport::HttpTransport;

    struct StubExtractor;

    #[async_trait]
    impl Extractor for StubExtractor {
        fn validate(&self, url: &str) -> bool {
            url.contains("youtube.com")
        }

        async fn metadata(&self, _url: &str) -> Result<VideoMetadata, ExtractError> {
            Ok(VideoMetadata {
                id: "abc123".into(),
                title: "Sample".into(),
            })
        }

        async fn open_stream(
            &self,
            _url: &str,
            _selector: FormatSelector,
        ) -> Result<MediaStream, ExtractError> {
            Ok(futures::stream::iter(vec![Ok(Bytes::from_static(b"0123456789"))]).boxed())
        }
    }

    async fn spawn_server(dir: &tempfile::TempDir) -> String {
        let store = ArtifactStore::new(dir.path(), RetentionPolicy::default()).unwrap();
        let orchestrator = Arc::new(Orchestrator::new(
            StubExtractor,
            store,
            Arc::new(FetchControl::new()),
            Duration::from_secs(5),
        ));
        let app = router(Arc::new(AppState {
            orchestrator,
            buffer_bytes: 8 * 1024,
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn missing_url_is_400_json() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(&dir).await;

        let resp = reqwest::get(format!("{base}/download")).await.unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        assert!(resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Please provide a video URL");
    }

    #[tokio::test]
    async fn unsupported_url_is_400_json() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(&dir).await;

        let resp = reqwest::get(format!("{base}/download?url=https://vimeo.com/123"))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(
            body["error"],
            "Unsupported video URL. Currently only YouTube videos are supported."
        );
    }

    #[tokio::test]
    async fn success_streams_binary_with_download_headers() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(&dir).await;

        let resp = reqwest::get(format!(
            "{base}/download?url=https://www.youtube.com/watch?v=abc123"
        ))
        .await
        .unwrap();

        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(
            resp.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
            MP4_MIME
        );
        assert_eq!(
            resp.headers()
                .get(reqwest::header::CONTENT_DISPOSITION)
                .unwrap(),
            "attachment; filename=\"Sample.mp4\""
        );
        assert_eq!(resp.content_length(), Some(10));
        assert_eq!(&resp.bytes().await.unwrap()[..], b"0123456789");
    }

    #[tokio::test]
    async fn form_post_binding_matches_query_binding() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(&dir).await;

        let client = reqwest::Client::new();
        let resp = client
            .post(&base)
            .form(&[("url", "https://www.youtube.com/watch?v=abc123")])
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(&resp.bytes().await.unwrap()[..], b"0123456789");
    }

    #[tokio::test]
    async fn persisted_artifact_served_under_downloads_route() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(&dir).await;

        // Fetch once to persist an artifact, then pick its name off disk.
        reqwest::get(format!(
            "{base}/download?url=https://www.youtube.com/watch?v=abc123"
        ))
        .await
        .unwrap();
        let file_name = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .file_name()
            .into_string()
            .unwrap();

        let resp = reqwest::get(format!("{base}/downloads/{file_name}"))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(&resp.bytes().await.unwrap()[..], b"0123456789");

        let missing = reqwest::get(format!("{base}/downloads/nope.mp4"))
            .await
            .unwrap();
        assert_eq!(missing.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn remote_client_session_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(&dir).await;

        let transport = HttpTransport::new(&base).unwrap();
        let mut session = ClientSession::new();
        session
            .submit("https://www.youtube.com/watch?v=abc123", &transport)
            .await;

        match session.ready() {
            Some(ReadyOutcome::Blob(blob)) => {
                assert_eq!(blob.file_name(), "Sample.mp4");
                assert_eq!(blob.bytes(), b"0123456789");
            }
            other => panic!("expected blob, got {other:?}"),
        }
        session.reset();

        session.submit("https://vimeo.com/1", &transport).await;
        assert_eq!(
            session.error_message(),
            Some("Unsupported video URL. Currently only YouTube videos are supported.")
        );
    }
}
