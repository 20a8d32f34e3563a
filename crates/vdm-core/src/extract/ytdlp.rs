//! yt-dlp adapter.
//!
//! `validate` is purely syntactic (scheme + known YouTube host + extractable
//! video id). `metadata` runs `yt-dlp --dump-json`; `open_stream` runs
//! `yt-dlp -o -` and hands the child's stdout to the caller as a stream.
//! The child is owned by the stream and killed when the stream is dropped.

use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{Future, Stream, StreamExt};
use tokio::process::{Child, ChildStdout, Command};
use tokio_util::io::ReaderStream;

use super::{ExtractError, Extractor, FormatSelector, MediaStream};
use crate::model::VideoMetadata;

/// Hosts accepted by the syntactic check.
const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

/// Read buffer for the child's stdout pipe.
const STDOUT_CHUNK_BYTES: usize = 64 * 1024;

/// Extractor backed by the `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtdlpExtractor {
    bin: PathBuf,
    extra_args: Vec<String>,
}

impl Default for YtdlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl YtdlpExtractor {
    /// Use `yt-dlp` from `$PATH`.
    pub fn new() -> Self {
        Self {
            bin: PathBuf::from("yt-dlp"),
            extra_args: Vec::new(),
        }
    }

    /// Use a specific binary and extra arguments (e.g. proxy or cookie flags).
    pub fn with_bin(bin: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            bin: bin.into(),
            extra_args,
        }
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--no-playlist").arg("--no-warnings");
        cmd.args(&self.extra_args);
        cmd.stdin(Stdio::null());
        cmd
    }

    fn format_arg(selector: FormatSelector) -> &'static str {
        match selector {
            // Highest quality with both streams present; plain best as fallback.
            FormatSelector::Best => "best[vcodec!=none][acodec!=none]/best",
        }
    }
}

/// Extracts the video id from a URL, or `None` if the URL is not a
/// recognizable single-video YouTube URL.
fn video_id(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    if !YOUTUBE_HOSTS.contains(&host) {
        return None;
    }

    let candidate: Option<String> = if host == "youtu.be" {
        parsed.path_segments()?.next().map(str::to_string)
    } else {
        match parsed.path() {
            "/watch" => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            path => path
                .strip_prefix("/shorts/")
                .or_else(|| path.strip_prefix("/embed/"))
                .or_else(|| path.strip_prefix("/live/"))
                .map(|rest| rest.split('/').next().unwrap_or_default().to_string()),
        }
    };

    candidate.filter(|id| {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

#[async_trait]
impl Extractor for YtdlpExtractor {
    fn validate(&self, url: &str) -> bool {
        video_id(url).is_some()
    }

    async fn metadata(&self, url: &str) -> Result<VideoMetadata, ExtractError> {
        if !self.validate(url) {
            return Err(ExtractError::Unsupported);
        }

        let output = self
            .base_command()
            .arg("--dump-json")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let line = stderr.lines().last().unwrap_or("no output").trim();
            tracing::warn!(%url, error = %line, "yt-dlp metadata lookup failed");
            return Err(ExtractError::Failed(format!(
                "yt-dlp exited with {}: {}",
                output.status, line
            )));
        }

        serde_json::from_slice::<VideoMetadata>(&output.stdout)
            .map_err(|e| ExtractError::Failed(format!("unparseable yt-dlp JSON: {e}")))
    }

    async fn open_stream(
        &self,
        url: &str,
        selector: FormatSelector,
    ) -> Result<MediaStream, ExtractError> {
        if !self.validate(url) {
            return Err(ExtractError::Unsupported);
        }

        let mut child = self
            .base_command()
            .arg("-f")
            .arg(Self::format_arg(selector))
            .arg("-o")
            .arg("-")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractError::Failed("yt-dlp stdout not captured".into()))?;

        tracing::debug!(%url, "yt-dlp stream started");
        Ok(ChildStream::new(child, stdout).boxed())
    }
}

/// Stream over a child process's stdout that owns the child.
///
/// The stream does not end at stdout EOF: it first awaits the child's exit
/// status, and a non-zero exit is yielded as a final stream error. A child
/// that closes stdout before failing is therefore never mistaken for a
/// clean completion. Dropping the stream kills the child via
/// `kill_on_drop`.
struct ChildStream {
    inner: ReaderStream<ChildStdout>,
    // Owns the child; created up front, polled only after stdout EOF.
    exit: BoxFuture<'static, std::io::Result<ExitStatus>>,
    eof: bool,
    done: bool,
}

impl ChildStream {
    fn new(mut child: Child, stdout: ChildStdout) -> Self {
        Self {
            inner: ReaderStream::with_capacity(stdout, STDOUT_CHUNK_BYTES),
            exit: Box::pin(async move { child.wait().await }),
            eof: false,
            done: false,
        }
    }
}

impl Stream for ChildStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        if !this.eof {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(None) => this.eof = true,
                other => return other,
            }
        }

        match this.exit.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(status)) => {
                this.done = true;
                if status.success() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Err(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("yt-dlp exited with {status}"),
                    ))))
                }
            }
            Poll::Ready(Err(e)) => {
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}
