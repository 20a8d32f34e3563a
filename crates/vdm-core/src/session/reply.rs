//! Content-type dispatch for the HTTP binding's responses.
//!
//! The server signals failure with a JSON body and success with a binary
//! one; there is no JSON success envelope. The client therefore inspects
//! the content type first and only then decides how to read the body.

use bytes::Bytes;
use serde::Deserialize;

use crate::naming::{parse_content_disposition_filename, DEFAULT_CLIENT_FILENAME};

/// Classified server response.
#[derive(Debug)]
pub enum ServerReply {
    /// JSON `{error}` body (or a non-success status with no JSON).
    Error { message: String },
    /// Binary payload with its suggested filename.
    Payload { file_name: String, body: Bytes },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Fallback when the error body cannot be parsed.
const GENERIC_ERROR: &str = "Failed to process video";

/// Classify a response by content type, then status.
///
/// JSON means error regardless of status; a non-2xx status without JSON is
/// reported generically; everything else is a payload whose filename comes
/// from `Content-Disposition`, defaulting when the header is absent or
/// unparseable.
pub fn classify(
    status: u16,
    content_type: Option<&str>,
    content_disposition: Option<&str>,
    body: Bytes,
) -> ServerReply {
    let is_json = content_type
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    if is_json {
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| GENERIC_ERROR.to_string());
        return ServerReply::Error { message };
    }

    if !(200..300).contains(&status) {
        return ServerReply::Error {
            message: format!("Error: HTTP {status}"),
        };
    }

    let file_name = content_disposition
        .and_then(parse_content_disposition_filename)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_CLIENT_FILENAME.to_string());

    ServerReply::Payload { file_name, body }
}
