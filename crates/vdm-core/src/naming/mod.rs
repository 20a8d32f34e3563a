//! Artifact and attachment naming.
//!
//! Artifact names must be unique per request (`<videoId>-<uuid>.mp4`);
//! attachment filenames are derived from the video title and must be safe to
//! put in a `Content-Disposition` header and to save on the client's disk.

mod content_disposition;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use sanitize::sanitize_filename;

/// Filename the client falls back to when the server sends no usable
/// `Content-Disposition`.
pub const DEFAULT_CLIENT_FILENAME: &str = "video.mp4";

/// Collision-resistant artifact name: `<videoId>-<uuid-v4>.mp4`.
///
/// Concurrent requests for the same video get distinct names by
/// construction. The id component is sanitized so an extractor can never
/// smuggle path separators into the store.
pub fn unique_artifact_name(video_id: &str) -> String {
    let id = sanitize_filename(video_id);
    let id = if id.is_empty() { "video".to_string() } else { id };
    format!("{}-{}.mp4", id, uuid::Uuid::new_v4())
}

/// Attachment filename for a video title: `<sanitized title>.mp4`.
pub fn attachment_filename(title: &str) -> String {
    let stem = sanitize_filename(title);
    if stem.is_empty() {
        DEFAULT_CLIENT_FILENAME.to_string()
    } else {
        format!("{stem}.mp4")
    }
}

/// Full `Content-Disposition` value for a successful binary response.
pub fn content_disposition_value(title: &str) -> String {
    format!("attachment; filename=\"{}\"", attachment_filename(title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_unique_for_same_id() {
        let a = unique_artifact_name("abc123");
        let b = unique_artifact_name("abc123");
        assert_ne!(a, b);
        assert!(a.starts_with("abc123-"));
        assert!(a.ends_with(".mp4"));
    }

    #[test]
    fn artifact_name_sanitizes_hostile_id() {
        let name = unique_artifact_name("../../etc/passwd");
        assert!(!name.contains('/'));
        assert!(!name.starts_with('.'));
    }

    #[test]
    fn artifact_name_empty_id_falls_back() {
        let name = unique_artifact_name("");
        assert!(name.starts_with("video-"));
    }

    #[test]
    fn attachment_filename_from_title() {
        assert_eq!(attachment_filename("Sample"), "Sample.mp4");
        assert_eq!(attachment_filename(""), "video.mp4");
        assert_eq!(attachment_filename("a/b"), "a_b.mp4");
    }

    #[test]
    fn content_disposition_is_quoted_attachment() {
        assert_eq!(
            content_disposition_value("Sample"),
            "attachment; filename=\"Sample.mp4\""
        );
    }
}
