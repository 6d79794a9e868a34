//! MIME type detection based on file extensions.

use std::path::Path;

/// Fallback for files whose extension is unknown or missing.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Returns the `Content-Type` for `path`, derived from its extension.
///
/// ```
/// # use warden::http::mime::content_type_for;
/// assert_eq!(content_type_for("index.html"), "text/html");
/// assert_eq!(content_type_for("blob.unknownext"), "application/octet-stream");
/// ```
pub fn content_type_for(path: impl AsRef<Path>) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}
