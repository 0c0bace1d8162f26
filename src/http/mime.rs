//! MIME type detection module
//!
//! Screenshots are the only files the service stores or serves, so the table
//! is limited to image formats plus the fallback.

use std::path::Path;

/// Image extensions accepted for screenshot uploads
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Get MIME Content-Type based on file extension
///
/// # Examples
/// ```
/// use bookmark_router::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("png")), "image/png");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Content-Type for a stored file name
pub fn content_type_for(file_name: &str) -> &'static str {
    get_content_type(extension_of(file_name).as_deref())
}

/// Lower-cased extension of a file name, if any
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
