//! Content type lookup
//!
//! Maps a resource name to the `Content-Type` announced for it and repeated in every part of
//! a `multipart/byteranges` body.

use std::path::Path;

/// Fallback for names without a known extension
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for a resource name, by extension (case-insensitive)
///
/// # Examples
/// ```
/// use range_fileserver::http::mime::content_type_for;
/// assert_eq!(content_type_for("/docs/INDEX.HTML"), "text/html; charset=utf-8");
/// assert_eq!(content_type_for("movie.mp4"), "video/mp4");
/// assert_eq!(content_type_for("README"), "application/octet-stream");
/// ```
pub fn content_type_for(name: &str) -> &'static str {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| by_extension(&ext.to_ascii_lowercase()))
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

fn by_extension(extension: &str) -> Option<&'static str> {
    let content_type = match extension {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "xml" => "text/xml; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",

        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",

        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",

        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",

        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "iso" => "application/x-iso9660-image",
        _ => return None,
    };
    Some(content_type)
}
