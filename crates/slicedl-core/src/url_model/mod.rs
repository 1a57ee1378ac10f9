//! Output filename hint from the resource URL.

mod path;

pub use path::filename_from_url_path;

/// Fallback when the URL path has no usable last segment.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Last URL path segment, or `download.bin`.
pub fn default_output_name(url: &str) -> String {
    filename_from_url_path(url).unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}
