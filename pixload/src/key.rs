//! Request fingerprints.
//!
//! The key identifies a (source, options, transformations) combination. It
//! is used as the memory cache key and as the deduplication key for
//! in-flight requests, so two requests with equal keys must produce the
//! same pixels.

use crate::source::{DecodeOptions, ImageSource, Transformation};
use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

const KEY_PADDING: usize = 50;

/// Builds the fingerprint for a request.
///
/// One line per component, each terminated by `\n`: the path (or resource
/// id), then `resize:`, `rotation:` and `scale:` lines for the options that
/// are set, then every transformation key in call order.
pub fn create_key(
    source: &ImageSource,
    options: Option<&DecodeOptions>,
    transformations: &[Arc<dyn Transformation>],
) -> String {
    let mut key = match source {
        ImageSource::Content(uri) | ImageSource::Stream(uri) => {
            let mut key = String::with_capacity(uri.len() + KEY_PADDING);
            key.push_str(uri);
            key
        }
        ImageSource::File(path) => file_key(path),
        ImageSource::Resource(id) => {
            let mut key = String::with_capacity(KEY_PADDING);
            let _ = write!(key, "{}", id);
            key
        }
    };
    key.push('\n');

    if let Some(options) = options {
        if let Some((width, height)) = options.resize {
            let _ = writeln!(key, "resize:{}x{}", width, height);
        }
        if let Some(rotation) = options.rotation {
            let _ = write!(key, "rotation:{}", rotation.degrees);
            if let Some((x, y)) = rotation.pivot {
                let _ = write!(key, "@{}x{}", x, y);
            }
            key.push('\n');
        }
        if let Some((x, y)) = options.scale {
            let _ = writeln!(key, "scale:{}x{}", x, y);
        }
    }

    for transformation in transformations {
        key.push_str(&transformation.key());
        key.push('\n');
    }

    key
}

/// Key text for a file path.
///
/// UTF-8 paths are used as-is. Any other path starts with a NUL, which no
/// real path contains, followed by its bytes with backslashes doubled and
/// invalid sequences written as `\xNN`, so distinct paths never share a key.
fn file_key(path: &Path) -> String {
    if let Some(text) = path.to_str() {
        let mut key = String::with_capacity(text.len() + KEY_PADDING);
        key.push_str(text);
        return key;
    }

    let bytes = path.as_os_str().as_encoded_bytes();
    let mut key = String::with_capacity(bytes.len() * 2 + KEY_PADDING);
    key.push('\0');
    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            if c == '\\' {
                key.push('\\');
            }
            key.push(c);
        }
        for byte in chunk.invalid() {
            let _ = write!(key, "\\x{:02x}", byte);
        }
    }
    key
}

/// Renders transformation keys as `[a, b, c]` for diagnostics.
pub fn transformation_keys(transformations: &[Arc<dyn Transformation>]) -> String {
    let mut out = String::with_capacity(transformations.len() * 16 + 2);
    out.push('[');
    for (i, transformation) in transformations.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&transformation.key());
    }
    out.push(']');
    out
}
