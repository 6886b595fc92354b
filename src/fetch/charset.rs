//! Charset detection from response `Content-Type` metadata.

use encoding_rs::Encoding;

use super::constants::DEFAULT_TEXT_CHARSET;
use super::error::FetchError;
use super::response::FetchResponse;

const CHARSET_MARKER: &str = "; charset=";

/// Returns the charset a response body should be decoded with, if any.
///
/// `None` means the body is opaque binary and should be copied byte for byte.
#[must_use]
pub fn resolve_charset(response: &FetchResponse) -> Option<String> {
    response
        .header("Content-Type")
        .and_then(charset_from_content_type)
}

/// Extracts the charset from a raw `Content-Type` value.
///
/// The label after `; charset=` wins (quotes and trailing parameters are
/// dropped). Otherwise `text/*` media types fall back to `ISO-8859-1`, and
/// everything else has no charset.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    if let Some(pos) = content_type.find(CHARSET_MARKER) {
        let label = content_type[pos + CHARSET_MARKER.len()..]
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches('"');
        return Some(label.to_string());
    }

    content_type
        .starts_with("text/")
        .then(|| DEFAULT_TEXT_CHARSET.to_string())
}

/// Looks up the decoder/encoder for a charset label.
///
/// # Errors
///
/// Returns [`FetchError::UnknownCharset`] for labels outside the WHATWG
/// encoding table.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, FetchError> {
    Encoding::for_label(label.as_bytes()).ok_or_else(|| FetchError::unknown_charset(label))
}
