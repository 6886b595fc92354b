//! Error types for the fetch module.
//!
//! Every variant carries the context (URL, path, offending value) needed to
//! produce a useful diagnostic without the caller re-attaching it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while issuing a request or copying its response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL being fetched.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The provided URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The URL does not name an HTTP(S) resource.
    #[error("expected an http or https URL, got {url}")]
    UnsupportedScheme {
        /// The offending URL.
        url: String,
    },

    /// A configured request header could not be sent on the wire.
    #[error("invalid request header {name:?}")]
    InvalidHeader {
        /// The header name as supplied.
        name: String,
    },

    /// A redirect response did not say where to go.
    #[error("HTTP {status} from {url} has no usable Location header")]
    MissingLocation {
        /// The URL that answered with a redirect.
        url: String,
        /// The redirect status code.
        status: u16,
    },

    /// The opt-in redirect cap was reached.
    #[error("stopped after {limit} redirects at {url}")]
    TooManyRedirects {
        /// The URL of the last redirect response.
        url: String,
        /// The configured cap.
        limit: u32,
    },

    /// The upload body file does not exist.
    #[error("upload file not found: {path}")]
    UploadFileNotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// File system error while preparing an upload or opening an output file.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the response body or writing the sink failed mid-copy.
    #[error("stream error copying response body: {source}")]
    Stream {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The declared Content-Length is not a non-negative decimal integer.
    #[error("malformed Content-Length: {value:?}")]
    InvalidContentLength {
        /// The raw header value.
        value: String,
    },

    /// The response charset is not one we can decode.
    #[error("unsupported charset: {label:?}")]
    UnknownCharset {
        /// The charset label from the response.
        label: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an unsupported scheme error.
    pub fn unsupported_scheme(url: impl Into<String>) -> Self {
        Self::UnsupportedScheme { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a mid-copy stream error.
    pub fn stream(source: std::io::Error) -> Self {
        Self::Stream { source }
    }

    /// Creates a malformed Content-Length error.
    pub fn invalid_content_length(value: impl Into<String>) -> Self {
        Self::InvalidContentLength {
            value: value.into(),
        }
    }

    /// Creates an unknown charset error.
    pub fn unknown_charset(label: impl Into<String>) -> Self {
        Self::UnknownCharset {
            label: label.into(),
        }
    }
}

// No From<reqwest::Error> or From<std::io::Error>: each variant needs the URL
// or path the source error lacks, so callers go through the constructors.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_invalid_url_display() {
        let msg = FetchError::invalid_url("not-a-url").to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_fetch_error_unsupported_scheme_display() {
        let msg = FetchError::unsupported_scheme("ftp://example.com/file").to_string();
        assert!(msg.contains("http or https"), "Expected scheme hint in: {msg}");
        assert!(msg.contains("ftp://example.com/file"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_fetch_error_missing_location_display() {
        let error = FetchError::MissingLocation {
            url: "https://example.com/moved".to_string(),
            status: 302,
        };
        let msg = error.to_string();
        assert!(msg.contains("302"), "Expected status in: {msg}");
        assert!(msg.contains("Location"), "Expected header name in: {msg}");
    }

    #[test]
    fn test_fetch_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let msg = FetchError::io(PathBuf::from("/tmp/out.bin"), io_error).to_string();
        assert!(msg.contains("/tmp/out.bin"), "Expected path in: {msg}");
    }

    #[test]
    fn test_fetch_error_content_length_display_quotes_value() {
        let msg = FetchError::invalid_content_length("12abc").to_string();
        assert!(msg.contains("\"12abc\""), "Expected quoted value in: {msg}");
    }

    #[test]
    fn test_fetch_error_upload_missing_display() {
        let error = FetchError::UploadFileNotFound {
            path: PathBuf::from("body.json"),
        };
        assert!(error.to_string().contains("body.json"));
    }
}
