//! The final response handed from the executor to the copiers.

use std::fmt;
use std::io::Read;

use url::Url;

/// A terminal (non-redirect) response: status, ordered headers, and body.
///
/// Headers are kept in the order the transport reports them. Index 0 of the
/// header list is the status line, mirroring how they appear on the wire.
///
/// For responses received over the network that order is not quite wire
/// order: the transport lowercases names and groups repeated fields, so all
/// values of a name sit together, in arrival order, at the position of its
/// first occurrence.
pub struct FetchResponse {
    status: u16,
    status_line: String,
    headers: Vec<(String, String)>,
    url: Url,
    body: Box<dyn Read + Send>,
}

impl FetchResponse {
    /// Assembles a response from already received parts.
    pub fn from_parts(
        status: u16,
        status_line: impl Into<String>,
        headers: Vec<(String, String)>,
        url: Url,
        body: impl Read + Send + 'static,
    ) -> Self {
        Self {
            status,
            status_line: status_line.into(),
            headers,
            url,
            body: Box::new(body),
        }
    }

    pub(crate) fn from_reqwest(response: reqwest::blocking::Response) -> Self {
        let status = response.status();
        let status_line = format!(
            "{:?} {} {}",
            response.version(),
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )
        .trim_end()
        .to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let url = response.url().clone();

        Self::from_parts(status.as_u16(), status_line, headers, url, response)
    }

    /// The HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is a 4xx or 5xx, i.e. the body is an error body.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.status / 100, 4 | 5)
    }

    /// The status line, e.g. `HTTP/1.1 200 OK`.
    #[must_use]
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// Response headers in transport order (names lowercased, repeated fields
    /// grouped), without the status line.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The first value of header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The value of header field `index`, where index 0 is the status line.
    #[must_use]
    pub fn header_at(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(self.status_line.as_str()),
            _ => self.headers.get(index - 1).map(|(_, value)| value.as_str()),
        }
    }

    /// The name of header field `index`; the status line (index 0) has none.
    #[must_use]
    pub fn header_name_at(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.headers.get(i))
            .map(|(key, _)| key.as_str())
    }

    /// The raw declared `Content-Length`, if the server sent one.
    #[must_use]
    pub fn declared_length(&self) -> Option<&str> {
        self.header("Content-Length")
    }

    /// The URL this response was served from.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Consumes the response, yielding its body stream.
    #[must_use]
    pub fn into_body(self) -> Box<dyn Read + Send> {
        self.body
    }
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
