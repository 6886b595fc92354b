//! Immutable request descriptions passed between redirect hops.
//!
//! A [`FetchRequest`] is never mutated by the executor: following a redirect
//! produces a new value via [`FetchRequest::redirected`], so the state carried
//! from one attempt to the next is explicit.

use std::fmt;
use std::path::PathBuf;

use url::Url;

use super::error::FetchError;
use super::header::Header;

/// HTTP methods the fetcher can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Plain retrieval, no body.
    #[default]
    Get,
    /// Upload with POST.
    Post,
    /// Upload with PUT.
    Put,
}

impl Method {
    /// Whether requests with this method carry an upload body.
    #[must_use]
    pub fn sends_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    /// The method name on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an upload body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Stream the contents of a file.
    File(PathBuf),
    /// Send a literal string.
    Text(String),
}

/// One request attempt: method, target, headers, and optional upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    method: Method,
    url: Url,
    headers: Vec<Header>,
    body: Option<RequestBody>,
    content_type: Option<String>,
}

impl FetchRequest {
    /// Creates a GET request for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the string is not an absolute URL.
    pub fn get(url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        Ok(Self::new(Method::Get, url))
    }

    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            content_type: None,
        }
    }

    /// Returns a copy that uploads `body` with `method`.
    #[must_use]
    pub fn with_body(self, method: Method, body: RequestBody) -> Self {
        Self {
            method,
            body: Some(body),
            ..self
        }
    }

    /// Returns a copy that declares `content_type` on uploads.
    #[must_use]
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..self
        }
    }

    /// Returns a copy with `header` appended after the existing headers.
    #[must_use]
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Returns a copy with all `headers` appended in order.
    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = Header>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Builds the request for the next hop after a redirect `status`.
    ///
    /// 303 See Other switches to GET and drops the upload; every other
    /// redirect keeps the method, body, and content type. Headers always carry
    /// over.
    #[must_use]
    pub fn redirected(&self, status: u16, location: Url) -> Self {
        if status == 303 {
            Self {
                method: Method::Get,
                url: location,
                headers: self.headers.clone(),
                body: None,
                content_type: None,
            }
        } else {
            Self {
                url: location,
                ..self.clone()
            }
        }
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// The target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Configured headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// The upload body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// The declared upload content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}
