//! Redirect-following request executor.
//!
//! The transport never follows redirects on its own. [`Fetcher`] issues a
//! request, inspects the status, and for 301/302/303/307 issues a new
//! request against `Location`:
//!
//! | status        | next method            |
//! |---------------|------------------------|
//! | 301, 302, 307 | same as previous hop   |
//! | 303           | GET, upload dropped    |
//! | anything else | terminal               |
//!
//! There is no redirect cap unless [`FetchConfig::max_redirects`] sets one.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::time::{Duration, Instant};

use reqwest::blocking::{Body, Client, ClientBuilder, Response};
use reqwest::header::{
    CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, LOCATION, USER_AGENT,
};
use reqwest::redirect::Policy;
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{BUFFER_SIZE, CONNECT_TIMEOUT_SECS, REDIRECT_STATUSES};
use super::error::FetchError;
use super::request::{FetchRequest, RequestBody};
use super::response::FetchResponse;
use crate::user_agent;

/// Transport settings for a [`Fetcher`].
#[derive(Debug, Clone, Default)]
pub struct FetchConfig {
    /// Skip TLS certificate validation.
    pub accept_invalid_certs: bool,
    /// Stop with [`FetchError::TooManyRedirects`] after this many hops.
    /// `None` follows redirects indefinitely.
    pub max_redirects: Option<u32>,
}

/// Blocking HTTP client that drives the redirect state machine.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_redirects: Option<u32>,
}

impl Fetcher {
    /// Creates a fetcher with the given transport settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the TLS backend cannot be
    /// initialised.
    #[instrument(level = "debug")]
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = base_client_builder(config)
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;
        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }

    /// Issues `request`, following redirects until a terminal status.
    ///
    /// Returns the final response and the time from just before the first
    /// attempt until its headers arrived.
    ///
    /// # Errors
    ///
    /// - [`FetchError::UnsupportedScheme`] if a hop targets a non-HTTP URL
    /// - [`FetchError::UploadFileNotFound`] if the upload file is missing
    /// - [`FetchError::MissingLocation`] for a redirect without `Location`
    /// - [`FetchError::TooManyRedirects`] when the configured cap is hit
    /// - [`FetchError::Network`] for any transport failure
    #[instrument(skip(self, request), fields(url = %request.url(), method = %request.method()))]
    pub fn execute_with_redirects(
        &self,
        request: FetchRequest,
    ) -> Result<(FetchResponse, Duration), FetchError> {
        let started = Instant::now();
        let mut request = request;
        let mut hops: u32 = 0;

        loop {
            let response = self.send(&request)?;
            let status = response.status().as_u16();

            if !is_redirect(status) {
                let elapsed = started.elapsed();
                info!(
                    status,
                    hops,
                    elapsed_ms = elapsed.as_millis(),
                    "response received"
                );
                return Ok((FetchResponse::from_reqwest(response), elapsed));
            }

            if let Some(limit) = self.max_redirects
                && hops >= limit
            {
                return Err(FetchError::TooManyRedirects {
                    url: request.url().to_string(),
                    limit,
                });
            }

            let location = redirect_target(&response, request.url())?;
            debug!(status, from = %request.url(), to = %location, "following redirect");

            // Release this hop's connection before opening the next.
            drop(response);
            request = request.redirected(status, location);
            hops += 1;
        }
    }

    /// Sends a single attempt with headers and, for POST/PUT, the upload.
    fn send(&self, request: &FetchRequest) -> Result<Response, FetchError> {
        let url = request.url();
        ensure_http(url)?;

        let mut headers = request_headers(request)?;
        let mut builder = self.client.request(request.method().to_reqwest(), url.clone());

        if request.method().sends_body()
            && let Some(body) = request.body()
        {
            if let Some(content_type) = request.content_type() {
                headers.insert(CONTENT_TYPE, header_value(CONTENT_TYPE.as_str(), content_type)?);
            }
            let (body, length) = upload_body(body)?;
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
            debug!(length, "uploading request body");
            builder = builder.body(body);
        }

        builder
            .headers(headers)
            .send()
            .map_err(|e| FetchError::network(url.as_str(), e))
    }
}

/// Whether `status` is one of the redirects the executor follows.
#[must_use]
pub fn is_redirect(status: u16) -> bool {
    REDIRECT_STATUSES.contains(&status)
}

fn base_client_builder(config: &FetchConfig) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(None::<Duration>)
        .redirect(Policy::none())
        .pool_max_idle_per_host(0)
        .user_agent(user_agent::default_user_agent())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
}

fn ensure_http(url: &Url) -> Result<(), FetchError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(FetchError::unsupported_scheme(url.as_str())),
    }
}

/// Configured headers in order, then the fixed User-Agent over any supplied one.
fn request_headers(request: &FetchRequest) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    for header in request.headers() {
        let name = HeaderName::from_bytes(header.name().as_bytes()).map_err(|_| {
            FetchError::InvalidHeader {
                name: header.name().to_string(),
            }
        })?;
        headers.append(name, header_value(header.name(), header.value())?);
    }
    headers.insert(
        USER_AGENT,
        header_value(USER_AGENT.as_str(), &user_agent::default_user_agent())?,
    );
    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader {
        name: name.to_string(),
    })
}

/// Opens the upload source and reports its length for `Content-Length`.
fn upload_body(body: &RequestBody) -> Result<(Body, u64), FetchError> {
    match body {
        RequestBody::File(path) => {
            let file = File::open(path).map_err(|e| match e.kind() {
                ErrorKind::NotFound => FetchError::UploadFileNotFound { path: path.clone() },
                _ => FetchError::io(path, e),
            })?;
            let length = file.metadata().map_err(|e| FetchError::io(path, e))?.len();
            let reader = BufReader::with_capacity(BUFFER_SIZE, file);
            Ok((Body::sized(reader, length), length))
        }
        RequestBody::Text(text) => Ok((Body::from(text.clone()), text.len() as u64)),
    }
}

/// Resolves `Location` against the URL that answered with the redirect.
fn redirect_target(response: &Response, current: &Url) -> Result<Url, FetchError> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|location| current.join(location.trim()).ok())
        .ok_or_else(|| FetchError::MissingLocation {
            url: current.to_string(),
            status: response.status().as_u16(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fetch::header::Header;
    use crate::fetch::request::Method;

    #[test]
    fn test_is_redirect_covers_exactly_the_followed_codes() {
        for status in [301, 302, 303, 307] {
            assert!(is_redirect(status), "{status} should redirect");
        }
        for status in [200, 204, 300, 304, 305, 308, 404, 500] {
            assert!(!is_redirect(status), "{status} should be terminal");
        }
    }

    #[test]
    fn test_ensure_http_rejects_other_schemes() {
        assert!(ensure_http(&Url::parse("http://example.com").unwrap()).is_ok());
        assert!(ensure_http(&Url::parse("https://example.com").unwrap()).is_ok());
        for url in ["ftp://example.com/f", "file:///etc/hosts", "data:text/plain,hi"] {
            let result = ensure_http(&Url::parse(url).unwrap());
            assert!(
                matches!(result, Err(FetchError::UnsupportedScheme { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_request_headers_append_duplicates_and_force_user_agent() {
        let request = FetchRequest::get("http://example.com/")
            .unwrap()
            .with_headers([
                Header::parse("X-Dup: 1"),
                Header::parse("X-Dup: 2"),
                Header::parse("User-Agent: spoofed"),
            ]);
        let headers = request_headers(&request).unwrap();

        let dups: Vec<_> = headers
            .get_all("x-dup")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(dups, ["1", "2"]);

        let agents: Vec<_> = headers.get_all(USER_AGENT).iter().collect();
        assert_eq!(agents.len(), 1);
        assert!(agents[0].to_str().unwrap().starts_with("urlfetch/"));
    }

    #[test]
    fn test_request_headers_reject_invalid_name() {
        let request = FetchRequest::get("http://example.com/")
            .unwrap()
            .with_header(Header::parse("Bad Name: value"));
        let result = request_headers(&request);
        assert!(matches!(result, Err(FetchError::InvalidHeader { .. })));
    }

    #[test]
    fn test_upload_body_missing_file() {
        let body = RequestBody::File("/definitely/not/here.bin".into());
        let result = upload_body(&body);
        assert!(matches!(result, Err(FetchError::UploadFileNotFound { .. })));
    }

    #[test]
    fn test_upload_body_reports_file_and_text_lengths() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("body.txt");
        std::fs::write(&path, b"0123456789").unwrap();

        let (_, length) = upload_body(&RequestBody::File(path)).unwrap();
        assert_eq!(length, 10);

        // Byte length, not character count.
        let (_, length) = upload_body(&RequestBody::Text("é".to_string())).unwrap();
        assert_eq!(length, 2);
    }

    #[test]
    fn test_missing_upload_fails_before_network() {
        // Port 9 on localhost is not listened on; the error must be about the
        // file, proving no connection was attempted first.
        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let request = FetchRequest::get("http://127.0.0.1:9/upload")
            .unwrap()
            .with_body(Method::Put, RequestBody::File("/no/such/upload".into()));
        let result = fetcher.execute_with_redirects(request);
        assert!(matches!(result, Err(FetchError::UploadFileNotFound { .. })));
    }

    #[test]
    fn test_unsupported_scheme_fails_before_network() {
        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let request = FetchRequest::get("ftp://example.com/file").unwrap();
        let result = fetcher.execute_with_redirects(request);
        assert!(matches!(result, Err(FetchError::UnsupportedScheme { .. })));
    }
}
