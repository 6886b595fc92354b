//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use urlfetch_core::{Header, Method, RequestBody};

/// Fetch a resource over HTTP(S) and save it to a file or stdout.
///
/// Redirects (301, 302, 303, 307) are followed. With --enforce-content-length
/// anything the server sends past its declared Content-Length is dropped.
#[derive(Parser, Debug)]
#[command(name = "urlfetch")]
#[command(author, version, about)]
#[command(group(ArgGroup::new("upload").args(["post_file", "post_data", "put_file", "put_data"])))]
pub struct Args {
    /// URL to fetch
    pub url: String,

    /// Include the HTTP status line and response headers in the output
    #[arg(short = 'S', long = "server-response")]
    pub server_response: bool,

    /// Write to FILE instead of a name derived from the URL ('-' for stdout)
    #[arg(short = 'O', long = "output-document", value_name = "FILE")]
    pub output_document: Option<String>,

    /// POST the contents of FILE
    #[arg(long, value_name = "FILE")]
    pub post_file: Option<PathBuf>,

    /// POST the literal string DATA
    #[arg(long, value_name = "DATA")]
    pub post_data: Option<String>,

    /// PUT the contents of FILE
    #[arg(long, value_name = "FILE")]
    pub put_file: Option<PathBuf>,

    /// PUT the literal string DATA
    #[arg(long, value_name = "DATA")]
    pub put_data: Option<String>,

    /// Content-Type to send with uploaded data
    #[arg(long, value_name = "MIMETYPE")]
    pub mime: Option<String>,

    /// Drop all response data after the end of the response's Content-Length
    #[arg(long)]
    pub enforce_content_length: bool,

    /// With -S, also print the time taken until response headers arrived
    #[arg(long)]
    pub timing: bool,

    /// Add a request header, e.g. 'Accept: text/plain' (repeatable)
    #[arg(long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Do not validate the server's TLS certificate
    #[arg(
        long,
        env = "URLFETCH_DISABLE_CERT_CHECKS",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_check_certificate: bool,

    /// Give up after N redirects (default: follow indefinitely)
    #[arg(long, value_name = "N")]
    pub max_redirect: Option<u32>,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// The upload method and body, if an upload flag was given.
    #[must_use]
    pub fn upload(&self) -> Option<(Method, RequestBody)> {
        if let Some(path) = &self.post_file {
            Some((Method::Post, RequestBody::File(path.clone())))
        } else if let Some(data) = &self.post_data {
            Some((Method::Post, RequestBody::Text(data.clone())))
        } else if let Some(path) = &self.put_file {
            Some((Method::Put, RequestBody::File(path.clone())))
        } else {
            self.put_data
                .as_ref()
                .map(|data| (Method::Put, RequestBody::Text(data.clone())))
        }
    }

    /// Parsed `--header` values in the order given.
    #[must_use]
    pub fn parsed_headers(&self) -> Vec<Header> {
        self.headers.iter().map(|raw| Header::parse(raw)).collect()
    }
}
