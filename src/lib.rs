//! urlfetch Core Library
//!
//! This library provides the core functionality for the urlfetch tool, a
//! small wget/curl-style fetcher: issue one HTTP request, follow redirects,
//! optionally upload a body, and stream the response to a file or stdout.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - Redirect-following executor and length-enforced body copies
//! - [`output`] - Output destination selection and response header echo

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod fetch;
pub mod output;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use fetch::{
    CopyReport, FetchConfig, FetchError, FetchRequest, FetchResponse, Fetcher, Header, LengthGate,
    Method, RequestBody, fetch_binary, fetch_text, resolve_charset,
};
pub use output::OutputTarget;
