//! Fetch engine: redirect-following requests and length-enforced body copies.
//!
//! # Features
//!
//! - Explicit redirect handling (301/302/307 keep the method, 303 switches to GET)
//! - POST/PUT uploads from a file or a literal string
//! - Byte-mode and character-mode body copies sharing one bounded-copy loop
//! - Optional truncation at the declared `Content-Length`, including lengths
//!   beyond the 64-bit range
//! - Charset detection from `Content-Type`, with truncation that never splits
//!   a character
//!
//! # Example
//!
//! ```no_run
//! use urlfetch_core::fetch::{
//!     FetchConfig, FetchRequest, Fetcher, fetch_binary, fetch_text, resolve_charset,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(&FetchConfig::default())?;
//! let request = FetchRequest::get("https://example.com/")?;
//! let (response, elapsed) = fetcher.execute_with_redirects(request)?;
//! println!("headers after {}ms", elapsed.as_millis());
//!
//! let mut out = std::io::stdout().lock();
//! match resolve_charset(&response) {
//!     Some(charset) => fetch_text(response, &mut out, &charset, true)?,
//!     None => fetch_binary(response, &mut out, true)?,
//! };
//! # Ok(())
//! # }
//! ```

mod charset;
pub mod constants;
mod copy;
mod error;
mod executor;
mod gate;
mod header;
mod request;
mod response;

pub use charset::{charset_from_content_type, encoding_for_label, resolve_charset};
pub use copy::{CopyReport, copy_bytes, copy_text, fetch_binary, fetch_text};
pub use error::FetchError;
pub use executor::{FetchConfig, Fetcher, is_redirect};
pub use gate::LengthGate;
pub use header::Header;
pub use request::{FetchRequest, Method, RequestBody};
pub use response::FetchResponse;
