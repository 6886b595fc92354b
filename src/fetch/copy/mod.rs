//! Streaming copy of a response body into a caller-owned sink.
//!
//! Both copy modes share one loop ([`run`]) parameterised over a
//! [`ChunkTransfer`] strategy:
//!
//! - [`bytes`] moves raw bytes (binary bodies).
//! - [`text`] decodes characters, re-encodes them, and trims the final chunk
//!   on a character boundary when a [`LengthGate`] runs out mid-chunk.
//!
//! Without a gate the loop runs to end-of-stream. With a gate it asks for at
//! most `want_this_time(BUFFER_SIZE)` units per chunk and stops once the gate
//! is exhausted. A short read is not the end; only end-of-stream is, and that
//! ends the copy early without error. On a bounded copy a connection that
//! closes before the declared length counts as end-of-stream too.
//!
//! The sink is flushed but never closed: it may be stdout. The source is
//! owned by the transfer and dropped on every exit path.

mod bytes;
mod text;

use std::error::Error;
use std::io::{self, Read, Write};

use encoding_rs::Encoding;
use tracing::{debug, info, instrument};

use super::charset::encoding_for_label;
use super::constants::BUFFER_SIZE;
use super::error::FetchError;
use super::gate::LengthGate;
use super::response::FetchResponse;

use self::bytes::ByteTransfer;
use self::text::TextTransfer;

/// What a single chunk transfer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// `n` units moved; charge them to the gate.
    Moved(usize),
    /// The chunk overran the budget and was cut; the gate is spent.
    Truncated,
    /// The source has no more data.
    EndOfStream,
}

/// One copy strategy: how to move up to `want` units from source to sink.
pub(crate) trait ChunkTransfer {
    /// Moves up to `want` units. `budget` is the gate's remaining allowance,
    /// or `None` for an unbounded copy.
    fn transfer(&mut self, want: usize, budget: Option<u128>) -> io::Result<Step>;

    /// Flushes the sink.
    fn flush(&mut self) -> io::Result<()>;

    /// Bytes written to the sink so far.
    fn bytes_written(&self) -> u64;
}

/// Summary of a finished copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyReport {
    /// Bytes written to the sink.
    pub bytes_written: u64,
    /// Budget left on the gate, or `None` when the copy was unbounded.
    pub remaining: Option<u128>,
}

impl CopyReport {
    /// Whether a bounded copy used up its whole budget.
    #[must_use]
    pub fn gate_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// Whether a read error means the peer closed before the declared length.
///
/// The transport wraps its "incomplete body" error in layers of its own; the
/// `UnexpectedEof` kind can sit anywhere in the source chain.
pub(crate) fn is_early_close(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        return true;
    }
    let mut cause = err.get_ref().map(|inner| inner as &(dyn Error + 'static));
    while let Some(current) = cause {
        if let Some(io_err) = current.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::UnexpectedEof
        {
            return true;
        }
        cause = current.source();
    }
    false
}

fn run<T: ChunkTransfer>(transfer: &mut T, gate: Option<LengthGate>) -> io::Result<CopyReport> {
    let remaining = match gate {
        None => {
            while transfer.transfer(BUFFER_SIZE, None)? != Step::EndOfStream {}
            None
        }
        Some(mut gate) => {
            while gate.has_more() {
                let want = gate.want_this_time(BUFFER_SIZE);
                match transfer.transfer(want, Some(gate.remaining()))? {
                    Step::Moved(n) => gate.consume(n),
                    Step::Truncated => gate.close(),
                    Step::EndOfStream => {
                        debug!(
                            remaining = %gate.remaining(),
                            "body ended before declared length"
                        );
                        break;
                    }
                }
            }
            Some(gate.remaining())
        }
    };

    transfer.flush()?;

    Ok(CopyReport {
        bytes_written: transfer.bytes_written(),
        remaining,
    })
}

/// Copies raw bytes from `source` to `sink`, bounded by `gate` if present.
///
/// # Errors
///
/// Returns any read or write error; end-of-stream before the gate is
/// exhausted is not an error.
pub fn copy_bytes<R, W>(source: R, sink: &mut W, gate: Option<LengthGate>) -> io::Result<CopyReport>
where
    R: Read,
    W: Write + ?Sized,
{
    run(&mut ByteTransfer::new(source, sink), gate)
}

/// Copies characters from `source` to `sink` in `encoding`, bounded by `gate`
/// if present.
///
/// The gate counts characters per chunk but is checked against the encoded
/// byte length; a chunk that would overrun is cut to the remaining byte
/// budget without splitting a character.
///
/// # Errors
///
/// Returns any read or write error.
pub fn copy_text<R, W>(
    source: R,
    sink: &mut W,
    encoding: &'static Encoding,
    gate: Option<LengthGate>,
) -> io::Result<CopyReport>
where
    R: Read,
    W: Write + ?Sized,
{
    run(&mut TextTransfer::new(source, sink, encoding), gate)
}

/// Streams a binary response body into `sink`.
///
/// With `enforce_length`, copying stops after the declared `Content-Length`
/// even if the connection delivers more.
///
/// # Errors
///
/// Returns [`FetchError::InvalidContentLength`] when enforcement is on and the
/// declared length is malformed, or [`FetchError::Stream`] on I/O failure.
#[instrument(skip_all, fields(status = response.status(), enforce_length = enforce_length))]
pub fn fetch_binary<W>(
    response: FetchResponse,
    sink: &mut W,
    enforce_length: bool,
) -> Result<CopyReport, FetchError>
where
    W: Write + ?Sized,
{
    let gate = declared_gate(&response, enforce_length)?;
    log_error_body(&response);

    let report = copy_bytes(response.into_body(), sink, gate).map_err(FetchError::stream)?;
    info!(bytes = report.bytes_written, "binary copy complete");
    Ok(report)
}

/// Streams a text response body into `sink`, decoding and re-encoding with
/// `charset`.
///
/// # Errors
///
/// Returns [`FetchError::UnknownCharset`] for unsupported labels, plus the
/// errors of [`fetch_binary`].
#[instrument(
    skip_all,
    fields(status = response.status(), charset = %charset, enforce_length = enforce_length)
)]
pub fn fetch_text<W>(
    response: FetchResponse,
    sink: &mut W,
    charset: &str,
    enforce_length: bool,
) -> Result<CopyReport, FetchError>
where
    W: Write + ?Sized,
{
    let encoding = encoding_for_label(charset)?;
    let gate = declared_gate(&response, enforce_length)?;
    log_error_body(&response);

    let report =
        copy_text(response.into_body(), sink, encoding, gate).map_err(FetchError::stream)?;
    info!(
        bytes = report.bytes_written,
        encoding = encoding.name(),
        "text copy complete"
    );
    Ok(report)
}

/// Builds the gate for a length-enforced copy; the header is ignored otherwise.
fn declared_gate(
    response: &FetchResponse,
    enforce_length: bool,
) -> Result<Option<LengthGate>, FetchError> {
    if !enforce_length {
        return Ok(None);
    }
    let gate = response
        .declared_length()
        .map(LengthGate::parse)
        .transpose()?;
    if gate.is_none() {
        debug!("length enforcement requested but no Content-Length declared");
    }
    Ok(gate)
}

fn log_error_body(response: &FetchResponse) {
    if response.is_error() {
        debug!(status = response.status(), "copying error body");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use url::Url;

    fn response(headers: &[(&str, &str)], body: &'static [u8]) -> FetchResponse {
        FetchResponse::from_parts(
            200,
            "HTTP/1.1 200 OK",
            headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            Url::parse("http://example.com/").unwrap(),
            Cursor::new(body),
        )
    }

    #[test]
    fn test_fetch_binary_enforced_drops_trailing_bytes() {
        let resp = response(&[("content-length", "5")], b"helloEXTRA");
        let mut sink = Vec::new();
        let report = fetch_binary(resp, &mut sink, true).unwrap();
        assert_eq!(sink, b"hello");
        assert!(report.gate_exhausted());
    }

    #[test]
    fn test_fetch_binary_unenforced_ignores_declared_length() {
        let resp = response(&[("content-length", "5")], b"helloEXTRA");
        let mut sink = Vec::new();
        let report = fetch_binary(resp, &mut sink, false).unwrap();
        assert_eq!(sink, b"helloEXTRA");
        assert_eq!(report.remaining, None);
    }

    #[test]
    fn test_fetch_binary_malformed_length_fails_only_when_enforced() {
        let resp = response(&[("content-length", "five")], b"hello");
        let result = fetch_binary(resp, &mut Vec::new(), true);
        assert!(matches!(result, Err(FetchError::InvalidContentLength { .. })));

        let resp = response(&[("content-length", "five")], b"hello");
        let mut sink = Vec::new();
        fetch_binary(resp, &mut sink, false).unwrap();
        assert_eq!(sink, b"hello");
    }

    #[test]
    fn test_fetch_binary_enforced_without_header_is_unbounded() {
        let resp = response(&[], b"all of it");
        let mut sink = Vec::new();
        let report = fetch_binary(resp, &mut sink, true).unwrap();
        assert_eq!(sink, b"all of it");
        assert_eq!(report.remaining, None);
    }

    #[test]
    fn test_fetch_text_unknown_charset_fails() {
        let resp = response(&[], b"text");
        let result = fetch_text(resp, &mut Vec::new(), "x-unknown", false);
        assert!(matches!(result, Err(FetchError::UnknownCharset { .. })));
    }

    #[test]
    fn test_fetch_text_enforced() {
        let resp = response(&[("content-length", "3")], b"abcdef");
        let mut sink = Vec::new();
        fetch_text(resp, &mut sink, "UTF-8", true).unwrap();
        assert_eq!(sink, b"abc");
    }

    #[test]
    fn test_zero_declared_length_copies_nothing() {
        let resp = response(&[("content-length", "0")], b"ignored");
        let mut sink = Vec::new();
        let report = fetch_binary(resp, &mut sink, true).unwrap();
        assert!(sink.is_empty());
        assert_eq!(report.bytes_written, 0);
    }

    #[test]
    fn test_stream_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let resp = FetchResponse::from_parts(
            200,
            "HTTP/1.1 200 OK",
            Vec::new(),
            Url::parse("http://example.com/").unwrap(),
            Broken,
        );
        let result = fetch_binary(resp, &mut Vec::new(), false);
        assert!(matches!(result, Err(FetchError::Stream { .. })));
    }
}
