//! Character transfer for text bodies.
//!
//! Units here are characters, not bytes. Each chunk is decoded from the
//! source charset, re-encoded to measure its real size on the wire, and
//! written. When a gate is active and the encoded chunk would overrun the
//! byte budget, the encoded bytes are cut at the budget and decoded again so
//! that only whole characters reach the sink.

use std::borrow::Cow;
use std::io::{self, Read, Write};

use encoding_rs::{CoderResult, Decoder, Encoding};
use tracing::debug;

use super::bytes::read_retrying;
use super::{ChunkTransfer, Step, is_early_close};
use crate::fetch::constants::BUFFER_SIZE;

pub(crate) struct TextTransfer<'a, R, W: ?Sized> {
    reader: CharReader<R>,
    encoding: &'static Encoding,
    sink: &'a mut W,
    chunk: String,
    written: u64,
}

impl<'a, R: Read, W: Write + ?Sized> TextTransfer<'a, R, W> {
    pub(crate) fn new(source: R, sink: &'a mut W, encoding: &'static Encoding) -> Self {
        Self {
            reader: CharReader::new(source, encoding),
            encoding,
            sink,
            chunk: String::with_capacity(BUFFER_SIZE),
            written: 0,
        }
    }
}

impl<R: Read, W: Write + ?Sized> ChunkTransfer for TextTransfer<'_, R, W> {
    fn transfer(&mut self, want: usize, budget: Option<u128>) -> io::Result<Step> {
        self.chunk.clear();
        let n = match self.reader.read_chars(want, &mut self.chunk) {
            Err(e) if budget.is_some() && is_early_close(&e) => {
                // A partial character still buffered in the decoder is dropped.
                debug!(error = %e, "connection closed before declared length");
                self.reader.eof = true;
                return Ok(Step::EndOfStream);
            }
            result => result?,
        };
        if n == 0 {
            return Ok(Step::EndOfStream);
        }

        let (encoded, output_encoding, _) = self.encoding.encode(&self.chunk);
        let (bytes, step) = match budget {
            Some(budget) if encoded.len() as u128 > budget => {
                // budget < encoded.len(), so it fits in usize.
                let cut = usize::try_from(budget).unwrap_or(encoded.len());
                let mut whole = decode_whole_chars(output_encoding, &encoded[..cut]);
                let mut trimmed = output_encoding.encode(&whole).0.into_owned();
                // Stateful encoders (ISO-2022-JP) append a shift back to ASCII.
                while trimmed.len() > cut && whole.pop().is_some() {
                    trimmed = output_encoding.encode(&whole).0.into_owned();
                }
                (Cow::Owned(trimmed), Step::Truncated)
            }
            _ => (encoded, Step::Moved(n)),
        };

        self.sink.write_all(&bytes)?;
        self.written += bytes.len() as u64;
        Ok(step)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }
}

/// Decodes `bytes`, dropping a trailing partial character instead of
/// replacing it.
fn decode_whole_chars(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len().saturating_mul(3));
    let mut text = String::with_capacity(capacity);
    // Not the last chunk: an incomplete sequence at the end stays buffered in
    // the decoder and never reaches `text`.
    let _ = decoder.decode_to_string_without_replacement(bytes, &mut text, false);
    text
}

/// Incremental decoder over a byte source that hands out characters.
struct CharReader<R> {
    source: R,
    decoder: Decoder,
    raw: Box<[u8]>,
    pending: String,
    cursor: usize,
    eof: bool,
}

impl<R: Read> CharReader<R> {
    fn new(source: R, encoding: &'static Encoding) -> Self {
        Self {
            source,
            decoder: encoding.new_decoder_without_bom_handling(),
            raw: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            pending: String::new(),
            cursor: 0,
            eof: false,
        }
    }

    /// Appends up to `want` characters to `out` and returns how many.
    ///
    /// Returns 0 only at end-of-stream; otherwise at least one character.
    fn read_chars(&mut self, want: usize, out: &mut String) -> io::Result<usize> {
        if want == 0 {
            return Ok(0);
        }
        while self.cursor == self.pending.len() {
            if self.eof {
                return Ok(0);
            }
            self.fill()?;
        }

        let rest = &self.pending[self.cursor..];
        let end = rest.char_indices().nth(want).map_or(rest.len(), |(i, _)| i);
        let taken = &rest[..end];
        out.push_str(taken);
        self.cursor += end;
        Ok(taken.chars().count())
    }

    fn fill(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.cursor = 0;

        let n = read_retrying(&mut self.source, &mut self.raw)?;
        let last = n == 0;
        self.eof = last;

        let mut input = &self.raw[..n];
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(BUFFER_SIZE * 4);
            self.pending.reserve(needed);
            let (result, read, _) = self.decoder.decode_to_string(input, &mut self.pending, last);
            input = &input[read..];
            if result == CoderResult::InputEmpty {
                return Ok(());
            }
        }
    }
}
