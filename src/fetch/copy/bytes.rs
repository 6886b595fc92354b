//! Raw byte transfer for binary bodies.

use std::io::{self, Read, Write};

use tracing::debug;

use super::{ChunkTransfer, Step, is_early_close};
use crate::fetch::constants::BUFFER_SIZE;

pub(crate) struct ByteTransfer<'a, R, W: ?Sized> {
    source: R,
    sink: &'a mut W,
    buffer: Box<[u8]>,
    written: u64,
}

impl<'a, R: Read, W: Write + ?Sized> ByteTransfer<'a, R, W> {
    pub(crate) fn new(source: R, sink: &'a mut W) -> Self {
        Self {
            source,
            sink,
            buffer: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            written: 0,
        }
    }
}

impl<R: Read, W: Write + ?Sized> ChunkTransfer for ByteTransfer<'_, R, W> {
    fn transfer(&mut self, want: usize, budget: Option<u128>) -> io::Result<Step> {
        let want = want.min(self.buffer.len());
        let n = match read_retrying(&mut self.source, &mut self.buffer[..want]) {
            Err(e) if budget.is_some() && is_early_close(&e) => {
                debug!(error = %e, "connection closed before declared length");
                return Ok(Step::EndOfStream);
            }
            result => result?,
        };
        if n == 0 {
            return Ok(Step::EndOfStream);
        }

        self.sink.write_all(&self.buffer[..n])?;
        self.written += n as u64;
        Ok(Step::Moved(n))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }
}

/// Reads once, retrying reads interrupted by a signal.
pub(crate) fn read_retrying<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match source.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            result => return result,
        }
    }
}
