//! Constants for the fetch module (buffer sizes, timeouts, protocol defaults).

/// Chunk size for body copies and uploads, in units (bytes or characters).
pub const BUFFER_SIZE: usize = 4096;

/// Charset assumed for `text/*` responses that do not declare one (HTTP/1.1, section 3.7.1).
pub const DEFAULT_TEXT_CHARSET: &str = "ISO-8859-1";

/// Default HTTP connect timeout (30 seconds). Reads are not bounded.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Status codes the executor follows. Anything else is terminal.
pub const REDIRECT_STATUSES: [u16; 4] = [301, 302, 303, 307];
