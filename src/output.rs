//! Output destination selection and response header echo.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::fetch::{FetchError, FetchResponse};

/// Name used when the URL path does not end in a file name.
pub const DEFAULT_FILENAME: &str = "index.html";

/// Where the response body goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output.
    Stdout,
    /// A file, created or truncated.
    File(PathBuf),
}

impl OutputTarget {
    /// Chooses the destination: an explicit `-O` value (`-` is stdout), or a
    /// file named after the final URL.
    #[must_use]
    pub fn resolve(explicit: Option<&str>, final_url: &Url) -> Self {
        match explicit {
            Some("-") => Self::Stdout,
            Some(path) => Self::File(PathBuf::from(path)),
            None => Self::File(PathBuf::from(filename_from_url(final_url))),
        }
    }

    /// Opens a buffered sink for this target.
    ///
    /// The copiers flush the sink; stdout is never closed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] if the file cannot be created.
    pub fn open(&self) -> Result<Box<dyn Write>, FetchError> {
        match self {
            Self::Stdout => {
                info!("saving to STDOUT");
                Ok(Box::new(BufWriter::new(io::stdout().lock())))
            }
            Self::File(path) => {
                info!(path = %path.display(), "saving to file");
                let file = File::create(path).map_err(|e| FetchError::io(path, e))?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }

    /// The file path, if this target is a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdout => None,
            Self::File(path) => Some(path),
        }
    }
}

/// The last path segment of `url`, percent-decoded, or [`DEFAULT_FILENAME`].
#[must_use]
pub fn filename_from_url(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
        last.into()
    });

    if decoded.trim().is_empty() || decoded.contains('/') || matches!(&*decoded, "." | "..") {
        DEFAULT_FILENAME.to_string()
    } else {
        decoded.into_owned()
    }
}

/// Writes the `-S` header block: indented status line, indented headers,
/// and a blank line.
///
/// # Errors
///
/// Returns any write error.
pub fn write_header_block<W: Write + ?Sized>(
    out: &mut W,
    response: &FetchResponse,
) -> io::Result<()> {
    writeln!(out, "  {}", response.status_line())?;
    for (name, value) in response.headers() {
        writeln!(out, "  {name}: {value}")?;
    }
    writeln!(out)
}

/// Writes the `--timing` line.
///
/// # Errors
///
/// Returns any write error.
pub fn write_timing<W: Write + ?Sized>(out: &mut W, elapsed: Duration) -> io::Result<()> {
    writeln!(out, "Time-to-headers: {}ms", elapsed.as_millis())
}
