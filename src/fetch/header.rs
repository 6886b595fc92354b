//! Request headers supplied on the command line.

use std::fmt;

/// A single `Name: Value` request header.
///
/// Headers are attached verbatim, in the order given, to every request the
/// executor issues, including requests re-issued after a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    /// Creates a header from an already split name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parses a raw `Name: Value` string.
    ///
    /// Name and value are trimmed. A string without a colon (or starting with
    /// one) becomes a header whose name is the whole string and whose value is
    /// empty.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.find(':') {
            Some(pos) if pos > 0 => Self::new(raw[..pos].trim(), raw[pos + 1..].trim()),
            _ => Self::new(raw, ""),
        }
    }

    /// The header name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The header value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}
