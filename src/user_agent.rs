//! User-Agent string sent with every request.

/// Identifies the tool and its version, e.g. `urlfetch/0.9.0`.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("urlfetch/{version}")
}
