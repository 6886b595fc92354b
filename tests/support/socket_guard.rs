//! Skips tests that need a localhost listener in sandboxes that forbid one.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

/// Set to `1`, `true` or `yes` to turn a skip into a failure (CI).
const REQUIRE_ENV: &str = "URLFETCH_REQUIRE_SOCKET_TESTS";

fn sockets_mandatory() -> bool {
    std::env::var(REQUIRE_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Whether the calling test should bail out because nothing can listen on
/// 127.0.0.1. Panics instead when sockets are mandatory.
#[track_caller]
#[must_use]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let caller = Location::caller();
    assert!(
        !sockets_mandatory(),
        "{}:{}: no localhost listener available and {REQUIRE_ENV} is set",
        caller.file(),
        caller.line()
    );
    eprintln!(
        "skipping {}:{}: no localhost listener available",
        caller.file(),
        caller.line()
    );
    true
}

/// A running mock server, or `None` when the test should be skipped.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if should_skip_socket_bound_test() {
        None
    } else {
        Some(MockServer::start().await)
    }
}
