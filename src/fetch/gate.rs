//! Remaining-budget tracking for length-enforced copies.
//!
//! A [`LengthGate`] is built from a response's declared `Content-Length` and
//! caps how many units a copy may still transfer. Declared lengths come from
//! the server and can be arbitrarily large, so the budget is held as a `u128`
//! with saturating arithmetic; only the per-chunk request is narrowed to
//! `usize`, since chunk buffers are small.

use super::error::FetchError;

/// Bounded counter of units still allowed through a copy.
///
/// `remaining` only ever decreases and never wraps below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthGate {
    remaining: u128,
}

impl LengthGate {
    /// Creates a gate with the given budget.
    #[must_use]
    pub fn new(remaining: u128) -> Self {
        Self { remaining }
    }

    /// Parses a declared length of decimal digits.
    ///
    /// Surrounding whitespace is ignored. Values beyond `u128::MAX` saturate,
    /// which no real stream can exhaust.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidContentLength`] if the value is empty or
    /// contains anything other than ASCII digits.
    pub fn parse(declared: &str) -> Result<Self, FetchError> {
        let digits = declared.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FetchError::invalid_content_length(declared));
        }

        let remaining = digits.bytes().fold(0u128, |acc, digit| {
            acc.saturating_mul(10)
                .saturating_add(u128::from(digit - b'0'))
        });
        Ok(Self::new(remaining))
    }

    /// Units still allowed through.
    #[must_use]
    pub fn remaining(&self) -> u128 {
        self.remaining
    }

    /// Whether the copy may continue.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.remaining > 0
    }

    /// How many units to request for the next chunk: `min(remaining, capacity)`.
    #[must_use]
    pub fn want_this_time(&self, capacity: usize) -> usize {
        usize::try_from(self.remaining).map_or(capacity, |remaining| remaining.min(capacity))
    }

    /// Charges `n` transferred units against the budget.
    pub fn consume(&mut self, n: usize) {
        self.remaining = self.remaining.saturating_sub(n as u128);
    }

    /// Exhausts the budget.
    pub fn close(&mut self) {
        self.remaining = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_length() {
        let gate = LengthGate::parse("5").unwrap();
        assert_eq!(gate.remaining(), 5);
        assert!(gate.has_more());
    }

    #[test]
    fn test_parse_zero_starts_exhausted() {
        let gate = LengthGate::parse("0").unwrap();
        assert!(!gate.has_more());
        assert_eq!(gate.want_this_time(4096), 0);
    }

    #[test]
    fn test_parse_beyond_i64_range() {
        // i64::MAX + 1
        let gate = LengthGate::parse("9223372036854775808").unwrap();
        assert_eq!(gate.remaining(), 9_223_372_036_854_775_808);
        assert_eq!(gate.want_this_time(4096), 4096);
    }

    #[test]
    fn test_parse_saturates_past_u128() {
        let huge = "9".repeat(60);
        let gate = LengthGate::parse(&huge).unwrap();
        assert_eq!(gate.remaining(), u128::MAX);
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert_eq!(LengthGate::parse(" 42 ").unwrap().remaining(), 42);
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        for raw in ["", "  ", "-1", "+5", "12abc", "1.5", "0x10"] {
            let result = LengthGate::parse(raw);
            assert!(
                matches!(result, Err(FetchError::InvalidContentLength { .. })),
                "expected rejection of {raw:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_want_this_time_caps_at_remaining() {
        let gate = LengthGate::new(10);
        assert_eq!(gate.want_this_time(4096), 10);
        assert_eq!(LengthGate::new(10_000).want_this_time(4096), 4096);
    }

    #[test]
    fn test_consume_never_goes_negative() {
        let mut gate = LengthGate::new(3);
        gate.consume(2);
        assert_eq!(gate.remaining(), 1);
        assert!(gate.has_more());
        gate.consume(5);
        assert_eq!(gate.remaining(), 0);
        assert!(!gate.has_more());
    }

    #[test]
    fn test_close_exhausts() {
        let mut gate = LengthGate::new(u128::MAX);
        gate.close();
        assert!(!gate.has_more());
    }

    #[test]
    fn test_has_more_turns_false_exactly_at_zero() {
        let mut gate = LengthGate::new(4096 * 2 + 1);
        let mut consumed = 0u128;
        while gate.has_more() {
            let want = gate.want_this_time(4096);
            gate.consume(want);
            consumed += want as u128;
        }
        assert_eq!(consumed, 4096 * 2 + 1);
        assert_eq!(gate.remaining(), 0);
    }
}
