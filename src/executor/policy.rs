//! Local usability rules for cached tokens.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Decides whether a cached token may be presented without re-acquiring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenPolicy {
	/// Margin subtracted from the token lifetime when checking expiry.
	pub clock_skew: Duration,
	/// When `false`, cached tokens are always presented and only a 401 evicts them.
	pub proactive_expiry: bool,
}
impl TokenPolicy {
	/// Default clock skew (60 seconds).
	pub const DEFAULT_CLOCK_SKEW: Duration = Duration::seconds(60);

	/// Policy that never checks expiry locally.
	pub fn lazy() -> Self {
		Self { clock_skew: Duration::ZERO, proactive_expiry: false }
	}

	/// Overrides the clock skew. Negative values are clamped to zero.
	pub fn with_clock_skew(mut self, skew: Duration) -> Self {
		self.clock_skew = if skew.is_negative() { Duration::ZERO } else { skew };

		self
	}

	/// Returns `true` when the token may be presented at `now`.
	pub fn is_usable(&self, token: &AccessToken, now: OffsetDateTime) -> bool {
		if !self.proactive_expiry {
			return true;
		}

		match now.checked_add(self.clock_skew) {
			Some(deadline) => !token.is_expired_at(deadline),
			None => false,
		}
	}
}
impl Default for TokenPolicy {
	fn default() -> Self {
		Self { clock_skew: Self::DEFAULT_CLOCK_SKEW, proactive_expiry: true }
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn token(expires_in: Duration) -> AccessToken {
		AccessToken::builder()
			.access_token("tok1")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(expires_in)
			.build()
			.expect("Token fixture should build.")
	}

	#[test]
	fn default_policy_applies_clock_skew() {
		let policy = TokenPolicy::default();
		let token = token(Duration::minutes(10));

		assert!(policy.is_usable(&token, macros::datetime!(2025-01-01 00:08 UTC)));
		assert!(!policy.is_usable(&token, macros::datetime!(2025-01-01 00:09:30 UTC)));
	}

	#[test]
	fn zero_lifetime_tokens_are_never_reused_proactively() {
		let token = token(Duration::ZERO);
		let now = macros::datetime!(2025-01-01 00:00 UTC);

		assert!(!TokenPolicy::default().is_usable(&token, now));
		assert!(TokenPolicy::lazy().is_usable(&token, now));
	}

	#[test]
	fn negative_skew_is_clamped() {
		let policy = TokenPolicy::default().with_clock_skew(Duration::seconds(-5));

		assert_eq!(policy.clock_skew, Duration::ZERO);
	}
}
