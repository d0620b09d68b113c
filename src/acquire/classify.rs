//! RFC 6749 heuristics that turn token endpoint errors into [`AuthFailureKind`] values.
//!
//! Structured OAuth `error` codes win; the HTTP status is only consulted when the code is
//! missing or unknown.

// self
use crate::error::AuthFailureKind;

/// Classifies an OAuth `error` code, returning `None` for unknown codes.
pub fn classify_oauth_error(code: &str) -> Option<AuthFailureKind> {
	if code.eq_ignore_ascii_case("invalid_client") || code.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(AuthFailureKind::InvalidClient)
	} else if code.eq_ignore_ascii_case("invalid_grant") || code.eq_ignore_ascii_case("access_denied")
	{
		Some(AuthFailureKind::InvalidGrant)
	} else if code.eq_ignore_ascii_case("invalid_scope") {
		Some(AuthFailureKind::InvalidScope)
	} else if code.eq_ignore_ascii_case("server_error")
		|| code.eq_ignore_ascii_case("temporarily_unavailable")
	{
		Some(AuthFailureKind::Unavailable)
	} else {
		None
	}
}

/// Classifies a token endpoint failure from its HTTP status alone.
pub fn classify_status(status: Option<u16>) -> AuthFailureKind {
	match status {
		Some(400 | 404 | 410) => AuthFailureKind::InvalidGrant,
		Some(401) => AuthFailureKind::InvalidClient,
		Some(403) => AuthFailureKind::InvalidScope,
		Some(429) => AuthFailureKind::Unavailable,
		Some(code) if code >= 500 => AuthFailureKind::Unavailable,
		_ => AuthFailureKind::Unexpected,
	}
}
