//! Immutable access token values, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
};

/// Token type reported by the token endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenType {
	/// RFC 6750 bearer token.
	#[default]
	Bearer,
	/// Any other token type, kept verbatim.
	Other(String),
}
impl TokenType {
	/// Returns the wire representation.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Bearer => "Bearer",
			Self::Other(value) => value,
		}
	}
}
impl From<&str> for TokenType {
	fn from(value: &str) -> Self {
		if value.eq_ignore_ascii_case("bearer") { Self::Bearer } else { Self::Other(value.into()) }
	}
}
impl From<String> for TokenType {
	fn from(value: String) -> Self {
		Self::from(value.as_str())
	}
}
impl From<TokenType> for String {
	fn from(value: TokenType) -> Self {
		value.as_str().to_owned()
	}
}
impl Display for TokenType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Lifecycle status of an access token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// The issued-at instant is still in the future.
	Pending,
	/// The token is inside its lifetime.
	Active,
	/// The token reached its expiry instant.
	Expired,
}

/// Errors produced by [`AccessTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum AccessTokenBuilderError {
	/// No access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// The expiry instant precedes the issued-at instant.
	#[error("Token expiry precedes its issued-at instant.")]
	ExpiresBeforeIssued,
	/// The relative lifetime does not fit in the representable date range.
	#[error("Token lifetime overflows the representable date range.")]
	LifetimeOutOfRange,
}

/// Access token issued by the client-credentials grant.
///
/// Values are never mutated once built; a re-acquisition produces a new token that
/// replaces the cached one wholesale.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Token type reported by the token endpoint.
	pub token_type: TokenType,
	/// Instant the token was received.
	pub issued_at: OffsetDateTime,
	/// Instant the token stops being valid (`issued_at + expires_in`).
	pub expires_at: OffsetDateTime,
	/// Refresh token, if the endpoint returned one. Unused by the client-credentials grant.
	pub refresh_token: Option<Secret>,
	/// Granted scope, if known.
	pub scope: Option<ScopeSet>,
}
impl AccessToken {
	/// Returns a builder for constructing tokens.
	pub fn builder() -> AccessTokenBuilder {
		AccessTokenBuilder::default()
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant < self.issued_at {
			return TokenStatus::Pending;
		}
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Remaining lifetime at the provided instant, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("scope", &self.scope)
			.finish()
	}
}

/// Builder for [`AccessToken`].
#[derive(Clone, Debug, Default)]
pub struct AccessTokenBuilder {
	access_token: Option<Secret>,
	token_type: TokenType,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	refresh_token: Option<Secret>,
	scope: Option<ScopeSet>,
}
impl AccessTokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(Secret::new(token));

		self
	}

	/// Overrides the token type (defaults to bearer).
	pub fn token_type(mut self, token_type: impl Into<TokenType>) -> Self {
		self.token_type = token_type.into();

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative lifetime from the issued-at instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(Secret::new(token));

		self
	}

	/// Records the granted scope.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = Some(scope);

		self
	}

	/// Consumes the builder and produces an [`AccessToken`].
	///
	/// Without an explicit expiry the lifetime is zero: the token counts as expired
	/// the moment it is issued.
	pub fn build(self) -> Result<AccessToken, AccessTokenBuilderError> {
		let access_token = self.access_token.ok_or(AccessTokenBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(AccessTokenBuilderError::LifetimeOutOfRange)?,
			(None, None) => issued_at,
		};

		if expires_at < issued_at {
			return Err(AccessTokenBuilderError::ExpiresBeforeIssued);
		}

		Ok(AccessToken {
			access_token,
			token_type: self.token_type,
			issued_at,
			expires_at,
			refresh_token: self.refresh_token,
			scope: self.scope,
		})
	}
}
