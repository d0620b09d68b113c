//! Crate-level error types shared by the acquirer, executor, stores, and configuration.

// crates.io
use oauth2::http::{Method, header::InvalidHeaderValue};
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error surfaced by the executor and its collaborators.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The token endpoint could not issue a usable access token.
	#[error(transparent)]
	Auth(#[from] AuthFailure),
	/// The resource server call failed for a reason other than a first 401.
	#[error(transparent)]
	Downstream(#[from] DownstreamRequestError),
}
impl Error {
	/// Returns the HTTP status reported by the failing endpoint, if any.
	pub fn http_status(&self) -> Option<u16> {
		match self {
			Self::Auth(failure) => failure.http_status,
			Self::Downstream(failure) => failure.status,
			_ => None,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A client registration failed validation.
	#[error(transparent)]
	InvalidRegistration(#[from] crate::registration::RegistrationError),
	/// An identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Configured scopes cannot be normalized.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// No registration exists for the requested id.
	#[error("No client registration is configured for `{registration}`.")]
	UnknownRegistration {
		/// Registration id that was requested.
		registration: String,
	},
	/// A header value could not be encoded.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name.
		name: &'static str,
		/// Underlying encoding failure.
		#[source]
		source: InvalidHeaderValue,
	},
	/// Configuration file could not be read.
	#[error("Configuration file `{path}` could not be read.")]
	Read {
		/// Path that failed to load.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Configuration file is not valid TOML for the expected schema.
	#[error("Configuration could not be parsed.")]
	Parse(#[from] toml::de::Error),
	/// A registration declares neither a client secret nor a readable secret variable.
	#[error("Registration `{registration}` has no client secret.")]
	MissingClientSecret {
		/// Registration id missing its secret.
		registration: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Broad classification of token acquisition failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureKind {
	/// Client authentication failed or the client is not allowed to use the grant.
	InvalidClient,
	/// The authorization server rejected the grant itself.
	InvalidGrant,
	/// Requested scopes are invalid or exceed what the client may request.
	InvalidScope,
	/// The authorization server reported a temporary or internal failure.
	Unavailable,
	/// The token endpoint answered with a body that could not be parsed.
	MalformedResponse,
	/// The token endpoint could not be reached.
	Transport,
	/// Any other unexpected answer.
	Unexpected,
}
impl AuthFailureKind {
	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidClient => "invalid_client",
			Self::InvalidGrant => "invalid_grant",
			Self::InvalidScope => "invalid_scope",
			Self::Unavailable => "unavailable",
			Self::MalformedResponse => "malformed_response",
			Self::Transport => "transport",
			Self::Unexpected => "unexpected",
		}
	}
}
impl Display for AuthFailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token acquisition failure. Never retried by the acquirer itself.
#[derive(Debug, ThisError)]
#[error("Token acquisition failed ({kind}): {reason}")]
pub struct AuthFailure {
	/// Failure classification.
	pub kind: AuthFailureKind,
	/// Human-readable reason. Never contains credentials.
	pub reason: String,
	/// HTTP status returned by the token endpoint, when one was received.
	pub http_status: Option<u16>,
	/// Raw response body, when one was received.
	pub raw_body: Option<String>,
	/// Underlying error, if any.
	#[source]
	pub source: Option<BoxError>,
}
impl AuthFailure {
	/// Creates a failure with the provided classification and reason.
	pub fn new(kind: AuthFailureKind, reason: impl Into<String>) -> Self {
		Self { kind, reason: reason.into(), http_status: None, raw_body: None, source: None }
	}

	/// Attaches the HTTP status, when known.
	pub fn with_status(mut self, status: Option<u16>) -> Self {
		self.http_status = status;

		self
	}

	/// Attaches the raw response body.
	pub fn with_raw_body(mut self, body: impl Into<String>) -> Self {
		self.raw_body = Some(body.into());

		self
	}

	/// Attaches the underlying error.
	pub fn with_source(mut self, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		self.source = Some(Box::new(src));

		self
	}
}

/// Failure calling the downstream resource endpoint.
#[derive(Debug, ThisError)]
#[error("{method} {url} failed: {message}")]
pub struct DownstreamRequestError {
	/// Method of the failing request.
	pub method: Method,
	/// Target URL of the failing request.
	pub url: Url,
	/// HTTP status, absent for network-level failures.
	pub status: Option<u16>,
	/// Response body, when one was received.
	pub body: Option<String>,
	/// Summary of the failure.
	pub message: String,
	/// Underlying error, if any.
	#[source]
	pub source: Option<BoxError>,
}
impl DownstreamRequestError {
	/// Builds an error for a response that carried an error status.
	pub fn from_status(method: Method, url: Url, status: u16, body: impl Into<String>) -> Self {
		Self {
			method,
			url,
			status: Some(status),
			body: Some(body.into()),
			message: format!("Resource server responded with HTTP {status}."),
			source: None,
		}
	}

	/// Builds an error for a request that never produced a response.
	pub fn network(method: Method, url: Url, src: TransportError) -> Self {
		Self {
			method,
			url,
			status: None,
			body: None,
			message: src.to_string(),
			source: Some(Box::new(src)),
		}
	}

	/// Builds an error for a success response whose body could not be decoded.
	pub fn decode(
		method: Method,
		url: Url,
		status: u16,
		body: impl Into<String>,
		src: serde_path_to_error::Error<serde_json::Error>,
	) -> Self {
		Self {
			method,
			url,
			status: Some(status),
			body: Some(body.into()),
			message: format!("Response body could not be decoded at `{}`.", src.path()),
			source: Some(Box::new(src)),
		}
	}

	/// Returns `true` when the resource server answered 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == Some(401)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within the configured timeout.
	#[error("Request timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout { source: Box::new(e) } } else { Self::network(e) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn auth_failure_display_omits_raw_body() {
		let failure = AuthFailure::new(AuthFailureKind::InvalidClient, "bad credentials")
			.with_status(Some(400))
			.with_raw_body("{\"error\":\"invalid_client\"}");
		let error: Error = failure.into();

		assert_eq!(error.to_string(), "Token acquisition failed (invalid_client): bad credentials");
		assert_eq!(error.http_status(), Some(400));
	}

	#[test]
	fn downstream_status_error_tracks_unauthorized() {
		let url = Url::parse("https://resource.example.com/words")
			.expect("Resource URL fixture should parse.");
		let err = DownstreamRequestError::from_status(Method::GET, url, 401, "");

		assert!(err.is_unauthorized());
		assert_eq!(
			err.to_string(),
			"GET https://resource.example.com/words failed: Resource server responded with HTTP 401."
		);
	}

	#[test]
	fn network_errors_carry_no_status() {
		let url = Url::parse("https://resource.example.com/words")
			.expect("Resource URL fixture should parse.");
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let err = DownstreamRequestError::network(Method::GET, url, TransportError::Io(io));

		assert_eq!(err.status, None);
		assert!(StdError::source(&err).is_some());
	}
}
