//! Client-credentials token acquisition.
//!
//! [`TokenAcquirer`] is the seam the executor depends on. [`OAuth2TokenAcquirer`] implements it
//! on top of the `oauth2` crate's `BasicClient`, which is configured per call from the
//! [`ClientRegistration`] so a single acquirer serves every registration. The acquirer never
//! retries; every failure is classified into an [`AuthFailure`] and returned.

pub mod classify;

pub use classify::*;

// crates.io
use oauth2::{
	AuthType, ClientId as OAuthClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet},
	clock::{Clock, SystemClock},
	error::{AuthFailure, AuthFailureKind},
	http::{StatusSlot, TokenHttpClient},
	obs::{self, Operation, Outcome},
	registration::{ClientAuthMethod, ClientRegistration},
};
#[cfg(feature = "reqwest")]
use crate::{error::TransportError, http::ReqwestHttpClient};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Boxed future returned by [`TokenAcquirer::acquire`].
pub type AcquireFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AccessToken, AuthFailure>> + 'a + Send>>;

#[cfg(feature = "reqwest")]
/// Acquirer specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenAcquirer = OAuth2TokenAcquirer<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Obtains fresh access tokens for a registration.
pub trait TokenAcquirer
where
	Self: Send + Sync,
{
	/// Performs one token request. Implementations must not retry.
	fn acquire<'a>(&'a self, registration: &'a ClientRegistration) -> AcquireFuture<'a>;
}

/// Maps HTTP transport failures into [`AuthFailure`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an acquisition failure.
	fn map_transport_error(
		&self,
		registration: &ClientRegistration,
		error: HttpClientError<E>,
	) -> AuthFailure;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		registration: &ClientRegistration,
		err: HttpClientError<ReqwestError>,
	) -> AuthFailure {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(registration, *inner),
			HttpClientError::Http(inner) =>
				AuthFailure::new(AuthFailureKind::Unexpected, "Token request could not be built.")
					.with_source(inner),
			HttpClientError::Io(inner) => AuthFailure::new(
				AuthFailureKind::Transport,
				"I/O error occurred while calling the token endpoint.",
			)
			.with_source(TransportError::Io(inner)),
			HttpClientError::Other(message) => AuthFailure::new(
				AuthFailureKind::Transport,
				format!("HTTP client error occurred while calling the token endpoint: {message}."),
			),
			_ => AuthFailure::new(
				AuthFailureKind::Transport,
				"HTTP client error occurred while calling the token endpoint.",
			),
		}
	}
}

/// [`TokenAcquirer`] backed by the `oauth2` crate.
pub struct OAuth2TokenAcquirer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every token request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors.
	pub transport_mapper: Arc<M>,
	clock: Arc<dyn Clock>,
}
impl<C, M> OAuth2TokenAcquirer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an acquirer that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(http_client: impl Into<Arc<C>>, mapper: impl Into<Arc<M>>) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			clock: Arc::new(SystemClock),
		}
	}

	/// Overrides the clock used to stamp `issued_at`.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	async fn exchange(&self, registration: &ClientRegistration) -> Result<AccessToken, AuthFailure> {
		let slot = StatusSlot::default();
		let handle = self.http_client.observed(slot.clone());
		let oauth_client = configure_client(registration);
		let mut request = oauth_client.exchange_client_credentials();

		for scope in registration.scopes.iter() {
			request = request.add_scope(Scope::new(scope.to_owned()));
		}

		tracing::debug!(
			registration = %registration.id,
			token_endpoint = %registration.token_endpoint,
			client_auth_method = registration.client_auth_method.as_str(),
			"Requesting access token."
		);

		let response = request.request_async(&handle).await.map_err(|err| {
			map_request_error(registration, slot.take(), err, self.transport_mapper.as_ref())
		})?;
		let status = slot.take();

		map_token_response(registration, self.clock.now(), status, response)
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2TokenAcquirer<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an acquirer on top of the provided reqwest transport.
	pub fn new(http_client: ReqwestHttpClient) -> Self {
		Self::with_http_client(http_client, ReqwestTransportErrorMapper)
	}
}
impl<C, M> TokenAcquirer for OAuth2TokenAcquirer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn acquire<'a>(&'a self, registration: &'a ClientRegistration) -> AcquireFuture<'a> {
		Box::pin(async move {
			obs::record_outcome(Operation::Acquire, Outcome::Attempt);

			let result = self.exchange(registration).await;

			match &result {
				Ok(token) => {
					obs::record_outcome(Operation::Acquire, Outcome::Success);
					tracing::info!(
						registration = %registration.id,
						token_endpoint = %registration.token_endpoint,
						expires_at = %token.expires_at,
						"Access token acquired."
					);
				},
				Err(failure) => {
					obs::record_outcome(Operation::Acquire, Outcome::Failure);
					tracing::warn!(
						registration = %registration.id,
						token_endpoint = %registration.token_endpoint,
						status = ?failure.http_status,
						kind = %failure.kind,
						"Access token acquisition failed."
					);
				},
			}

			result
		})
	}
}
impl<C, M> Debug for OAuth2TokenAcquirer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2TokenAcquirer").finish_non_exhaustive()
	}
}

fn configure_client(registration: &ClientRegistration) -> ConfiguredBasicClient {
	let oauth_client = BasicClient::new(OAuthClientId::new(registration.client_id.to_string()))
		.set_client_secret(ClientSecret::new(registration.client_secret.expose().to_owned()))
		.set_token_uri(TokenUrl::from_url(registration.token_endpoint.clone()));

	match registration.client_auth_method {
		ClientAuthMethod::ClientSecretBasic => oauth_client.set_auth_type(AuthType::BasicAuth),
		ClientAuthMethod::ClientSecretPost => oauth_client.set_auth_type(AuthType::RequestBody),
	}
}

fn map_token_response(
	registration: &ClientRegistration,
	issued_at: OffsetDateTime,
	status: Option<u16>,
	response: BasicTokenResponse,
) -> Result<AccessToken, AuthFailure> {
	let malformed = |reason: &str| {
		AuthFailure::new(AuthFailureKind::MalformedResponse, reason).with_status(status)
	};
	let mut builder = AccessToken::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(response.token_type().as_ref())
		.issued_at(issued_at);

	if let Some(expires_in) = response.expires_in() {
		let expires_at = i64::try_from(expires_in.as_secs())
			.ok()
			.and_then(|secs| issued_at.checked_add(Duration::seconds(secs)))
			.ok_or_else(|| malformed("Token endpoint returned an out-of-range `expires_in`."))?;

		builder = builder.expires_at(expires_at);
	}

	let scope = match response.scopes() {
		Some(scopes) => ScopeSet::new(
			scopes.iter().map(|scope| scope.as_str()).filter(|scope| !scope.is_empty()),
		)
		.map_err(|err| malformed("Token endpoint returned an invalid scope.").with_source(err))?,
		None => registration.scopes.clone(),
	};

	builder = builder.scope(scope);

	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|err| malformed(&err.to_string()).with_source(err))
}

fn map_request_error<E, M>(
	registration: &ClientRegistration,
	status: Option<u16>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> AuthFailure
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => mapper.map_transport_error(registration, error),
		RequestTokenError::Parse(error, body) => AuthFailure::new(
			AuthFailureKind::MalformedResponse,
			format!("Token endpoint response could not be parsed at `{}`.", error.path()),
		)
		.with_status(status)
		.with_raw_body(String::from_utf8_lossy(&body))
		.with_source(error),
		RequestTokenError::Other(message) => {
			let kind = match status {
				Some(code) if code >= 400 => classify_status(Some(code)),
				Some(_) => AuthFailureKind::MalformedResponse,
				None => AuthFailureKind::Unexpected,
			};

			AuthFailure::new(
				kind,
				format!("Token endpoint returned an unexpected response: {message}."),
			)
			.with_status(status)
		},
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> AuthFailure {
	let code = response.error().as_ref().to_owned();
	let kind = classify_oauth_error(&code).unwrap_or_else(|| classify_status(status));
	let reason = match response.error_description() {
		Some(description) => format!("Token endpoint returned `{code}`: {description}."),
		None => format!("Token endpoint returned `{code}`."),
	};
	let failure = AuthFailure::new(kind, reason).with_status(status);

	match serde_json::to_string(&response) {
		Ok(body) => failure.with_raw_body(body),
		Err(_) => failure,
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(registration: &ClientRegistration, err: ReqwestError) -> AuthFailure {
	if err.is_builder() {
		return AuthFailure::new(AuthFailureKind::Unexpected, "Token request could not be built.")
			.with_source(err);
	}

	let reason = if err.is_timeout() {
		"Request timed out while calling the token endpoint."
	} else {
		"Token endpoint could not be reached."
	};

	tracing::debug!(registration = %registration.id, timeout = err.is_timeout(), "{reason}");

	AuthFailure::new(AuthFailureKind::Transport, reason).with_source(TransportError::from(err))
}
