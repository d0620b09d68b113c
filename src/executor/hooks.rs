//! Callbacks fired around token acquisition and resource-server rejections.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, RegistrationId},
	error::AuthFailure,
};

/// Why an authorization attempt failed.
#[derive(Clone, Copy, Debug)]
pub enum AuthorizationFailure<'a> {
	/// The token endpoint refused or could not issue a token.
	TokenEndpoint(&'a AuthFailure),
	/// The resource server rejected the presented token.
	ResourceServer {
		/// HTTP status returned by the resource server (401).
		status: u16,
	},
}

/// Observer notified by the executor. Both methods default to no-ops.
pub trait AuthorizationHooks
where
	Self: Send + Sync,
{
	/// Called after every successful acquisition, once the token is stored.
	fn on_authorization_success(&self, registration: &RegistrationId, token: &AccessToken) {
		let _ = (registration, token);
	}

	/// Called for token endpoint failures and for resource-server 401s, before eviction.
	fn on_authorization_failure(
		&self,
		registration: &RegistrationId,
		failure: AuthorizationFailure<'_>,
	) {
		let _ = (registration, failure);
	}
}

/// Hooks that ignore every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;
impl AuthorizationHooks for NoopHooks {}
