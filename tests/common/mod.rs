//! Shared fixtures for the integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
use time::{Duration, OffsetDateTime, macros};
use url::Url;
// self
use oauth2_cc_broker::{
	acquire::ReqwestTokenAcquirer,
	auth::{AccessToken, ClientId, RegistrationId, ScopeSet},
	clock::FixedClock,
	executor::AuthorizedRequestExecutor,
	http::ReqwestHttpClient,
	registration::{ClientAuthMethod, ClientRegistration, ClientRegistrations},
	reqwest::Client,
	store::{MemoryStore, TokenStore},
};

pub const REGISTRATION: &str = "my-client";
pub const CLIENT_ID: &str = "my-client-id";
pub const CLIENT_SECRET: &str = "s3cret";
pub const NOW: OffsetDateTime = macros::datetime!(2025-06-01 12:00 UTC);

pub fn registration_id() -> RegistrationId {
	RegistrationId::new(REGISTRATION).expect("Registration id fixture should be valid.")
}

pub fn registration(
	server: &MockServer,
	method: ClientAuthMethod,
	scopes: &[&str],
) -> ClientRegistration {
	let endpoint = Url::parse(&server.url("/token")).expect("Mock token endpoint should parse.");

	registration_for(endpoint, method, scopes)
}

pub fn registration_for(
	token_endpoint: Url,
	method: ClientAuthMethod,
	scopes: &[&str],
) -> ClientRegistration {
	ClientRegistration::builder(registration_id())
		.token_endpoint(token_endpoint)
		.client_id(ClientId::new(CLIENT_ID).expect("Client id fixture should be valid."))
		.client_secret(CLIENT_SECRET)
		.scopes(ScopeSet::new(scopes.iter().copied()).expect("Scope fixture should be valid."))
		.client_auth_method(method)
		.build()
		.expect("Registration fixture should build.")
}

pub fn test_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(oauth2_cc_broker::reqwest::redirect::Policy::none())
		.build()
		.expect("Test reqwest client should build.");

	ReqwestHttpClient::with_client(client)
}

pub fn acquirer() -> ReqwestTokenAcquirer {
	ReqwestTokenAcquirer::new(test_http_client()).with_clock(Arc::new(FixedClock(NOW)))
}

pub fn token(value: &str, lifetime: Duration) -> AccessToken {
	AccessToken::builder()
		.access_token(value)
		.issued_at(NOW)
		.expires_in(lifetime)
		.build()
		.expect("Token fixture should build.")
}

pub fn resource_url(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock resource URL should parse.")
}

/// Executor wired to the real reqwest transport, a fresh memory store, and a frozen clock.
pub fn build_stack(registration: ClientRegistration) -> (AuthorizedRequestExecutor, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::new());
	let registrations =
		ClientRegistrations::new([registration]).expect("Single registration should be accepted.");
	let executor = AuthorizedRequestExecutor::new(
		registrations,
		store.clone() as Arc<dyn TokenStore>,
		Arc::new(acquirer()),
		Arc::new(test_http_client()),
	)
	.with_clock(Arc::new(FixedClock(NOW)));

	(executor, store)
}

pub fn token_body(access_token: &str, expires_in: u64) -> String {
	format!(
		"{{\"access_token\":\"{access_token}\",\"token_type\":\"bearer\",\"expires_in\":{expires_in}}}"
	)
}
