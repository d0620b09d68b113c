//! Demonstrates the authorized executor against a mock token endpoint and resource server:
//! the first call acquires a token, the second reuses it, and a revoked token is replaced
//! transparently after a single 401.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_cc_broker::{
	acquire::ReqwestTokenAcquirer,
	auth::{AccessToken, ClientId, RegistrationId, ScopeSet},
	executor::AuthorizedRequestExecutor,
	http::ReqwestHttpClient,
	registration::{ClientRegistration, ClientRegistrations},
	secret_words::SecretWordsClient,
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let revoked_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/words").header("authorization", "Bearer revoked");
			then.status(401);
		})
		.await;
	let words_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/words").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("[\"orchid\",\"lantern\",\"quartz\"]");
		})
		.await;
	let id = RegistrationId::new("demo-client")?;
	let registration = ClientRegistration::builder(id.clone())
		.token_endpoint(Url::parse(&server.url("/token"))?)
		.client_id(ClientId::new("demo-client-id")?)
		.client_secret("super-secret")
		.scopes(ScopeSet::new(["words.read"])?)
		.build()?;
	let http_client = ReqwestHttpClient::default();
	let store = Arc::new(MemoryStore::new());
	let executor = AuthorizedRequestExecutor::new(
		ClientRegistrations::new([registration])?,
		store.clone(),
		Arc::new(ReqwestTokenAcquirer::new(http_client.clone())),
		Arc::new(http_client),
	);
	let client = SecretWordsClient::new(executor, id.clone(), Url::parse(&server.url("/words"))?);

	println!("First call: {:?}.", client.get_secret_words().await?);
	println!("Cached call: {:?}.", client.get_secret_words().await?);

	store
		.put(
			&id,
			AccessToken::builder()
				.access_token("revoked")
				.expires_in(time::Duration::minutes(15))
				.build()?,
		)
		.await?;

	println!("After revocation: {:?}.", client.get_secret_words().await?);

	token_mock.assert_calls_async(2).await;
	revoked_mock.assert_calls_async(1).await;
	words_mock.assert_calls_async(3).await;

	Ok(())
}
