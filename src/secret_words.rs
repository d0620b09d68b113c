//! Secret-words resource client and its response DTO.

// self
use crate::{
	_prelude::*,
	auth::RegistrationId,
	executor::AuthorizedRequestExecutor,
	http::ResourceRequest,
};

/// Fetches the secret words list through an [`AuthorizedRequestExecutor`].
#[derive(Clone, Debug)]
pub struct SecretWordsClient {
	executor: AuthorizedRequestExecutor,
	registration: RegistrationId,
	url: Url,
}
impl SecretWordsClient {
	/// Creates a client bound to one registration and resource URL.
	pub fn new(executor: AuthorizedRequestExecutor, registration: RegistrationId, url: Url) -> Self {
		Self { executor, registration, url }
	}

	/// Resource URL this client calls.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// GETs the configured URL and decodes the JSON array of words.
	pub async fn get_secret_words(&self) -> Result<Vec<String>> {
		let request = ResourceRequest::get(self.url.clone());

		tracing::info!(method = %request.method, url = %request.url, "Making HTTP request.");

		self.executor.execute_json(&self.registration, request).await
	}
}

/// Body returned by `GET /api/words`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretWordsDto {
	/// Words returned by the resource server, in order.
	pub words: Vec<String>,
	/// Instant the response was assembled.
	#[serde(rename = "createdAt", with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl SecretWordsDto {
	/// Builds the DTO from fetched words and the current instant.
	pub fn from(words: Vec<String>, created_at: OffsetDateTime) -> Self {
		Self { words, created_at }
	}
}
