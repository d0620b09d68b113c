//! TOML configuration for the secret-words service.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [http]
//! timeout_secs = 30
//!
//! [secret_words_client]
//! url = "http://localhost:9000/words"
//! registration = "my-client"
//!
//! [registrations.my-client]
//! token_uri = "http://localhost:9000/token"
//! client_id = "my-client-id"
//! client_secret_env = "MY_CLIENT_SECRET"
//! scopes = ["words.read"]
//! client_auth_method = "client_secret_basic"
//! ```

// std
use std::{fs, net::SocketAddr, path::Path, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, RegistrationId, ScopeSet, Secret},
	error::ConfigError,
	registration::{ClientAuthMethod, ClientRegistration, ClientRegistrations},
};

/// Root configuration document.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
	/// Inbound API settings.
	#[serde(default)]
	pub server: ServerConfig,
	/// Outbound HTTP client settings.
	#[serde(default)]
	pub http: HttpConfig,
	/// Resource endpoint served through `/api/words`.
	pub secret_words_client: SecretWordsClientConfig,
	/// Client registrations keyed by registration id.
	#[serde(default)]
	pub registrations: BTreeMap<String, RegistrationConfig>,
}
impl AppConfig {
	/// Reads and parses the configuration file at `path`.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;

		tracing::debug!(path = %path.display(), "Loaded configuration file.");

		Self::from_toml_str(&raw)
	}

	/// Parses a configuration document.
	pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(raw)?)
	}

	/// Overrides the bind address when one is provided.
	pub fn with_bind(mut self, bind: Option<SocketAddr>) -> Self {
		if let Some(bind) = bind {
			self.server.bind = bind;
		}

		self
	}

	/// Builds validated registrations, reading `client_secret_env` from the process environment.
	pub fn registrations(&self) -> Result<ClientRegistrations, ConfigError> {
		self.registrations_with(|name| std::env::var(name).ok())
	}

	/// Builds validated registrations, resolving `client_secret_env` through `lookup_env`.
	pub fn registrations_with<F>(&self, lookup_env: F) -> Result<ClientRegistrations, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut built = Vec::with_capacity(self.registrations.len());

		for (name, entry) in &self.registrations {
			built.push(entry.build(name, &lookup_env)?);
		}

		Ok(ClientRegistrations::new(built)?)
	}
}

/// `[server]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
	/// Socket address the API listens on.
	pub bind: SocketAddr,
}
impl Default for ServerConfig {
	fn default() -> Self {
		Self { bind: SocketAddr::from(([127, 0, 0, 1], 8080)) }
	}
}

/// `[http]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
	/// Per-request timeout, in seconds, for token and resource calls.
	pub timeout_secs: u64,
}
impl HttpConfig {
	/// Timeout as a [`std::time::Duration`].
	pub fn timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.timeout_secs)
	}
}
impl Default for HttpConfig {
	fn default() -> Self {
		Self { timeout_secs: 30 }
	}
}

/// `[secret_words_client]` section.
#[derive(Clone, Debug, Deserialize)]
pub struct SecretWordsClientConfig {
	/// Resource endpoint returning a JSON array of words.
	pub url: Url,
	/// Registration used to authorize calls.
	pub registration: RegistrationId,
}

/// `[registrations.<id>]` section.
#[derive(Clone, Debug, Deserialize)]
pub struct RegistrationConfig {
	/// Token endpoint.
	pub token_uri: Url,
	/// OAuth client identifier.
	pub client_id: String,
	/// Inline client secret.
	#[serde(default)]
	pub client_secret: Option<Secret>,
	/// Environment variable holding the client secret, used when `client_secret` is absent.
	#[serde(default)]
	pub client_secret_env: Option<String>,
	/// Requested scopes.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Client authentication method.
	#[serde(default)]
	pub client_auth_method: ClientAuthMethod,
}
impl RegistrationConfig {
	fn build<F>(&self, name: &str, lookup_env: &F) -> Result<ClientRegistration, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let secret = match (&self.client_secret, &self.client_secret_env) {
			(Some(secret), _) => Some(secret.expose().to_owned()),
			(None, Some(variable)) => lookup_env(variable),
			(None, None) => None,
		}
		.ok_or_else(|| ConfigError::MissingClientSecret { registration: name.to_owned() })?;
		let registration = ClientRegistration::builder(RegistrationId::new(name)?)
			.token_endpoint(self.token_uri.clone())
			.client_id(ClientId::new(&self.client_id)?)
			.client_secret(secret)
			.scopes(ScopeSet::new(self.scopes.iter().cloned())?)
			.client_auth_method(self.client_auth_method)
			.build()?;

		Ok(registration)
	}
}
