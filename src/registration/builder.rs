// std
use std::net::IpAddr;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, RegistrationId, ScopeSet, Secret},
	registration::{ClientAuthMethod, ClientRegistration, GrantType},
};

/// Errors raised while constructing or validating registrations.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RegistrationError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Client id is mandatory.
	#[error("Missing client id.")]
	MissingClientId,
	/// Client secret is mandatory for confidential clients.
	#[error("Missing client secret.")]
	MissingClientSecret,
	/// Token endpoints must use HTTPS unless they point at a loopback host.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Two registrations share the same id.
	#[error("Registration `{id}` is declared more than once.")]
	DuplicateRegistration {
		/// Duplicated id.
		id: String,
	},
}

/// Builder for [`ClientRegistration`] values.
#[derive(Debug)]
pub struct ClientRegistrationBuilder {
	/// Identifier for the registration being constructed.
	pub id: RegistrationId,
	/// Token endpoint the grant is posted to.
	pub token_endpoint: Option<Url>,
	/// OAuth client identifier.
	pub client_id: Option<ClientId>,
	/// OAuth client secret.
	pub client_secret: Option<Secret>,
	/// Grant used to obtain tokens.
	pub grant_type: GrantType,
	/// Scopes requested on every acquisition.
	pub scopes: ScopeSet,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl ClientRegistrationBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: RegistrationId) -> Self {
		Self {
			id,
			token_endpoint: None,
			client_id: None,
			client_secret: None,
			grant_type: GrantType::default(),
			scopes: ScopeSet::default(),
			client_auth_method: ClientAuthMethod::default(),
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: ClientId) -> Self {
		self.client_id = Some(client_id);

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(Secret::new(secret));

		self
	}

	/// Overrides the grant type.
	pub fn grant_type(mut self, grant: GrantType) -> Self {
		self.grant_type = grant;

		self
	}

	/// Sets the requested scopes.
	pub fn scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Consumes the builder and validates the resulting registration.
	pub fn build(self) -> Result<ClientRegistration, RegistrationError> {
		let token_endpoint = self.token_endpoint.ok_or(RegistrationError::MissingTokenEndpoint)?;
		let client_id = self.client_id.ok_or(RegistrationError::MissingClientId)?;
		let client_secret = self.client_secret.ok_or(RegistrationError::MissingClientSecret)?;

		validate_endpoint(&token_endpoint)?;

		Ok(ClientRegistration {
			id: self.id,
			token_endpoint,
			client_id,
			client_secret,
			grant_type: self.grant_type,
			scopes: self.scopes,
			client_auth_method: self.client_auth_method,
		})
	}
}

fn validate_endpoint(url: &Url) -> Result<(), RegistrationError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(RegistrationError::InsecureEndpoint { url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
