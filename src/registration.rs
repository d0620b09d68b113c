//! Client registrations: the immutable token-endpoint metadata each downstream call authenticates
//! with.
//!
//! A [`ClientRegistration`] is assembled once at startup through [`ClientRegistrationBuilder`],
//! which enforces a secure token endpoint. Registrations are then collected into a read-only
//! [`ClientRegistrations`] repository keyed by [`RegistrationId`].

/// Builder API for assembling registrations.
pub mod builder;
/// Grant and client authentication variants.
pub mod grant;

pub use builder::*;
pub use grant::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, RegistrationId, ScopeSet, Secret},
};

/// Immutable client-credentials registration consumed by the acquirer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRegistration {
	/// Registration identifier.
	pub id: RegistrationId,
	/// Token endpoint the grant is posted to.
	pub token_endpoint: Url,
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret.
	pub client_secret: Secret,
	/// Grant used to obtain tokens.
	pub grant_type: GrantType,
	/// Scopes requested on every acquisition.
	pub scopes: ScopeSet,
	/// How client credentials are presented to the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl ClientRegistration {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: RegistrationId) -> ClientRegistrationBuilder {
		ClientRegistrationBuilder::new(id)
	}
}

/// Read-only repository of registrations keyed by id.
#[derive(Clone, Debug, Default)]
pub struct ClientRegistrations {
	entries: HashMap<RegistrationId, ClientRegistration>,
}
impl ClientRegistrations {
	/// Collects registrations, rejecting duplicate ids.
	pub fn new<I>(registrations: I) -> Result<Self, RegistrationError>
	where
		I: IntoIterator<Item = ClientRegistration>,
	{
		let mut entries = HashMap::new();

		for registration in registrations {
			let id = registration.id.clone();

			if entries.insert(id.clone(), registration).is_some() {
				return Err(RegistrationError::DuplicateRegistration { id: id.to_string() });
			}
		}

		Ok(Self { entries })
	}

	/// Looks up a registration by id.
	pub fn get(&self, id: &str) -> Option<&ClientRegistration> {
		self.entries.get(id)
	}

	/// Number of registrations.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` when no registration is configured.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterator over the registered ids.
	pub fn ids(&self) -> impl Iterator<Item = &RegistrationId> {
		self.entries.keys()
	}
}
