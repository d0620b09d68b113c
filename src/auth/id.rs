//! Validated identifiers for client registrations and OAuth clients.
//!
//! Registration ids double as configuration keys and span fields, so they are limited to a
//! conservative slug alphabet. Client ids follow RFC 6749's visible-ASCII rule minus the space,
//! which keeps them safe inside both form bodies and the Basic credential.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Identifier kind.
		kind: &'static str,
	},
	/// The identifier contains a character outside its alphabet.
	#[error("{kind} identifier contains the disallowed character {character:?}.")]
	InvalidCharacter {
		/// Identifier kind.
		kind: &'static str,
		/// First offending character.
		character: char,
	},
	/// The identifier exceeded the allowed length.
	#[error("{kind} identifier exceeds {max} bytes.")]
	TooLong {
		/// Identifier kind.
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

struct Rule {
	kind: &'static str,
	max_len: usize,
	accepts: fn(char) -> bool,
}
impl Rule {
	fn check(&self, value: &str) -> Result<(), IdentifierError> {
		let kind = self.kind;

		if value.is_empty() {
			return Err(IdentifierError::Empty { kind });
		}
		if let Some(character) = value.chars().find(|c| !(self.accepts)(*c)) {
			return Err(IdentifierError::InvalidCharacter { kind, character });
		}
		if value.len() > self.max_len {
			return Err(IdentifierError::TooLong { kind, max: self.max_len });
		}

		Ok(())
	}
}

const REGISTRATION_RULE: Rule = Rule {
	kind: "Registration",
	max_len: 64,
	accepts: |c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'),
};
const CLIENT_RULE: Rule = Rule { kind: "Client", max_len: 255, accepts: |c| c.is_ascii_graphic() };

macro_rules! identifier {
	($(#[$meta:meta])* $name:ident => $rule:expr) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates and wraps the identifier.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				Self::try_from(value.as_ref().to_owned())
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$rule.check(&value).map(|()| Self(value))
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", $rule.kind, self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

identifier! {
	/// Key of a configured client registration, e.g. `my-client`.
	RegistrationId => REGISTRATION_RULE
}
identifier! {
	/// OAuth 2.0 `client_id` presented to the token endpoint.
	ClientId => CLIENT_RULE
}
