//! Scope sets requested by registrations and granted on tokens.

// std
use std::collections::BTreeSet;
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// The scope contains a character outside RFC 6749's `scope-token` grammar.
	#[error("Scope `{scope}` contains the disallowed character {character:?}.")]
	InvalidCharacter {
		/// The offending scope string.
		scope: String,
		/// First disallowed character.
		character: char,
	},
}

/// Sorted, deduplicated set of OAuth scopes.
///
/// Two sets listing the same scopes in a different order compare equal and produce the same
/// `scope` form value.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeSet(Arc<[String]>);
impl ScopeSet {
	/// Validates, sorts and deduplicates the provided scopes.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut sorted = BTreeSet::new();

		for scope in scopes {
			let scope = scope.into();

			validate(&scope)?;
			sorted.insert(scope);
		}

		Ok(Self(sorted.into_iter().collect()))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains `scope`.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Scopes in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Space-delimited form used for the `scope` request parameter.
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.iter()).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl TryFrom<Vec<String>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<ScopeSet> for Vec<String> {
	fn from(value: ScopeSet) -> Self {
		value.0.to_vec()
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	/// Parses the space-delimited `scope` value of a token response.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s.split(' ').filter(|scope| !scope.is_empty()))
	}
}

// scope-token = 1*( %x21 / %x23-5B / %x5D-7E )
fn validate(scope: &str) -> Result<(), ScopeValidationError> {
	if scope.is_empty() {
		return Err(ScopeValidationError::Empty);
	}

	match scope.chars().find(|c| !c.is_ascii_graphic() || matches!(c, '"' | '\\')) {
		Some(character) =>
			Err(ScopeValidationError::InvalidCharacter { scope: scope.to_owned(), character }),
		None => Ok(()),
	}
}
