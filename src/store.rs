//! Token cache contract and the built-in in-memory implementation.
//!
//! The store holds zero or one [`AccessToken`] per registration id. It never inspects expiry:
//! deciding whether a cached token is still usable belongs to the executor.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, RegistrationId},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for cached access tokens.
///
/// Every operation is atomic for a given id; last `put` wins.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns a clone of the cached token, if present.
	fn get<'a>(&'a self, id: &'a RegistrationId) -> StoreFuture<'a, Option<AccessToken>>;

	/// Stores the token, replacing any previous entry.
	fn put<'a>(&'a self, id: &'a RegistrationId, token: AccessToken) -> StoreFuture<'a, ()>;

	/// Drops the cached token. Removing an absent entry is a no-op.
	fn remove<'a>(&'a self, id: &'a RegistrationId) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
