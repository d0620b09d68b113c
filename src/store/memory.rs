//! Thread-safe in-memory [`TokenStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, RegistrationId},
	store::{StoreFuture, TokenStore},
};

type Slot = Arc<Mutex<Option<AccessToken>>>;
type SlotIndex = Arc<RwLock<HashMap<RegistrationId, Slot>>>;

/// In-process token cache with one mutex-guarded slot per registration id.
///
/// The index lock is only taken for writing the first time an id is seen, so operations on
/// different ids never contend with each other.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SlotIndex);
impl MemoryStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	fn slot(index: &SlotIndex, id: &RegistrationId) -> Slot {
		if let Some(slot) = index.read().get(id) {
			return slot.clone();
		}

		index.write().entry(id.clone()).or_default().clone()
	}

	fn existing_slot(index: &SlotIndex, id: &RegistrationId) -> Option<Slot> {
		index.read().get(id).cloned()
	}

	fn get_now(index: &SlotIndex, id: &RegistrationId) -> Option<AccessToken> {
		Self::existing_slot(index, id).and_then(|slot| slot.lock().clone())
	}

	fn put_now(index: &SlotIndex, id: &RegistrationId, token: AccessToken) {
		*Self::slot(index, id).lock() = Some(token);
	}

	fn remove_now(index: &SlotIndex, id: &RegistrationId) {
		if let Some(slot) = Self::existing_slot(index, id) {
			slot.lock().take();
		}
	}
}
impl TokenStore for MemoryStore {
	fn get<'a>(&'a self, id: &'a RegistrationId) -> StoreFuture<'a, Option<AccessToken>> {
		Box::pin(async move { Ok(Self::get_now(&self.0, id)) })
	}

	fn put<'a>(&'a self, id: &'a RegistrationId, token: AccessToken) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			Self::put_now(&self.0, id, token);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, id: &'a RegistrationId) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			Self::remove_now(&self.0, id);

			Ok(())
		})
	}
}
