//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::token::AccessToken,
	store::{StoreError, StoreFuture, TokenStore},
};

type SlotMap = Arc<RwLock<HashMap<String, AccessToken>>>;

/// Thread-safe store that keeps tokens in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SlotMap);
impl MemoryStore {
	fn load_now(map: SlotMap, slot: String) -> Option<AccessToken> {
		map.read().get(&slot).cloned()
	}

	fn store_now(map: SlotMap, slot: String, token: AccessToken) -> Result<(), StoreError> {
		map.write().insert(slot, token);

		Ok(())
	}
}
impl TokenStore for MemoryStore {
	fn load<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, Option<AccessToken>> {
		let map = self.0.clone();
		let slot = slot.to_owned();

		Box::pin(async move { Ok(Self::load_now(map, slot)) })
	}

	fn store<'a>(&'a self, slot: &'a str, token: &'a AccessToken) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let slot = slot.to_owned();
		let token = token.clone();

		Box::pin(async move { Self::store_now(map, slot, token) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	use tokio::runtime::Runtime;
	// self
	use super::*;

	#[test]
	fn slots_are_independent() {
		let store = MemoryStore::default();
		let now = datetime!(2026-01-01 00:00:00 UTC);
		let token = AccessToken::from_exchange("tok-a", "Bearer", 600, None, now);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for memory store test.");

		rt.block_on(store.store("business_access_token", &token))
			.expect("Storing into a slot should succeed.");

		let hit = rt
			.block_on(store.load("business_access_token"))
			.expect("Loading a written slot should succeed.");
		let miss = rt
			.block_on(store.load("school_access_token"))
			.expect("Loading an unwritten slot should succeed.");

		assert_eq!(
			hit.expect("Written slot should be present.").token.expose(),
			"tok-a"
		);
		assert!(miss.is_none());
	}

	#[test]
	fn store_overwrites_existing_entries() {
		let store = MemoryStore::default();
		let now = datetime!(2026-01-01 00:00:00 UTC);
		let first = AccessToken::from_exchange("tok-1", "Bearer", 600, None, now);
		let second = AccessToken::from_exchange("tok-2", "Bearer", 600, None, now);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for memory store test.");

		rt.block_on(store.store("slot", &first)).expect("First write should succeed.");
		rt.block_on(store.store("slot", &second)).expect("Second write should succeed.");

		let current = rt
			.block_on(store.load("slot"))
			.expect("Loading the slot should succeed.")
			.expect("Slot should hold the latest write.");

		assert_eq!(current.token.expose(), "tok-2");
	}
}
