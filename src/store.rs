//! Named-slot persistence contracts and built-in token stores.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::token::AccessToken};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for cached access tokens.
///
/// A store exposes independent named slots; the client reads and overwrites one
/// slot per credential. Writes must be atomic enough that a concurrent reader
/// never observes a partially written value. Multiple processes sharing a slot
/// coordinate only through last-write-wins.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the token cached under `slot`, if present.
	///
	/// A present-but-unparsable entry surfaces as [`StoreError::Serialization`]; the
	/// session layer treats that as a cache miss rather than a fatal failure.
	fn load<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, Option<AccessToken>>;

	/// Persists or replaces the token cached under `slot`.
	fn store<'a>(&'a self, slot: &'a str, token: &'a AccessToken) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// A cached entry exists but does not parse as a valid token.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl StoreError {
	/// Returns `true` for corrupt-entry failures that read as a cache miss.
	pub fn is_corrupt(&self) -> bool {
		matches!(self, Self::Serialization { .. })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn corruption_is_distinguished_from_backend_failures() {
		let corrupt = StoreError::Serialization { message: "bad json".into() };
		let backend = StoreError::Backend { message: "disk gone".into() };

		assert!(corrupt.is_corrupt());
		assert!(!backend.is_corrupt());
	}

	#[test]
	fn store_error_can_be_serialized() {
		let payload = serde_json::to_string(&StoreError::Backend { message: "disk".into() })
			.expect("Store error should serialize to JSON.");
		let round_trip: StoreError =
			serde_json::from_str(&payload).expect("Serialized store error should deserialize.");

		assert_eq!(round_trip, StoreError::Backend { message: "disk".into() });
	}
}
