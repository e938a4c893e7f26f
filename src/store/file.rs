//! File-backed [`TokenStore`] keeping one JSON file per slot under a secrets directory.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::token::AccessToken,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Persists each slot to `<dir>/<slot>.json`, replacing the file atomically on write.
///
/// Writes go to a sibling temp file, are fsynced, then renamed over the slot file,
/// so a concurrent reader sees either the previous or the new token, never a torn
/// one. Processes sharing a directory coordinate through last-write-wins.
#[derive(Clone, Debug)]
pub struct FileStore {
	dir: PathBuf,
}
impl FileStore {
	/// Opens (or creates) a store rooted at the provided directory.
	pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let dir = dir.into();

		fs::create_dir_all(&dir).map_err(|e| StoreError::Backend {
			message: format!("Failed to create secrets directory {}: {e}", dir.display()),
		})?;

		Ok(Self { dir })
	}

	fn slot_path(&self, slot: &str) -> PathBuf {
		self.dir.join(format!("{slot}.json"))
	}

	fn load_slot(path: &Path) -> Result<Option<AccessToken>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let token = serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})?;

		Ok(Some(token))
	}

	fn persist_slot(&self, slot: &str, token: &AccessToken) -> Result<(), StoreError> {
		let path = self.slot_path(slot);
		let serialized =
			serde_json::to_vec_pretty(token).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize token for slot {slot}: {e}"),
			})?;
		let mut tmp_path = path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn load<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, Option<AccessToken>> {
		Box::pin(async move { Self::load_slot(&self.slot_path(slot)) })
	}

	fn store<'a>(&'a self, slot: &'a str, token: &'a AccessToken) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.persist_slot(slot, token) })
	}
}
