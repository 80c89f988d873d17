//! File-backed [`TokenStore`] that keeps a JSON snapshot of every cached token.
//!
//! The snapshot nests records by environment, then scope name:
//!
//! ```json
//! {
//!   "production": {
//!     "main": { "access_token": "...", "token_type": "Bearer", "expires_at": 1735689600 }
//!   }
//! }
//! ```

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	store::{StoreError, StoreFuture, StoreKey, TokenStore},
};

type Snapshot = BTreeMap<String, BTreeMap<String, CachedToken>>;

/// Persists tokens to a JSON file after each save.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		if !path.exists() {
			return Ok(Snapshot::new());
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(Snapshot::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

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

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn save<'a>(&'a self, key: &'a StoreKey, token: &'a CachedToken) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let mut next = guard.clone();

			next.entry(key.environment.to_string())
				.or_default()
				.insert(key.scope.to_string(), token.clone());
			self.persist_locked(&next)?;

			*guard = next;

			Ok(())
		})
	}

	fn load<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CachedToken>> {
		Box::pin(async move {
			let guard = self.inner.read();

			Ok(guard
				.get(key.environment.as_ref())
				.and_then(|scopes| scopes.get(key.scope.as_ref()))
				.cloned())
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use time::macros;
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::{EnvironmentName, ScopeName};

	fn temp_path(label: &str) -> PathBuf {
		let unique = format!(
			"azure_directory_file_store_{label}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn key(environment: &str, scope: &str) -> StoreKey {
		StoreKey::new(
			EnvironmentName::new(environment).expect("Environment fixture should be valid."),
			ScopeName::new(scope).expect("Scope fixture should be valid."),
		)
	}

	fn token(access: &str) -> CachedToken {
		CachedToken::builder()
			.access_token(access)
			.expires_at(macros::datetime!(2030-01-01 00:00 UTC))
			.build()
			.expect("Failed to build file-store test token.")
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path("round_trip");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let key = key("production", "main");
		let token = token("access-token");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(&key, &token)).expect("Failed to save fixture token.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.load(&key))
			.expect("Failed to load fixture token from file store.")
			.expect("File store lost token after reopen.");

		assert_eq!(fetched, token);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn environments_and_scopes_do_not_collide() {
		let path = temp_path("partition");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(&key("production", "main"), &token("prod-main")))
			.expect("Failed to save production token.");
		rt.block_on(store.save(&key("staging", "main"), &token("staging-main")))
			.expect("Failed to save staging token.");

		let prod = rt
			.block_on(store.load(&key("production", "main")))
			.expect("Load should succeed.")
			.expect("Production token should be present.");
		let missing =
			rt.block_on(store.load(&key("production", "reporting"))).expect("Load should succeed.");

		assert_eq!(prod.access_token.expose(), "prod-main");
		assert!(missing.is_none(), "Unsaved scopes must load as absent.");

		let raw: serde_json::Value = serde_json::from_slice(
			&fs::read(&path).expect("Snapshot file should exist after a save."),
		)
		.expect("Snapshot should be valid JSON.");

		assert_eq!(raw["staging"]["main"]["access_token"], "staging-main");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_write_leaves_the_snapshot_untouched() {
		let dir = temp_path("failed_write");

		fs::create_dir_all(&dir).expect("Failed to create store directory.");

		let store = FileStore::open(dir.join("tokens.json")).expect("Store should open.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let key = key("production", "main");

		// A plain file where the parent directory should be makes every write fail.
		fs::remove_dir_all(&dir).expect("Failed to remove store directory.");
		fs::write(&dir, b"").expect("Failed to block the store directory.");

		assert!(rt.block_on(store.save(&key, &token("lost"))).is_err());
		assert!(rt.block_on(store.load(&key)).expect("Load should succeed.").is_none());

		fs::remove_file(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove blocking file {}: {e}", dir.display())
		});
	}

	#[test]
	fn empty_file_opens_as_empty_store() {
		let path = temp_path("empty");

		File::create(&path).expect("Failed to create empty snapshot file.");

		let store = FileStore::open(&path).expect("Empty snapshot should open.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		assert!(
			rt.block_on(store.load(&key("production", "main")))
				.expect("Load should succeed.")
				.is_none()
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
