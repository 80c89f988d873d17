//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	store::{StoreFuture, StoreKey, TokenStore},
};

/// Storage backend that keeps tokens in-process and counts saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
	tokens: RwLock<HashMap<StoreKey, CachedToken>>,
	saves: AtomicU64,
}
impl MemoryStore {
	/// Seeds the store with a token without counting it as a save.
	pub fn with_token(self, key: StoreKey, token: CachedToken) -> Self {
		self.tokens.write().insert(key, token);

		self
	}

	/// Returns the number of [`TokenStore::save`] calls observed so far.
	pub fn save_count(&self) -> u64 {
		self.saves.load(Ordering::Relaxed)
	}

	/// Returns a snapshot of the token stored under `key`.
	pub fn get(&self, key: &StoreKey) -> Option<CachedToken> {
		self.tokens.read().get(key).cloned()
	}
}
impl TokenStore for MemoryStore {
	fn save<'a>(&'a self, key: &'a StoreKey, token: &'a CachedToken) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.tokens.write().insert(key.clone(), token.clone());
			self.saves.fetch_add(1, Ordering::Relaxed);

			Ok(())
		})
	}

	fn load<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CachedToken>> {
		Box::pin(async move { Ok(self.get(key)) })
	}
}
