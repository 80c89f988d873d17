//! Token store contract and built-in implementations.
//!
//! A store persists one [`CachedToken`] per [`StoreKey`] (environment + scope name), so a
//! single physical store can serve several deployment environments and every configured
//! scope without collisions. Saves replace the whole record for a key.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, EnvironmentName, ScopeName},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for cached access tokens.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the token for the provided key.
	fn save<'a>(&'a self, key: &'a StoreKey, token: &'a CachedToken) -> StoreFuture<'a, ()>;

	/// Loads the token for the provided key; `None` when nothing was ever saved.
	fn load<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CachedToken>>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
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

/// Unique key identifying a stored token.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Deployment environment partition.
	pub environment: EnvironmentName,
	/// Configuration scope owning the token.
	pub scope: ScopeName,
}
impl StoreKey {
	/// Builds a key for the provided environment and scope.
	pub fn new(environment: EnvironmentName, scope: ScopeName) -> Self {
		Self { environment, scope }
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}", self.environment, self.scope)
	}
}
