//! Scoped client configuration.
//!
//! [`ConfigBuilder`] accumulates root settings plus named scope overrides and then
//! materializes a [`DirectoryConfig`]: one immutable [`ScopedConfig`] for the implicit
//! `main` scope and one per named scope. Scopes share the endpoints, environment, and
//! (unless they override it) the token store that was configured when they were declared.
//! [`Configuration`] is the caller-held handle that is installed once and then shared.

pub mod builder;
pub mod endpoints;
pub mod settings;

pub use builder::*;
pub use endpoints::*;
pub use settings::*;

// std
use std::sync::OnceLock;
// crates.io
use oauth2::ClientSecret;
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, EnvironmentName, ScopeName, TenantId},
	error::ConfigError,
	store::{StoreError, StoreKey, TokenStore},
};

/// Immutable configuration for one scope.
#[derive(Clone)]
pub struct ScopedConfig {
	/// Scope name, unique within a configuration tree.
	pub scope: ScopeName,
	/// Application (client) identifier.
	pub client_id: String,
	/// Application secret.
	pub client_secret: ClientSecret,
	/// Tenant that issues tokens and hosts the directory.
	pub tenant_id: TenantId,
	/// Resource the access token is requested for.
	pub resource_id: String,
	/// Shared token store, if tokens should survive the process.
	pub token_store: Option<Arc<dyn TokenStore>>,
	/// Environment partition used for token store keys.
	pub environment: EnvironmentName,
	/// Authority and graph endpoints.
	pub endpoints: Endpoints,
	/// Timeout applied to every HTTP exchange, when set.
	pub request_timeout: Option<Duration>,
}
impl ScopedConfig {
	/// Key under which this scope's token is persisted.
	pub fn store_key(&self) -> StoreKey {
		StoreKey::new(self.environment.clone(), self.scope.clone())
	}

	/// Loads the persisted token; `None` without a store or without a prior save.
	pub async fn load_token(&self) -> Result<Option<CachedToken>, StoreError> {
		match &self.token_store {
			Some(store) => store.load(&self.store_key()).await,
			None => Ok(None),
		}
	}

	/// Persists the token when a store is configured.
	pub async fn save_token(&self, token: &CachedToken) -> Result<(), StoreError> {
		match &self.token_store {
			Some(store) => store.save(&self.store_key(), token).await,
			None => Ok(()),
		}
	}

	/// Token endpoint for this scope's tenant.
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		self.endpoints.token_url(&self.tenant_id)
	}
}
impl Debug for ScopedConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ScopedConfig")
			.field("scope", &self.scope)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("tenant_id", &self.tenant_id)
			.field("resource_id", &self.resource_id)
			.field("token_store_set", &self.token_store.is_some())
			.field("environment", &self.environment)
			.field("endpoints", &self.endpoints)
			.field("request_timeout", &self.request_timeout)
			.finish()
	}
}

/// Materialized configuration tree: the `main` scope plus every named scope.
#[derive(Clone, Debug)]
pub struct DirectoryConfig {
	root: ScopedConfig,
	scopes: BTreeMap<ScopeName, ScopedConfig>,
}
impl DirectoryConfig {
	/// Returns a builder for a new configuration tree.
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder::default()
	}

	/// Configuration of the implicit `main` scope.
	pub fn root(&self) -> &ScopedConfig {
		&self.root
	}

	/// Resolves a scope by name; `main` resolves to the root.
	pub fn using(&self, scope: &str) -> Result<&ScopedConfig, ConfigError> {
		if scope == ScopeName::MAIN {
			return Ok(&self.root);
		}

		self.scopes.get(scope).ok_or_else(|| ConfigError::UnknownScope { scope: scope.to_owned() })
	}

	/// Names of every configured scope, `main` first.
	pub fn scope_names(&self) -> impl Iterator<Item = &ScopeName> {
		std::iter::once(&self.root.scope).chain(self.scopes.keys())
	}
}

/// Caller-held configuration slot that is installed exactly once.
///
/// Hand out clones of the [`Arc`] returned by [`Configuration::get`] instead of relying on
/// hidden global state.
#[derive(Debug, Default)]
pub struct Configuration(OnceLock<Arc<DirectoryConfig>>);
impl Configuration {
	/// Creates an empty slot.
	pub const fn new() -> Self {
		Self(OnceLock::new())
	}

	/// Builds and installs the configuration; a second call fails with
	/// [`ConfigError::AlreadyConfigured`].
	pub fn configure(&self, builder: ConfigBuilder) -> Result<Arc<DirectoryConfig>> {
		let config = Arc::new(builder.build()?);

		self.0.set(config.clone()).map_err(|_| ConfigError::AlreadyConfigured)?;

		Ok(config)
	}

	/// Returns the installed configuration or [`Error::MissingConfiguration`].
	pub fn get(&self) -> Result<Arc<DirectoryConfig>> {
		self.0.get().cloned().ok_or(Error::MissingConfiguration)
	}
}
