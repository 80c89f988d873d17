//! Fluent builder that materializes root and named scopes.

// std
use std::collections::BTreeSet;
// crates.io
use oauth2::ClientSecret;
// self
use crate::{
	_prelude::*,
	auth::{EnvironmentName, ScopeName, TenantId},
	config::{DirectoryConfig, Endpoints, ScopedConfig},
	error::ConfigError,
	store::TokenStore,
};

/// Credential fields a scope may set or inherit from the root.
#[derive(Clone, Debug, Default)]
struct CredentialFields {
	client_id: Option<String>,
	client_secret: Option<String>,
	tenant_id: Option<String>,
	resource_id: Option<String>,
}
impl CredentialFields {
	fn or(self, defaults: &Self) -> Self {
		Self {
			client_id: self.client_id.or_else(|| defaults.client_id.clone()),
			client_secret: self.client_secret.or_else(|| defaults.client_secret.clone()),
			tenant_id: self.tenant_id.or_else(|| defaults.tenant_id.clone()),
			resource_id: self.resource_id.or_else(|| defaults.resource_id.clone()),
		}
	}
}

struct ScopeDraft {
	name: String,
	fields: CredentialFields,
	token_store: Option<Arc<dyn TokenStore>>,
}

/// Builder for a [`DirectoryConfig`].
///
/// Statements outside [`ConfigBuilder::scope`] configure the implicit `main` scope. Each
/// named scope starts from the token store configured so far and inherits the root's
/// credential fields unless it overrides them.
#[derive(Default)]
pub struct ConfigBuilder {
	root: CredentialFields,
	token_store: Option<Arc<dyn TokenStore>>,
	environment: Option<String>,
	authority_url: Option<String>,
	graph_url: Option<String>,
	api_version: Option<String>,
	request_timeout: Option<Duration>,
	scopes: Vec<ScopeDraft>,
}
impl ConfigBuilder {
	/// Uses a persistent token store; declare it before the scopes that should share it.
	pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
		self.token_store = Some(store);

		self
	}

	/// Application (client) identifier of the root scope.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.root.client_id = Some(client_id.into());

		self
	}

	/// Application secret of the root scope.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.root.client_secret = Some(client_secret.into());

		self
	}

	/// Tenant of the root scope.
	pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
		self.root.tenant_id = Some(tenant_id.into());

		self
	}

	/// Resource identifier requested by the root scope.
	pub fn resource_id(mut self, resource_id: impl Into<String>) -> Self {
		self.root.resource_id = Some(resource_id.into());

		self
	}

	/// Environment partition for token store keys (defaults to `production`).
	pub fn environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());

		self
	}

	/// Overrides the authority base URL.
	pub fn authority_url(mut self, url: impl Into<String>) -> Self {
		self.authority_url = Some(url.into());

		self
	}

	/// Overrides the graph base URL.
	pub fn graph_url(mut self, url: impl Into<String>) -> Self {
		self.graph_url = Some(url.into());

		self
	}

	/// Overrides the pinned `api-version`.
	pub fn api_version(mut self, version: impl Into<String>) -> Self {
		self.api_version = Some(version.into());

		self
	}

	/// Applies a timeout to every HTTP exchange.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Declares a named scope configured by `configure`.
	pub fn scope(
		mut self,
		name: impl Into<String>,
		configure: impl FnOnce(ScopeBuilder) -> ScopeBuilder,
	) -> Self {
		let scope = configure(ScopeBuilder {
			fields: CredentialFields::default(),
			token_store: self.token_store.clone(),
		});

		self.scopes.push(ScopeDraft {
			name: name.into(),
			fields: scope.fields,
			token_store: scope.token_store,
		});

		self
	}

	/// Validates every scope and materializes the configuration tree.
	pub fn build(self) -> Result<DirectoryConfig, ConfigError> {
		let environment = match self.environment {
			Some(raw) => EnvironmentName::new(raw)?,
			None => EnvironmentName::default(),
		};
		let endpoints = Endpoints::new(
			self.authority_url.as_deref().unwrap_or(Endpoints::DEFAULT_AUTHORITY),
			self.graph_url.as_deref().unwrap_or(Endpoints::DEFAULT_GRAPH),
			self.api_version.as_deref().unwrap_or(Endpoints::DEFAULT_API_VERSION),
		)?;
		let shared = Shared { environment, endpoints, request_timeout: self.request_timeout };
		let root = materialize(ScopeName::main(), self.root.clone(), self.token_store, &shared)?;
		let mut seen = BTreeSet::new();
		let mut scopes = BTreeMap::new();

		for draft in self.scopes {
			let name = ScopeName::new(&draft.name)?;

			if name.is_main() || !seen.insert(name.clone()) {
				return Err(ConfigError::DuplicateScope { scope: draft.name });
			}

			let config =
				materialize(name.clone(), draft.fields.or(&self.root), draft.token_store, &shared)?;

			scopes.insert(name, config);
		}

		Ok(DirectoryConfig { root, scopes })
	}
}

/// Field overrides for a single named scope.
pub struct ScopeBuilder {
	fields: CredentialFields,
	token_store: Option<Arc<dyn TokenStore>>,
}
impl ScopeBuilder {
	/// Application (client) identifier of this scope.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.fields.client_id = Some(client_id.into());

		self
	}

	/// Application secret of this scope.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.fields.client_secret = Some(client_secret.into());

		self
	}

	/// Tenant of this scope.
	pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
		self.fields.tenant_id = Some(tenant_id.into());

		self
	}

	/// Resource identifier requested by this scope.
	pub fn resource_id(mut self, resource_id: impl Into<String>) -> Self {
		self.fields.resource_id = Some(resource_id.into());

		self
	}

	/// Replaces the inherited token store for this scope only.
	pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
		self.token_store = Some(store);

		self
	}
}

struct Shared {
	environment: EnvironmentName,
	endpoints: Endpoints,
	request_timeout: Option<Duration>,
}

fn materialize(
	scope: ScopeName,
	fields: CredentialFields,
	token_store: Option<Arc<dyn TokenStore>>,
	shared: &Shared,
) -> Result<ScopedConfig, ConfigError> {
	let missing =
		|field: &'static str| ConfigError::MissingField { scope: scope.to_string(), field };
	let client_id = fields.client_id.ok_or_else(|| missing("client_id"))?;
	let client_secret = fields.client_secret.ok_or_else(|| missing("client_secret"))?;
	let tenant_id = TenantId::new(fields.tenant_id.ok_or_else(|| missing("tenant_id"))?)?;
	let resource_id = fields.resource_id.ok_or_else(|| missing("resource_id"))?;

	Ok(ScopedConfig {
		scope,
		client_id,
		client_secret: ClientSecret::new(client_secret),
		tenant_id,
		resource_id,
		token_store,
		environment: shared.environment.clone(),
		endpoints: shared.endpoints.clone(),
		request_timeout: shared.request_timeout,
	})
}
