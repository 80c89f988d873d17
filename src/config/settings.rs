//! JSON settings surface for loading a configuration from disk.

// std
use std::{
	fs,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	config::ConfigBuilder,
	error::ConfigError,
	store::{FileStore, StoreError, TokenStore},
};

/// Serializable configuration surface, typically loaded from a JSON document.
///
/// ```json
/// {
///   "tenant_id": "contoso.onmicrosoft.com",
///   "client_id": "...",
///   "client_secret": "...",
///   "resource_id": "https://graph.windows.net",
///   "token_store": "tmp/azure_tokens.json",
///   "scopes": { "billing": { "client_id": "...", "client_secret": "..." } }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectorySettings {
	/// Root application (client) identifier.
	pub client_id: Option<String>,
	/// Root application secret.
	pub client_secret: Option<String>,
	/// Root tenant.
	pub tenant_id: Option<String>,
	/// Root resource identifier.
	pub resource_id: Option<String>,
	/// Path of a JSON token store shared by every scope.
	pub token_store: Option<PathBuf>,
	/// Environment partition for token store keys.
	pub environment: Option<String>,
	/// Authority base URL override.
	pub authority_url: Option<String>,
	/// Graph base URL override.
	pub graph_url: Option<String>,
	/// `api-version` override.
	pub api_version: Option<String>,
	/// Per-request timeout in seconds.
	pub request_timeout_secs: Option<u64>,
	/// Named scopes.
	pub scopes: BTreeMap<String, ScopeSettings>,
}
impl DirectorySettings {
	/// Parses settings from a JSON string.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(de)
			.map_err(|source| ConfigError::InvalidSettings { source })
	}

	/// Reads and parses settings from a JSON file.
	pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path).map_err(|source| ConfigError::SettingsIo {
			path: path.display().to_string(),
			source,
		})?;

		Self::from_json_str(&raw)
	}

	/// Converts the settings into a builder, opening file-backed token stores on the way.
	pub fn into_builder(self) -> Result<ConfigBuilder> {
		let mut builder = ConfigBuilder::default();
		let mut stores = BTreeMap::new();

		if let Some(path) = self.token_store {
			builder = builder.token_store(open_store(&mut stores, path)?);
		}

		builder = apply(builder, self.client_id, |b, v| b.client_id(v));
		builder = apply(builder, self.client_secret, |b, v| b.client_secret(v));
		builder = apply(builder, self.tenant_id, |b, v| b.tenant_id(v));
		builder = apply(builder, self.resource_id, |b, v| b.resource_id(v));
		builder = apply(builder, self.environment, |b, v| b.environment(v));
		builder = apply(builder, self.authority_url, |b, v| b.authority_url(v));
		builder = apply(builder, self.graph_url, |b, v| b.graph_url(v));
		builder = apply(builder, self.api_version, |b, v| b.api_version(v));

		if let Some(secs) = self.request_timeout_secs {
			let secs = i64::try_from(secs).unwrap_or(i64::MAX);

			builder = builder.request_timeout(Duration::seconds(secs));
		}

		for (name, scope) in self.scopes {
			let store = match scope.token_store {
				Some(path) => Some(open_store(&mut stores, path)?),
				None => None,
			};

			builder = builder.scope(name, |mut s| {
				if let Some(value) = scope.client_id {
					s = s.client_id(value);
				}
				if let Some(value) = scope.client_secret {
					s = s.client_secret(value);
				}
				if let Some(value) = scope.tenant_id {
					s = s.tenant_id(value);
				}
				if let Some(value) = scope.resource_id {
					s = s.resource_id(value);
				}
				if let Some(store) = store {
					s = s.token_store(store);
				}

				s
			});
		}

		Ok(builder)
	}
}

/// Overrides for a single named scope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeSettings {
	/// Application (client) identifier.
	pub client_id: Option<String>,
	/// Application secret.
	pub client_secret: Option<String>,
	/// Tenant.
	pub tenant_id: Option<String>,
	/// Resource identifier.
	pub resource_id: Option<String>,
	/// Path of a token store used by this scope only.
	pub token_store: Option<PathBuf>,
}

// One store per distinct path; two snapshots of the same file would overwrite each other.
fn open_store(
	stores: &mut BTreeMap<PathBuf, Arc<dyn TokenStore>>,
	path: PathBuf,
) -> Result<Arc<dyn TokenStore>, StoreError> {
	if let Some(store) = stores.get(&path) {
		return Ok(store.clone());
	}

	let store: Arc<dyn TokenStore> = Arc::new(FileStore::open(&path)?);

	stores.insert(path, store.clone());

	Ok(store)
}

fn apply(
	builder: ConfigBuilder,
	value: Option<String>,
	setter: fn(ConfigBuilder, String) -> ConfigBuilder,
) -> ConfigBuilder {
	match value {
		Some(value) => setter(builder, value),
		None => builder,
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
	use crate::auth::CachedToken;

	#[test]
	fn settings_build_a_scoped_configuration() {
		let settings = DirectorySettings::from_json_str(
			r#"{
				"client_id": "root-client",
				"client_secret": "root-secret",
				"tenant_id": "contoso.onmicrosoft.com",
				"resource_id": "https://graph.windows.net",
				"environment": "staging",
				"request_timeout_secs": 15,
				"scopes": { "billing": { "client_id": "billing-client" } }
			}"#,
		)
		.expect("Settings should parse.");
		let config = settings
			.into_builder()
			.expect("Settings should convert into a builder.")
			.build()
			.expect("Configuration should build.");
		let billing = config.using("billing").expect("Billing scope should resolve.");

		assert_eq!(billing.client_id, "billing-client");
		assert_eq!(billing.tenant_id.as_ref(), "contoso.onmicrosoft.com");
		assert_eq!(billing.environment.as_ref(), "staging");
		assert_eq!(billing.request_timeout, Some(Duration::seconds(15)));
		assert!(billing.token_store.is_none());
	}

	#[test]
	fn scopes_naming_the_root_store_path_share_one_store() {
		let path = env::temp_dir().join(format!(
			"azure_directory_settings_shared_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		));
		let raw = serde_json::json!({
			"client_id": "root-client",
			"client_secret": "root-secret",
			"tenant_id": "contoso.onmicrosoft.com",
			"resource_id": "https://graph.windows.net",
			"token_store": path,
			"scopes": { "billing": { "client_id": "billing-client", "token_store": path } }
		});
		let config = DirectorySettings::from_json_str(&raw.to_string())
			.expect("Settings should parse.")
			.into_builder()
			.expect("Settings should convert into a builder.")
			.build()
			.expect("Configuration should build.");
		let billing = config.using("billing").expect("Billing scope should resolve.");
		let root_store = config.root().token_store.clone().expect("Root should have a store.");
		let billing_store = billing.token_store.clone().expect("Billing should have a store.");
		let token = |access: &str| {
			CachedToken::builder()
				.access_token(access)
				.expires_at(macros::datetime!(2030-01-01 00:00 UTC))
				.build()
				.expect("Token fixture should build.")
		};
		let rt = Runtime::new().expect("Failed to build Tokio runtime for settings test.");

		assert!(Arc::ptr_eq(&root_store, &billing_store));

		rt.block_on(config.root().save_token(&token("main-token")))
			.expect("Root save should succeed.");
		rt.block_on(billing.save_token(&token("billing-token")))
			.expect("Billing save should succeed.");

		let reopened = FileStore::open(&path).expect("Snapshot should reopen.");
		let main = rt
			.block_on(reopened.load(&config.root().store_key()))
			.expect("Load should succeed.")
			.expect("Root token should survive the billing save.");
		let other = rt
			.block_on(reopened.load(&billing.store_key()))
			.expect("Load should succeed.")
			.expect("Billing token should be persisted.");

		assert_eq!(main.access_token.expose(), "main-token");
		assert_eq!(other.access_token.expose(), "billing-token");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary settings snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn unknown_fields_point_at_their_path() {
		let err = DirectorySettings::from_json_str(
			r#"{ "scopes": { "billing": { "clientid": "x" } } }"#,
		)
		.expect_err("Unknown fields must be rejected.");

		match err {
			ConfigError::InvalidSettings { source } =>
				assert!(source.path().to_string().starts_with("scopes.billing")),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
