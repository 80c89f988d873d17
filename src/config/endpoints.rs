//! Authority and Graph endpoint resolution.

// self
use crate::{_prelude::*, auth::TenantId, error::ConfigError};

/// Directory and authority endpoints shared by every scope in a configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// Authority base; the token endpoint is `<authority>/<tenant>/oauth2/token`.
	pub authority: Url,
	/// Graph base; API calls go to `<graph>/<tenant>/<path>`.
	pub graph: Url,
	/// Value injected as the `api-version` query parameter.
	pub api_version: String,
}
impl Endpoints {
	/// Default authority host.
	pub const DEFAULT_AUTHORITY: &str = "https://login.windows.net/";
	/// Default Azure AD Graph host.
	pub const DEFAULT_GRAPH: &str = "https://graph.windows.net/";
	/// Graph API version pinned by this client.
	pub const DEFAULT_API_VERSION: &str = "1.5";

	/// Parses and validates an endpoint set.
	pub fn new(
		authority: &str,
		graph: &str,
		api_version: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let api_version = api_version.into();

		if api_version.trim().is_empty() {
			return Err(ConfigError::InvalidEndpoint { endpoint: "api-version", url: api_version });
		}

		Ok(Self {
			authority: parse_base("authority", authority)?,
			graph: parse_base("graph", graph)?,
			api_version,
		})
	}

	/// Endpoints of the public Azure cloud.
	pub fn azure() -> Result<Self, ConfigError> {
		Self::new(Self::DEFAULT_AUTHORITY, Self::DEFAULT_GRAPH, Self::DEFAULT_API_VERSION)
	}

	/// Token endpoint for the provided tenant.
	pub fn token_url(&self, tenant: &TenantId) -> Result<Url, ConfigError> {
		join_segments(&self.authority, "authority", [tenant.as_ref(), "oauth2", "token"])
	}

	/// Builds `<graph>/<tenant>/<path>?<query>&api-version=<version>`.
	///
	/// A caller-supplied `api-version` pair is replaced by the pinned version.
	pub fn graph_url(
		&self,
		tenant: &TenantId,
		path: &str,
		query: &[(&str, &str)],
	) -> Result<Url, ConfigError> {
		let segments =
			std::iter::once(tenant.as_ref()).chain(path.split('/').filter(|s| !s.is_empty()));
		let mut url = join_segments(&self.graph, "graph", segments)?;

		{
			let mut pairs = url.query_pairs_mut();

			for (key, value) in query.iter().filter(|(key, _)| *key != "api-version") {
				pairs.append_pair(key, value);
			}

			pairs.append_pair("api-version", &self.api_version);
		}

		Ok(url)
	}
}

fn parse_base(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	let url =
		Url::parse(raw).map_err(|source| ConfigError::UnparsableEndpoint { endpoint, source })?;

	if !matches!(url.scheme(), "https" | "http") || url.cannot_be_a_base() {
		return Err(ConfigError::InvalidEndpoint { endpoint, url: url.to_string() });
	}

	Ok(url)
}

fn join_segments<'a>(
	base: &Url,
	endpoint: &'static str,
	segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, ConfigError> {
	let mut url = base.clone();

	url.set_query(None);
	url.path_segments_mut()
		.map_err(|_| ConfigError::InvalidEndpoint { endpoint, url: base.to_string() })?
		.pop_if_empty()
		.extend(segments);

	Ok(url)
}
