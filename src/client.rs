//! Scope-bound directory client.
//!
//! A [`DirectoryClient`] owns the live token of exactly one scope. Construction adopts the
//! token persisted for that scope or performs a fresh client-credential grant, and every
//! request checks the token's expiry first so refreshes stay transparent to callers.

pub mod dispatch;
pub mod users;

mod token;

pub use dispatch::*;
pub use users::*;

// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	config::{DirectoryConfig, ScopedConfig},
	http::{DirectoryHttpClient, TransportErrorMapper},
	obs::{ResponseObserver, TracingObserver},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestDirectoryClient = DirectoryClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Directory client bound to one configured scope.
///
/// Clients are `Send + Sync`; concurrent callers share one live token and at most one grant
/// is in flight per client at any time.
pub struct DirectoryClient<C, M>
where
	C: ?Sized + DirectoryHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for the authority and the graph.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	observer: Arc<dyn ResponseObserver>,
	config: ScopedConfig,
	token: RwLock<CachedToken>,
	refresh_guard: AsyncMutex<()>,
}
impl<C, M> DirectoryClient<C, M>
where
	C: ?Sized + DirectoryHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client for `scope` that reuses the caller-provided transport + mapper pair.
	///
	/// Adopts the token persisted for the scope when one exists; otherwise performs a grant
	/// and persists its result before returning.
	pub async fn with_http_client(
		config: &DirectoryConfig,
		scope: &str,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let config = config.using(scope)?.clone();
		let http_client = http_client.into();
		let transport_mapper = mapper.into();
		let token =
			Self::bootstrap_token(http_client.as_ref(), transport_mapper.as_ref(), &config).await?;

		Ok(Self {
			http_client,
			transport_mapper,
			observer: Arc::new(TracingObserver),
			config,
			token: RwLock::new(token),
			refresh_guard: AsyncMutex::new(()),
		})
	}

	/// Replaces the observer that receives classified service errors.
	pub fn with_observer(mut self, observer: Arc<dyn ResponseObserver>) -> Self {
		self.observer = observer;

		self
	}

	/// Configuration of the scope this client is bound to.
	pub fn config(&self) -> &ScopedConfig {
		&self.config
	}
}
#[cfg(feature = "reqwest")]
impl DirectoryClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client for `scope` backed by a reqwest transport.
	///
	/// The transport applies the scope's request timeout and never follows redirects.
	pub async fn initialize(config: &DirectoryConfig, scope: &str) -> Result<Self> {
		let timeout = config.using(scope)?.request_timeout;
		let http_client = ReqwestHttpClient::build(timeout)?;

		Self::with_http_client(config, scope, http_client, ReqwestTransportErrorMapper).await
	}
}
impl<C, M> Debug for DirectoryClient<C, M>
where
	C: ?Sized + DirectoryHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DirectoryClient")
			.field("config", &self.config)
			.field("token", &*self.token.read())
			.finish()
	}
}
