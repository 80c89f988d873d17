//! Token lifecycle: bootstrap, forced grants, and single-flight refresh.

// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	client::DirectoryClient,
	config::ScopedConfig,
	http::{DirectoryHttpClient, TransportErrorMapper},
	oauth,
	obs::{self, CallKind, CallOutcome, CallSpan},
};

impl<C, M> DirectoryClient<C, M>
where
	C: ?Sized + DirectoryHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Performs a client-credential grant now, persists it, and adopts it as the live token.
	pub async fn fetch_access_token(&self) -> Result<CachedToken> {
		let _singleflight = self.refresh_guard.lock().await;

		self.refresh_locked("fetch_access_token").await
	}

	/// Returns a copy of the live token.
	pub fn access_token(&self) -> CachedToken {
		self.token.read().clone()
	}

	/// Returns a token that has not expired, refreshing it first when necessary.
	pub(crate) async fn ensure_fresh_token(&self) -> Result<CachedToken> {
		let current = self.access_token();

		if !current.is_expired() {
			return Ok(current);
		}

		let _singleflight = self.refresh_guard.lock().await;
		// Another caller may have refreshed while this one waited for the guard.
		let current = self.access_token();

		if !current.is_expired() {
			return Ok(current);
		}

		self.refresh_locked("expired").await
	}

	pub(super) async fn bootstrap_token(
		http_client: &C,
		mapper: &M,
		config: &ScopedConfig,
	) -> Result<CachedToken> {
		if let Some(token) = config.load_token().await? {
			return Ok(token);
		}

		grant_and_save(http_client, mapper, config, "bootstrap").await
	}

	async fn refresh_locked(&self, stage: &'static str) -> Result<CachedToken> {
		let token = grant_and_save(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			&self.config,
			stage,
		)
		.await?;

		*self.token.write() = token.clone();

		Ok(token)
	}
}

async fn grant_and_save<C, M>(
	http_client: &C,
	mapper: &M,
	config: &ScopedConfig,
	stage: &'static str,
) -> Result<CachedToken>
where
	C: ?Sized + DirectoryHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	const KIND: CallKind = CallKind::TokenGrant;

	let span = CallSpan::new(KIND, stage);

	obs::record_call_outcome(KIND, CallOutcome::Attempt);

	let result = span
		.instrument(async move {
			let token = oauth::exchange_client_credentials(http_client, mapper, config).await?;

			config.save_token(&token).await?;

			Ok::<_, Error>(token)
		})
		.await;

	match &result {
		Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
		Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
	}

	result
}
