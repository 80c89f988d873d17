//! Transport primitives shared by the token grant and directory requests.
//!
//! The client's only dependency on an HTTP stack is [`DirectoryHttpClient`], which hands out
//! [`AsyncHttpClient`] handles from the `oauth2` crate. Requests and responses use the
//! `http` crate types re-exported by `oauth2`, so custom transports (or test fakes) never
//! see reqwest types. [`TransportErrorMapper`] turns transport failures into client errors.

pub use oauth2::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};

// std
use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	obs::CallKind,
};

/// Abstraction over HTTP transports used for both the authority and the graph.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back many clients,
/// and the handles they return must own whatever state their request futures need.
pub trait DirectoryHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single exchange.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for the next exchange.
	fn handle(&self) -> Self::Handle;
}

/// Maps HTTP transport failures into client [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted while performing `call`.
	fn map_transport_error(&self, call: CallKind, error: HttpClientError<E>) -> Error;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Directory responses are classified by status, including 3xx, so clients built through
/// [`ReqwestHttpClient::build`] never follow redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a non-redirecting client with an optional request timeout.
	pub fn build(timeout: Option<Duration>) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none());

		if let Some(timeout) = timeout {
			let timeout =
				std::time::Duration::try_from(timeout).map_err(ConfigError::http_client_build)?;

			builder = builder.timeout(timeout);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl DirectoryHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// [`AsyncHttpClient`] handle returned by [`ReqwestHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, call: CallKind, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(call, *inner),
			other => map_generic_transport_error(call, other),
		}
	}
}

/// Mapper for custom transports whose errors need no special treatment.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenericTransportErrorMapper;
impl<E> TransportErrorMapper<E> for GenericTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, call: CallKind, err: HttpClientError<E>) -> Error {
		map_generic_transport_error(call, err)
	}
}

/// Maps the transport-agnostic [`HttpClientError`] variants.
///
/// Custom mappers can delegate here for everything except their own transport errors.
pub fn map_generic_transport_error<E>(call: CallKind, err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let endpoint = call.endpoint();

	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(endpoint, *inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Other { endpoint, message }.into(),
		_ => TransportError::Other { endpoint, message: "unknown transport failure".into() }.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(call: CallKind, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { endpoint: call.endpoint() }.into();
	}

	TransportError::network(call.endpoint(), err).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug)]
	struct Refused;
	impl Display for Refused {
		fn fmt(&self, f: &mut Formatter) -> FmtResult {
			f.write_str("connection refused")
		}
	}
	impl StdError for Refused {}

	#[test]
	fn generic_mapper_classifies_variants() {
		let err = map_generic_transport_error(
			CallKind::Request,
			HttpClientError::Reqwest(Box::new(Refused)),
		);

		assert!(matches!(err, Error::Transport(TransportError::Network { endpoint: "graph", .. })));

		let err = map_generic_transport_error::<Refused>(
			CallKind::TokenGrant,
			HttpClientError::Other("boom".into()),
		);

		assert!(matches!(
			err,
			Error::Transport(TransportError::Other { endpoint: "authority", .. })
		));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn reqwest_client_builds_with_timeout() {
		assert!(ReqwestHttpClient::build(Some(Duration::seconds(5))).is_ok());
		assert!(ReqwestHttpClient::build(Some(Duration::seconds(-5))).is_err());
	}
}
