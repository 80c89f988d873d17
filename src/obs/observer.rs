// self
use crate::{_prelude::*, auth::ScopeName, http::Method, response::ServiceError};

/// Request metadata passed to a [`ResponseObserver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSummary {
	/// Scope whose client issued the request.
	pub scope: ScopeName,
	/// HTTP method.
	pub method: Method,
	/// Directory path relative to the tenant, without the query.
	pub path: String,
}

/// Receives classified service errors from the request dispatcher.
///
/// Not-found responses are an expected outcome and should stay quiet; everything else is an
/// unexpected server-side error. Both still resolve to an absent result for the directory
/// operations, so the observer is the only place the distinction is visible by default.
pub trait ResponseObserver
where
	Self: 'static + Send + Sync,
{
	/// Called for `Request_ResourceNotFound` error responses.
	fn on_not_found(&self, request: &RequestSummary, error: &ServiceError) {
		let _ = (request, error);
	}

	/// Called for every other `4xx`/`5xx` response.
	fn on_unexpected(&self, request: &RequestSummary, error: &ServiceError);
}

/// Default observer that forwards to `tracing` when the feature is enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;
impl ResponseObserver for TracingObserver {
	fn on_not_found(&self, request: &RequestSummary, error: &ServiceError) {
		#[cfg(feature = "tracing")]
		tracing::debug!(
			scope = %request.scope,
			method = %request.method,
			path = %request.path,
			status = error.status.as_u16(),
			"Directory resource not found."
		);
		#[cfg(not(feature = "tracing"))]
		let _ = (request, error);
	}

	fn on_unexpected(&self, request: &RequestSummary, error: &ServiceError) {
		#[cfg(feature = "tracing")]
		tracing::error!(
			scope = %request.scope,
			method = %request.method,
			path = %request.path,
			status = error.status.as_u16(),
			code = error.code.as_deref().unwrap_or("unknown"),
			body = %error.body,
			"Unexpected directory service error."
		);
		#[cfg(not(feature = "tracing"))]
		let _ = (request, error);
	}
}
