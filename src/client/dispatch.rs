//! Authenticated request dispatch against the graph.

// crates.io
use oauth2::http::Request;
// self
use crate::{
	_prelude::*,
	client::DirectoryClient,
	error::ConfigError,
	http::{AsyncHttpClient, DirectoryHttpClient, Method, TransportErrorMapper, header},
	obs::{self, CallKind, CallOutcome, CallSpan, RequestSummary},
	response::ApiResponse,
};

/// Request payload sent to the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// Pre-encoded JSON document.
	Json(Vec<u8>),
}
impl RequestBody {
	/// Encodes `value` as JSON.
	pub fn json<T>(value: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		serde_json::to_vec(value).map(Self::Json).map_err(Error::Encode)
	}

	/// Whether the request carries no body.
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}

	fn into_bytes(self) -> Vec<u8> {
		match self {
			Self::Empty => Vec::new(),
			Self::Json(bytes) => bytes,
		}
	}
}

impl<C, M> DirectoryClient<C, M>
where
	C: ?Sized + DirectoryHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends an authenticated request to `<graph>/<tenant>/<path>` and classifies the response.
	///
	/// The pinned `api-version` is always appended to `query`. An expired token is refreshed
	/// before the request goes out. Error statuses are reported to the observer and returned
	/// as [`ApiResponse::NotFound`] or [`ApiResponse::Failed`] rather than as [`Error`]s.
	pub async fn execute(
		&self,
		method: Method,
		path: &str,
		query: &[(&str, &str)],
		body: RequestBody,
	) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "execute");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.dispatch(method, path, query, body)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn dispatch(
		&self,
		method: Method,
		path: &str,
		query: &[(&str, &str)],
		body: RequestBody,
	) -> Result<ApiResponse> {
		let token = self.ensure_fresh_token().await?;
		let url = self.config.endpoints.graph_url(&self.config.tenant_id, path, query)?;
		let request = Request::builder()
			.method(method.clone())
			.uri(url.as_str())
			.header(header::AUTHORIZATION, token.access_token.bearer())
			.header(header::ACCEPT, "application/json")
			.header(header::CONTENT_TYPE, "application/json")
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;
		let handle = self.http_client.handle();
		let response = handle
			.call(request)
			.await
			.map_err(|e| self.transport_mapper.map_transport_error(CallKind::Request, e))?;
		let classified = ApiResponse::classify(response);

		match &classified {
			ApiResponse::NotFound(error) =>
				self.observer.on_not_found(&self.summary(method, path), error),
			ApiResponse::Failed(error) =>
				self.observer.on_unexpected(&self.summary(method, path), error),
			_ => (),
		}

		Ok(classified)
	}

	fn summary(&self, method: Method, path: &str) -> RequestSummary {
		RequestSummary {
			scope: self.config.scope.clone(),
			method,
			path: path.trim_start_matches('/').to_owned(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn json_bodies_are_encoded_once() {
		let body = RequestBody::json(&serde_json::json!({ "accountEnabled": false }))
			.expect("JSON body should encode.");

		assert_eq!(body, RequestBody::Json(br#"{"accountEnabled":false}"#.to_vec()));
		assert!(!body.is_empty());
		assert!(RequestBody::default().is_empty());
	}
}
