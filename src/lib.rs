//! Azure Active Directory Graph client with scoped client-credential tokens, pluggable token
//! stores, and classified request dispatch in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod response;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		config::ConfigBuilder,
		http::{
			AsyncHttpClient, DirectoryHttpClient, HeaderMap, HeaderValue, HttpClientError,
			HttpRequest, HttpResponse, Method, ReqwestHttpClient, StatusCode, header,
		},
		obs::{RequestSummary, ResponseObserver},
		response::ServiceError,
	};

	/// Tenant used by test configurations.
	pub const TEST_TENANT: &str = "contoso.onmicrosoft.com";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Root configuration whose authority and graph both point at `base_url`.
	///
	/// The grant goes to `/<tenant>/oauth2/token` and directory calls to `/<tenant>/<path>`.
	pub fn test_config_builder(base_url: &str) -> ConfigBuilder {
		ConfigBuilder::default()
			.client_id("test-client")
			.client_secret("test-secret")
			.tenant_id(TEST_TENANT)
			.resource_id("https://graph.windows.net")
			.authority_url(base_url)
			.graph_url(base_url)
	}

	/// Builds an HTTP response with a JSON content type.
	pub fn json_response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = StatusCode::from_u16(status).expect("Status must be valid.");
		response
			.headers_mut()
			.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

		response
	}

	/// Successful grant response that expires `expires_in` seconds after issue.
	pub fn grant_response(access_token: &str, expires_in: i64) -> HttpResponse {
		json_response(
			200,
			&format!(
				r#"{{"access_token":"{access_token}","token_type":"Bearer","expires_in":"{}"}}"#,
				expires_in
			),
		)
	}

	/// Request captured by [`ScriptedHttpClient`].
	#[derive(Clone, Debug)]
	pub struct RecordedRequest {
		/// HTTP method.
		pub method: Method,
		/// Full request URL.
		pub url: Url,
		/// Request headers.
		pub headers: HeaderMap,
		/// Raw body bytes.
		pub body: Vec<u8>,
	}
	impl RecordedRequest {
		/// Body parsed as JSON.
		pub fn json(&self) -> Value {
			serde_json::from_slice(&self.body).expect("Recorded body should be JSON.")
		}

		/// Body parsed as `application/x-www-form-urlencoded` pairs.
		pub fn form(&self) -> BTreeMap<String, String> {
			url::form_urlencoded::parse(&self.body).into_owned().collect()
		}
	}

	/// Fake transport that replays scripted responses and records every request.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedHttpClient {
		responses: Arc<Mutex<VecDeque<HttpResponse>>>,
		requests: Arc<Mutex<Vec<RecordedRequest>>>,
	}
	impl ScriptedHttpClient {
		/// Queues a response for the next unanswered request.
		pub fn respond(&self, response: HttpResponse) -> &Self {
			self.responses.lock().push_back(response);

			self
		}

		/// Requests seen so far, in order.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.requests.lock().clone()
		}

		/// Requests whose path ends with `suffix`.
		pub fn requests_to(&self, suffix: &str) -> Vec<RecordedRequest> {
			self.requests().into_iter().filter(|r| r.url.path().ends_with(suffix)).collect()
		}
	}
	impl DirectoryHttpClient for ScriptedHttpClient {
		type Handle = ScriptedHttpClient;
		type TransportError = std::io::Error;

		fn handle(&self) -> Self::Handle {
			self.clone()
		}
	}
	impl<'c> AsyncHttpClient<'c> for ScriptedHttpClient {
		type Error = HttpClientError<std::io::Error>;
		type Future =
			Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			let url = Url::parse(&request.uri().to_string()).expect("Request URI should be a URL.");

			self.requests.lock().push(RecordedRequest {
				method: request.method().clone(),
				url,
				headers: request.headers().clone(),
				body: request.into_body(),
			});

			let next = self.responses.lock().pop_front();

			Box::pin(async move {
				next.ok_or_else(|| HttpClientError::Other("No scripted response left.".into()))
			})
		}
	}

	/// Observer that records every classified service error it receives.
	#[derive(Debug, Default)]
	pub struct RecordingObserver {
		/// Not-found responses as `(path, status)`.
		pub not_found: Mutex<Vec<(String, u16)>>,
		/// Unexpected errors as `(path, status)`.
		pub unexpected: Mutex<Vec<(String, u16)>>,
	}
	impl ResponseObserver for RecordingObserver {
		fn on_not_found(&self, request: &RequestSummary, error: &ServiceError) {
			self.not_found.lock().push((request.path.clone(), error.status.as_u16()));
		}

		fn on_unexpected(&self, request: &RequestSummary, error: &ServiceError) {
			self.unexpected.lock().push((request.path.clone(), error.status.as_u16()));
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
#[cfg(all(test, not(feature = "tracing")))] use tracing_subscriber as _;
