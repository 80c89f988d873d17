//! Classification of directory API responses.
//!
//! Every HTTP exchange that reaches the graph ends as an [`ApiResponse`]; only configuration,
//! authentication, and transport failures become [`Error`] values.

// self
use crate::{
	_prelude::*,
	http::{HeaderMap, HttpResponse, StatusCode},
};

/// Error code the directory uses for missing resources.
pub const RESOURCE_NOT_FOUND: &str = "Request_ResourceNotFound";

/// Classified outcome of a directory request.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse {
	/// `200 OK` or `201 Created` with the parsed body.
	Body(Value),
	/// `204 No Content`.
	NoContent,
	/// Any other non-error status, returned untouched.
	Passthrough(RawResponse),
	/// Error status whose payload carries the `Request_ResourceNotFound` code.
	NotFound(ServiceError),
	/// Any other error status.
	Failed(ServiceError),
}
impl ApiResponse {
	/// Classifies a raw HTTP response.
	pub fn classify(response: HttpResponse) -> Self {
		let status = response.status();
		let headers = response.headers().clone();
		let body = response.into_body();

		match status.as_u16() {
			200 | 201 => Self::Body(parse_body(&body)),
			204 => Self::NoContent,
			code if code >= 400 => {
				let error = ServiceError::from_body(status, &body);

				if error.is_not_found() { Self::NotFound(error) } else { Self::Failed(error) }
			},
			_ => Self::Passthrough(RawResponse { status, headers, body }),
		}
	}

	/// Collapses both error variants into `None`, keeping every success variant.
	pub fn ok(self) -> Option<Self> {
		match self {
			Self::NotFound(_) | Self::Failed(_) => None,
			other => Some(other),
		}
	}

	/// Returns the parsed body of a `200`/`201` response; `None` for everything else.
	pub fn into_body(self) -> Option<Value> {
		match self {
			Self::Body(value) => Some(value),
			_ => None,
		}
	}

	/// Whether the response was `204 No Content`.
	pub fn is_no_content(&self) -> bool {
		matches!(self, Self::NoContent)
	}

	/// The service error carried by [`ApiResponse::NotFound`] or [`ApiResponse::Failed`].
	pub fn service_error(&self) -> Option<&ServiceError> {
		match self {
			Self::NotFound(error) | Self::Failed(error) => Some(error),
			_ => None,
		}
	}
}

/// Unclassified response returned for statuses outside the known success set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}

/// Error payload returned by the directory for a `4xx`/`5xx` status.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceError {
	/// HTTP status.
	pub status: StatusCode,
	/// Error code from `odata.error.code` (or `error.code`), when present.
	pub code: Option<String>,
	/// Error message, when present.
	pub message: Option<String>,
	/// Parsed body; a JSON string when the body was not JSON.
	pub body: Value,
}
impl ServiceError {
	fn from_body(status: StatusCode, raw: &[u8]) -> Self {
		let body = parse_body(raw);
		let error = body.get("odata.error").or_else(|| body.get("error"));
		let code = error.and_then(|e| e.get("code")).and_then(Value::as_str).map(str::to_owned);
		let message = error.and_then(|e| e.get("message")).and_then(|m| match m {
			Value::String(s) => Some(s.clone()),
			// The directory nests messages as `{ "lang": "en", "value": "..." }`.
			Value::Object(o) => o.get("value").and_then(Value::as_str).map(str::to_owned),
			_ => None,
		});

		Self { status, code, message, body }
	}

	/// Whether this is the directory's resource-not-found error.
	pub fn is_not_found(&self) -> bool {
		self.code.as_deref() == Some(RESOURCE_NOT_FOUND)
	}
}
impl Display for ServiceError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "HTTP {}", self.status.as_u16())?;

		if let Some(code) = &self.code {
			write!(f, " {code}")?;
		}
		if let Some(message) = &self.message {
			write!(f, ": {message}")?;
		}

		Ok(())
	}
}

fn parse_body(raw: &[u8]) -> Value {
	if raw.iter().all(u8::is_ascii_whitespace) {
		return Value::Null;
	}

	serde_json::from_slice(raw)
		.unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
}
