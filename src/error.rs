//! Client-level error types shared across configuration, token stores, and dispatch.
//!
//! Only configuration, storage, authentication, and transport failures surface as
//! [`Error`]. Directory API error responses are classified into
//! [`ApiResponse`](crate::response::ApiResponse) values instead.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// An operation asked for configuration before any was installed.
	#[error("No configuration found for Azure Directory.")]
	MissingConfiguration,
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// The client-credential grant failed; never retried automatically.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	Encode(#[source] serde_json::Error),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A configuration handle was installed twice.
	#[error("Azure Directory configuration has already been installed.")]
	AlreadyConfigured,
	/// A scope is missing one of its required fields.
	#[error("Scope `{scope}` is missing the required `{field}` setting.")]
	MissingField {
		/// Scope that failed validation.
		scope: String,
		/// Name of the missing field.
		field: &'static str,
	},
	/// The requested scope was never configured.
	#[error("Scope `{scope}` is not configured.")]
	UnknownScope {
		/// Requested scope name.
		scope: String,
	},
	/// A scope name was declared more than once.
	#[error("Scope `{scope}` is declared more than once.")]
	DuplicateScope {
		/// Offending scope name.
		scope: String,
	},
	/// Identifier validation failed.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// An endpoint URL is unusable.
	#[error("The {endpoint} endpoint is invalid: {url}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint value that failed validation.
		url: String,
	},
	/// An endpoint URL cannot be parsed.
	#[error("The {endpoint} endpoint cannot be parsed.")]
	UnparsableEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Settings document could not be read.
	#[error("Settings file {path} could not be read.")]
	SettingsIo {
		/// Path of the settings file.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Settings document is malformed.
	#[error("Settings document is malformed.")]
	InvalidSettings {
		/// Structured parsing failure pointing at the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures of the client-credential grant.
#[derive(Debug, ThisError)]
pub enum AuthenticationError {
	/// The authority answered with a non-success status.
	#[error("Authority rejected the client-credential grant (HTTP {status}): {reason}.")]
	Rejected {
		/// HTTP status returned by the authority.
		status: u16,
		/// OAuth `error` code, when the body carried one.
		error: Option<String>,
		/// OAuth `error_description`, when the body carried one.
		description: Option<String>,
		/// Human-readable summary used in the display message.
		reason: String,
	},
	/// The token response could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status returned by the authority.
		status: u16,
	},
	/// The token response carried no usable expiry.
	#[error("Token endpoint response does not carry an expiry.")]
	MissingExpiry,
	/// The token response carried an expiry that is not a unix timestamp or duration.
	#[error("Token expiry `{value}` is not a number of seconds.")]
	InvalidExpiry {
		/// Raw expiry value.
		value: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Which endpoint was being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the configured timeout.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Which endpoint was being called.
		endpoint: &'static str,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
	/// Transport failed without a more specific cause.
	#[error("HTTP client error occurred while calling the {endpoint} endpoint: {message}.")]
	Other {
		/// Which endpoint was being called.
		endpoint: &'static str,
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}
