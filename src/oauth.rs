//! Client-credential grant against the directory authority.
//!
//! The authority is a v1 endpoint: it expects a `resource` form field instead of scopes and
//! reports expiries as strings, so the grant is encoded and parsed here while transport,
//! secrets, and OAuth error bodies reuse the `oauth2` crate's types.

pub use oauth2;

// crates.io
use oauth2::{
	basic::BasicErrorResponse,
	http::{Request, header},
};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, CachedTokenBuilderError},
	config::ScopedConfig,
	error::{AuthenticationError, ConfigError},
	http::{AsyncHttpClient, DirectoryHttpClient, HttpRequest, HttpResponse, TransportErrorMapper},
	obs::CallKind,
};

/// Grant type sent to the authority.
pub const GRANT_TYPE: &str = "client_credentials";

/// Builds the form-encoded grant request for a scope.
pub fn grant_request(config: &ScopedConfig) -> Result<HttpRequest, ConfigError> {
	let body = Serializer::new(String::new())
		.append_pair("client_id", &config.client_id)
		.append_pair("client_secret", config.client_secret.secret())
		.append_pair("grant_type", GRANT_TYPE)
		.append_pair("response_type", GRANT_TYPE)
		.append_pair("resource", &config.resource_id)
		.finish();
	let request = Request::builder()
		.method(oauth2::http::Method::POST)
		.uri(config.token_url()?.as_str())
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.header(header::ACCEPT, "application/json")
		.body(body.into_bytes())?;

	Ok(request)
}

/// Performs the grant for `config` and returns the issued token.
pub async fn exchange_client_credentials<C, M>(
	http_client: &C,
	mapper: &M,
	config: &ScopedConfig,
) -> Result<CachedToken>
where
	C: ?Sized + DirectoryHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let request = grant_request(config)?;
	let handle = http_client.handle();
	let response = handle
		.call(request)
		.await
		.map_err(|e| mapper.map_transport_error(CallKind::TokenGrant, e))?;

	parse_grant_response(response, OffsetDateTime::now_utc())
}

/// Parses the authority's answer; relative expiries are measured from `issued_at`.
pub fn parse_grant_response(
	response: HttpResponse,
	issued_at: OffsetDateTime,
) -> Result<CachedToken> {
	let status = response.status();

	if !status.is_success() {
		return Err(rejected(status.as_u16(), response.body()).into());
	}

	let de = &mut serde_json::Deserializer::from_slice(response.body());
	let grant: GrantResponse = serde_path_to_error::deserialize(de).map_err(|source| {
		AuthenticationError::MalformedResponse { source, status: status.as_u16() }
	})?;
	let mut builder = CachedToken::builder().access_token(grant.access_token).issued_at(issued_at);

	if let Some(token_type) = grant.token_type {
		builder = builder.token_type(token_type);
	}

	let mut relative_secs = None;

	match (grant.expires_at.or(grant.expires_on), grant.expires_in) {
		(Some(absolute), _) => {
			let secs = absolute.seconds()?;
			let instant = OffsetDateTime::from_unix_timestamp(secs)
				.map_err(|_| AuthenticationError::InvalidExpiry { value: secs.to_string() })?;

			builder = builder.expires_at(instant);
		},
		(None, Some(relative)) => {
			let secs = relative.seconds()?;

			relative_secs = Some(secs);
			builder = builder.expires_in(Duration::seconds(secs));
		},
		(None, None) => return Err(AuthenticationError::MissingExpiry.into()),
	}

	builder.build().map_err(|e| match e {
		CachedTokenBuilderError::MissingExpiry => AuthenticationError::MissingExpiry.into(),
		CachedTokenBuilderError::ExpiryOutOfRange => AuthenticationError::InvalidExpiry {
			value: relative_secs.map(|secs| secs.to_string()).unwrap_or_default(),
		}
		.into(),
		CachedTokenBuilderError::MissingAccessToken => AuthenticationError::Rejected {
			status: status.as_u16(),
			error: None,
			description: None,
			reason: e.to_string(),
		}
		.into(),
	})
}

#[derive(Debug, Deserialize)]
struct GrantResponse {
	access_token: String,
	token_type: Option<String>,
	expires_at: Option<Seconds>,
	expires_on: Option<Seconds>,
	expires_in: Option<Seconds>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
	Number(i64),
	Text(String),
}
impl Seconds {
	fn seconds(self) -> Result<i64, AuthenticationError> {
		match self {
			Self::Number(value) => Ok(value),
			Self::Text(raw) =>
				raw.trim().parse().map_err(|_| AuthenticationError::InvalidExpiry { value: raw }),
		}
	}
}

fn rejected(status: u16, body: &[u8]) -> AuthenticationError {
	match serde_json::from_slice::<BasicErrorResponse>(body) {
		Ok(response) => {
			let error = response.error().as_ref().to_owned();
			let description = response.error_description().cloned();
			let reason = description.clone().unwrap_or_else(|| error.clone());

			AuthenticationError::Rejected { status, error: Some(error), description, reason }
		},
		Err(_) => {
			let text = String::from_utf8_lossy(body).trim().to_owned();
			let reason = if text.is_empty() { "empty response body".into() } else { text };

			AuthenticationError::Rejected { status, error: None, description: None, reason }
		},
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::config::DirectoryConfig;

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			oauth2::http::StatusCode::from_u16(status).expect("Status fixture is valid.");

		response
	}

	#[test]
	fn grant_request_carries_resource_and_both_grant_fields() {
		let config = DirectoryConfig::builder()
			.client_id("app")
			.client_secret("s3cr3t&")
			.tenant_id("contoso.onmicrosoft.com")
			.resource_id("https://graph.windows.net")
			.build()
			.expect("Configuration should build.");
		let request = grant_request(config.root()).expect("Grant request should build.");
		let body = String::from_utf8(request.body().clone()).expect("Form body is UTF-8.");

		assert_eq!(
			request.uri().to_string(),
			"https://login.windows.net/contoso.onmicrosoft.com/oauth2/token"
		);
		assert_eq!(request.method(), oauth2::http::Method::POST);
		assert_eq!(
			body,
			"client_id=app&client_secret=s3cr3t%26&grant_type=client_credentials\
			 &response_type=client_credentials&resource=https%3A%2F%2Fgraph.windows.net"
		);
	}

	#[test]
	fn string_expiries_are_accepted() {
		let issued_at = macros::datetime!(2025-01-01 00:00 UTC);
		let token = parse_grant_response(
			response(200, r#"{"access_token":"abc","token_type":"Bearer","expires_in":"3599"}"#),
			issued_at,
		)
		.expect("Relative string expiry should parse.");

		assert_eq!(token.expires_at, issued_at + Duration::seconds(3599));

		let token = parse_grant_response(
			response(200, r#"{"access_token":"abc","expires_on":"1735693200","expires_in":"1"}"#),
			issued_at,
		)
		.expect("Absolute string expiry should parse.");

		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 01:00 UTC));
		assert_eq!(token.token_type, CachedToken::DEFAULT_TOKEN_TYPE);
	}

	#[test]
	fn numeric_absolute_expiry_wins() {
		let token = parse_grant_response(
			response(200, r#"{"access_token":"abc","expires_at":1735689600}"#),
			OffsetDateTime::now_utc(),
		)
		.expect("Numeric absolute expiry should parse.");

		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 00:00 UTC));
	}

	#[test]
	fn missing_or_invalid_expiry_is_rejected() {
		let now = OffsetDateTime::now_utc();

		assert!(matches!(
			parse_grant_response(response(200, r#"{"access_token":"abc"}"#), now),
			Err(Error::Authentication(AuthenticationError::MissingExpiry))
		));
		assert!(matches!(
			parse_grant_response(
				response(200, r#"{"access_token":"abc","expires_in":"soon"}"#),
				now
			),
			Err(Error::Authentication(AuthenticationError::InvalidExpiry { .. }))
		));
	}

	#[test]
	fn out_of_range_relative_expiry_is_rejected() {
		let err = parse_grant_response(
			response(200, r#"{"access_token":"abc","expires_in":"99999999999999"}"#),
			OffsetDateTime::now_utc(),
		)
		.expect_err("Relative expiries past the representable range must be rejected.");

		match err {
			Error::Authentication(AuthenticationError::InvalidExpiry { value }) => {
				assert_eq!(value, "99999999999999");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn malformed_bodies_point_at_the_field() {
		let err = parse_grant_response(
			response(200, r#"{"access_token":42,"expires_in":1}"#),
			OffsetDateTime::now_utc(),
		)
		.expect_err("Non-string access tokens must be rejected.");

		match err {
			Error::Authentication(AuthenticationError::MalformedResponse { source, status }) => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "access_token");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn error_statuses_are_rejections() {
		let err = parse_grant_response(
			response(
				401,
				r#"{"error":"invalid_client","error_description":"AADSTS70002: bad secret"}"#,
			),
			OffsetDateTime::now_utc(),
		)
		.expect_err("Error statuses must be rejected.");

		match err {
			Error::Authentication(AuthenticationError::Rejected {
				status,
				error,
				description,
				..
			}) => {
				assert_eq!(status, 401);
				assert_eq!(error.as_deref(), Some("invalid_client"));
				assert_eq!(description.as_deref(), Some("AADSTS70002: bad secret"));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
		assert!(matches!(
			parse_grant_response(response(500, "upstream down"), OffsetDateTime::now_utc()),
			Err(Error::Authentication(AuthenticationError::Rejected { status: 500, .. }))
		));
	}
}
