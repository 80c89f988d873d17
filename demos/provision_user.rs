//! Provisions a user and assigns a license against a mocked directory, configured from JSON
//! settings the way a deployment would load them from disk.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::Map;
// self
use azure_directory::{
	client::ReqwestDirectoryClient,
	config::{Configuration, DirectorySettings},
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	reqwest::{Client, redirect::Policy},
};

const TENANT: &str = "contoso.onmicrosoft.com";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let grant = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/{TENANT}/oauth2/token"));
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"demo-token","token_type":"Bearer","expires_in":"3599"}"#,
			);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/{TENANT}/users"));
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"objectId\":\"u-1\",\"userPrincipalName\":\"ada.l@contoso.com\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/{TENANT}/subscribedSkus"));
			then.status(200).header("content-type", "application/json").body(
				r#"{"value":[{"skuId":"sku-1","skuPartNumber":"STANDARDWOFFPACK_FACULTY"}]}"#,
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/{TENANT}/users/ada.l@contoso.com/assignLicense"));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"objectId":"u-1"}"#);
		})
		.await;

	let settings = DirectorySettings::from_json_str(&format!(
		r#"{{
			"tenant_id": "{TENANT}",
			"client_id": "demo-client",
			"client_secret": "demo-secret",
			"resource_id": "https://graph.windows.net",
			"authority_url": "{base}",
			"graph_url": "{base}"
		}}"#,
		base = server.base_url(),
	))?;
	let slot = Configuration::new();
	let config = slot.configure(settings.into_builder()?)?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(Policy::none())
			.build()?,
	);
	let client = ReqwestDirectoryClient::with_http_client(
		&config,
		"main",
		http_client,
		ReqwestTransportErrorMapper,
	)
	.await?;
	let user = client.create_user("ada.l@contoso.com", "Ada", "L", "Pa55word!", Map::new()).await?;
	let license = client.assign_license("ada.l@contoso.com", "STANDARDWOFFPACK_FACULTY").await?;

	println!("Created user: {user:?}.");
	println!("License assignment: {license:?}.");

	grant.assert_async().await;

	Ok(())
}
