// crates.io
use serde_json::{Map, json};
// self
use azure_directory::{
	_preludet::*,
	client::DirectoryClient,
	http::{GenericTransportErrorMapper, Method},
	response::ApiResponse,
};

type ScriptedClient = DirectoryClient<ScriptedHttpClient, GenericTransportErrorMapper>;

const SKUS: &str = r#"{"value":[
	{"skuId":"sku-student","skuPartNumber":"STANDARDWOFFPACK_STUDENT"},
	{"skuId":"sku-faculty","skuPartNumber":"STANDARDWOFFPACK_FACULTY"}
]}"#;

async fn scripted_client() -> (ScriptedClient, ScriptedHttpClient) {
	let transport = ScriptedHttpClient::default();

	transport.respond(grant_response("ops-token", 3600));

	let config = test_config_builder("https://directory.test/")
		.build()
		.expect("Configuration should build successfully.");
	let client = ScriptedClient::with_http_client(
		&config,
		"main",
		transport.clone(),
		GenericTransportErrorMapper,
	)
	.await
	.expect("Client should initialize against the scripted transport.");

	(client, transport)
}

#[tokio::test]
async fn grant_form_carries_credentials_and_resource() {
	let (_client, transport) = scripted_client().await;
	let grants = transport.requests_to("/oauth2/token");
	let form = grants.first().expect("Construction should issue one grant.").form();

	assert_eq!(grants.len(), 1);
	assert_eq!(grants[0].method, Method::POST);
	assert_eq!(form.get("client_id").map(String::as_str), Some("test-client"));
	assert_eq!(form.get("client_secret").map(String::as_str), Some("test-secret"));
	assert_eq!(form.get("grant_type").map(String::as_str), Some("client_credentials"));
	assert_eq!(form.get("response_type").map(String::as_str), Some("client_credentials"));
	assert_eq!(form.get("resource").map(String::as_str), Some("https://graph.windows.net"));
}

#[tokio::test]
async fn create_user_posts_the_default_payload() {
	let (client, transport) = scripted_client().await;

	transport.respond(json_response(201, r#"{"objectId":"u1","userPrincipalName":"a.b@x.com"}"#));

	let created = client
		.create_user("a.b@x.com", "A", "B", "pw", Map::new())
		.await
		.expect("Create request should complete.");
	let posts = transport.requests_to("/users");
	let request = posts.first().expect("Create should POST to users.");
	let body = request.json();

	assert_eq!(created.and_then(|u| u.get("objectId").cloned()), Some(json!("u1")));
	assert_eq!(request.method, Method::POST);
	assert_eq!(request.url.query(), Some("api-version=1.5"));
	assert_eq!(
		request.headers.get("authorization").and_then(|v| v.to_str().ok()),
		Some("Bearer ops-token")
	);
	assert_eq!(body["displayName"], "A B");
	assert_eq!(body["mailNickname"], "a.b");
	assert_eq!(body["userPrincipalName"], "a.b@x.com");
	assert_eq!(body["passwordProfile"]["forceChangePasswordNextLogin"], true);
	assert_eq!(body["accountEnabled"], true);
	assert_eq!(body["usageLocation"], "US");
}

#[tokio::test]
async fn find_operations_unwrap_bodies_and_absorb_errors() {
	let (client, transport) = scripted_client().await;

	transport.respond(json_response(200, r#"{"value":[{"id":"u1"},{"id":"u2"}]}"#));
	transport.respond(json_response(
		404,
		r#"{"odata.error":{"code":"Request_ResourceNotFound","message":{"value":"Gone."}}}"#,
	));
	transport
		.respond(json_response(500, r#"{"odata.error":{"code":"Service_InternalServerError"}}"#));

	let users = client.find_users(&[("$top", "2")]).await.expect("List should complete.");
	let missing =
		client.find_user_by_email("ghost@x.com", &[]).await.expect("Lookup should complete.");
	let broken =
		client.find_user_by_email("a.b@x.com", &[]).await.expect("Lookup should complete.");

	assert_eq!(users, Some(vec![json!({ "id": "u1" }), json!({ "id": "u2" })]));
	assert_eq!(missing, None);
	assert_eq!(broken, None);
	assert_eq!(
		transport.requests_to("/users")[0].url.query(),
		Some("%24top=2&api-version=1.5")
	);
}

#[tokio::test]
async fn updates_report_success_only_for_no_content() {
	let (client, transport) = scripted_client().await;

	transport.respond(json_response(204, ""));
	transport.respond(json_response(200, r#"{"objectId":"u1"}"#));
	transport.respond(json_response(204, ""));

	assert!(
		client
			.update_user("a.b@x.com", &json!({ "surname": "C" }))
			.await
			.expect("Update should complete.")
	);
	assert!(
		!client
			.update_user("a.b@x.com", &json!({ "surname": "D" }))
			.await
			.expect("Update should complete.")
	);
	assert!(
		client
			.update_user_password("a.b@x.com", "n3w", false)
			.await
			.expect("Password update should complete.")
	);

	let patches = transport.requests_to("/users/a.b@x.com");

	assert_eq!(patches.len(), 3);
	assert!(patches.iter().all(|r| r.method == Method::PATCH));
	assert_eq!(
		patches[2].json(),
		json!({ "passwordProfile": { "password": "n3w", "forceChangePasswordNextLogin": false } })
	);
}

#[tokio::test]
async fn assign_license_resolves_the_sku_id() {
	let (client, transport) = scripted_client().await;

	transport.respond(json_response(200, SKUS));
	transport.respond(json_response(200, r#"{"objectId":"u1"}"#));

	let assigned = client
		.assign_license("a.b@x.com", "STANDARDWOFFPACK_STUDENT")
		.await
		.expect("Assignment should complete.");
	let posts = transport.requests_to("/users/a.b@x.com/assignLicense");

	assert_eq!(assigned, Some(ApiResponse::Body(json!({ "objectId": "u1" }))));
	assert_eq!(posts.len(), 1);
	assert_eq!(
		posts[0].json(),
		json!({
			"addLicenses": [{ "disabledPlans": [], "skuId": "sku-student" }],
			"removeLicenses": []
		})
	);
}

#[tokio::test]
async fn unknown_sku_issues_no_post() {
	let (client, transport) = scripted_client().await;

	transport.respond(json_response(200, SKUS));

	let assigned =
		client.assign_license("a.b@x.com", "NOPE").await.expect("Lookup should complete.");

	assert_eq!(assigned, None);
	assert!(transport.requests_to("/assignLicense").is_empty());
	// One grant plus the catalog lookup.
	assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn remove_license_posts_the_sku_id() {
	let (client, transport) = scripted_client().await;

	transport.respond(json_response(200, SKUS));
	transport.respond(json_response(200, r#"{"objectId":"u1"}"#));

	client
		.remove_license("a.b@x.com", "STANDARDWOFFPACK_FACULTY")
		.await
		.expect("Removal should complete.")
		.expect("Removal should succeed.");

	let posts = transport.requests_to("/users/a.b@x.com/assignLicense");

	assert_eq!(
		posts[0].json(),
		json!({ "addLicenses": [], "removeLicenses": ["sku-faculty"] })
	);
}

#[tokio::test]
async fn delete_user_is_true_only_for_no_content() {
	let (client, transport) = scripted_client().await;

	transport.respond(json_response(204, ""));
	transport.respond(json_response(
		404,
		r#"{"odata.error":{"code":"Request_ResourceNotFound"}}"#,
	));
	transport.respond(json_response(200, "{}"));

	assert!(client.delete_user("a.b@x.com").await.expect("Delete should complete."));
	assert!(!client.delete_user("a.b@x.com").await.expect("Delete should complete."));
	assert!(!client.delete_user("a.b@x.com").await.expect("Delete should complete."));
	assert!(
		transport
			.requests_to("/users/a.b@x.com")
			.iter()
			.all(|r| r.method == Method::DELETE)
	);
}

#[tokio::test]
async fn exhausted_transport_is_a_transport_error() {
	let (client, _transport) = scripted_client().await;
	let err = client
		.subscribed_skus()
		.await
		.expect_err("Requests without a scripted response must fail.");

	assert!(matches!(err, Error::Transport(_)));
}
