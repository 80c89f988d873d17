//! User and license operations.
//!
//! Every operation is a single [`DirectoryClient::execute`] call (two for license changes)
//! that collapses not-found and failed responses into `None`/`false`. Callers that need to
//! tell those apart should use [`DirectoryClient::execute`] directly.

// crates.io
use serde_json::{Map, json};
// self
use crate::{
	_prelude::*,
	client::{DirectoryClient, RequestBody},
	http::{DirectoryHttpClient, Method, TransportErrorMapper},
	response::ApiResponse,
};

/// Usage location assigned to new users unless overridden.
pub const DEFAULT_USAGE_LOCATION: &str = "US";

/// Builds the default user payload and shallow-merges `overrides` over it.
pub fn new_user_payload(
	email: &str,
	given_name: &str,
	family_name: &str,
	password: &str,
	overrides: Map<String, Value>,
) -> Value {
	let mail_nickname = email.split('@').next().unwrap_or(email);
	let mut payload = json!({
		"accountEnabled": true,
		"displayName": format!("{given_name} {family_name}"),
		"mailNickname": mail_nickname,
		"passwordProfile": {
			"password": password,
			"forceChangePasswordNextLogin": true,
		},
		"userPrincipalName": email,
		"givenName": given_name,
		"surname": family_name,
		"usageLocation": DEFAULT_USAGE_LOCATION,
	});

	if let Value::Object(fields) = &mut payload {
		fields.extend(overrides);
	}

	payload
}

/// Builds an `assignLicense` payload that adds or removes one SKU.
pub fn license_payload(sku_id: &Value, assign: bool) -> Value {
	if assign {
		json!({ "addLicenses": [{ "disabledPlans": [], "skuId": sku_id }], "removeLicenses": [] })
	} else {
		json!({ "addLicenses": [], "removeLicenses": [sku_id] })
	}
}

impl<C, M> DirectoryClient<C, M>
where
	C: ?Sized + DirectoryHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists users; returns the `value` array of the response.
	pub async fn find_users(&self, query: &[(&str, &str)]) -> Result<Option<Vec<Value>>> {
		let body = self.execute(Method::GET, "users", query, RequestBody::Empty).await?.into_body();

		Ok(body.and_then(|mut body| match body.get_mut("value").map(Value::take) {
			Some(Value::Array(users)) => Some(users),
			_ => None,
		}))
	}

	/// Fetches one user by principal name; `None` when absent.
	pub async fn find_user_by_email(
		&self,
		email: &str,
		query: &[(&str, &str)],
	) -> Result<Option<Value>> {
		let path = format!("users/{email}");

		Ok(self.execute(Method::GET, &path, query, RequestBody::Empty).await?.into_body())
	}

	/// Creates a user from [`new_user_payload`]; returns the created user.
	pub async fn create_user(
		&self,
		email: &str,
		given_name: &str,
		family_name: &str,
		password: &str,
		overrides: Map<String, Value>,
	) -> Result<Option<Value>> {
		let payload = new_user_payload(email, given_name, family_name, password, overrides);
		let body = RequestBody::json(&payload)?;

		Ok(self.execute(Method::POST, "users", &[], body).await?.into_body())
	}

	/// Patches a user; `true` only when the directory answers `204 No Content`.
	pub async fn update_user<T>(&self, email: &str, changes: &T) -> Result<bool>
	where
		T: ?Sized + Serialize,
	{
		let path = format!("users/{email}");
		let body = RequestBody::json(changes)?;

		Ok(self.execute(Method::PATCH, &path, &[], body).await?.is_no_content())
	}

	/// Replaces a user's password; `true` only on `204 No Content`.
	pub async fn update_user_password(
		&self,
		email: &str,
		password: &str,
		force_change_password_next_login: bool,
	) -> Result<bool> {
		let changes = json!({
			"passwordProfile": {
				"password": password,
				"forceChangePasswordNextLogin": force_change_password_next_login,
			}
		});

		self.update_user(email, &changes).await
	}

	/// Fetches the tenant's SKU catalog.
	pub async fn subscribed_skus(&self) -> Result<Option<Value>> {
		Ok(self
			.execute(Method::GET, "subscribedSkus", &[], RequestBody::Empty)
			.await?
			.into_body())
	}

	/// Adds the SKU whose `skuPartNumber` matches to a user.
	///
	/// Returns `None` without posting anything when no SKU matches, and `None` when the
	/// assignment itself fails.
	pub async fn assign_license(
		&self,
		email: &str,
		sku_part_number: &str,
	) -> Result<Option<ApiResponse>> {
		self.change_license(email, sku_part_number, true).await
	}

	/// Removes the SKU whose `skuPartNumber` matches from a user.
	pub async fn remove_license(
		&self,
		email: &str,
		sku_part_number: &str,
	) -> Result<Option<ApiResponse>> {
		self.change_license(email, sku_part_number, false).await
	}

	/// Deletes a user; `true` only on `204 No Content`.
	pub async fn delete_user(&self, email: &str) -> Result<bool> {
		let path = format!("users/{email}");

		Ok(self.execute(Method::DELETE, &path, &[], RequestBody::Empty).await?.is_no_content())
	}

	async fn change_license(
		&self,
		email: &str,
		sku_part_number: &str,
		assign: bool,
	) -> Result<Option<ApiResponse>> {
		let Some(sku_id) = self.find_sku_id(sku_part_number).await? else {
			return Ok(None);
		};
		let path = format!("users/{email}/assignLicense");
		let body = RequestBody::json(&license_payload(&sku_id, assign))?;

		Ok(self.execute(Method::POST, &path, &[], body).await?.ok())
	}

	async fn find_sku_id(&self, sku_part_number: &str) -> Result<Option<Value>> {
		let Some(catalog) = self.subscribed_skus().await? else {
			return Ok(None);
		};
		let sku_id = catalog
			.get("value")
			.and_then(Value::as_array)
			.into_iter()
			.flatten()
			.find(|sku| sku.get("skuPartNumber").and_then(Value::as_str) == Some(sku_part_number))
			.and_then(|sku| sku.get("skuId"))
			.cloned();

		Ok(sku_id)
	}
}
