//! Raw client for the Rancher management API (`management.cattle.io/v3`).
//!
//! Rancher's own resources (settings, clusters, nodes, node pools and the
//! rest of the management catalog) are custom resources served under one API
//! group. This client issues plain GETs against those paths and returns the
//! responses as JSON or re-encoded YAML, without binding to typed schemas.

use http::header::AUTHORIZATION;
use kube::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Base path of the management API group.
const MGMT_BASE: &str = "/apis/management.cattle.io/v3";

/// Errors from management API calls.
#[derive(Debug, Error)]
pub enum MgmtError {
	#[error("building management API request")]
	Request(#[from] http::Error),

	#[error(transparent)]
	Api(#[from] kube::Error),

	#[error("decoding management API response")]
	Decode(#[from] serde_json::Error),

	#[error("re-encoding management object as YAML")]
	Encode(#[from] serde_yaml::Error),

	#[error("setting {0} has no value")]
	MissingValue(String),
}

/// Versioned settings endpoint response.
#[derive(Deserialize)]
struct Setting {
	value: Option<String>,
}

/// Client for the management API group, authenticated with the Rancher API
/// key pair.
#[derive(Clone)]
pub struct MgmtClient {
	client: Client,
	token: String,
}

impl MgmtClient {
	pub fn new(client: Client, access_key: &str, secret_key: &str) -> Self {
		Self {
			client,
			token: format!("{access_key}:{secret_key}"),
		}
	}

	async fn get_raw(&self, path: &str) -> Result<String, MgmtError> {
		let request = http::Request::builder()
			.uri(path)
			.header(AUTHORIZATION, format!("Bearer {}", self.token))
			.body(Vec::new())?;
		Ok(self.client.request_text(request).await?)
	}

	/// Fetch the `value` field of a named platform setting.
	pub async fn get_setting(&self, name: &str) -> Result<String, MgmtError> {
		let body = self.get_raw(&format!("{MGMT_BASE}/settings/{name}")).await?;
		let setting: Setting = serde_json::from_str(&body)?;
		setting
			.value
			.ok_or_else(|| MgmtError::MissingValue(name.to_string()))
	}

	/// List object names in a management collection, optionally scoped to a
	/// parent (clusters scope their nodes and node pools by namespace).
	pub async fn list_names(
		&self,
		collection: &str,
		scope: Option<&str>,
	) -> Result<Vec<String>, MgmtError> {
		let body = self.get_raw(&collection_path(collection, scope, None)).await?;
		let list: Value = serde_json::from_str(&body)?;

		let names = list
			.get("items")
			.and_then(Value::as_array)
			.map(|items| {
				items
					.iter()
					.filter_map(|item| {
						item.pointer("/metadata/name")
							.and_then(Value::as_str)
							.map(str::to_string)
					})
					.collect()
			})
			.unwrap_or_default();
		Ok(names)
	}

	/// Fetch one management object and re-encode it as YAML.
	pub async fn get_yaml(
		&self,
		collection: &str,
		scope: Option<&str>,
		name: &str,
	) -> Result<String, MgmtError> {
		let body = self
			.get_raw(&collection_path(collection, scope, Some(name)))
			.await?;
		let object: Value = serde_json::from_str(&body)?;
		Ok(serde_yaml::to_string(&object)?)
	}
}

fn collection_path(collection: &str, scope: Option<&str>, name: Option<&str>) -> String {
	let mut path = format!("{MGMT_BASE}/{collection}");
	if let Some(name) = name {
		path.push('/');
		path.push_str(name);
	}
	if let Some(scope) = scope {
		path.push_str("?namespace=");
		path.push_str(scope);
	}
	path
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn paths_for_global_collections() {
		assert_eq!(
			collection_path("clusters", None, None),
			"/apis/management.cattle.io/v3/clusters"
		);
		assert_eq!(
			collection_path("clusters", None, Some("c-12345")),
			"/apis/management.cattle.io/v3/clusters/c-12345"
		);
	}

	#[test]
	fn paths_for_cluster_scoped_collections() {
		assert_eq!(
			collection_path("nodes", Some("c-12345"), None),
			"/apis/management.cattle.io/v3/nodes?namespace=c-12345"
		);
		assert_eq!(
			collection_path("nodepools", Some("c-12345"), Some("np-1")),
			"/apis/management.cattle.io/v3/nodepools/np-1?namespace=c-12345"
		);
	}
}
