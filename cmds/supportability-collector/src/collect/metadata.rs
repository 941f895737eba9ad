//! Platform metadata collection.
//!
//! Resolves four singleton settings from the management API and writes the
//! aggregate record twice, as YAML and as JSON, under `rancher-data/`.
//! Unlike the per-kind collectors every failure here is fatal: the record
//! is written exactly once, fully populated or not at all.

use std::{
	fs, io,
	path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::k8s::mgmt::{MgmtClient, MgmtError};

/// Directory under the staging root holding the metadata record.
const DATA_DIR: &str = "rancher-data";

#[derive(Debug, Error)]
pub enum MetadataError {
	#[error("creating {DATA_DIR} directory")]
	CreateDir(#[source] io::Error),

	#[error("fetching setting {name}")]
	Fetch {
		name: &'static str,
		#[source]
		source: MgmtError,
	},

	#[error("encoding metadata record")]
	EncodeYaml(#[from] serde_yaml::Error),

	#[error("encoding metadata record")]
	EncodeJson(#[from] serde_json::Error),

	#[error("writing {path}")]
	Write {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

/// Aggregate record describing the Rancher installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RancherInfo {
	pub timestamp: DateTime<Utc>,
	pub version: String,
	pub uuid: String,
	pub server_url: String,
	pub eula_date: String,
}

/// Fetch the four platform settings and write the record under
/// `<root>/rancher-data/` in both encodings.
pub async fn collect(mgmt: &MgmtClient, root: &Path) -> Result<RancherInfo, MetadataError> {
	let dir = root.join(DATA_DIR);
	fs::create_dir_all(&dir).map_err(MetadataError::CreateDir)?;

	let info = RancherInfo {
		timestamp: Utc::now(),
		uuid: fetch_setting(mgmt, "install-uuid").await?,
		version: fetch_setting(mgmt, "server-version").await?,
		server_url: fetch_setting(mgmt, "server-url").await?,
		eula_date: fetch_setting(mgmt, "eula-agreed").await?,
	};
	info!(
		version = %info.version,
		uuid = %info.uuid,
		server_url = %info.server_url,
		"platform metadata resolved"
	);

	write_record(&dir.join("rancher-data.yaml"), serde_yaml::to_string(&info)?)?;
	write_record(
		&dir.join("rancher-data.json"),
		serde_json::to_string_pretty(&info)?,
	)?;
	Ok(info)
}

async fn fetch_setting(mgmt: &MgmtClient, name: &'static str) -> Result<String, MetadataError> {
	let value = mgmt
		.get_setting(name)
		.await
		.map_err(|source| MetadataError::Fetch { name, source })?;
	info!(setting = name, value = %value, "fetched platform setting");
	Ok(value)
}

fn write_record(path: &Path, contents: String) -> Result<(), MetadataError> {
	fs::write(path, contents).map_err(|source| MetadataError::Write {
		path: path.to_path_buf(),
		source,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> RancherInfo {
		RancherInfo {
			timestamp: "2024-05-01T12:30:45Z".parse().unwrap(),
			version: "v2.8.3".to_string(),
			uuid: "9e63b5a0-55f7-4a58-b73b-0569fc7616a2".to_string(),
			server_url: "https://rancher.example.com".to_string(),
			eula_date: "2023-01-15T00:00:00Z".to_string(),
		}
	}

	#[test]
	fn both_encodings_decode_to_identical_values() {
		let info = sample();

		let yaml = serde_yaml::to_string(&info).unwrap();
		let json = serde_json::to_string_pretty(&info).unwrap();

		let from_yaml: RancherInfo = serde_yaml::from_str(&yaml).unwrap();
		let from_json: RancherInfo = serde_json::from_str(&json).unwrap();
		assert_eq!(from_yaml, from_json);
		assert_eq!(from_yaml, info);
	}

	#[test]
	fn record_uses_wire_field_names() {
		let json = serde_json::to_string(&sample()).unwrap();
		assert!(json.contains("\"serverUrl\""));
		assert!(json.contains("\"eulaDate\""));
		assert!(json.contains("\"uuid\""));
	}
}
