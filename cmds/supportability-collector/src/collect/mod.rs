//! The collection pipeline.
//!
//! Strictly sequential: create the staging area, write the start marker,
//! run the collectors in fixed order, build the archive, delete the staging
//! tree, ship the archive. Per-item failures inside collectors degrade to
//! warnings; everything at this level is fatal.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub mod kinds;
pub mod metadata;
pub mod topology;
pub mod upstream;
pub mod workloads;

use crate::{
	archive,
	config::Settings,
	k8s::{Connection, MgmtClient},
	shipper::{NoopShipper, Shipper},
	staging::StagingArea,
};

/// Category directory shared by the namespace and workload collectors.
const K8S_YAML_DIR: &str = "rancher-k8s-yaml";

/// One configured collection run.
pub struct Pipeline {
	client: kube::Client,
	mgmt: MgmtClient,
	namespace: String,
}

impl Pipeline {
	pub fn new(conn: &Connection, access_key: &str, secret_key: &str, namespace: &str) -> Self {
		Self {
			client: conn.client().clone(),
			mgmt: MgmtClient::new(conn.client().clone(), access_key, secret_key),
			namespace: namespace.to_string(),
		}
	}

	/// Run every stage against `staging` and ship the result. Returns the
	/// path of the archive, which stays on disk after upload. The staging
	/// area carries its start marker already; `execute` only collects.
	pub async fn execute(&self, staging: StagingArea, shipper: &dyn Shipper) -> Result<PathBuf> {
		metadata::collect(&self.mgmt, staging.path()).await?;
		topology::collect(&self.mgmt, staging.path()).await;

		let category_dir = staging.path().join(K8S_YAML_DIR);
		if let Err(err) = fs::create_dir(&category_dir) {
			warn!(path = %category_dir.display(), error = %err, "category directory creation failed");
		}
		workloads::collect_namespaces(&self.client, &category_dir).await;
		workloads::collect_workloads(&self.client, &self.namespace, &category_dir).await;

		upstream::collect(&self.client, staging.path()).await?;

		let archive_path = staging.archive_path();
		info!(archive = %archive_path.display(), "building bundle archive");
		archive::build(staging.path(), &archive_path)?;

		staging.destroy()?;

		shipper
			.upload(&archive_path)
			.await
			.context("shipping bundle archive")?;

		info!(archive = %archive_path.display(), "collection run complete");
		Ok(archive_path)
	}
}

/// Full production run: infer the cluster connection, collect, ship.
pub async fn run(settings: &Settings) -> Result<()> {
	info!("starting supportability collection");

	// The start marker records when the run began, so it goes down before
	// the first network call can stall on a slow endpoint.
	let staging = StagingArea::create()?;
	staging.mark_timestamp()?;

	let conn = Connection::infer()
		.await
		.context("connecting to upstream cluster")?;

	let pipeline = Pipeline::new(
		&conn,
		&settings.rancher_access_key,
		&settings.rancher_secret_key,
		&settings.rancher_namespace,
	);
	pipeline.execute(staging, &NoopShipper).await?;
	Ok(())
}
