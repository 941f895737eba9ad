//! Upstream cluster node collection.
//!
//! Snapshots every node manifest of the cluster hosting Rancher into
//! `upstream/nodes/`. The `upstream/` directory itself is required
//! structure, so failing to create it ends the run; the nodes beneath it
//! follow the usual warn-and-continue policy.

use std::{fs, io, path::Path};

use k8s_openapi::api::core::v1::Node;
use kube::Client;
use thiserror::Error;
use tracing::info;

use super::kinds::{collect_kind, ClusterKind};

const UPSTREAM_DIR: &str = "upstream";

#[derive(Debug, Error)]
pub enum UpstreamError {
	#[error("creating {UPSTREAM_DIR} directory")]
	CreateDir(#[source] io::Error),
}

pub async fn collect(client: &Client, root: &Path) -> Result<(), UpstreamError> {
	info!("collecting upstream cluster nodes");
	let dir = root.join(UPSTREAM_DIR);
	fs::create_dir_all(&dir).map_err(UpstreamError::CreateDir)?;

	let nodes = ClusterKind::<Node>::new(client.clone());
	collect_kind("nodes", &nodes, None, &dir.join("nodes")).await;
	Ok(())
}
