//! Rancher management resource collection.
//!
//! Table-driven walk of the management catalog under
//! `rancher-resources/`. Global collections produce one directory of
//! manifests; parent-scoped collections produce one subdirectory per parent
//! object (`cluster-nodes/<cluster>/<node>.yaml`). Everything here is
//! warn-and-continue.

use std::{fs, path::Path};

use tracing::{debug, warn};

use super::kinds::{collect_kind, MgmtKind};
use crate::k8s::mgmt::MgmtClient;

/// Directory under the staging root holding management manifests.
const RESOURCES_DIR: &str = "rancher-resources";

/// One management collection wired into the bundle.
pub struct TopologyEntry {
	/// Output directory name under `rancher-resources/`.
	pub dir: &'static str,
	/// Management API collection name.
	pub collection: &'static str,
	/// Collection whose object names scope this one, if any.
	pub parent: Option<&'static str>,
	/// Disabled entries stay in the table so they can be switched on
	/// without structural change, but are skipped at run time.
	pub enabled: bool,
}

/// The management catalog. Order is the on-disk order of the bundle.
pub const TOPOLOGY_TABLE: &[TopologyEntry] = &[
	TopologyEntry {
		dir: "clusters",
		collection: "clusters",
		parent: None,
		enabled: true,
	},
	TopologyEntry {
		dir: "cluster-nodes",
		collection: "nodes",
		parent: Some("clusters"),
		enabled: true,
	},
	TopologyEntry {
		dir: "cluster-node-pools",
		collection: "nodepools",
		parent: Some("clusters"),
		enabled: true,
	},
	TopologyEntry {
		dir: "cluster-node-templates",
		collection: "nodetemplates",
		parent: Some("clusters"),
		enabled: false,
	},
	TopologyEntry {
		dir: "cluster-templates",
		collection: "clustertemplates",
		parent: None,
		enabled: false,
	},
	TopologyEntry {
		dir: "cluster-template-revisions",
		collection: "clustertemplaterevisions",
		parent: Some("clustertemplates"),
		enabled: false,
	},
	TopologyEntry {
		dir: "features",
		collection: "features",
		parent: None,
		enabled: false,
	},
];

/// Collect every enabled entry of the management catalog into
/// `<root>/rancher-resources/`.
pub async fn collect(mgmt: &MgmtClient, root: &Path) {
	let dest = root.join(RESOURCES_DIR);
	if let Err(err) = fs::create_dir(&dest) {
		warn!(path = %dest.display(), error = %err, "resources directory creation failed");
	}

	for entry in TOPOLOGY_TABLE {
		if !entry.enabled {
			debug!(kind = entry.dir, "kind disabled, skipping");
			continue;
		}

		let source = MgmtKind::new(mgmt.clone(), entry.collection);
		let kind_dir = dest.join(entry.dir);

		match entry.parent {
			None => collect_kind(entry.dir, &source, None, &kind_dir).await,
			Some(parent_collection) => {
				if let Err(err) = fs::create_dir(&kind_dir) {
					warn!(
						kind = entry.dir,
						path = %kind_dir.display(),
						error = %err,
						"kind directory creation failed"
					);
				}

				let parents = match mgmt.list_names(parent_collection, None).await {
					Ok(parents) => parents,
					Err(err) => {
						warn!(
							kind = entry.dir,
							parent = parent_collection,
							error = %err,
							"parent listing failed"
						);
						Vec::new()
					}
				};

				for parent in &parents {
					collect_kind(entry.dir, &source, Some(parent), &kind_dir.join(parent)).await;
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dormant_entries_stay_in_the_table() {
		let disabled: Vec<_> = TOPOLOGY_TABLE
			.iter()
			.filter(|e| !e.enabled)
			.map(|e| e.dir)
			.collect();
		assert_eq!(
			disabled,
			[
				"cluster-node-templates",
				"cluster-templates",
				"cluster-template-revisions",
				"features",
			]
		);
	}

	#[test]
	fn enabled_entries_cover_the_bundle_layout() {
		let enabled: Vec<_> = TOPOLOGY_TABLE
			.iter()
			.filter(|e| e.enabled)
			.map(|e| e.dir)
			.collect();
		assert_eq!(enabled, ["clusters", "cluster-nodes", "cluster-node-pools"]);
	}
}
