//! Kubernetes manifest collection for the local cluster.
//!
//! Two collectors share the `rancher-k8s-yaml/` category directory: one
//! snapshot of every namespace manifest, and one snapshot per workload kind
//! in the namespace Rancher runs in.

use std::path::Path;

use k8s_openapi::api::{
	apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
	batch::v1::{CronJob, Job},
	core::v1::{Endpoints, Namespace, Pod, Service},
	networking::v1::Ingress,
};
use kube::Client;

use super::kinds::{collect_kind, ClusterKind, NamespacedKind, Source};

/// Output directory for namespace manifests inside the category dir.
const NAMESPACE_DIR: &str = "rancher-all-namespace-yaml";

/// The workload catalog: output directory name and typed source, one entry
/// per kind. Listing order is the on-disk order of the bundle.
pub fn workload_table(client: &Client) -> Vec<(&'static str, Box<dyn Source>)> {
	vec![
		("pods", namespaced::<Pod>(client)),
		("deployments", namespaced::<Deployment>(client)),
		("daemonsets", namespaced::<DaemonSet>(client)),
		("statefulsets", namespaced::<StatefulSet>(client)),
		("cronjobs", namespaced::<CronJob>(client)),
		("jobs", namespaced::<Job>(client)),
		("replicasets", namespaced::<ReplicaSet>(client)),
		("services", namespaced::<Service>(client)),
		("endpoints", namespaced::<Endpoints>(client)),
		("ingresses", namespaced::<Ingress>(client)),
	]
}

fn namespaced<K>(client: &Client) -> Box<dyn Source>
where
	NamespacedKind<K>: Source + 'static,
{
	Box::new(NamespacedKind::<K>::new(client.clone()))
}

/// Snapshot every namespace manifest into
/// `<category>/rancher-all-namespace-yaml/`.
pub async fn collect_namespaces(client: &Client, category_dir: &Path) {
	let namespaces = ClusterKind::<Namespace>::new(client.clone());
	collect_kind(
		"namespaces",
		&namespaces,
		None,
		&category_dir.join(NAMESPACE_DIR),
	)
	.await;
}

/// Snapshot every workload kind in `namespace` into
/// `<category>/<kind>/<name>.yaml`.
pub async fn collect_workloads(client: &Client, namespace: &str, category_dir: &Path) {
	for (kind, source) in workload_table(client) {
		collect_kind(kind, source.as_ref(), Some(namespace), &category_dir.join(kind)).await;
	}
}
