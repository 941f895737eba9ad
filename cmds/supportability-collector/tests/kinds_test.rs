//! Per-kind collection against a live mock API server.

use std::{collections::BTreeSet, fs, path::Path};

use collector::{
	collect::kinds::{collect_kind, ClusterKind, MgmtKind, NamespacedKind},
	k8s::{Connection, MgmtClient},
};
use k8s_openapi::api::core::v1::{Node, Pod};
use mgmt_mock::{MockMgmtServer, RunningMockMgmtServer};

async fn connect(server: &RunningMockMgmtServer) -> Connection {
	Connection::from_kubeconfig(server.kubeconfig())
		.await
		.expect("connection should succeed")
}

fn written_files(dir: &Path) -> BTreeSet<String> {
	fs::read_dir(dir)
		.unwrap()
		.map(|e| e.unwrap().file_name().into_string().unwrap())
		.collect()
}

#[tokio::test]
async fn namespaced_kind_collects_scoped_pods() {
	let server = MockMgmtServer::new()
		.pod("cattle-system", "rancher-abc")
		.pod("cattle-system", "rancher-def")
		.pod("other", "unrelated")
		.start()
		.await;
	let conn = connect(&server).await;

	let dir = tempfile::tempdir().unwrap();
	let dest = dir.path().join("pods");
	let source = NamespacedKind::<Pod>::new(conn.client().clone());

	collect_kind("pods", &source, Some("cattle-system"), &dest).await;

	assert_eq!(
		written_files(&dest),
		BTreeSet::from(["rancher-abc.yaml".to_string(), "rancher-def.yaml".to_string()])
	);
}

#[tokio::test]
async fn failing_fetch_skips_one_pod() {
	let server = MockMgmtServer::new()
		.pod("cattle-system", "rancher-abc")
		.pod("cattle-system", "rancher-broken")
		.fail_fetch("/api/v1/namespaces/cattle-system/pods", "rancher-broken")
		.start()
		.await;
	let conn = connect(&server).await;

	let dir = tempfile::tempdir().unwrap();
	let dest = dir.path().join("pods");
	let source = NamespacedKind::<Pod>::new(conn.client().clone());

	collect_kind("pods", &source, Some("cattle-system"), &dest).await;

	assert_eq!(
		written_files(&dest),
		BTreeSet::from(["rancher-abc.yaml".to_string()])
	);
}

#[tokio::test]
async fn failing_listing_leaves_empty_directory() {
	let server = MockMgmtServer::new()
		.pod("cattle-system", "rancher-abc")
		.fail_list("/api/v1/namespaces/cattle-system/pods")
		.start()
		.await;
	let conn = connect(&server).await;

	let dir = tempfile::tempdir().unwrap();
	let dest = dir.path().join("pods");
	let source = NamespacedKind::<Pod>::new(conn.client().clone());

	collect_kind("pods", &source, Some("cattle-system"), &dest).await;

	assert!(dest.is_dir());
	assert!(written_files(&dest).is_empty());
}

#[tokio::test]
async fn cluster_kind_collects_nodes() {
	let server = MockMgmtServer::new()
		.node("node-a")
		.node("node-b")
		.start()
		.await;
	let conn = connect(&server).await;

	let dir = tempfile::tempdir().unwrap();
	let dest = dir.path().join("nodes");
	let source = ClusterKind::<Node>::new(conn.client().clone());

	collect_kind("nodes", &source, None, &dest).await;

	assert_eq!(
		written_files(&dest),
		BTreeSet::from(["node-a.yaml".to_string(), "node-b.yaml".to_string()])
	);
}

#[tokio::test]
async fn mgmt_kind_scopes_nodes_by_cluster() {
	let server = MockMgmtServer::new()
		.mgmt_node("c-12345", "m-aaa")
		.mgmt_node("c-12345", "m-bbb")
		.mgmt_node("c-67890", "m-other")
		.start()
		.await;
	let conn = connect(&server).await;

	let dir = tempfile::tempdir().unwrap();
	let dest = dir.path().join("c-12345");
	let mgmt = MgmtClient::new(conn.client().clone(), "token-abcde", "s3cret");
	let source = MgmtKind::new(mgmt, "nodes");

	collect_kind("cluster-nodes", &source, Some("c-12345"), &dest).await;

	assert_eq!(
		written_files(&dest),
		BTreeSet::from(["m-aaa.yaml".to_string(), "m-bbb.yaml".to_string()])
	);
}
