//! Mock Kubernetes and Rancher management API server for testing.
//!
//! Serves just enough of the API surface the collector touches: `/version`,
//! typed list/get paths for core and group resources, and the
//! `management.cattle.io/v3` settings and collections. Resources are
//! registered up front; individual fetches and whole listings can be made
//! to fail to exercise the collector's failure policy.

use std::collections::HashSet;

use kube::config::{
	AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext,
};
use serde_json::{json, Value};
use tracing::debug;
use wiremock::{
	matchers::{method, path, path_regex},
	Mock, MockServer, Request, ResponseTemplate,
};

const MGMT_BASE: &str = "/apis/management.cattle.io/v3";

struct MockResource {
	/// API path a LIST for this resource hits, e.g.
	/// `/api/v1/namespaces/cattle-system/pods`.
	list_path: String,
	name: String,
	/// Management scope (`?namespace=` query); `None` for resources whose
	/// scope is already part of the path.
	scope: Option<String>,
	manifest: Value,
}

/// Builder for the mock server.
#[derive(Default)]
pub struct MockMgmtServer {
	resources: Vec<MockResource>,
	broken_fetches: HashSet<(String, String)>,
	broken_lists: HashSet<String>,
}

impl MockMgmtServer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a resource under an explicit list path.
	pub fn resource(
		mut self,
		list_path: impl Into<String>,
		name: &str,
		scope: Option<&str>,
		manifest: Value,
	) -> Self {
		self.resources.push(MockResource {
			list_path: list_path.into(),
			name: name.to_string(),
			scope: scope.map(str::to_string),
			manifest,
		});
		self
	}

	/// Register the four platform settings the collector reads, with
	/// plausible values.
	pub fn with_default_settings(self) -> Self {
		self.setting("install-uuid", "9e63b5a0-55f7-4a58-b73b-0569fc7616a2")
			.setting("server-version", "v2.8.3")
			.setting("server-url", "https://rancher.example.com")
			.setting("eula-agreed", "2023-01-15T00:00:00Z")
	}

	pub fn setting(self, name: &str, value: &str) -> Self {
		self.resource(
			format!("{MGMT_BASE}/settings"),
			name,
			None,
			json!({ "name": name, "value": value }),
		)
	}

	pub fn namespace(self, name: &str) -> Self {
		self.resource(
			"/api/v1/namespaces",
			name,
			None,
			json!({
				"apiVersion": "v1",
				"kind": "Namespace",
				"metadata": { "name": name }
			}),
		)
	}

	pub fn pod(self, namespace: &str, name: &str) -> Self {
		self.resource(
			format!("/api/v1/namespaces/{namespace}/pods"),
			name,
			None,
			json!({
				"apiVersion": "v1",
				"kind": "Pod",
				"metadata": { "name": name, "namespace": namespace },
				"spec": { "containers": [{ "name": "rancher", "image": "rancher/rancher" }] }
			}),
		)
	}

	pub fn deployment(self, namespace: &str, name: &str) -> Self {
		self.resource(
			format!("/apis/apps/v1/namespaces/{namespace}/deployments"),
			name,
			None,
			json!({
				"apiVersion": "apps/v1",
				"kind": "Deployment",
				"metadata": { "name": name, "namespace": namespace },
				"spec": { "replicas": 1 }
			}),
		)
	}

	pub fn node(self, name: &str) -> Self {
		self.resource(
			"/api/v1/nodes",
			name,
			None,
			json!({
				"apiVersion": "v1",
				"kind": "Node",
				"metadata": { "name": name }
			}),
		)
	}

	pub fn mgmt_cluster(self, id: &str) -> Self {
		self.resource(
			format!("{MGMT_BASE}/clusters"),
			id,
			None,
			json!({
				"apiVersion": "management.cattle.io/v3",
				"kind": "Cluster",
				"metadata": { "name": id }
			}),
		)
	}

	pub fn mgmt_node(self, cluster: &str, name: &str) -> Self {
		self.resource(
			format!("{MGMT_BASE}/nodes"),
			name,
			Some(cluster),
			json!({
				"apiVersion": "management.cattle.io/v3",
				"kind": "Node",
				"metadata": { "name": name, "namespace": cluster }
			}),
		)
	}

	pub fn mgmt_node_pool(self, cluster: &str, name: &str) -> Self {
		self.resource(
			format!("{MGMT_BASE}/nodepools"),
			name,
			Some(cluster),
			json!({
				"apiVersion": "management.cattle.io/v3",
				"kind": "NodePool",
				"metadata": { "name": name, "namespace": cluster }
			}),
		)
	}

	/// Make a single resource fetch return 500.
	pub fn fail_fetch(mut self, list_path: impl Into<String>, name: &str) -> Self {
		self.broken_fetches.insert((list_path.into(), name.to_string()));
		self
	}

	/// Make a whole listing return 500.
	pub fn fail_list(mut self, list_path: impl Into<String>) -> Self {
		self.broken_lists.insert(list_path.into());
		self
	}

	pub async fn start(self) -> RunningMockMgmtServer {
		let server = MockServer::start().await;
		debug!(uri = %server.uri(), "started mock management server");

		mount_version(&server).await;
		mount_resources(&server, self.resources, self.broken_fetches, self.broken_lists).await;

		RunningMockMgmtServer { server }
	}
}

/// A running mock server instance.
pub struct RunningMockMgmtServer {
	server: MockServer,
}

impl RunningMockMgmtServer {
	pub fn uri(&self) -> String {
		self.server.uri()
	}

	/// A kubeconfig pointing at this mock server.
	pub fn kubeconfig(&self) -> Kubeconfig {
		let cluster_name = "mock-cluster";
		let user_name = "mock-user";
		let context_name = "mock-context";

		Kubeconfig {
			clusters: vec![NamedCluster {
				name: cluster_name.to_string(),
				cluster: Some(Cluster {
					server: Some(self.uri()),
					insecure_skip_tls_verify: Some(true),
					..Default::default()
				}),
			}],
			contexts: vec![NamedContext {
				name: context_name.to_string(),
				context: Some(Context {
					cluster: cluster_name.to_string(),
					user: Some(user_name.to_string()),
					namespace: Some("default".to_string()),
					..Default::default()
				}),
			}],
			auth_infos: vec![NamedAuthInfo {
				name: user_name.to_string(),
				auth_info: Some(AuthInfo::default()),
			}],
			current_context: Some(context_name.to_string()),
			..Default::default()
		}
	}
}

async fn mount_version(server: &MockServer) {
	Mock::given(method("GET"))
		.and(path("/version"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"major": "1",
			"minor": "31",
			"gitVersion": "v1.31.0",
			"gitCommit": "fake",
			"gitTreeState": "clean",
			"buildDate": "2024-01-01T00:00:00Z",
			"goVersion": "go1.22.0",
			"compiler": "gc",
			"platform": "linux/amd64"
		})))
		.mount(server)
		.await;
}

async fn mount_resources(
	server: &MockServer,
	resources: Vec<MockResource>,
	broken_fetches: HashSet<(String, String)>,
	broken_lists: HashSet<String>,
) {
	Mock::given(method("GET"))
		.and(path_regex(r"^/api(s)?/.*"))
		.respond_with(move |req: &Request| {
			let path_str = req.url.path().trim_end_matches('/').to_string();

			if broken_lists.contains(&path_str) {
				return server_error();
			}

			let scope_filter = req
				.url
				.query_pairs()
				.find(|(key, _)| key == "namespace")
				.map(|(_, value)| value.into_owned());

			// Single resource: the last path component is the name.
			let (api_path, name) = split_name(&path_str);
			if !name.is_empty() {
				if broken_fetches.contains(&(api_path.to_string(), name.to_string())) {
					return server_error();
				}
				if let Some(resource) = resources
					.iter()
					.find(|r| r.list_path == api_path && r.name == name)
				{
					return ResponseTemplate::new(200).set_body_json(resource.manifest.clone());
				}
			}

			// Listing: every resource registered under this path, filtered
			// by the management scope query when present.
			let items: Vec<Value> = resources
				.iter()
				.filter(|r| r.list_path == path_str)
				.filter(|r| match (&scope_filter, &r.scope) {
					(Some(want), Some(have)) => want == have,
					_ => true,
				})
				.map(|r| r.manifest.clone())
				.collect();

			if !items.is_empty() {
				return ResponseTemplate::new(200).set_body_json(json!({
					"kind": "List",
					"apiVersion": "v1",
					"metadata": { "resourceVersion": "1" },
					"items": items
				}));
			}

			if !name.is_empty() {
				return not_found();
			}

			ResponseTemplate::new(200).set_body_json(json!({
				"kind": "List",
				"apiVersion": "v1",
				"metadata": { "resourceVersion": "1" },
				"items": []
			}))
		})
		.mount(server)
		.await;
}

fn split_name(path: &str) -> (&str, &str) {
	match path.rfind('/') {
		Some(idx) => (&path[..idx], &path[idx + 1..]),
		None => (path, ""),
	}
}

fn server_error() -> ResponseTemplate {
	ResponseTemplate::new(500).set_body_json(json!({
		"kind": "Status",
		"apiVersion": "v1",
		"metadata": {},
		"status": "Failure",
		"message": "induced failure",
		"reason": "InternalError",
		"code": 500
	}))
}

fn not_found() -> ResponseTemplate {
	ResponseTemplate::new(404).set_body_json(json!({
		"kind": "Status",
		"apiVersion": "v1",
		"metadata": {},
		"status": "Failure",
		"message": "not found",
		"reason": "NotFound",
		"code": 404
	}))
}
