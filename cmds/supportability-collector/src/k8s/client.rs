//! Cluster connection management.

use std::time::Duration;

use k8s_openapi::apimachinery::pkg::version::Info;
use kube::{
	config::{InferConfigError, KubeConfigOptions, Kubeconfig, KubeconfigError},
	Client, Config,
};
use thiserror::Error;
use tracing::info;

/// Default timeout for Kubernetes API requests. Without this an
/// unresponsive API server would stall a run indefinitely.
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when connecting to the upstream cluster.
#[derive(Debug, Error)]
pub enum ConnectionError {
	#[error("no in-cluster service account or kubeconfig available")]
	Infer(#[from] InferConfigError),

	#[error(transparent)]
	Kubeconfig(#[from] KubeconfigError),

	#[error(transparent)]
	Kube(#[from] kube::Error),
}

/// A connection to the cluster hosting Rancher.
///
/// Wraps the kube client together with the server version fetched at
/// connect time, so a dead endpoint fails the run up front rather than
/// midway through collection.
#[derive(Clone)]
pub struct Connection {
	client: Client,
	server_version: Info,
}

impl std::fmt::Debug for Connection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Connection")
			.field("server_version", &self.server_version)
			.finish_non_exhaustive()
	}
}

impl Connection {
	/// Connect using the environment: the in-cluster service account when
	/// running inside a pod, otherwise the local kubeconfig.
	pub async fn infer() -> Result<Self, ConnectionError> {
		let config = Config::infer().await?;
		Self::from_config(config).await
	}

	/// Connect using an explicit kubeconfig. Used by tests to point the
	/// collector at a mock API server.
	pub async fn from_kubeconfig(kubeconfig: Kubeconfig) -> Result<Self, ConnectionError> {
		let config =
			Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
		Self::from_config(config).await
	}

	async fn from_config(mut config: Config) -> Result<Self, ConnectionError> {
		config.read_timeout = Some(DEFAULT_API_TIMEOUT);
		let client = Client::try_from(config)?;

		let server_version = client.apiserver_version().await?;
		info!(
			server = %server_version.git_version,
			"connected to upstream cluster"
		);

		Ok(Self {
			client,
			server_version,
		})
	}

	pub fn client(&self) -> &Client {
		&self.client
	}

	pub fn server_version(&self) -> &Info {
		&self.server_version
	}
}
