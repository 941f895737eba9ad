//! Generic per-kind collection.
//!
//! Every resource kind in the bundle, Kubernetes workload or Rancher
//! management object alike, goes through the same three-step contract:
//! list names in a scope, fetch each object, write one YAML file per name.
//! [`collect_kind`] owns the orchestration and the failure policy: a single
//! kind or item being forbidden, deleted mid-run or erroring produces a
//! warning and partial output, never an aborted run.

use std::{fmt::Debug, fs, marker::PhantomData, path::Path};

use async_trait::async_trait;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::{api::ListParams, Api, Client, Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::k8s::mgmt::{MgmtClient, MgmtError};

/// Errors surfaced by a [`Source`] implementation.
#[derive(Debug, Error)]
pub enum SourceError {
	#[error(transparent)]
	Api(#[from] kube::Error),

	#[error(transparent)]
	Mgmt(#[from] MgmtError),

	#[error("serializing manifest")]
	Serialize(#[from] serde_yaml::Error),
}

/// Listing and fetching for one resource kind.
///
/// `scope` is the logical partition a call is restricted to: a namespace
/// for namespaced workloads, a management cluster id for its nodes and node
/// pools, `None` for cluster-wide kinds.
#[async_trait]
pub trait Source: Send + Sync {
	/// Names of all objects of this kind within `scope`, in listing order.
	async fn list(&self, scope: Option<&str>) -> Result<Vec<String>, SourceError>;

	/// One object of this kind, serialized as YAML.
	async fn fetch(&self, scope: Option<&str>, name: &str) -> Result<String, SourceError>;
}

/// Collect every object of one kind into `dest`, one `<name>.yaml` per
/// object.
///
/// Failure policy: directory creation (including "already exists"), the
/// listing call and every per-item fetch/write each degrade to a warning.
/// Files written by earlier iterations are never removed by a later
/// failure.
pub async fn collect_kind(kind: &str, source: &dyn Source, scope: Option<&str>, dest: &Path) {
	if let Err(err) = fs::create_dir(dest) {
		warn!(kind, path = %dest.display(), error = %err, "kind directory creation failed");
	}

	let names = match source.list(scope).await {
		Ok(names) => names,
		Err(err) => {
			warn!(kind, error = %err, "listing failed");
			Vec::new()
		}
	};

	for name in &names {
		debug!(kind, name = %name, "collecting manifest");
		let manifest = match source.fetch(scope, name).await {
			Ok(manifest) => manifest,
			Err(err) => {
				warn!(kind, name = %name, error = %err, "fetch failed");
				continue;
			}
		};
		if let Err(err) = fs::write(dest.join(format!("{name}.yaml")), manifest) {
			warn!(kind, name = %name, error = %err, "manifest write failed");
		}
	}
}

/// [`Source`] over a typed namespaced Kubernetes API, generic over the
/// `k8s-openapi` resource type. This single body replaces a per-kind copy
/// of the list/fetch/serialize/write loop for every workload kind.
pub struct NamespacedKind<K> {
	client: Client,
	_kind: PhantomData<K>,
}

impl<K> NamespacedKind<K> {
	pub fn new(client: Client) -> Self {
		Self {
			client,
			_kind: PhantomData,
		}
	}
}

#[async_trait]
impl<K> Source for NamespacedKind<K>
where
	K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
		+ Clone
		+ Debug
		+ DeserializeOwned
		+ Serialize
		+ Send
		+ Sync,
{
	async fn list(&self, scope: Option<&str>) -> Result<Vec<String>, SourceError> {
		let api = self.api(scope);
		let objects = api.list(&ListParams::default()).await?;
		Ok(objects.items.iter().map(ResourceExt::name_any).collect())
	}

	async fn fetch(&self, scope: Option<&str>, name: &str) -> Result<String, SourceError> {
		let object = self.api(scope).get(name).await?;
		Ok(serde_yaml::to_string(&object)?)
	}
}

impl<K> NamespacedKind<K>
where
	K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
	fn api(&self, scope: Option<&str>) -> Api<K> {
		match scope {
			Some(namespace) => Api::namespaced(self.client.clone(), namespace),
			None => Api::default_namespaced(self.client.clone()),
		}
	}
}

/// [`Source`] over a typed cluster-scoped Kubernetes API (namespaces,
/// nodes). The scope argument is ignored.
pub struct ClusterKind<K> {
	client: Client,
	_kind: PhantomData<K>,
}

impl<K> ClusterKind<K> {
	pub fn new(client: Client) -> Self {
		Self {
			client,
			_kind: PhantomData,
		}
	}
}

#[async_trait]
impl<K> Source for ClusterKind<K>
where
	K: Resource<Scope = ClusterResourceScope, DynamicType = ()>
		+ Clone
		+ Debug
		+ DeserializeOwned
		+ Serialize
		+ Send
		+ Sync,
{
	async fn list(&self, _scope: Option<&str>) -> Result<Vec<String>, SourceError> {
		let api = Api::<K>::all(self.client.clone());
		let objects = api.list(&ListParams::default()).await?;
		Ok(objects.items.iter().map(ResourceExt::name_any).collect())
	}

	async fn fetch(&self, _scope: Option<&str>, name: &str) -> Result<String, SourceError> {
		let object = Api::<K>::all(self.client.clone()).get(name).await?;
		Ok(serde_yaml::to_string(&object)?)
	}
}

/// [`Source`] over a Rancher management API collection, fetched raw and
/// re-encoded as YAML.
pub struct MgmtKind {
	client: MgmtClient,
	collection: &'static str,
}

impl MgmtKind {
	pub fn new(client: MgmtClient, collection: &'static str) -> Self {
		Self { client, collection }
	}
}

#[async_trait]
impl Source for MgmtKind {
	async fn list(&self, scope: Option<&str>) -> Result<Vec<String>, SourceError> {
		Ok(self.client.list_names(self.collection, scope).await?)
	}

	async fn fetch(&self, scope: Option<&str>, name: &str) -> Result<String, SourceError> {
		Ok(self.client.get_yaml(self.collection, scope, name).await?)
	}
}

#[cfg(test)]
mod tests {
	use std::{
		collections::BTreeSet,
		sync::{Arc, Mutex},
	};

	use tracing::{
		field::{Field, Visit},
		Event, Level, Subscriber,
	};
	use tracing_subscriber::{
		layer::{Context, SubscriberExt},
		registry::Registry,
		Layer,
	};

	use super::*;

	/// Layer collecting the message of every warn-level event.
	#[derive(Clone, Default)]
	struct WarningCapture {
		messages: Arc<Mutex<Vec<String>>>,
	}

	impl WarningCapture {
		fn messages(&self) -> Vec<String> {
			self.messages.lock().unwrap().clone()
		}
	}

	impl<S: Subscriber> Layer<S> for WarningCapture {
		fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
			if *event.metadata().level() != Level::WARN {
				return;
			}

			struct MessageVisitor(Option<String>);
			impl Visit for MessageVisitor {
				fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
					if field.name() == "message" {
						self.0 = Some(format!("{value:?}"));
					}
				}
			}

			let mut visitor = MessageVisitor(None);
			event.record(&mut visitor);
			if let Some(message) = visitor.0 {
				self.messages.lock().unwrap().push(message);
			}
		}
	}

	/// In-memory source with per-name induced failures.
	struct FakeSource {
		names: Vec<&'static str>,
		broken: BTreeSet<&'static str>,
		list_fails: bool,
	}

	fn induced_error() -> SourceError {
		SourceError::Mgmt(MgmtError::MissingValue("induced failure".to_string()))
	}

	#[async_trait]
	impl Source for FakeSource {
		async fn list(&self, _scope: Option<&str>) -> Result<Vec<String>, SourceError> {
			if self.list_fails {
				return Err(induced_error());
			}
			Ok(self.names.iter().map(|n| n.to_string()).collect())
		}

		async fn fetch(&self, _scope: Option<&str>, name: &str) -> Result<String, SourceError> {
			if self.broken.contains(name) {
				return Err(induced_error());
			}
			Ok(format!("name: {name}\n"))
		}
	}

	fn written_files(dir: &Path) -> BTreeSet<String> {
		fs::read_dir(dir)
			.unwrap()
			.map(|e| e.unwrap().file_name().into_string().unwrap())
			.collect()
	}

	#[tokio::test]
	async fn one_failing_item_leaves_the_rest() {
		let dir = tempfile::tempdir().unwrap();
		let dest = dir.path().join("pods");
		let source = FakeSource {
			names: vec!["a", "b", "c"],
			broken: BTreeSet::from(["b"]),
			list_fails: false,
		};

		collect_kind("pods", &source, None, &dest).await;

		assert_eq!(
			written_files(&dest),
			BTreeSet::from(["a.yaml".to_string(), "c.yaml".to_string()])
		);
	}

	#[tokio::test]
	async fn failed_listing_still_leaves_directory_marker() {
		let dir = tempfile::tempdir().unwrap();
		let dest = dir.path().join("pods");
		let source = FakeSource {
			names: vec![],
			broken: BTreeSet::new(),
			list_fails: true,
		};

		collect_kind("pods", &source, None, &dest).await;

		assert!(dest.is_dir());
		assert!(written_files(&dest).is_empty());
	}

	#[tokio::test]
	async fn failing_fetch_is_logged_as_warning() {
		let dir = tempfile::tempdir().unwrap();
		let dest = dir.path().join("pods");
		let source = FakeSource {
			names: vec!["a", "b"],
			broken: BTreeSet::from(["b"]),
			list_fails: false,
		};

		let capture = WarningCapture::default();
		let subscriber = Registry::default().with(capture.clone());
		let guard = tracing::subscriber::set_default(subscriber);
		collect_kind("pods", &source, None, &dest).await;
		drop(guard);

		assert_eq!(capture.messages(), vec!["fetch failed".to_string()]);
	}

	#[tokio::test]
	async fn failing_listing_is_logged_as_warning() {
		let dir = tempfile::tempdir().unwrap();
		let dest = dir.path().join("pods");
		let source = FakeSource {
			names: vec![],
			broken: BTreeSet::new(),
			list_fails: true,
		};

		let capture = WarningCapture::default();
		let subscriber = Registry::default().with(capture.clone());
		let guard = tracing::subscriber::set_default(subscriber);
		collect_kind("pods", &source, None, &dest).await;
		drop(guard);

		assert_eq!(capture.messages(), vec!["listing failed".to_string()]);
	}

	#[tokio::test]
	async fn existing_destination_is_not_rolled_back() {
		let dir = tempfile::tempdir().unwrap();
		let dest = dir.path().join("pods");
		fs::create_dir(&dest).unwrap();
		fs::write(dest.join("earlier.yaml"), "name: earlier\n").unwrap();

		let source = FakeSource {
			names: vec!["late"],
			broken: BTreeSet::from(["late"]),
			list_fails: false,
		};

		// Directory already exists (warn) and the only item fails (warn);
		// the file written before this kind ran must survive.
		collect_kind("pods", &source, None, &dest).await;

		assert_eq!(
			written_files(&dest),
			BTreeSet::from(["earlier.yaml".to_string()])
		);
	}
}
