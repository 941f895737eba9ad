//! Bundle shipping.
//!
//! The transport is a replaceable collaborator behind one trait; the
//! pipeline only cares that the archive ends up off-box. Upload failure is
//! fatal to the run.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Uploads a finished bundle archive to remote storage.
#[async_trait]
pub trait Shipper: Send + Sync {
	async fn upload(&self, archive: &Path) -> Result<()>;
}

/// Placeholder transport: leaves the archive on local disk.
#[derive(Debug, Default)]
pub struct NoopShipper;

#[async_trait]
impl Shipper for NoopShipper {
	async fn upload(&self, archive: &Path) -> Result<()> {
		info!(
			archive = %archive.display(),
			"no remote storage configured, bundle left on disk"
		);
		Ok(())
	}
}
