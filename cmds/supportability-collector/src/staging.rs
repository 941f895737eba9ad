//! Staging area management.
//!
//! One run owns one uniquely named staging directory. Everything the
//! collectors produce lands beneath it; after archival the directory is
//! removed and only the sibling `.tar.gz` remains.

use std::{
	fs, io,
	path::{Path, PathBuf},
};

use chrono::Utc;
use thiserror::Error;
use tracing::info;

/// Prefix for the staging directory name.
const STAGING_PREFIX: &str = "supportability-";

/// Name of the run start marker file inside the staging root.
const TIMESTAMP_FILE: &str = "timestamp";

/// Errors from staging directory lifecycle operations. All of these are
/// run-ending: without a staging tree no later stage can produce output,
/// and a failed cleanup points at a storage or permission anomaly.
#[derive(Debug, Error)]
pub enum StagingError {
	#[error("creating staging directory")]
	Create(#[source] io::Error),

	#[error("writing timestamp marker")]
	Timestamp(#[source] io::Error),

	#[error("removing staging directory {path}")]
	Destroy {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

/// Private working directory for one collection run.
pub struct StagingArea {
	root: PathBuf,
}

impl StagingArea {
	/// Allocate a staging directory under the system temp dir.
	pub fn create() -> Result<Self, StagingError> {
		Self::from_tempdir(tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir())
	}

	/// Allocate a staging directory under `parent`. Used by tests to keep
	/// the whole run inside a scratch directory.
	pub fn create_in(parent: &Path) -> Result<Self, StagingError> {
		Self::from_tempdir(
			tempfile::Builder::new()
				.prefix(STAGING_PREFIX)
				.tempdir_in(parent),
		)
	}

	fn from_tempdir(dir: io::Result<tempfile::TempDir>) -> Result<Self, StagingError> {
		// The directory outlives the TempDir guard; cleanup is an explicit
		// pipeline stage, not a drop side effect.
		let root = dir.map_err(StagingError::Create)?.keep();
		info!(path = %root.display(), "staging directory created");
		Ok(Self { root })
	}

	pub fn path(&self) -> &Path {
		&self.root
	}

	/// Path of the archive this run will produce: `<root>.tar.gz`, a
	/// sibling of the staging directory.
	pub fn archive_path(&self) -> PathBuf {
		let mut path = self.root.clone().into_os_string();
		path.push(".tar.gz");
		PathBuf::from(path)
	}

	/// Write the run's start time (unix seconds) as a plain marker file.
	pub fn mark_timestamp(&self) -> Result<(), StagingError> {
		let marker = self.root.join(TIMESTAMP_FILE);
		fs::write(&marker, Utc::now().timestamp().to_string()).map_err(StagingError::Timestamp)
	}

	/// Recursively delete the staging tree. Consumes the area; the archive
	/// file (if already built) is not touched.
	pub fn destroy(self) -> Result<(), StagingError> {
		fs::remove_dir_all(&self.root).map_err(|source| StagingError::Destroy {
			path: self.root.clone(),
			source,
		})?;
		info!(path = %self.root.display(), "staging directory removed");
		Ok(())
	}
}
