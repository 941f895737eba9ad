//! Bundle packaging.
//!
//! Walks the staged tree and streams every regular file into a gzip
//! compressed tar archive. Entries are named relative to the staging root so
//! the bundle extracts cleanly anywhere. Traversal follows filesystem order;
//! byte-for-byte reproducibility across runs is not a goal.

use std::{
	fs::File,
	io,
	path::{Path, PathBuf},
};

use flate2::{write::GzEncoder, Compression};
use thiserror::Error;
use tracing::debug;

/// Errors from archive construction. Any of these aborts the build; a
/// partial archive is worse than none.
#[derive(Debug, Error)]
pub enum ArchiveError {
	#[error("creating archive file {path}")]
	Create {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("walking staged tree")]
	Walk(#[from] walkdir::Error),

	#[error("staged file {path} is outside the staging root")]
	OutsideRoot { path: PathBuf },

	#[error("adding {path} to archive")]
	Append {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("finishing archive stream")]
	Finish(#[source] io::Error),
}

/// Package the tree rooted at `src` into a gzip compressed tar archive at
/// `dest`. Files are streamed one at a time; the tree is never buffered in
/// memory as a whole.
pub fn build(src: &Path, dest: &Path) -> Result<(), ArchiveError> {
	let out = File::create(dest).map_err(|source| ArchiveError::Create {
		path: dest.to_path_buf(),
		source,
	})?;
	let encoder = GzEncoder::new(out, Compression::default());
	let mut builder = tar::Builder::new(encoder);

	for entry in walkdir::WalkDir::new(src).min_depth(1) {
		let entry = entry?;
		if !entry.file_type().is_file() {
			continue;
		}

		let name = entry
			.path()
			.strip_prefix(src)
			.map_err(|_| ArchiveError::OutsideRoot {
				path: entry.path().to_path_buf(),
			})?;
		debug!(entry = %name.display(), "archiving");

		builder
			.append_path_with_name(entry.path(), name)
			.map_err(|source| ArchiveError::Append {
				path: entry.path().to_path_buf(),
				source,
			})?;
	}

	let encoder = builder.into_inner().map_err(ArchiveError::Finish)?;
	encoder.finish().map_err(ArchiveError::Finish)?;
	Ok(())
}
