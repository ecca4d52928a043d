//! Directory/file access behind a small async trait
//!
//! The matcher, the codec helpers and the copy routines only talk to a
//! [`DirectoryProvider`]. [`LocalFs`] maps it onto the local filesystem and
//! [`MemoryFs`] onto an in-memory tree used for deterministic fixtures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

pub mod local;
pub mod memory;

pub use local::LocalFs;
pub use memory::{MemDir, MemFile, MemoryFs};

/// Access level asked of a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionMode {
	Read,
	ReadWrite,
}

/// Answer to a permission query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionState {
	Granted,
	Denied,
	/// Not decided yet; a request may still grant it
	Prompt,
}

/// Kind-tagged handle returned by a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryHandle<D, F> {
	File(F),
	Directory(D),
}

/// One named entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry<D, F> {
	pub name: String,
	pub handle: EntryHandle<D, F>,
}

impl<D, F> DirEntry<D, F> {
	pub fn file(name: impl Into<String>, file: F) -> Self {
		Self {
			name: name.into(),
			handle: EntryHandle::File(file),
		}
	}

	pub fn directory(name: impl Into<String>, dir: D) -> Self {
		Self {
			name: name.into(),
			handle: EntryHandle::Directory(dir),
		}
	}

	pub fn is_file(&self) -> bool {
		matches!(self.handle, EntryHandle::File(_))
	}
}

/// Hierarchical storage the engine can search, read and write.
///
/// Directory handles must compare equal when they name the same directory;
/// the matcher de-duplicates its worklist on that identity.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
	type Dir: Clone + Eq + Hash + Debug + Send + Sync;
	type File: Clone + Debug + Send + Sync;

	/// Every entry of `dir`, files and subdirectories
	async fn list_entries(
		&self,
		dir: &Self::Dir,
	) -> ProviderResult<Vec<DirEntry<Self::Dir, Self::File>>>;

	/// A file directly inside `dir`.
	///
	/// Fails with [`ProviderError::NotFound`] when absent,
	/// [`ProviderError::TypeMismatch`] when the name is a directory and
	/// [`ProviderError::InvalidName`] when the name cannot name an entry.
	async fn get_file_by_name(&self, dir: &Self::Dir, name: &str) -> ProviderResult<Self::File>;

	/// A subdirectory of `dir`, created when missing
	async fn get_or_create_dir(&self, dir: &Self::Dir, name: &str) -> ProviderResult<Self::Dir>;

	/// An empty file in `dir`, truncating any existing one
	async fn create_file(&self, dir: &Self::Dir, name: &str) -> ProviderResult<Self::File>;

	async fn read_all_bytes(&self, file: &Self::File) -> ProviderResult<Vec<u8>>;

	/// File contents decoded as UTF-8, invalid sequences replaced
	async fn read_all_text(&self, file: &Self::File) -> ProviderResult<String> {
		let bytes = self.read_all_bytes(file).await?;
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	}

	/// Replace the whole contents of `file`
	async fn write_all_bytes(&self, file: &Self::File, bytes: &[u8]) -> ProviderResult<()>;

	async fn query_permission(
		&self,
		dir: &Self::Dir,
		mode: PermissionMode,
	) -> ProviderResult<PermissionState>;

	async fn request_permission(
		&self,
		dir: &Self::Dir,
		mode: PermissionMode,
	) -> ProviderResult<PermissionState>;
}

/// Query first and request only when the answer is not already granted.
pub async fn ensure_permission<P: DirectoryProvider>(
	provider: &P,
	dir: &P::Dir,
	mode: PermissionMode,
) -> ProviderResult<bool> {
	if provider.query_permission(dir, mode).await? == PermissionState::Granted {
		return Ok(true);
	}
	let state = provider.request_permission(dir, mode).await?;
	debug!("Provider: permission request for {dir:?} ({mode:?}) -> {state:?}");
	Ok(state == PermissionState::Granted)
}

/// Names every provider accepts as a single entry
pub(crate) fn check_entry_name(name: &str) -> ProviderResult<()> {
	if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
		return Err(ProviderError::InvalidName {
			name: name.to_string(),
		});
	}
	Ok(())
}
