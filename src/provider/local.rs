//! Local filesystem provider over `smol::fs`

use async_trait::async_trait;
use futures_lite::StreamExt;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

use super::{
	DirEntry, DirectoryProvider, PermissionMode, PermissionState, check_entry_name,
};
use crate::error::{ProviderError, ProviderResult};

/// Paths double as handles, so two handles for one directory compare equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
	pub fn new() -> Self {
		Self
	}

	async fn existing_kind(path: &Path) -> ProviderResult<Option<bool>> {
		match smol::fs::metadata(path).await {
			Ok(meta) => Ok(Some(meta.is_dir())),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(ProviderError::from_io(e, path)),
		}
	}
}

#[async_trait]
impl DirectoryProvider for LocalFs {
	type Dir = PathBuf;
	type File = PathBuf;

	async fn list_entries(&self, dir: &PathBuf) -> ProviderResult<Vec<DirEntry<PathBuf, PathBuf>>> {
		let mut reader = smol::fs::read_dir(dir)
			.await
			.map_err(|e| ProviderError::from_io(e, dir))?;

		let mut entries = Vec::new();
		while let Some(entry) = reader.next().await {
			let entry = entry.map_err(|e| ProviderError::from_io(e, dir))?;
			let path = entry.path();
			let name = entry.file_name().to_string_lossy().into_owned();

			// follows symlinks; dangling ones are skipped
			let meta = match smol::fs::metadata(&path).await {
				Ok(meta) => meta,
				Err(e) => {
					warn!("LocalFs: skipping {}: {}", path.display(), e);
					continue;
				}
			};
			if meta.is_dir() {
				entries.push(DirEntry::directory(name, path));
			} else if meta.is_file() {
				entries.push(DirEntry::file(name, path));
			}
		}
		entries.sort_by(|a, b| a.name.cmp(&b.name));
		trace!("LocalFs: {} entries in {}", entries.len(), dir.display());
		Ok(entries)
	}

	async fn get_file_by_name(&self, dir: &PathBuf, name: &str) -> ProviderResult<PathBuf> {
		check_entry_name(name)?;
		let path = dir.join(name);
		match Self::existing_kind(&path).await? {
			Some(false) => Ok(path),
			Some(true) => Err(ProviderError::TypeMismatch {
				name: name.to_string(),
			}),
			None => Err(ProviderError::NotFound {
				name: name.to_string(),
			}),
		}
	}

	async fn get_or_create_dir(&self, dir: &PathBuf, name: &str) -> ProviderResult<PathBuf> {
		check_entry_name(name)?;
		let path = dir.join(name);
		match Self::existing_kind(&path).await? {
			Some(true) => Ok(path),
			Some(false) => Err(ProviderError::TypeMismatch {
				name: name.to_string(),
			}),
			None => {
				smol::fs::create_dir_all(&path)
					.await
					.map_err(|e| ProviderError::from_io(e, &path))?;
				Ok(path)
			}
		}
	}

	async fn create_file(&self, dir: &PathBuf, name: &str) -> ProviderResult<PathBuf> {
		check_entry_name(name)?;
		let path = dir.join(name);
		if Self::existing_kind(&path).await? == Some(true) {
			return Err(ProviderError::TypeMismatch {
				name: name.to_string(),
			});
		}
		smol::fs::File::create(&path)
			.await
			.map_err(|e| ProviderError::from_io(e, &path))?;
		Ok(path)
	}

	async fn read_all_bytes(&self, file: &PathBuf) -> ProviderResult<Vec<u8>> {
		smol::fs::read(file)
			.await
			.map_err(|e| ProviderError::from_io(e, file))
	}

	async fn write_all_bytes(&self, file: &PathBuf, bytes: &[u8]) -> ProviderResult<()> {
		smol::fs::write(file, bytes)
			.await
			.map_err(|e| ProviderError::from_io(e, file))
	}

	async fn query_permission(
		&self,
		dir: &PathBuf,
		mode: PermissionMode,
	) -> ProviderResult<PermissionState> {
		let meta = match smol::fs::metadata(dir).await {
			Ok(meta) => meta,
			Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
				return Ok(PermissionState::Denied);
			}
			Err(e) => return Err(ProviderError::from_io(e, dir)),
		};
		let state = match mode {
			PermissionMode::ReadWrite if meta.permissions().readonly() => PermissionState::Denied,
			_ => PermissionState::Granted,
		};
		Ok(state)
	}

	/// The local filesystem cannot prompt; this repeats the query.
	async fn request_permission(
		&self,
		dir: &PathBuf,
		mode: PermissionMode,
	) -> ProviderResult<PermissionState> {
		self.query_permission(dir, mode).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[smol_potat::test]
	async fn test_list_and_lookup() {
		let temp = TempDir::new().unwrap();
		let root = temp.path().to_path_buf();
		fs::write(root.join("b.txt"), "b").unwrap();
		fs::write(root.join("a.txt"), "a").unwrap();
		fs::create_dir(root.join("sub")).unwrap();

		let provider = LocalFs::new();
		let entries = provider.list_entries(&root).await.unwrap();
		let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
		assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
		assert!(!entries[2].is_file());

		let file = provider.get_file_by_name(&root, "a.txt").await.unwrap();
		assert_eq!(provider.read_all_text(&file).await.unwrap(), "a");
		assert!(matches!(
			provider.get_file_by_name(&root, "sub").await,
			Err(ProviderError::TypeMismatch { .. })
		));
		assert!(matches!(
			provider.get_file_by_name(&root, "nope.txt").await,
			Err(ProviderError::NotFound { .. })
		));
		assert!(matches!(
			provider.get_file_by_name(&root, "../a.txt").await,
			Err(ProviderError::InvalidName { .. })
		));
	}

	#[smol_potat::test]
	async fn test_create_and_write() {
		let temp = TempDir::new().unwrap();
		let root = temp.path().to_path_buf();
		let provider = LocalFs::new();

		let out = provider.get_or_create_dir(&root, "out").await.unwrap();
		assert_eq!(provider.get_or_create_dir(&root, "out").await.unwrap(), out);
		let file = provider.create_file(&out, "x.txt").await.unwrap();
		provider.write_all_bytes(&file, b"payload").await.unwrap();
		assert_eq!(std::fs::read(out.join("x.txt")).unwrap(), b"payload");

		assert_eq!(
			provider.query_permission(&root, PermissionMode::Read).await.unwrap(),
			PermissionState::Granted
		);
	}
}
