//! In-memory directory tree

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

use super::{
	DirEntry, DirectoryProvider, PermissionMode, PermissionState, check_entry_name,
};
use crate::error::{ProviderError, ProviderResult};

/// Directory handle: index into the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemDir(usize);

/// File handle: index into the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemFile(usize);

#[derive(Debug)]
enum NodeKind {
	Dir {
		children: Vec<usize>,
		permission: PermissionState,
	},
	File {
		content: Vec<u8>,
	},
}

#[derive(Debug)]
struct Node {
	name: String,
	parent: Option<usize>,
	kind: NodeKind,
}

/// Arena-backed tree; listings come back in insertion order.
///
/// Directories can be locked with [`MemoryFs::set_permission`] to exercise
/// permission failures.
#[derive(Debug)]
pub struct MemoryFs {
	nodes: RwLock<Vec<Node>>,
	listings: AtomicUsize,
}

impl Default for MemoryFs {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryFs {
	pub fn new() -> Self {
		Self {
			nodes: RwLock::new(vec![Node {
				name: String::new(),
				parent: None,
				kind: NodeKind::Dir {
					children: Vec::new(),
					permission: PermissionState::Granted,
				},
			}]),
			listings: AtomicUsize::new(0),
		}
	}

	pub fn root(&self) -> MemDir {
		MemDir(0)
	}

	fn read(&self) -> RwLockReadGuard<'_, Vec<Node>> {
		self.nodes.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, Vec<Node>> {
		self.nodes.write().unwrap_or_else(PoisonError::into_inner)
	}

	/// Add a subdirectory, or return the existing one of that name
	pub fn add_dir(&self, parent: MemDir, name: &str) -> MemDir {
		let mut nodes = self.write();
		if let Some(id) = child_named(&nodes, parent.0, name)
			&& matches!(nodes[id].kind, NodeKind::Dir { .. })
		{
			return MemDir(id);
		}
		MemDir(insert_node(
			&mut nodes,
			parent.0,
			name,
			NodeKind::Dir {
				children: Vec::new(),
				permission: PermissionState::Granted,
			},
		))
	}

	/// Add a file, replacing the contents of an existing one of that name
	pub fn add_file(&self, parent: MemDir, name: &str, content: impl Into<Vec<u8>>) -> MemFile {
		let content = content.into();
		let mut nodes = self.write();
		if let Some(id) = child_named(&nodes, parent.0, name)
			&& let NodeKind::File { content: existing } = &mut nodes[id].kind
		{
			*existing = content;
			return MemFile(id);
		}
		MemFile(insert_node(&mut nodes, parent.0, name, NodeKind::File { content }))
	}

	/// Create every directory along a `/`-separated path
	pub fn add_dir_path(&self, path: &str) -> MemDir {
		path.split('/')
			.filter(|s| !s.is_empty())
			.fold(self.root(), |dir, segment| self.add_dir(dir, segment))
	}

	pub fn set_permission(&self, dir: MemDir, state: PermissionState) {
		if let NodeKind::Dir { permission, .. } = &mut self.write()[dir.0].kind {
			*permission = state;
		}
	}

	/// Contents of a file handle
	pub fn contents(&self, file: MemFile) -> Option<Vec<u8>> {
		match &self.read().get(file.0)?.kind {
			NodeKind::File { content } => Some(content.clone()),
			NodeKind::Dir { .. } => None,
		}
	}

	/// Look up a file by `/`-separated path from the root
	pub fn file_at(&self, path: &str) -> Option<MemFile> {
		let nodes = self.read();
		let mut current = 0;
		for segment in path.split('/').filter(|s| !s.is_empty()) {
			current = child_named(&nodes, current, segment)?;
		}
		matches!(nodes[current].kind, NodeKind::File { .. }).then_some(MemFile(current))
	}

	/// `/`-joined path of a node, for error messages
	pub fn path_of(&self, dir: MemDir) -> PathBuf {
		path_of(&self.read(), dir.0)
	}

	/// How many times `list_entries` ran
	pub fn listing_count(&self) -> usize {
		self.listings.load(Ordering::Relaxed)
	}

	fn check_access(&self, nodes: &[Node], dir: MemDir) -> ProviderResult<()> {
		match nodes.get(dir.0).map(|n| &n.kind) {
			Some(NodeKind::Dir { permission, .. }) if *permission == PermissionState::Granted => {
				Ok(())
			}
			Some(NodeKind::Dir { .. }) => Err(ProviderError::PermissionDenied {
				path: path_of(nodes, dir.0),
			}),
			Some(NodeKind::File { .. }) => Err(ProviderError::TypeMismatch {
				name: path_of(nodes, dir.0).to_string_lossy().into_owned(),
			}),
			None => Err(ProviderError::NotFound {
				name: format!("#{}", dir.0),
			}),
		}
	}
}

fn child_named(nodes: &[Node], parent: usize, name: &str) -> Option<usize> {
	match &nodes.get(parent)?.kind {
		NodeKind::Dir { children, .. } => children.iter().copied().find(|&c| nodes[c].name == name),
		NodeKind::File { .. } => None,
	}
}

fn insert_node(nodes: &mut Vec<Node>, parent: usize, name: &str, kind: NodeKind) -> usize {
	let id = nodes.len();
	nodes.push(Node {
		name: name.to_string(),
		parent: Some(parent),
		kind,
	});
	if let NodeKind::Dir { children, .. } = &mut nodes[parent].kind {
		children.push(id);
	}
	id
}

fn path_of(nodes: &[Node], id: usize) -> PathBuf {
	let mut segments = Vec::new();
	let mut current = Some(id);
	while let Some(i) = current {
		let Some(node) = nodes.get(i) else { break };
		if node.parent.is_some() {
			segments.push(node.name.as_str());
		}
		current = node.parent;
	}
	segments.reverse();
	PathBuf::from(format!("/{}", segments.join("/")))
}

#[async_trait]
impl DirectoryProvider for MemoryFs {
	type Dir = MemDir;
	type File = MemFile;

	async fn list_entries(&self, dir: &MemDir) -> ProviderResult<Vec<DirEntry<MemDir, MemFile>>> {
		self.listings.fetch_add(1, Ordering::Relaxed);
		let nodes = self.read();
		self.check_access(&nodes, *dir)?;
		let NodeKind::Dir { children, .. } = &nodes[dir.0].kind else {
			return Ok(Vec::new());
		};
		let entries = children
			.iter()
			.map(|&id| {
				let node = &nodes[id];
				match node.kind {
					NodeKind::Dir { .. } => DirEntry::directory(node.name.clone(), MemDir(id)),
					NodeKind::File { .. } => DirEntry::file(node.name.clone(), MemFile(id)),
				}
			})
			.collect::<Vec<_>>();
		trace!("MemoryFs: {} entries in {:?}", entries.len(), dir);
		Ok(entries)
	}

	async fn get_file_by_name(&self, dir: &MemDir, name: &str) -> ProviderResult<MemFile> {
		check_entry_name(name)?;
		let nodes = self.read();
		self.check_access(&nodes, *dir)?;
		let id = child_named(&nodes, dir.0, name).ok_or_else(|| ProviderError::NotFound {
			name: name.to_string(),
		})?;
		match nodes[id].kind {
			NodeKind::File { .. } => Ok(MemFile(id)),
			NodeKind::Dir { .. } => Err(ProviderError::TypeMismatch {
				name: name.to_string(),
			}),
		}
	}

	async fn get_or_create_dir(&self, dir: &MemDir, name: &str) -> ProviderResult<MemDir> {
		check_entry_name(name)?;
		{
			let nodes = self.read();
			self.check_access(&nodes, *dir)?;
			if let Some(id) = child_named(&nodes, dir.0, name)
				&& matches!(nodes[id].kind, NodeKind::File { .. })
			{
				return Err(ProviderError::TypeMismatch {
					name: name.to_string(),
				});
			}
		}
		Ok(self.add_dir(*dir, name))
	}

	async fn create_file(&self, dir: &MemDir, name: &str) -> ProviderResult<MemFile> {
		check_entry_name(name)?;
		{
			let nodes = self.read();
			self.check_access(&nodes, *dir)?;
			if let Some(id) = child_named(&nodes, dir.0, name)
				&& matches!(nodes[id].kind, NodeKind::Dir { .. })
			{
				return Err(ProviderError::TypeMismatch {
					name: name.to_string(),
				});
			}
		}
		Ok(self.add_file(*dir, name, Vec::new()))
	}

	async fn read_all_bytes(&self, file: &MemFile) -> ProviderResult<Vec<u8>> {
		self.contents(*file).ok_or_else(|| ProviderError::NotFound {
			name: format!("#{}", file.0),
		})
	}

	async fn write_all_bytes(&self, file: &MemFile, bytes: &[u8]) -> ProviderResult<()> {
		let mut nodes = self.write();
		match nodes.get_mut(file.0).map(|n| &mut n.kind) {
			Some(NodeKind::File { content }) => {
				*content = bytes.to_vec();
				Ok(())
			}
			_ => Err(ProviderError::NotFound {
				name: format!("#{}", file.0),
			}),
		}
	}

	async fn query_permission(
		&self,
		dir: &MemDir,
		_mode: PermissionMode,
	) -> ProviderResult<PermissionState> {
		match self.read().get(dir.0).map(|n| &n.kind) {
			Some(NodeKind::Dir { permission, .. }) => Ok(*permission),
			_ => Err(ProviderError::NotFound {
				name: format!("#{}", dir.0),
			}),
		}
	}

	async fn request_permission(
		&self,
		dir: &MemDir,
		mode: PermissionMode,
	) -> ProviderResult<PermissionState> {
		if self.query_permission(dir, mode).await? == PermissionState::Prompt {
			self.set_permission(*dir, PermissionState::Granted);
		}
		self.query_permission(dir, mode).await
	}
}
