//! File index backed by a Polars DataFrame

use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::config::{MatchConfig, TempFileMarkers};
use crate::error::DocResult;
use crate::normalize::normalize_file_name_key;

/// One file known to the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
	pub path: PathBuf,
	/// `/`-joined folder relative to the scan root, `.` for the root
	pub folder: String,
	pub file_name: String,
	pub size: u64,
	pub modified: DateTime<Utc>,
}

impl IndexedFile {
	/// Name up to the last `.`, trimmed and uppercased
	pub fn stem_upper(&self) -> String {
		stem_upper(&self.file_name)
	}
}

fn stem_upper(file_name: &str) -> String {
	let stem = file_name.rfind('.').map_or(file_name, |dot| &file_name[..dot]);
	MatchConfig::normalize_file_number(stem)
}

/// Snapshot of the files under a root with one extension.
///
/// ## DataFrame Schema
///
/// | column | type | meaning |
/// |---|---|---|
/// | `path` | str | full path |
/// | `folder` | str | folder relative to the root |
/// | `file_name` | str | entry name |
/// | `stem_upper` | str | identifier lookup form |
/// | `normalized_key` | str | [`normalize_file_name_key`] of the name |
/// | `size` | u64 | bytes |
/// | `modified` | i64 | Unix timestamp in nanoseconds |
///
/// When several files share a stem or key the first one in scan order
/// (folders and names sorted) answers lookups.
#[derive(Debug, Clone)]
pub struct FileIndex {
	data: DataFrame,
	records: Vec<IndexedFile>,
	by_stem: HashMap<String, usize>,
	by_key: HashMap<String, usize>,
}

impl FileIndex {
	/// Walk `root` recursively and index every file ending with `extension`.
	///
	/// Temporary files matching `temp` are left out. Unreadable subdirectories
	/// are logged and skipped; an unreadable root is an error.
	pub fn scan(root: &Path, extension: &str, temp: &TempFileMarkers) -> DocResult<Self> {
		info!("Index: scanning {} for {} files", root.display(), extension);
		std::fs::metadata(root)?;

		let extension = extension.to_lowercase();
		let mut records = Vec::new();
		for entry in WalkDir::new(root)
			.follow_links(false)
			.sort_by_file_name()
			.into_iter()
		{
			let entry = match entry {
				Ok(entry) => entry,
				Err(e) => {
					warn!("Index: skipping unreadable entry: {}", e);
					continue;
				}
			};
			if !entry.file_type().is_file() {
				continue;
			}

			let file_name = entry.file_name().to_string_lossy().into_owned();
			if !file_name.to_lowercase().ends_with(&extension) {
				continue;
			}
			if temp.is_temp(&file_name) {
				trace!("Index: skipping temporary file {}", file_name);
				continue;
			}

			let metadata = match entry.metadata() {
				Ok(metadata) => metadata,
				Err(e) => {
					warn!("Index: cannot stat {}: {}", entry.path().display(), e);
					continue;
				}
			};
			let modified = metadata
				.modified()
				.map(DateTime::<Utc>::from)
				.unwrap_or_else(|_| Utc::now());

			records.push(IndexedFile {
				folder: relative_folder(root, entry.path()),
				path: entry.path().to_path_buf(),
				file_name,
				size: metadata.len(),
				modified,
			});
		}

		Self::from_records(records)
	}

	/// Index bare file names, e.g. ones collected through a provider
	pub fn from_names<I, S>(names: I) -> DocResult<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let now = Utc::now();
		let records = names
			.into_iter()
			.map(|name| {
				let file_name = name.into();
				IndexedFile {
					path: PathBuf::from(&file_name),
					folder: ".".to_string(),
					file_name,
					size: 0,
					modified: now,
				}
			})
			.collect();
		Self::from_records(records)
	}

	pub fn from_records(records: Vec<IndexedFile>) -> DocResult<Self> {
		let mut by_stem = HashMap::new();
		let mut by_key = HashMap::new();
		for (i, record) in records.iter().enumerate() {
			by_stem.entry(record.stem_upper()).or_insert(i);
			let key = normalize_file_name_key(&record.file_name);
			if !key.is_empty() {
				by_key.entry(key).or_insert(i);
			}
		}

		let data = records_to_dataframe(&records)?;
		let index = Self {
			data,
			records,
			by_stem,
			by_key,
		};

		let duplicates = index.duplicate_stems()?;
		if !duplicates.is_empty() {
			warn!(
				"Index: {} identifiers match several files, first one wins: {:?}",
				duplicates.len(),
				duplicates
			);
		}
		debug!("Index: {} files indexed", index.len());
		Ok(index)
	}

	pub fn data(&self) -> &DataFrame {
		&self.data
	}

	pub fn records(&self) -> &[IndexedFile] {
		&self.records
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// File whose stem equals the identifier (trimmed, case-insensitive)
	pub fn lookup_file_number(&self, file_number: &str) -> Option<&IndexedFile> {
		let stem = MatchConfig::normalize_file_number(file_number);
		self.by_stem.get(&stem).map(|&i| &self.records[i])
	}

	pub fn contains_file_number(&self, file_number: &str) -> bool {
		self.lookup_file_number(file_number).is_some()
	}

	/// Whether any indexed name has this normalized key; the empty key never matches
	pub fn contains_key(&self, key: &str) -> bool {
		!key.is_empty() && self.by_key.contains_key(key)
	}

	/// Upper-cased stems shared by more than one file, sorted
	pub fn duplicate_stems(&self) -> DocResult<Vec<String>> {
		if self.data.height() == 0 {
			return Ok(Vec::new());
		}
		let grouped = self
			.data
			.clone()
			.lazy()
			.group_by([col("stem_upper")])
			.agg([col("path").count().alias("files")])
			.filter(col("files").gt(lit(1u32)))
			.sort(["stem_upper"], SortMultipleOptions::default())
			.collect()?;
		let stems = grouped
			.column("stem_upper")?
			.str()?
			.into_iter()
			.flatten()
			.map(str::to_string)
			.collect();
		Ok(stems)
	}
}

fn relative_folder(root: &Path, path: &Path) -> String {
	let parent = path.parent().unwrap_or(root);
	let relative = parent.strip_prefix(root).unwrap_or(parent);
	let joined = relative
		.components()
		.map(|c| c.as_os_str().to_string_lossy())
		.collect::<Vec<_>>()
		.join("/");
	if joined.is_empty() {
		".".to_string()
	} else {
		joined
	}
}

fn records_to_dataframe(records: &[IndexedFile]) -> PolarsResult<DataFrame> {
	let paths: Vec<String> = records
		.iter()
		.map(|r| r.path.to_string_lossy().to_string())
		.collect();
	let folders: Vec<String> = records.iter().map(|r| r.folder.clone()).collect();
	let names: Vec<String> = records.iter().map(|r| r.file_name.clone()).collect();
	let stems: Vec<String> = records.iter().map(IndexedFile::stem_upper).collect();
	let keys: Vec<String> = records
		.iter()
		.map(|r| normalize_file_name_key(&r.file_name))
		.collect();
	let sizes: Vec<u64> = records.iter().map(|r| r.size).collect();
	let modified: Vec<i64> = records
		.iter()
		.map(|r| r.modified.timestamp_nanos_opt().unwrap_or(0))
		.collect();

	df! {
		"path" => paths,
		"folder" => folders,
		"file_name" => names,
		"stem_upper" => stems,
		"normalized_key" => keys,
		"size" => sizes,
		"modified" => modified,
	}
}
