//! CSV discovery and title search across a folder tree

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::read_dataset;
use crate::columns::find_title_column;
use crate::dataset::TabularDataset;
use crate::error::DocResult;
use crate::provider::{DirectoryProvider, EntryHandle};

/// A CSV file found under a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvEntry<F> {
	/// `/`-joined folder path relative to the root, `.` for the root itself
	pub folder_path: String,
	pub file_name: String,
	pub file: F,
}

/// One title cell matching a search term
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleHit {
	pub folder_path: String,
	pub file_name: String,
	pub title: String,
	/// 0-based data row index
	pub row_index: usize,
}

/// A parsed dataset plus where it came from
#[derive(Debug, Clone, Copy)]
pub struct SearchSource<'a> {
	pub folder_path: &'a str,
	pub file_name: &'a str,
	pub dataset: &'a TabularDataset,
}

fn join_relative(parent: &str, name: &str) -> String {
	if parent.is_empty() {
		name.to_string()
	} else {
		format!("{}/{}", parent.trim_end_matches('/'), name.trim_start_matches('/'))
	}
}

fn has_extension(name: &str, extension: &str) -> bool {
	name.to_lowercase().ends_with(&extension.to_lowercase())
}

/// Every `.csv` file under `root`, sorted by folder path then file name.
pub async fn list_csv_files<P: DirectoryProvider>(
	provider: &P,
	root: &P::Dir,
	recursive: bool,
) -> DocResult<Vec<CsvEntry<P::File>>> {
	let mut found = Vec::new();
	let mut pending = vec![(root.clone(), String::new())];

	while let Some((dir, relative)) = pending.pop() {
		for entry in provider.list_entries(&dir).await? {
			match entry.handle {
				EntryHandle::File(file) if has_extension(&entry.name, ".csv") => {
					found.push(CsvEntry {
						folder_path: if relative.is_empty() {
							".".to_string()
						} else {
							relative.clone()
						},
						file_name: entry.name,
						file,
					});
				}
				EntryHandle::Directory(sub) if recursive => {
					pending.push((sub, join_relative(&relative, &entry.name)));
				}
				_ => {}
			}
		}
	}

	found.sort_by(|a, b| {
		a.folder_path
			.cmp(&b.folder_path)
			.then_with(|| a.file_name.cmp(&b.file_name))
	});
	debug!("Search: {} CSV files under {:?}", found.len(), root);
	Ok(found)
}

/// Names of every file under `root` ending with `extension` (case-insensitive)
pub async fn collect_file_names<P: DirectoryProvider>(
	provider: &P,
	root: &P::Dir,
	extension: &str,
	recursive: bool,
) -> DocResult<Vec<String>> {
	let mut names = Vec::new();
	let mut pending = vec![root.clone()];

	while let Some(dir) = pending.pop() {
		for entry in provider.list_entries(&dir).await? {
			match entry.handle {
				EntryHandle::File(_) if has_extension(&entry.name, extension) => {
					names.push(entry.name)
				}
				EntryHandle::Directory(sub) if recursive => pending.push(sub),
				_ => {}
			}
		}
	}
	debug!("Search: {} {} files under {:?}", names.len(), extension, root);
	Ok(names)
}

/// Case-insensitive substring search over each dataset's title column.
///
/// Datasets without a title column are skipped. An empty term matches nothing.
pub fn search_titles(sources: &[SearchSource<'_>], term: &str) -> Vec<TitleHit> {
	let needle = term.trim().to_lowercase();
	if needle.is_empty() {
		return Vec::new();
	}

	let mut hits = Vec::new();
	for source in sources {
		let Some(col) = find_title_column(source.dataset.headers()) else {
			debug!("Search: no title column in {}", source.file_name);
			continue;
		};
		for (row_index, title) in source.dataset.column_values(col).enumerate() {
			if title.to_lowercase().contains(&needle) {
				hits.push(TitleHit {
					folder_path: source.folder_path.to_string(),
					file_name: source.file_name.to_string(),
					title: title.to_string(),
					row_index,
				});
			}
		}
	}
	hits
}

/// List, read and search every CSV under `root`; unreadable files are logged
/// and skipped.
pub async fn search_tree<P: DirectoryProvider>(
	provider: &P,
	root: &P::Dir,
	term: &str,
) -> DocResult<Vec<TitleHit>> {
	info!("Search: looking for {term:?} under {root:?}");
	let entries = list_csv_files(provider, root, true).await?;

	let mut loaded = Vec::with_capacity(entries.len());
	for entry in &entries {
		match read_dataset(provider, &entry.file).await {
			Ok(dataset) => loaded.push((entry, dataset)),
			Err(e) => warn!("Search: cannot read {}/{}: {}", entry.folder_path, entry.file_name, e),
		}
	}

	let sources: Vec<SearchSource<'_>> = loaded
		.iter()
		.map(|(entry, dataset)| SearchSource {
			folder_path: &entry.folder_path,
			file_name: &entry.file_name,
			dataset,
		})
		.collect();
	let hits = search_titles(&sources, term);
	info!("Search: {} hits in {} files", hits.len(), sources.len());
	Ok(hits)
}
