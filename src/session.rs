//! Links and transcript files collected across row picks

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::candidates::{FileCandidateSet, TXT};
use crate::columns::extract_title;
use crate::normalize::{extract_youtube_links, link_key, normalize_file_name_key};

/// A transcript file queued for copying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile<D> {
	pub title: String,
	/// Preferred `.txt` name derived from the title
	pub file_name: String,
	/// Folder of the CSV the row came from
	pub folder_path: String,
	/// Directory searched first when looking the file up
	pub hint: Option<D>,
}

/// Where a collected row came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOrigin<D> {
	pub folder_path: String,
	pub dir: Option<D>,
}

impl<D> RowOrigin<D> {
	pub fn new(folder_path: impl Into<String>, dir: Option<D>) -> Self {
		Self {
			folder_path: folder_path.into(),
			dir,
		}
	}
}

/// What happened to the row's title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileCollectStatus {
	Added(String),
	AlreadyCollected(String),
	/// The title yields no legal `.txt` name
	NoFileName,
	NoTitle,
}

/// Outcome of [`Session::collect_row`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowCollectReport {
	/// Distinct links found in the row
	pub links_found: usize,
	/// Links that were new to the session
	pub links_added: usize,
	pub file: FileCollectStatus,
}

/// Accumulates links and files until [`Session::reset`].
///
/// Links are unique by their lowercased cleaned form, files by the normalized
/// key of their preferred name. Names whose key is empty are unique by their
/// lowercased name.
#[derive(Debug, Clone)]
pub struct Session<D> {
	links: Vec<String>,
	link_keys: HashSet<String>,
	files: Vec<CollectedFile<D>>,
}

impl<D> Default for Session<D> {
	fn default() -> Self {
		Self {
			links: Vec::new(),
			link_keys: HashSet::new(),
			files: Vec::new(),
		}
	}
}

impl<D: Clone> Session<D> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn links(&self) -> &[String] {
		&self.links
	}

	pub fn files(&self) -> &[CollectedFile<D>] {
		&self.files
	}

	pub fn is_empty(&self) -> bool {
		self.links.is_empty() && self.files.is_empty()
	}

	/// Collect the links and the transcript name of one row.
	///
	/// A non-blank `title` overrides the row's title cell.
	pub fn collect_row<H: AsRef<str>, C: AsRef<str>>(
		&mut self,
		headers: &[H],
		row: &[C],
		title: Option<&str>,
		origin: &RowOrigin<D>,
	) -> RowCollectReport {
		let links = extract_youtube_links(row);
		let links_found = links.len();
		let mut links_added = 0;
		for link in links {
			let Some(key) = link_key(&link) else { continue };
			if self.link_keys.insert(key) {
				self.links.push(link);
				links_added += 1;
			}
		}

		let file = match extract_title(headers, row, title) {
			None => FileCollectStatus::NoTitle,
			Some(title) => self.collect_file(title, origin),
		};
		debug!("Session: {links_added}/{links_found} links added, file {file:?}");

		RowCollectReport {
			links_found,
			links_added,
			file,
		}
	}

	fn collect_file(&mut self, title: String, origin: &RowOrigin<D>) -> FileCollectStatus {
		let candidates = FileCandidateSet::generate(&title, TXT);
		let Some(file_name) = candidates.preferred().map(str::to_string) else {
			return FileCollectStatus::NoFileName;
		};

		// an empty key matches nothing, so such names only collide literally
		let key = normalize_file_name_key(&file_name);
		let lower = file_name.to_lowercase();
		let collected = self.files.iter().any(|f| {
			if key.is_empty() {
				f.file_name.to_lowercase() == lower
			} else {
				normalize_file_name_key(&f.file_name) == key
			}
		});
		if collected {
			return FileCollectStatus::AlreadyCollected(file_name);
		}

		self.files.push(CollectedFile {
			title,
			file_name: file_name.clone(),
			folder_path: origin.folder_path.clone(),
			hint: origin.dir.clone(),
		});
		FileCollectStatus::Added(file_name)
	}

	/// Every collected link joined with `;`
	pub fn joined_links(&self) -> String {
		self.links.join(";")
	}

	pub fn reset(&mut self) {
		self.links.clear();
		self.link_keys.clear();
		self.files.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn origin() -> RowOrigin<u32> {
		RowOrigin::new("season 1", Some(7))
	}

	#[test_log::test]
	fn test_accented_titles_collapse_to_one_file() {
		let headers = ["Link", "Title"];
		let mut session = Session::new();

		let first = session.collect_row(
			&headers,
			&["https://youtu.be/a", "Odc. 1: Début"],
			None,
			&origin(),
		);
		assert_eq!(first.file, FileCollectStatus::Added("Odc. 1 Début.txt".to_string()));

		let second = session.collect_row(
			&headers,
			&["https://youtu.be/b", "odc 1 debut"],
			None,
			&origin(),
		);
		assert_eq!(
			second.file,
			FileCollectStatus::AlreadyCollected("odc 1 debut.txt".to_string())
		);
		assert_eq!(session.files().len(), 1);
		assert_eq!(session.files()[0].hint, Some(7));
		assert_eq!(session.links().len(), 2);
	}

	#[test_log::test]
	fn test_punctuation_titles_are_distinct_files() {
		let headers = ["Title"];
		let mut session: Session<u32> = Session::new();

		let bangs = session.collect_row(&headers, &["!!!"], None, &origin());
		assert_eq!(bangs.file, FileCollectStatus::Added("!!!.txt".to_string()));
		let dashes = session.collect_row(&headers, &["---"], None, &origin());
		assert_eq!(dashes.file, FileCollectStatus::Added("---.txt".to_string()));
		assert_eq!(session.files().len(), 2);

		let repeat = session.collect_row(&headers, &["!!!"], None, &origin());
		assert_eq!(
			repeat.file,
			FileCollectStatus::AlreadyCollected("!!!.txt".to_string())
		);
		assert_eq!(session.files().len(), 2);
	}

	#[test_log::test]
	fn test_links_deduplicated_by_key() {
		let headers = ["Link", "Other"];
		let mut session: Session<u32> = Session::new();
		let report = session.collect_row(
			&headers,
			&[
				"https://www.youtube.com/watch?v=X&t=1",
				"also https://www.youtube.com/watch?v=x&t=9",
			],
			None,
			&origin(),
		);
		assert_eq!(report.links_found, 2);
		assert_eq!(report.links_added, 1);
		assert_eq!(report.file, FileCollectStatus::NoTitle);

		let again = session.collect_row(
			&headers,
			&["https://www.youtube.com/watch?v=X&t=5", ""],
			None,
			&origin(),
		);
		assert_eq!(again.links_added, 0);
	}

	#[test_log::test]
	fn test_fallback_title_and_reset() {
		let headers = ["Link", "Title"];
		let mut session: Session<u32> = Session::new();
		let report = session.collect_row(
			&headers,
			&["https://youtu.be/a", "Row title"],
			Some("Search title"),
			&origin(),
		);
		assert_eq!(report.file, FileCollectStatus::Added("Search title.txt".to_string()));

		let unusable = session.collect_row(&headers, &["", "???"], None, &origin());
		assert_eq!(unusable.file, FileCollectStatus::NoFileName);

		session.collect_row(&headers, &["https://youtu.be/b", ""], None, &origin());
		assert_eq!(session.joined_links(), "https://youtu.be/a;https://youtu.be/b");

		session.reset();
		assert!(session.is_empty());
		assert_eq!(session.joined_links(), "");
		let report = session.collect_row(&headers, &["https://youtu.be/a", ""], None, &origin());
		assert_eq!(report.links_added, 1);
	}
}
