//! Breadth-first search for a file matching a set of candidates

use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, trace};

use crate::candidates::MatchTargets;
use crate::error::DocResult;
use crate::normalize::normalize_file_name_key;
use crate::provider::{DirectoryProvider, EntryHandle};

/// A located file and the name it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult<F> {
	pub file: F,
	pub file_name: String,
}

/// Outcome of one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<F> {
	Found(MatchResult<F>),
	NotFound,
}

impl<F> MatchOutcome<F> {
	pub fn found(self) -> Option<MatchResult<F>> {
		match self {
			MatchOutcome::Found(result) => Some(result),
			MatchOutcome::NotFound => None,
		}
	}

	pub fn is_found(&self) -> bool {
		matches!(self, MatchOutcome::Found(_))
	}
}

/// Searches a directory tree level by level.
///
/// For each directory, in queue order: exact lookups of every candidate
/// name, then a single listing where target-extension files match by
/// case-insensitive name or by normalized key. The first hit wins, so a
/// loose match one level down beats an exact match two levels down.
/// Subdirectories join the back of the queue; each directory is visited once.
///
/// Nothing is cached between calls.
pub struct TreeMatcher<'a, P: DirectoryProvider> {
	provider: &'a P,
}

impl<'a, P: DirectoryProvider> TreeMatcher<'a, P> {
	pub fn new(provider: &'a P) -> Self {
		Self { provider }
	}

	/// Search from `hint` (if any) and then `root`.
	///
	/// Not-found-class lookup errors move on to the next candidate; any other
	/// provider error, permission refusals included, aborts the search.
	pub async fn find(
		&self,
		root: &P::Dir,
		hint: Option<&P::Dir>,
		targets: &MatchTargets,
	) -> DocResult<MatchOutcome<P::File>> {
		if targets.is_empty() {
			return Ok(MatchOutcome::NotFound);
		}

		let extension = targets.candidates.extension().to_lowercase();
		let names: Vec<&str> = targets.candidates.iter().collect();
		let lowercase_names = targets.candidates.lowercase_names();

		let mut visited: HashSet<P::Dir> = HashSet::new();
		let mut queue: VecDeque<P::Dir> = VecDeque::new();
		for dir in hint.into_iter().chain(std::iter::once(root)) {
			if visited.insert(dir.clone()) {
				queue.push_back(dir.clone());
			}
		}

		let mut searched = 0usize;
		while let Some(dir) = queue.pop_front() {
			searched += 1;

			if let Some(found) = self.try_exact_names(&dir, &names).await? {
				info!("Matcher: exact match {} in {:?}", found.file_name, dir);
				return Ok(MatchOutcome::Found(found));
			}

			let mut subdirs = Vec::new();
			for entry in self.provider.list_entries(&dir).await? {
				match entry.handle {
					EntryHandle::File(file) => {
						let lower = entry.name.to_lowercase();
						if !lower.ends_with(&extension) {
							continue;
						}
						if lowercase_names.contains(&lower) {
							debug!("Matcher: case-insensitive match {} in {:?}", entry.name, dir);
							return Ok(MatchOutcome::Found(MatchResult {
								file,
								file_name: entry.name,
							}));
						}
						let key = normalize_file_name_key(&entry.name);
						if !key.is_empty() && targets.keys.contains(&key) {
							debug!("Matcher: normalized match {} in {:?}", entry.name, dir);
							return Ok(MatchOutcome::Found(MatchResult {
								file,
								file_name: entry.name,
							}));
						}
					}
					EntryHandle::Directory(sub) => subdirs.push(sub),
				}
			}

			for sub in subdirs {
				if visited.insert(sub.clone()) {
					queue.push_back(sub);
				}
			}
		}

		debug!("Matcher: no match after {searched} directories");
		Ok(MatchOutcome::NotFound)
	}

	async fn try_exact_names(
		&self,
		dir: &P::Dir,
		names: &[&str],
	) -> DocResult<Option<MatchResult<P::File>>> {
		for name in names {
			match self.provider.get_file_by_name(dir, name).await {
				Ok(file) => {
					return Ok(Some(MatchResult {
						file,
						file_name: name.to_string(),
					}));
				}
				Err(e) if e.is_not_found_class() => {
					trace!("Matcher: {name} not in {dir:?}: {e}");
				}
				Err(e) => return Err(e.into()),
			}
		}
		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::candidates::{PDF, TXT};
	use crate::error::{DocError, ProviderError};
	use crate::provider::{MemoryFs, PermissionState};

	#[smol_potat::test]
	async fn test_exact_match_in_root() {
		let fs = MemoryFs::new();
		let file = fs.add_file(fs.root(), "Lecture 1.txt", "x");
		let targets = MatchTargets::for_title(None, "Lecture 1", TXT);

		let outcome = TreeMatcher::new(&fs).find(&fs.root(), None, &targets).await.unwrap();
		assert_eq!(
			outcome,
			MatchOutcome::Found(MatchResult {
				file,
				file_name: "Lecture 1.txt".to_string()
			})
		);
		// exact lookup hit; no listing needed
		assert_eq!(fs.listing_count(), 0);
	}

	#[smol_potat::test]
	async fn test_depth_one_normalized_beats_depth_two_exact() {
		let fs = MemoryFs::new();
		let a = fs.add_dir(fs.root(), "a");
		let b = fs.add_dir(a, "b");
		fs.add_file(b, "Odc. 1 Début.txt", "exact");
		let loose = fs.add_file(a, "odc 1 debut.TXT", "loose");

		let targets = MatchTargets::for_title(None, "Odc. 1: Début", TXT);
		let found = TreeMatcher::new(&fs)
			.find(&fs.root(), None, &targets)
			.await
			.unwrap()
			.found()
			.unwrap();
		assert_eq!(found.file, loose);
		assert_eq!(found.file_name, "odc 1 debut.TXT");
	}

	#[smol_potat::test]
	async fn test_hint_searched_before_root() {
		let fs = MemoryFs::new();
		fs.add_file(fs.root(), "notes.txt", "root copy");
		let hint = fs.add_dir(fs.root(), "hint");
		let hinted = fs.add_file(hint, "NOTES.txt", "hint copy");

		let targets = MatchTargets::for_title(None, "notes", TXT);
		let found = TreeMatcher::new(&fs)
			.find(&fs.root(), Some(&hint), &targets)
			.await
			.unwrap()
			.found()
			.unwrap();
		assert_eq!(found.file, hinted);
	}

	#[smol_potat::test]
	async fn test_other_extensions_ignored() {
		let fs = MemoryFs::new();
		fs.add_file(fs.root(), "report.pdf", "pdf");
		let targets = MatchTargets::for_title(None, "report", TXT);
		let outcome = TreeMatcher::new(&fs).find(&fs.root(), None, &targets).await.unwrap();
		assert_eq!(outcome, MatchOutcome::NotFound);

		let targets = MatchTargets::for_title(None, "report", PDF);
		assert!(
			TreeMatcher::new(&fs)
				.find(&fs.root(), None, &targets)
				.await
				.unwrap()
				.is_found()
		);
	}

	#[smol_potat::test]
	async fn test_directories_named_like_candidates_are_skipped() {
		let fs = MemoryFs::new();
		let trap = fs.add_dir(fs.root(), "Lecture 1.txt");
		let real = fs.add_file(trap, "lecture-1.txt", "x");

		let targets = MatchTargets::for_title(None, "Lecture 1", TXT);
		let found = TreeMatcher::new(&fs)
			.find(&fs.root(), None, &targets)
			.await
			.unwrap()
			.found()
			.unwrap();
		assert_eq!(found.file, real);
	}

	#[smol_potat::test]
	async fn test_not_found_and_empty_targets() {
		let fs = MemoryFs::new();
		fs.add_dir_path("x/y/z");
		let targets = MatchTargets::for_title(None, "absent", TXT);
		let outcome = TreeMatcher::new(&fs).find(&fs.root(), None, &targets).await.unwrap();
		assert_eq!(outcome, MatchOutcome::NotFound);
		assert_eq!(fs.listing_count(), 4);

		let empty = MatchTargets::for_title(None, "   ", TXT);
		let outcome = TreeMatcher::new(&fs).find(&fs.root(), None, &empty).await.unwrap();
		assert_eq!(outcome, MatchOutcome::NotFound);
	}

	#[smol_potat::test]
	async fn test_permission_denied_aborts() {
		let fs = MemoryFs::new();
		let locked = fs.add_dir(fs.root(), "locked");
		fs.set_permission(locked, PermissionState::Denied);

		let targets = MatchTargets::for_title(None, "anything", TXT);
		let err = TreeMatcher::new(&fs)
			.find(&fs.root(), None, &targets)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			DocError::Provider(ProviderError::PermissionDenied { .. })
		));
	}
}
