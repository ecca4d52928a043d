//! Filename candidates derived from a title

use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;

use crate::normalize::{normalize_file_name_key, normalize_key};

/// Plain-text transcript extension
pub const TXT: &str = ".txt";
/// Document extension used by the file-number workflow
pub const PDF: &str = ".pdf";

static ILLEGAL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("illegal filename pattern compiles")
});

static WHITESPACE_RUN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Legality predicate every candidate must pass.
///
/// Rejects empty names, `.` and `..`, control characters, `<>:"/\|?*` and
/// path separators.
pub fn is_allowed_file_name(name: &str) -> bool {
	let trimmed = name.trim();
	if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
		return false;
	}
	!ILLEGAL_CHARS.is_match(trimmed) && !trimmed.contains(['/', '\\'])
}

/// Remove illegal characters, collapse whitespace, trim trailing dots and spaces.
pub fn sanitize_file_name(input: &str) -> String {
	let stripped = ILLEGAL_CHARS.replace_all(input, "");
	let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");
	collapsed
		.trim()
		.trim_end_matches(|c: char| c == '.' || c.is_whitespace())
		.to_string()
}

fn ends_with_ignore_case(name: &str, extension: &str) -> bool {
	name.to_lowercase().ends_with(&extension.to_lowercase())
}

/// Ordered, duplicate-free set of legal filenames for one title.
///
/// ```rust
/// use docmatch::candidates::{FileCandidateSet, TXT};
///
/// let set = FileCandidateSet::generate("Odc. 1: Début", TXT);
/// assert_eq!(set.preferred(), Some("Odc. 1 Début.txt"));
/// assert!(FileCandidateSet::generate("   ", TXT).is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidateSet {
	extension: String,
	names: IndexSet<String>,
}

impl FileCandidateSet {
	pub fn empty(extension: &str) -> Self {
		Self {
			extension: extension.to_string(),
			names: IndexSet::new(),
		}
	}

	/// Candidates for `title` with `extension` (including the leading dot).
	///
	/// Order: the extensioned title, the bare title, then the sanitized
	/// variant's extensioned and bare forms when sanitizing changed anything.
	/// Illegal names are silently skipped.
	pub fn generate(title: &str, extension: &str) -> Self {
		let mut set = Self::empty(extension);
		let trimmed = title.trim();
		if trimmed.is_empty() {
			return set;
		}

		set.push_with_bare(trimmed);

		let sanitized = sanitize_file_name(trimmed);
		if !sanitized.is_empty() && sanitized != trimmed {
			set.push_with_bare(&sanitized);
		}
		set
	}

	fn push_with_bare(&mut self, name: &str) {
		if ends_with_ignore_case(name, &self.extension) {
			self.push(name);
		} else {
			self.push(&format!("{name}{}", self.extension));
			self.push(name);
		}
	}

	/// Add a name if it is legal; returns whether it was newly inserted.
	pub fn push(&mut self, name: &str) -> bool {
		if !is_allowed_file_name(name) {
			return false;
		}
		self.names.insert(name.to_string())
	}

	pub fn extension(&self) -> &str {
		&self.extension
	}

	/// First candidate carrying the target extension
	pub fn preferred(&self) -> Option<&str> {
		self.names
			.iter()
			.find(|n| ends_with_ignore_case(n, &self.extension))
			.map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.names.iter().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.names.contains(name)
	}

	/// Lowercased candidates for case-insensitive literal comparison
	pub fn lowercase_names(&self) -> IndexSet<String> {
		self.names.iter().map(|n| n.to_lowercase()).collect()
	}

	/// Non-empty keys of every candidate.
	///
	/// Only candidates carrying the target extension lose their last segment;
	/// a bare `Odc. 1 Début` keeps its full key instead of collapsing to `odc`.
	pub fn normalized_keys(&self) -> IndexSet<String> {
		self.names
			.iter()
			.map(|n| {
				if ends_with_ignore_case(n, &self.extension) {
					normalize_file_name_key(n)
				} else {
					normalize_key(n)
				}
			})
			.filter(|k| !k.is_empty())
			.collect()
	}
}

/// Candidate names plus normalized keys handed to the tree matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTargets {
	pub candidates: FileCandidateSet,
	pub keys: IndexSet<String>,
}

impl MatchTargets {
	/// Targets for a known file name and/or a title.
	///
	/// The file name (when legal) comes first, then the title's generated
	/// candidates; keys cover every candidate plus the title itself.
	pub fn for_title(file_name: Option<&str>, title: &str, extension: &str) -> Self {
		let mut candidates = FileCandidateSet::empty(extension);
		if let Some(name) = file_name {
			candidates.push(name);
		}
		for name in FileCandidateSet::generate(title, extension).iter() {
			candidates.push(name);
		}

		let mut keys = candidates.normalized_keys();
		let title_key = normalize_key(title);
		if !title_key.is_empty() {
			keys.insert(title_key);
		}
		Self { candidates, keys }
	}

	pub fn is_empty(&self) -> bool {
		self.candidates.is_empty() && self.keys.is_empty()
	}
}
