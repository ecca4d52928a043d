//! Canonical keys for titles, file names, headers and links
//!
//! Every function here is total and pure: no I/O, no locale lookups beyond
//! Unicode decomposition, and an empty input yields an empty key. An empty key
//! never matches anything, including another empty key.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static YOUTUBE_LINK: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)https?://(?:www\.)?(?:youtube\.com|youtu\.be)[^\s"']*"#)
		.expect("youtube link pattern compiles")
});

/// Lowercase, strip diacritics and drop everything outside `[a-z0-9]`.
///
/// ```rust
/// use docmatch::normalize::normalize_key;
///
/// assert_eq!(normalize_key("Odc. 1: Début"), "odc1debut");
/// assert_eq!(normalize_key("  "), "");
/// ```
pub fn normalize_key(raw: &str) -> String {
	fold(raw, false)
}

/// Like [`normalize_key`] but drops the last `.`-delimited segment first, so
/// `Report.TXT` and `report` share a key.
pub fn normalize_file_name_key(raw: &str) -> String {
	fold(raw, true)
}

fn fold(raw: &str, strip_extension: bool) -> String {
	// compatibility forms can decompose to uppercase (`№` -> `No`), hence the second pass
	let mut folded: String = raw
		.to_lowercase()
		.nfkd()
		.filter(|c| !is_combining_mark(*c))
		.flat_map(char::to_lowercase)
		.collect();
	if strip_extension && let Some(dot) = folded.rfind('.') {
		// a trailing dot alone is not an extension
		if dot + 1 < folded.len() {
			folded.truncate(dot);
		}
	}
	folded
		.chars()
		.filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
		.collect()
}

/// Header comparison form: trimmed and lowercased.
pub fn normalize_header_name(header: &str) -> String {
	header.trim().to_lowercase()
}

fn is_trailing_link_noise(c: char) -> bool {
	matches!(c, ')' | ';' | ',' | '.') || c.is_whitespace()
}

/// Cut a link just before its second `=`; no second `=` keeps it whole.
///
/// Keeps the first query parameter (`v=...`) and drops whatever tracking
/// parameter follows it.
pub fn truncate_after_second_equals(value: &str) -> &str {
	let Some(first) = value.find('=') else {
		return value;
	};
	match value[first + 1..].find('=') {
		Some(offset) => value[..first + 1 + offset].trim_end(),
		None => value,
	}
}

/// Trim, drop trailing `)` `;` `,` `.` runs and truncate after the second `=`.
///
/// Stable under re-cleaning: `clean_link(clean_link(x)) == clean_link(x)`.
pub fn clean_link(raw: &str) -> String {
	let trimmed = raw.trim().trim_end_matches(is_trailing_link_noise);
	truncate_after_second_equals(trimmed)
		.trim_end_matches(is_trailing_link_noise)
		.trim()
		.to_string()
}

/// Dedup key for a link: the lowercased cleaned form, `None` when empty.
pub fn link_key(raw: &str) -> Option<String> {
	let cleaned = clean_link(raw);
	if cleaned.is_empty() {
		None
	} else {
		Some(cleaned.to_lowercase())
	}
}

/// Every YouTube link found in the row's cells, cleaned, first occurrence kept.
pub fn extract_youtube_links<S: AsRef<str>>(row: &[S]) -> Vec<String> {
	let mut seen = std::collections::HashSet::new();
	let mut links = Vec::new();
	for cell in row {
		for found in YOUTUBE_LINK.find_iter(cell.as_ref()) {
			let cleaned = clean_link(found.as_str());
			if !cleaned.is_empty() && seen.insert(cleaned.clone()) {
				links.push(cleaned);
			}
		}
	}
	links
}
