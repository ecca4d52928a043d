//! Header heuristics for locating well-known columns

use crate::normalize::normalize_header_name;

/// Substrings that mark a title column, Polish spellings included.
///
/// `tutuł` covers a common typo found in real exports.
pub const TITLE_HEADER_KEYWORDS: [&str; 4] = ["tutuł", "tytul", "title", "tytuł"];

/// First header containing any [`TITLE_HEADER_KEYWORDS`] entry.
pub fn find_title_column<S: AsRef<str>>(headers: &[S]) -> Option<usize> {
	headers.iter().position(|h| {
		let header = normalize_header_name(h.as_ref());
		TITLE_HEADER_KEYWORDS.iter().any(|k| header.contains(k))
	})
}

/// Title for a row: a non-blank `fallback` wins, else the title cell.
///
/// Returns `None` when neither yields non-blank text.
///
/// ```rust
/// use docmatch::columns::extract_title;
///
/// let headers = ["Link", "Tytuł odcinka"];
/// let row = ["https://youtu.be/x", "  Odc. 1  "];
/// assert_eq!(extract_title(&headers, &row, None).as_deref(), Some("Odc. 1"));
/// assert_eq!(extract_title(&headers, &row, Some("Other")).as_deref(), Some("Other"));
/// ```
pub fn extract_title<H: AsRef<str>, C: AsRef<str>>(
	headers: &[H],
	row: &[C],
	fallback: Option<&str>,
) -> Option<String> {
	if let Some(fallback) = fallback.map(str::trim)
		&& !fallback.is_empty()
	{
		return Some(fallback.to_string());
	}
	let index = find_title_column(headers)?;
	let value = row.get(index)?.as_ref().trim();
	(!value.is_empty()).then(|| value.to_string())
}

/// First header mentioning both `file` and `number`, e.g. `FILE NUMBER`.
pub fn find_file_number_column<S: AsRef<str>>(headers: &[S]) -> Option<usize> {
	headers.iter().position(|h| {
		let header = h.as_ref().to_lowercase();
		header.contains("file") && header.contains("number")
	})
}

/// First header mentioning both `file` and `title`, e.g. `FILE TITLE (PL)`.
pub fn find_file_title_column<S: AsRef<str>>(headers: &[S]) -> Option<usize> {
	headers.iter().position(|h| {
		let header = h.as_ref().to_lowercase();
		header.contains("file") && header.contains("title")
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test_log::test]
	fn test_title_column_keywords() {
		assert_eq!(find_title_column(&["Link", " TYTUŁ "]), Some(1));
		assert_eq!(find_title_column(&["tutuł filmu", "title"]), Some(0));
		assert_eq!(find_title_column(&["Video Title"]), Some(0));
		assert_eq!(find_title_column(&["Link", "Status"]), None);
	}

	#[test_log::test]
	fn test_extract_title_blank_values() {
		let headers = ["Title"];
		assert_eq!(extract_title(&headers, &["   "], None), None);
		assert_eq!(extract_title(&headers, &["   "], Some("  ")), None);
		assert_eq!(extract_title(&["Link"], &["x"], None), None);
		let short: [&str; 0] = [];
		assert_eq!(extract_title(&headers, &short, None), None);
	}

	#[test_log::test]
	fn test_file_number_column() {
		assert_eq!(
			find_file_number_column(&["Folder", "FILE NUMBER", "FILE TITLE"]),
			Some(1)
		);
		assert_eq!(find_file_number_column(&["Number", "File"]), None);
		assert_eq!(find_file_title_column(&["FILE NUMBER", "File title (PL)"]), Some(1));
	}
}
