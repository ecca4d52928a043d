//! Volume codes (`Tom 2.1.1`) and the hierarchical folder column

use indexmap::IndexSet;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::columns::find_file_number_column;
use crate::config::MatchConfig;
use crate::dataset::{ColumnPlacement, ColumnUpdate, TabularDataset};
use crate::error::{DocError, DocResult};
use crate::merge::NamedDataset;

/// Word that introduces a volume code
pub const HIERARCHY_KEYWORD: &str = "Tom";

/// Patterns tried in order against an identifier cell:
///
/// 1. `Tom 2.1` (keyword, whitespace, dotted digits), anywhere in the text
/// 2. `Tom:2.1`, `Tom-2`, `TOM2` (separators optional)
static CODE_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
	[
		Regex::new(r"(?i)tom\s+(\d+(?:\.\d+)*)").expect("spaced code pattern compiles"),
		Regex::new(r"(?i)tom[\s:-]*(\d+(?:\.\d+)*)").expect("loose code pattern compiles"),
	]
});

/// Code inside one `Tom x.y` folder segment
static SEGMENT_CODE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)tom\s+(\d+(?:\.\d+)*)").expect("segment code pattern compiles")
});

/// Dotted volume code found in `text`, e.g. `2.1.1` from `Tom 2.1.1 - opis`.
pub fn extract_hierarchy_code(text: &str) -> Option<String> {
	let text = text.trim();
	CODE_PATTERNS
		.iter()
		.find_map(|re| re.captures(text))
		.map(|caps| caps[1].to_string())
}

/// Expand a dotted code into its folder chain.
///
/// ```rust
/// use docmatch::tagging::build_hierarchical_path;
///
/// assert_eq!(build_hierarchical_path("2.1.1"), "Tom 2/Tom 2.1/Tom 2.1.1");
/// assert_eq!(build_hierarchical_path("1"), "Tom 1");
/// ```
pub fn build_hierarchical_path(code: &str) -> String {
	let parts: Vec<&str> = code.split('.').collect();
	(1..=parts.len())
		.map(|depth| format!("{} {}", HIERARCHY_KEYWORD, parts[..depth].join(".")))
		.collect::<Vec<_>>()
		.join("/")
}

/// Folder chain for an identifier cell, `None` when it holds no code
pub fn extract_folder(text: &str) -> Option<String> {
	extract_hierarchy_code(text).map(|code| build_hierarchical_path(&code))
}

/// Folder value for every row, carrying the last seen chain forward.
///
/// Rows before the first code get an empty string.
pub fn carry_forward_folders<'a>(cells: impl IntoIterator<Item = &'a str>) -> Vec<String> {
	let mut current = String::new();
	cells
		.into_iter()
		.map(|cell| {
			if let Some(folder) = extract_folder(cell) {
				current = folder;
			}
			current.clone()
		})
		.collect()
}

/// Add or refresh the folder column from the file-number column.
///
/// A new folder column goes to position 0. A dataset without a file-number
/// column is rejected rather than tagged with empty folders.
pub fn add_folder_column(input: NamedDataset<'_>, config: &MatchConfig) -> DocResult<ColumnUpdate> {
	let dataset = input.dataset;
	let folder_name = &config.columns.folder;
	let source = find_file_number_column(dataset.headers())
		.ok_or_else(|| DocError::MissingColumn {
			dataset: input.name.to_string(),
			column: "FILE NUMBER".to_string(),
		})?;
	info!(
		"Folders: deriving {} from {:?} in {}",
		folder_name,
		dataset.headers()[source],
		input.name
	);

	let folders = carry_forward_folders(dataset.column_values(source));
	let tagged = folders.iter().filter(|f| !f.is_empty()).count();
	let update = dataset.upsert_column(folder_name, &ColumnPlacement::Front, folders)?;
	debug!(
		"Folders: {tagged}/{} rows in a folder (column {})",
		dataset.len(),
		if update.inserted { "added" } else { "refreshed" }
	);
	Ok(update)
}

/// `Tom 2/Tom 2.1/Tom 2.1.5` -> `2---2-1---2-1-5`; segments without a code are dropped.
pub fn transform_hierarchy_folder(folder: &str) -> String {
	folder
		.split('/')
		.filter_map(|segment| SEGMENT_CODE.captures(segment.trim()))
		.map(|caps| caps[1].replace('.', "-"))
		.collect::<Vec<_>>()
		.join("---")
}

fn segment_numbers(folder: &str) -> Vec<Vec<u64>> {
	folder
		.split('/')
		.map(|segment| match SEGMENT_CODE.captures(segment) {
			Some(caps) => caps[1].split('.').map(|n| n.parse().unwrap_or(0)).collect(),
			None => vec![0],
		})
		.collect()
}

/// Order folder chains by their numeric codes, level by level.
///
/// Missing levels and missing parts count as 0, so `Tom 1` sorts before
/// `Tom 1/Tom 1.1`, which sorts before `Tom 2`.
pub fn compare_hierarchy(a: &str, b: &str) -> Ordering {
	let (a, b) = (segment_numbers(a), segment_numbers(b));
	let zero = vec![0];
	for level in 0..a.len().max(b.len()) {
		let x = a.get(level).unwrap_or(&zero);
		let y = b.get(level).unwrap_or(&zero);
		for part in 0..x.len().max(y.len()) {
			let ord = x.get(part).unwrap_or(&0).cmp(y.get(part).unwrap_or(&0));
			if ord != Ordering::Equal {
				return ord;
			}
		}
	}
	Ordering::Equal
}

/// Distinct non-empty folder values in hierarchical order
pub fn folder_tags(dataset: &TabularDataset, config: &MatchConfig) -> Vec<String> {
	let Some(col) = dataset.find_column(&config.columns.folder) else {
		return Vec::new();
	};
	let mut tags: Vec<String> = dataset
		.column_values(col)
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(str::to_string)
		.collect::<IndexSet<_>>()
		.into_iter()
		.collect();
	tags.sort_by(|a, b| compare_hierarchy(a, b));
	tags
}

/// Nesting level of a folder tag: the number of `/`
pub fn tag_depth(tag: &str) -> usize {
	tag.matches('/').count()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test_log::test]
	fn test_extract_codes() {
		assert_eq!(extract_folder("TOM 1 (PZT)").as_deref(), Some("Tom 1"));
		assert_eq!(
			extract_folder("Tom 1.1 - część opisowa").as_deref(),
			Some("Tom 1/Tom 1.1")
		);
		assert_eq!(
			extract_folder("Some text TOM 2 more text").as_deref(),
			Some("Tom 2")
		);
		assert_eq!(extract_folder("tom:3.2").as_deref(), Some("Tom 3/Tom 3.2"));
		assert_eq!(extract_folder("P001-A"), None);
		assert_eq!(extract_folder(""), None);
	}

	#[test_log::test]
	fn test_carry_forward() {
		let folders = carry_forward_folders(["Tom 1 intro", "", "Tom 1.1 detail"]);
		assert_eq!(folders, vec!["Tom 1", "Tom 1", "Tom 1/Tom 1.1"]);

		let folders = carry_forward_folders(["P001", "Tom 2", "P002"]);
		assert_eq!(folders, vec!["", "Tom 2", "Tom 2"]);
	}

	#[test_log::test]
	fn test_add_folder_column_front_then_refresh() {
		let ds = TabularDataset::new(
			vec!["FILE NUMBER".into(), "FILE TITLE".into()],
			vec![
				vec!["Tom 1 intro".into(), "a".into()],
				vec!["P001".into(), "b".into()],
				vec!["Tom 1.1 detail".into(), "c".into()],
			],
		)
		.unwrap();
		let config = MatchConfig::default();

		let first = add_folder_column(NamedDataset::new("x.xlsx", &ds), &config).unwrap();
		assert!(first.inserted);
		assert_eq!(first.index, 0);
		let values: Vec<&str> = first.dataset.column_values(0).collect();
		assert_eq!(values, vec!["Tom 1", "Tom 1", "Tom 1/Tom 1.1"]);

		let second = add_folder_column(NamedDataset::new("x.xlsx", &first.dataset), &config).unwrap();
		assert!(!second.inserted);
		assert_eq!(second.dataset, first.dataset);
	}

	#[test_log::test]
	fn test_add_folder_column_requires_file_number() {
		let ds = TabularDataset::new(vec!["Title".into()], vec![]).unwrap();
		let err = add_folder_column(NamedDataset::new("x.xlsx", &ds), &MatchConfig::default())
			.unwrap_err();
		assert!(matches!(err, DocError::MissingColumn { ref dataset, .. } if dataset == "x.xlsx"));
	}

	#[test_log::test]
	fn test_transform_folder() {
		assert_eq!(transform_hierarchy_folder("Tom 1/Tom 1.1"), "1---1-1");
		assert_eq!(
			transform_hierarchy_folder("Tom 2/Tom 2.1/Tom 2.1.5"),
			"2---2-1---2-1-5"
		);
		assert_eq!(transform_hierarchy_folder(""), "");
		assert_eq!(transform_hierarchy_folder("misc/Tom 3"), "3");
	}

	#[test_log::test]
	fn test_folder_tags_sorted_hierarchically() {
		let ds = TabularDataset::new(
			vec!["Folder".into()],
			["Tom 10", "Tom 2", "", "Tom 1/Tom 1.1", "Tom 1", "Tom 2", "Tom 1/Tom 1.10", "Tom 1/Tom 1.2"]
				.into_iter()
				.map(|v| vec![v.to_string()])
				.collect(),
		)
		.unwrap();
		assert_eq!(
			folder_tags(&ds, &MatchConfig::default()),
			vec![
				"Tom 1",
				"Tom 1/Tom 1.1",
				"Tom 1/Tom 1.2",
				"Tom 1/Tom 1.10",
				"Tom 2",
				"Tom 10"
			]
		);
		assert_eq!(tag_depth("Tom 1/Tom 1.1"), 1);
		assert_eq!(tag_depth("Tom 1"), 0);
	}
}
