//! Existence flags for title rows (TXT) and file-number rows (PDF)

use serde::Serialize;
use tracing::{debug, info};

use crate::candidates::{MatchTargets, TXT};
use crate::columns::{extract_title, find_file_number_column};
use crate::config::MatchConfig;
use crate::dataset::{ColumnPlacement, TabularDataset};
use crate::error::{DocError, DocResult};
use crate::index::FileIndex;
use crate::merge::NamedDataset;

/// Tagged dataset plus how many rows were looked up and found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistenceReport {
	pub dataset: TabularDataset,
	pub checked: usize,
	pub found: usize,
	/// Whether the flag column was created by this run
	pub inserted: bool,
}

/// Flag rows whose title has a matching `.txt` file in `index`.
///
/// The flag column goes right after the status column the first time
/// (appended when there is none) and is refreshed in place afterwards.
/// Rows without a title get an empty flag.
pub fn tag_title_existence(
	dataset: &TabularDataset,
	index: &FileIndex,
	config: &MatchConfig,
) -> DocResult<ExistenceReport> {
	info!(
		"Existence: checking {} titles against {} files",
		dataset.len(),
		index.len()
	);
	let mut checked = 0;
	let mut found = 0;

	let values = dataset
		.rows()
		.iter()
		.map(|row| {
			let Some(title) = extract_title(dataset.headers(), row, None) else {
				return String::new();
			};
			checked += 1;
			let targets = MatchTargets::for_title(None, &title, TXT);
			if targets.keys.iter().any(|key| index.contains_key(key)) {
				found += 1;
				config.markers.title_found.clone()
			} else {
				String::new()
			}
		})
		.collect();

	let placement = ColumnPlacement::After(config.columns.status_anchor.clone());
	let update = dataset.upsert_column(&config.columns.file_exist, &placement, values)?;
	debug!("Existence: {found}/{checked} titles have a transcript");

	Ok(ExistenceReport {
		dataset: update.dataset,
		checked,
		found,
		inserted: update.inserted,
	})
}

/// Flag rows whose identifier has a file of the same stem in `index`.
///
/// Only identifiers passing the prefix filter are looked up; others get an
/// empty value. The column is appended on first creation.
pub fn tag_file_number_existence(
	input: NamedDataset<'_>,
	index: &FileIndex,
	config: &MatchConfig,
) -> DocResult<ExistenceReport> {
	let dataset = input.dataset;
	let source = find_file_number_column(dataset.headers()).ok_or_else(|| {
		DocError::MissingColumn {
			dataset: input.name.to_string(),
			column: "FILE NUMBER".to_string(),
		}
	})?;
	info!(
		"Existence: checking {} identifiers with prefix {} against {} files",
		dataset.len(),
		config.file_number_prefix,
		index.len()
	);

	let mut checked = 0;
	let mut found = 0;
	let values = dataset
		.column_values(source)
		.map(|file_number| {
			if !config.is_prefixed_file_number(file_number) {
				return String::new();
			}
			checked += 1;
			if index.contains_file_number(file_number) {
				found += 1;
				config.markers.found.clone()
			} else {
				debug!("Existence: no file for {}", file_number.trim());
				config.markers.missing.clone()
			}
		})
		.collect();

	let update = dataset.upsert_column(&config.columns.exist, &ColumnPlacement::Append, values)?;
	info!("Existence: {found}/{checked} identifiers found");

	Ok(ExistenceReport {
		dataset: update.dataset,
		checked,
		found,
		inserted: update.inserted,
	})
}

/// Counts of existence values in a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExistStats {
	pub missing: usize,
	pub found: usize,
	pub empty: usize,
}

impl ExistStats {
	pub fn total(&self) -> usize {
		self.missing + self.found + self.empty
	}
}

/// Marks counted as "found" besides the word TAK
const CHECK_MARKS: [char; 3] = ['\u{2714}', '\u{2705}', '\u{2713}'];

/// Tally the existence column: values containing `NIE` are missing, `TAK` or
/// a check mark found, blanks empty. Other values are not counted; a missing
/// column counts every row as empty.
pub fn exist_stats(dataset: &TabularDataset, config: &MatchConfig) -> ExistStats {
	let mut stats = ExistStats::default();
	let Some(col) = dataset.find_column(&config.columns.exist) else {
		stats.empty = dataset.len();
		return stats;
	};
	for value in dataset.column_values(col) {
		let value = value.trim().to_uppercase();
		if value.contains("NIE") {
			stats.missing += 1;
		} else if value.contains("TAK") || value.contains(CHECK_MARKS) {
			stats.found += 1;
		} else if value.is_empty() {
			stats.empty += 1;
		}
	}
	stats
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::{parse_csv, stringify_csv};

	#[test_log::test]
	fn test_title_existence_inserted_after_status() {
		let ds = parse_csv("Link;Tytuł;Status;Notes\nl1;Odc. 1: Début;ok;\nl2;Missing one;;\nl3;;;\n").unwrap();
		let index = FileIndex::from_names(["odc 1 debut.txt", "unrelated.txt"]).unwrap();
		let config = MatchConfig::default();

		let report = tag_title_existence(&ds, &index, &config).unwrap();
		assert!(report.inserted);
		assert_eq!(report.checked, 2);
		assert_eq!(report.found, 1);
		assert_eq!(report.dataset.headers()[3], "fileExist");
		let flags: Vec<&str> = report.dataset.column_values(3).collect();
		assert_eq!(flags, vec!["yes", "", ""]);
	}

	#[test_log::test]
	fn test_title_existence_rerun_is_byte_identical() {
		let ds = parse_csv("Title;Link\nLecture 1;a\nLecture 2;b\n").unwrap();
		let index = FileIndex::from_names(["Lecture 2.txt"]).unwrap();
		let config = MatchConfig::default();

		let first = tag_title_existence(&ds, &index, &config).unwrap();
		assert_eq!(first.dataset.headers().last().unwrap(), "fileExist");
		let second = tag_title_existence(&first.dataset, &index, &config).unwrap();
		assert!(!second.inserted);
		assert_eq!(
			stringify_csv(&first.dataset).unwrap(),
			stringify_csv(&second.dataset).unwrap()
		);
	}

	#[test_log::test]
	fn test_file_number_existence() {
		let ds = parse_csv("FILE NUMBER;FILE TITLE\nP001;a\np002 ;b\nX100;c\nTom 1;d\n").unwrap();
		let index = FileIndex::from_names(["P001.pdf", "P100.pdf"]).unwrap();
		let config = MatchConfig::default();

		let report =
			tag_file_number_existence(NamedDataset::new("list.xlsx", &ds), &index, &config).unwrap();
		assert_eq!(report.checked, 2);
		assert_eq!(report.found, 1);
		let col = report.dataset.find_column("Exist").unwrap();
		assert_eq!(col, 2);
		let flags: Vec<&str> = report.dataset.column_values(col).collect();
		assert_eq!(flags, vec!["✅ TAK", "❌ NIE", "", ""]);

		let stats = exist_stats(&report.dataset, &config);
		assert_eq!(
			stats,
			ExistStats {
				missing: 1,
				found: 1,
				empty: 2
			}
		);
		assert_eq!(stats.total(), 4);
	}

	#[test_log::test]
	fn test_file_number_existence_requires_column() {
		let ds = parse_csv("Title\nx\n").unwrap();
		let index = FileIndex::from_names(Vec::<String>::new()).unwrap();
		let err = tag_file_number_existence(
			NamedDataset::new("list.xlsx", &ds),
			&index,
			&MatchConfig::default(),
		)
		.unwrap_err();
		assert!(matches!(err, DocError::MissingColumn { .. }));
	}

	#[test_log::test]
	fn test_stats_accept_other_check_marks() {
		let ds = parse_csv("Exist\n✔\nnie\n?\n").unwrap();
		let stats = exist_stats(&ds, &MatchConfig::default());
		assert_eq!(stats.found, 1);
		assert_eq!(stats.missing, 1);
		assert_eq!(stats.total(), 2);
	}
}
