//! Tabular datasets: ordered headers with positionally aligned rows

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{DocError, DocResult};
use crate::normalize::normalize_header_name;

/// Headers plus rows, every row exactly as wide as the header list.
///
/// Datasets are values: every operation that changes cells or columns returns
/// a new dataset and leaves `self` untouched, so callers detect edits with a
/// plain `==`.
///
/// Header names are unique under [`normalize_header_name`] (blank headers
/// excepted, since spreadsheets often carry several unnamed columns).
///
/// ```rust
/// use docmatch::TabularDataset;
///
/// let ds = TabularDataset::new(
///     vec!["Link".into(), "Title".into()],
///     vec![vec!["https://youtu.be/a".into(), "A".into()]],
/// )
/// .unwrap();
/// assert_eq!(ds.find_column(" link "), Some(0));
/// assert_eq!(ds.cell(0, 1), Some("A"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularDataset {
	headers: Vec<String>,
	rows: Vec<Vec<String>>,
}

/// Where a derived column goes the first time it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPlacement {
	/// Position 0
	Front,
	/// Right after the named column, appended when the anchor is absent
	After(String),
	/// After the last column
	Append,
}

/// Result of writing a derived column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnUpdate {
	pub dataset: TabularDataset,
	pub index: usize,
	pub inserted: bool,
}

impl TabularDataset {
	/// Build a dataset, rejecting ragged rows and duplicate header names.
	pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> DocResult<Self> {
		check_unique_headers(&headers)?;
		for (i, row) in rows.iter().enumerate() {
			if row.len() != headers.len() {
				return Err(DocError::RowWidth {
					row: i,
					found: row.len(),
					expected: headers.len(),
				});
			}
		}
		Ok(Self { headers, rows })
	}

	/// Build a dataset, padding short rows with empty cells and cutting long ones.
	pub fn from_rows_padded(headers: Vec<String>, rows: Vec<Vec<String>>) -> DocResult<Self> {
		check_unique_headers(&headers)?;
		let width = headers.len();
		let rows = rows
			.into_iter()
			.map(|mut row| {
				row.resize(width, String::new());
				row
			})
			.collect();
		Ok(Self { headers, rows })
	}

	pub fn headers(&self) -> &[String] {
		&self.headers
	}

	pub fn rows(&self) -> &[Vec<String>] {
		&self.rows
	}

	pub fn width(&self) -> usize {
		self.headers.len()
	}

	/// Number of data rows
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
		self.rows.get(row)?.get(col).map(String::as_str)
	}

	/// Index of the header equal to `name` after trimming and lowercasing
	pub fn find_column(&self, name: &str) -> Option<usize> {
		let wanted = normalize_header_name(name);
		if wanted.is_empty() {
			return None;
		}
		self.headers
			.iter()
			.position(|h| normalize_header_name(h) == wanted)
	}

	/// Values of one column in row order
	pub fn column_values(&self, col: usize) -> impl Iterator<Item = &str> {
		self.rows
			.iter()
			.map(move |row| row.get(col).map(String::as_str).unwrap_or(""))
	}

	/// Same headers, different rows
	pub fn with_rows(&self, rows: Vec<Vec<String>>) -> DocResult<Self> {
		Self::new(self.headers.clone(), rows)
	}

	/// Same headers, `rows` placed before the existing ones
	pub fn with_prepended_rows(&self, rows: Vec<Vec<String>>) -> DocResult<Self> {
		let mut all = rows;
		all.extend(self.rows.iter().cloned());
		self.with_rows(all)
	}

	/// Add or refresh a derived column.
	///
	/// An existing column (matched by normalized name) keeps its position and
	/// has its cells overwritten. A new column is placed per `placement`.
	/// `values` must hold one entry per row.
	pub fn upsert_column(
		&self,
		name: &str,
		placement: &ColumnPlacement,
		values: Vec<String>,
	) -> DocResult<ColumnUpdate> {
		if values.len() != self.rows.len() {
			return Err(DocError::ColumnLength {
				column: name.to_string(),
				found: values.len(),
				expected: self.rows.len(),
			});
		}

		if let Some(index) = self.find_column(name) {
			let rows = self
				.rows
				.iter()
				.zip(values)
				.map(|(row, value)| {
					let mut row = row.clone();
					row[index] = value;
					row
				})
				.collect();
			return Ok(ColumnUpdate {
				dataset: Self {
					headers: self.headers.clone(),
					rows,
				},
				index,
				inserted: false,
			});
		}

		let index = match placement {
			ColumnPlacement::Front => 0,
			ColumnPlacement::After(anchor) => self
				.find_column(anchor)
				.map(|i| i + 1)
				.unwrap_or(self.headers.len()),
			ColumnPlacement::Append => self.headers.len(),
		};

		let mut headers = self.headers.clone();
		headers.insert(index, name.to_string());
		let rows = self
			.rows
			.iter()
			.zip(values)
			.map(|(row, value)| {
				let mut row = row.clone();
				row.insert(index, value);
				row
			})
			.collect();

		Ok(ColumnUpdate {
			dataset: Self { headers, rows },
			index,
			inserted: true,
		})
	}

	/// Drop a column by normalized name; an absent column yields an equal copy
	pub fn remove_column(&self, name: &str) -> Self {
		let Some(index) = self.find_column(name) else {
			return self.clone();
		};
		let mut headers = self.headers.clone();
		headers.remove(index);
		let rows = self
			.rows
			.iter()
			.map(|row| {
				let mut row = row.clone();
				row.remove(index);
				row
			})
			.collect();
		Self { headers, rows }
	}
}

fn check_unique_headers(headers: &[String]) -> DocResult<()> {
	let mut seen = HashSet::new();
	for header in headers {
		let key = normalize_header_name(header);
		if !key.is_empty() && !seen.insert(key) {
			return Err(DocError::DuplicateHeader {
				header: header.clone(),
			});
		}
	}
	Ok(())
}

/// One row as produced by a spreadsheet reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetRow {
	/// 1-based sheet row number
	pub row_index: usize,
	pub columns: HashMap<String, String>,
	pub row_color: Option<String>,
	pub source_file: Option<String>,
}

/// Header list plus keyed rows from one or more sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetData {
	pub headers: Vec<String>,
	pub rows: Vec<SpreadsheetRow>,
}

impl SpreadsheetData {
	/// Lay the keyed rows out positionally; keys not in `headers` are dropped
	/// and missing ones become empty cells.
	pub fn to_dataset(&self) -> DocResult<TabularDataset> {
		let rows = self
			.rows
			.iter()
			.map(|row| {
				self.headers
					.iter()
					.map(|h| row.columns.get(h).cloned().unwrap_or_default())
					.collect()
			})
			.collect();
		TabularDataset::new(self.headers.clone(), rows)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn strings(values: &[&str]) -> Vec<String> {
		values.iter().map(|s| s.to_string()).collect()
	}

	fn sample() -> TabularDataset {
		TabularDataset::new(
			strings(&["Title", "Status", "Link"]),
			vec![strings(&["a", "new", "l1"]), strings(&["b", "", "l2"])],
		)
		.unwrap()
	}

	#[test_log::test]
	fn test_rejects_ragged_rows() {
		let err = TabularDataset::new(strings(&["a", "b"]), vec![strings(&["1"])]).unwrap_err();
		assert!(matches!(
			err,
			DocError::RowWidth {
				row: 0,
				found: 1,
				expected: 2
			}
		));
	}

	#[test_log::test]
	fn test_rejects_duplicate_headers() {
		let err = TabularDataset::new(strings(&["Link", " link"]), vec![]).unwrap_err();
		assert!(matches!(err, DocError::DuplicateHeader { .. }));
		assert!(TabularDataset::new(strings(&["", ""]), vec![]).is_ok());
	}

	#[test_log::test]
	fn test_padding() {
		let ds = TabularDataset::from_rows_padded(
			strings(&["a", "b"]),
			vec![strings(&["1"]), strings(&["1", "2", "3"])],
		)
		.unwrap();
		assert_eq!(ds.rows()[0], strings(&["1", ""]));
		assert_eq!(ds.rows()[1], strings(&["1", "2"]));
	}

	#[test_log::test]
	fn test_upsert_inserts_after_anchor_then_refreshes_in_place() {
		let ds = sample();
		let placement = ColumnPlacement::After("status".to_string());

		let first = ds
			.upsert_column("fileExist", &placement, strings(&["yes", ""]))
			.unwrap();
		assert!(first.inserted);
		assert_eq!(first.index, 2);
		assert_eq!(
			first.dataset.headers(),
			&strings(&["Title", "Status", "fileExist", "Link"])[..]
		);
		assert_eq!(first.dataset.rows()[0], strings(&["a", "new", "yes", "l1"]));

		let second = first
			.dataset
			.upsert_column("FILEEXIST", &placement, strings(&["", "yes"]))
			.unwrap();
		assert!(!second.inserted);
		assert_eq!(second.index, 2);
		assert_eq!(second.dataset.headers(), first.dataset.headers());
		assert_eq!(second.dataset.rows()[1], strings(&["b", "", "yes", "l2"]));
	}

	#[test_log::test]
	fn test_upsert_placements() {
		let ds = sample();
		let front = ds
			.upsert_column("Folder", &ColumnPlacement::Front, strings(&["x", "y"]))
			.unwrap();
		assert_eq!(front.index, 0);
		assert_eq!(front.dataset.rows()[1][0], "y");

		let missing_anchor = ds
			.upsert_column(
				"Exist",
				&ColumnPlacement::After("nope".to_string()),
				strings(&["1", "2"]),
			)
			.unwrap();
		assert_eq!(missing_anchor.index, 3);

		let err = ds
			.upsert_column("x", &ColumnPlacement::Append, strings(&["only one"]))
			.unwrap_err();
		assert!(matches!(
			err,
			DocError::ColumnLength { ref column, found: 1, expected: 2 } if column == "x"
		));
		assert_eq!(err.to_string(), "Column \"x\" has 1 values for 2 rows");
	}

	#[test_log::test]
	fn test_remove_column() {
		let ds = sample();
		let removed = ds.remove_column("status");
		assert_eq!(removed.headers(), &strings(&["Title", "Link"])[..]);
		assert_eq!(removed.rows()[0], strings(&["a", "l1"]));
		assert_eq!(ds.remove_column("absent"), ds);
	}

	#[test_log::test]
	fn test_prepend_keeps_headers() {
		let ds = sample();
		let merged = ds.with_prepended_rows(vec![strings(&["c", "", "l3"])]).unwrap();
		assert_eq!(merged.headers(), ds.headers());
		assert_eq!(merged.len(), 3);
		assert_eq!(merged.cell(0, 0), Some("c"));
		assert_eq!(merged.cell(2, 0), Some("b"));
	}

	#[test_log::test]
	fn test_spreadsheet_conversion() {
		let data = SpreadsheetData {
			headers: strings(&["FILE NUMBER", "FILE TITLE (PL)"]),
			rows: vec![SpreadsheetRow {
				row_index: 2,
				columns: HashMap::from([
					("FILE NUMBER".to_string(), "P001".to_string()),
					("Ignored".to_string(), "x".to_string()),
				]),
				row_color: Some("FFFF0000".to_string()),
				source_file: None,
			}],
		};
		let ds = data.to_dataset().unwrap();
		assert_eq!(ds.rows()[0], strings(&["P001", ""]));
	}
}
