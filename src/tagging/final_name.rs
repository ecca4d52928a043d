//! Sequenced final file names: `<volumes>_<nnn>_<identifier>`

use std::collections::HashMap;
use tracing::{debug, info};

use super::hierarchy::transform_hierarchy_folder;
use crate::columns::find_file_number_column;
use crate::config::MatchConfig;
use crate::dataset::{ColumnPlacement, ColumnUpdate};
use crate::error::{DocError, DocResult};
use crate::merge::NamedDataset;

/// Join the transformed folder, the 3-digit sequence and the identifier.
///
/// Empty parts are left out; with neither a folder code nor an identifier
/// the result is empty.
///
/// ```rust
/// use docmatch::tagging::compose_final_name;
///
/// assert_eq!(compose_final_name("Tom 1/Tom 1.1", "P001", 1), "1---1-1_001_P001");
/// assert_eq!(compose_final_name("", "P002", 12), "012_P002");
/// ```
pub fn compose_final_name(folder: &str, file_number: &str, sequence: usize) -> String {
	let volumes = transform_hierarchy_folder(folder);
	let file_number = file_number.trim();
	if volumes.is_empty() && file_number.is_empty() {
		return String::new();
	}

	let mut parts = Vec::with_capacity(3);
	if !volumes.is_empty() {
		parts.push(volumes);
	}
	parts.push(format!("{sequence:03}"));
	if !file_number.is_empty() {
		parts.push(file_number.to_string());
	}
	parts.join("_")
}

/// Add or refresh the final-name column.
///
/// Rows whose identifier passes the prefix filter are numbered per folder
/// value in row order; every other row gets an empty name. The column is
/// appended on first creation. Both the folder and the file-number columns
/// are required.
pub fn add_final_name_column(
	input: NamedDataset<'_>,
	config: &MatchConfig,
) -> DocResult<ColumnUpdate> {
	let dataset = input.dataset;
	let missing = |column: &str| DocError::MissingColumn {
		dataset: input.name.to_string(),
		column: column.to_string(),
	};
	let folder_col = dataset
		.find_column(&config.columns.folder)
		.ok_or_else(|| missing(&config.columns.folder))?;
	let number_col =
		find_file_number_column(dataset.headers()).ok_or_else(|| missing("FILE NUMBER"))?;
	info!("Final names: numbering {} rows of {}", dataset.len(), input.name);

	let mut counters: HashMap<String, usize> = HashMap::new();
	let names: Vec<String> = dataset
		.rows()
		.iter()
		.map(|row| {
			let file_number = row[number_col].trim();
			if !config.is_prefixed_file_number(file_number) {
				return String::new();
			}
			let folder = row[folder_col].trim();
			let counter = counters.entry(folder.to_string()).or_insert(0);
			*counter += 1;
			compose_final_name(folder, file_number, *counter)
		})
		.collect();

	debug!(
		"Final names: {} named rows in {} folders",
		names.iter().filter(|n| !n.is_empty()).count(),
		counters.len()
	);
	dataset.upsert_column(&config.columns.final_name, &ColumnPlacement::Append, names)
}
