//! Merge two datasets by link, keeping the wider one's layout

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::codec::{read_dataset, save_dataset};
use crate::dataset::TabularDataset;
use crate::error::{DocError, DocResult};
use crate::normalize::{clean_link, link_key, normalize_header_name};
use crate::provider::DirectoryProvider;

/// Default header every merged dataset must carry
pub const LINK_HEADER: &str = "link";

/// A dataset plus the name used in error messages
#[derive(Debug, Clone, Copy)]
pub struct NamedDataset<'a> {
	pub name: &'a str,
	pub dataset: &'a TabularDataset,
}

impl<'a> NamedDataset<'a> {
	pub fn new(name: &'a str, dataset: &'a TabularDataset) -> Self {
		Self { name, dataset }
	}
}

/// Which argument became the merge target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSide {
	First,
	Second,
}

/// Result of one merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
	pub rows_added: usize,
	pub primary: MergeSide,
	pub primary_name: String,
	/// The primary dataset with accepted rows prepended
	pub dataset: TabularDataset,
}

impl MergeOutcome {
	pub fn changed(&self) -> bool {
		self.rows_added > 0
	}
}

fn link_column(named: &NamedDataset<'_>, link_header: &str) -> DocResult<usize> {
	named
		.dataset
		.find_column(link_header)
		.ok_or_else(|| DocError::MissingColumn {
			dataset: named.name.to_string(),
			column: link_header.to_string(),
		})
}

/// Merge `first` and `second` by link.
///
/// The dataset with more columns is the target (`first` on a tie). Each
/// secondary row whose link key is new is reshaped to the target headers
/// (matching by normalized header name, cleaning the link cell, dropping
/// columns the target lacks) and the accepted rows are placed before the
/// target's rows. Rows without a usable link and repeated links are skipped,
/// so merging the result again adds nothing.
///
/// The target is validated before the secondary, and both must have a
/// [`LINK_HEADER`] column.
pub fn merge_datasets(first: NamedDataset<'_>, second: NamedDataset<'_>) -> DocResult<MergeOutcome> {
	merge_datasets_on(first, second, LINK_HEADER)
}

/// [`merge_datasets`] keyed on the column named `link_header`
pub fn merge_datasets_on(
	first: NamedDataset<'_>,
	second: NamedDataset<'_>,
	link_header: &str,
) -> DocResult<MergeOutcome> {
	let (primary, secondary, side) = if first.dataset.width() >= second.dataset.width() {
		(first, second, MergeSide::First)
	} else {
		(second, first, MergeSide::Second)
	};
	info!(
		"Merge: {} ({} columns) <- {} ({} columns)",
		primary.name,
		primary.dataset.width(),
		secondary.name,
		secondary.dataset.width()
	);

	if primary.dataset.headers().is_empty() {
		return Err(DocError::EmptyHeaders {
			dataset: primary.name.to_string(),
		});
	}
	let primary_link = link_column(&primary, link_header)?;
	let secondary_link = link_column(&secondary, link_header)?;

	// secondary column -> primary column
	let column_map: Vec<Option<usize>> = secondary
		.dataset
		.headers()
		.iter()
		.map(|h| {
			let name = normalize_header_name(h);
			if name.is_empty() {
				None
			} else {
				primary.dataset.find_column(&name)
			}
		})
		.collect();

	let mut seen: IndexSet<String> = primary
		.dataset
		.column_values(primary_link)
		.filter_map(link_key)
		.collect();

	let mut accepted = Vec::new();
	for row in secondary.dataset.rows() {
		let Some(key) = link_key(&row[secondary_link]) else {
			continue;
		};
		if !seen.insert(key) {
			continue;
		}

		let mut reshaped = vec![String::new(); primary.dataset.width()];
		for (src, target) in column_map.iter().enumerate() {
			let Some(target) = *target else { continue };
			let value = &row[src];
			if value.trim().is_empty() {
				continue;
			}
			reshaped[target] = if target == primary_link {
				clean_link(value)
			} else {
				value.clone()
			};
		}
		accepted.push(reshaped);
	}

	let rows_added = accepted.len();
	let dataset = if rows_added == 0 {
		primary.dataset.clone()
	} else {
		primary.dataset.with_prepended_rows(accepted)?
	};
	debug!("Merge: {} rows added to {}", rows_added, primary.name);

	Ok(MergeOutcome {
		rows_added,
		primary: side,
		primary_name: primary.name.to_string(),
		dataset,
	})
}

/// Read two CSV files, merge them and write the target back when rows were added.
///
/// Rows are keyed on the column named `link_header`. Returns the outcome and
/// the handle of the file that was (or would have been) written.
pub async fn merge_csv_files<P: DirectoryProvider>(
	provider: &P,
	first: (&str, &P::File),
	second: (&str, &P::File),
	link_header: &str,
) -> DocResult<(MergeOutcome, P::File)> {
	let a = read_dataset(provider, first.1).await?;
	let b = read_dataset(provider, second.1).await?;
	let outcome = merge_datasets_on(
		NamedDataset::new(first.0, &a),
		NamedDataset::new(second.0, &b),
		link_header,
	)?;

	let target = match outcome.primary {
		MergeSide::First => first.1.clone(),
		MergeSide::Second => second.1.clone(),
	};
	if outcome.changed() {
		save_dataset(provider, &target, &outcome.dataset).await?;
	} else {
		info!("Merge: nothing new for {}", outcome.primary_name);
	}
	Ok((outcome, target))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::parse_csv;
	use crate::provider::MemoryFs;

	fn dataset(text: &str) -> TabularDataset {
		parse_csv(text).unwrap()
	}

	#[test_log::test]
	fn test_wider_dataset_is_primary() {
		let a = dataset("Title;Link\nA;https://youtu.be/a\n");
		let b = dataset("Link;Title;Status\nhttps://youtu.be/b;B;new\n");
		let outcome = merge_datasets(NamedDataset::new("a", &a), NamedDataset::new("b", &b)).unwrap();
		assert_eq!(outcome.primary, MergeSide::Second);
		assert_eq!(outcome.primary_name, "b");
		assert_eq!(outcome.dataset.headers(), b.headers());
		assert_eq!(
			outcome.dataset.rows()[0],
			["https://youtu.be/a", "A", ""].map(String::from)
		);
	}

	#[test_log::test]
	fn test_tie_prefers_first() {
		let a = dataset("Link\nx\n");
		let b = dataset("LINK \ny\n");
		let outcome = merge_datasets(NamedDataset::new("a", &a), NamedDataset::new("b", &b)).unwrap();
		assert_eq!(outcome.primary, MergeSide::First);
		assert_eq!(outcome.rows_added, 1);
	}

	#[test_log::test]
	fn test_missing_link_names_dataset() {
		let a = dataset("Link;Title;Status\nx;y;z\n");
		let b = dataset("Title\nq\n");
		let err = merge_datasets(NamedDataset::new("a.csv", &a), NamedDataset::new("b.csv", &b))
			.unwrap_err();
		assert!(matches!(
			err,
			DocError::MissingColumn { ref dataset, ref column } if dataset == "b.csv" && column == "link"
		));

		let empty = TabularDataset::default();
		let err = merge_datasets(NamedDataset::new("e.csv", &empty), NamedDataset::new("f.csv", &empty))
			.unwrap_err();
		assert!(matches!(err, DocError::EmptyHeaders { ref dataset } if dataset == "e.csv"));
	}

	#[test_log::test]
	fn test_duplicates_and_blank_links_skipped() {
		let a = dataset("Link;Title\nhttps://youtu.be/A?v=1&t=2;old\n");
		let b = dataset(
			"Title;Link\n\
			 dup;https://YOUTU.BE/a?v=1&t=99\n\
			 blank;\n\
			 new;https://youtu.be/n).\n\
			 again;https://youtu.be/N\n",
		);
		let outcome = merge_datasets(NamedDataset::new("a", &a), NamedDataset::new("b", &b)).unwrap();
		assert_eq!(outcome.rows_added, 1);
		assert_eq!(
			outcome.dataset.rows()[0],
			["https://youtu.be/n", "new"].map(String::from)
		);
		assert_eq!(outcome.dataset.len(), 2);
	}

	#[test_log::test]
	fn test_merge_is_idempotent() {
		let a = dataset("Link;Title\nhttps://youtu.be/1;one\n");
		let b = dataset("Link;Title\nhttps://youtu.be/2;two\nhttps://youtu.be/3;three\n");
		let first = merge_datasets(NamedDataset::new("a", &a), NamedDataset::new("b", &b)).unwrap();
		assert_eq!(first.rows_added, 2);

		let second = merge_datasets(
			NamedDataset::new("a", &first.dataset),
			NamedDataset::new("b", &b),
		)
		.unwrap();
		assert_eq!(second.rows_added, 0);
		assert!(!second.changed());
		assert_eq!(second.dataset, first.dataset);
	}

	#[test_log::test]
	fn test_configured_link_header() {
		let mut config = crate::config::MatchConfig::default();
		config.columns.link = "url".to_string();

		let a = dataset("Url;Title\nhttps://youtu.be/1;one\n");
		let b = dataset("Title;URL\ntwo;https://youtu.be/2\n");
		let outcome = merge_datasets_on(
			NamedDataset::new("a", &a),
			NamedDataset::new("b", &b),
			&config.columns.link,
		)
		.unwrap();
		assert_eq!(outcome.rows_added, 1);
		assert_eq!(
			outcome.dataset.rows()[0],
			["https://youtu.be/2", "two"].map(String::from)
		);

		let err = merge_datasets(NamedDataset::new("a", &a), NamedDataset::new("b", &b)).unwrap_err();
		assert!(matches!(err, DocError::MissingColumn { ref column, .. } if column == "link"));
	}

	#[smol_potat::test]
	async fn test_merge_csv_files_writes_primary() {
		let fs = MemoryFs::new();
		let a = fs.add_file(fs.root(), "a.csv", "Link;Title;Status\nhttps://youtu.be/1;one;done\n");
		let b = fs.add_file(fs.root(), "b.csv", "Title;Link\ntwo;https://youtu.be/2\n");

		let (outcome, target) = merge_csv_files(&fs, ("a.csv", &a), ("b.csv", &b), LINK_HEADER)
			.await
			.unwrap();
		assert_eq!(outcome.rows_added, 1);
		assert_eq!(target, a);
		assert_eq!(
			String::from_utf8(fs.contents(a).unwrap()).unwrap(),
			"Link;Title;Status\nhttps://youtu.be/2;two;\nhttps://youtu.be/1;one;done"
		);
		assert_eq!(
			fs.contents(b).unwrap(),
			b"Title;Link\ntwo;https://youtu.be/2\n".to_vec()
		);
	}
}
