//! Semicolon-delimited CSV reading and writing

use csv::{QuoteStyle, ReaderBuilder, Terminator, Trim, WriterBuilder};
use tracing::debug;

use crate::dataset::TabularDataset;
use crate::error::DocResult;
use crate::provider::DirectoryProvider;

/// Field separator used by every CSV this crate reads or writes
pub const DELIMITER: u8 = b';';

/// Parse `;`-separated text into a dataset.
///
/// The first non-blank record is the header row. Cells are trimmed and
/// unquoted (`""` inside quotes is a literal quote), blank lines are skipped
/// and rows are padded or cut to the header width. A leading BOM is ignored.
///
/// ```rust
/// use docmatch::codec::parse_csv;
///
/// let ds = parse_csv("Link;Title\n\nhttps://youtu.be/a;\"Say \"\"hi\"\"\"\n").unwrap();
/// assert_eq!(ds.headers(), &["Link".to_string(), "Title".to_string()][..]);
/// assert_eq!(ds.cell(0, 1), Some("Say \"hi\""));
/// ```
pub fn parse_csv(text: &str) -> DocResult<TabularDataset> {
	let text = text.strip_prefix('\u{feff}').unwrap_or(text);
	let mut reader = ReaderBuilder::new()
		.delimiter(DELIMITER)
		.has_headers(false)
		.flexible(true)
		.trim(Trim::All)
		.from_reader(text.as_bytes());

	let mut records = Vec::new();
	for record in reader.records() {
		let record = record?;
		if record.iter().all(str::is_empty) {
			continue;
		}
		records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
	}

	let mut records = records.into_iter();
	let Some(headers) = records.next() else {
		return Ok(TabularDataset::default());
	};
	TabularDataset::from_rows_padded(headers, records.collect())
}

/// Render a dataset as `;`-separated lines joined with `\n`.
///
/// Cells holding `;`, `"`, `\r` or `\n` are quoted with inner quotes doubled.
pub fn stringify_csv(dataset: &TabularDataset) -> DocResult<String> {
	if dataset.headers().is_empty() {
		return Ok(String::new());
	}
	let mut writer = WriterBuilder::new()
		.delimiter(DELIMITER)
		.quote_style(QuoteStyle::Necessary)
		.terminator(Terminator::Any(b'\n'))
		.from_writer(Vec::new());

	writer.write_record(dataset.headers())?;
	for row in dataset.rows() {
		writer.write_record(row)?;
	}
	let bytes = writer
		.into_inner()
		.map_err(|e| std::io::Error::other(e.to_string()))?;
	let mut text = String::from_utf8_lossy(&bytes).into_owned();
	if text.ends_with('\n') {
		text.pop();
	}
	Ok(text)
}

/// Read and parse a CSV file through a provider
pub async fn read_dataset<P: DirectoryProvider>(
	provider: &P,
	file: &P::File,
) -> DocResult<TabularDataset> {
	let text = provider.read_all_text(file).await?;
	let dataset = parse_csv(&text)?;
	debug!(
		"Codec: read {:?} ({} columns, {} rows)",
		file,
		dataset.width(),
		dataset.len()
	);
	Ok(dataset)
}

/// Serialize and write a dataset through a provider
pub async fn save_dataset<P: DirectoryProvider>(
	provider: &P,
	file: &P::File,
	dataset: &TabularDataset,
) -> DocResult<()> {
	let text = stringify_csv(dataset)?;
	provider.write_all_bytes(file, text.as_bytes()).await?;
	debug!("Codec: saved {:?} ({} rows)", file, dataset.len());
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::provider::MemoryFs;

	#[test_log::test]
	fn test_parse_trims_and_pads() {
		let ds = parse_csv("  Link ; Title ;Status\r\nx;Odc. 1\n   \ny;Odc. 2;done;extra\n").unwrap();
		assert_eq!(ds.headers(), &["Link", "Title", "Status"].map(String::from)[..]);
		assert_eq!(ds.rows()[0], ["x", "Odc. 1", ""].map(String::from));
		assert_eq!(ds.rows()[1], ["y", "Odc. 2", "done"].map(String::from));
	}

	#[test_log::test]
	fn test_parse_empty_input() {
		let ds = parse_csv("\n\n").unwrap();
		assert!(ds.headers().is_empty());
		assert!(ds.is_empty());
		assert_eq!(stringify_csv(&ds).unwrap(), "");
	}

	#[test_log::test]
	fn test_parse_quoted_delimiter() {
		let ds = parse_csv("Title;Link\n\"a; b\";l").unwrap();
		assert_eq!(ds.cell(0, 0), Some("a; b"));
		assert_eq!(ds.cell(0, 1), Some("l"));
	}

	#[test_log::test]
	fn test_stringify_quotes_only_when_needed() {
		let ds = TabularDataset::new(
			vec!["Title".into(), "Note".into()],
			vec![vec!["plain".into(), "has;semi and \"quote\"".into()]],
		)
		.unwrap();
		assert_eq!(
			stringify_csv(&ds).unwrap(),
			"Title;Note\nplain;\"has;semi and \"\"quote\"\"\""
		);
	}

	#[test_log::test]
	fn test_stringify_then_parse_preserves_cells() {
		let ds = TabularDataset::new(
			vec!["A".into(), "B".into()],
			vec![
				vec!["multi\nline".into(), "x".into()],
				vec!["".into(), "ok".into()],
			],
		)
		.unwrap();
		let text = stringify_csv(&ds).unwrap();
		assert_eq!(parse_csv(&text).unwrap(), ds);
	}

	#[smol_potat::test]
	async fn test_provider_round_trip() {
		let fs = MemoryFs::new();
		let file = fs.add_file(fs.root(), "list.csv", "\u{feff}Title;Link\nA;l1\n");
		let ds = read_dataset(&fs, &file).await.unwrap();
		assert_eq!(ds.headers()[0], "Title");

		let updated = ds.remove_column("link");
		save_dataset(&fs, &file, &updated).await.unwrap();
		assert_eq!(fs.contents(file).unwrap(), b"Title\nA");
	}
}
