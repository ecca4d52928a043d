//! Bulk copies: collected transcripts through a provider, PDFs on local disk

use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::candidates::{MatchTargets, TXT};
use crate::columns::find_file_number_column;
use crate::config::MatchConfig;
use crate::dataset::TabularDataset;
use crate::error::{DocError, DocResult, ProviderError};
use crate::index::FileIndex;
use crate::matcher::{MatchOutcome, TreeMatcher};
use crate::merge::NamedDataset;
use crate::provider::{DirectoryProvider, PermissionMode, ensure_permission};
use crate::session::CollectedFile;

static UNSAFE_RUN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]+"#).expect("unsafe run pattern compiles"));

static PATH_SEPARATORS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[\\/]+").expect("separator pattern compiles"));

/// Name used when sanitizing leaves nothing
pub const FALLBACK_PDF_NAME: &str = "plik.pdf";

/// One item a bulk copy could not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyFailure {
	pub item: String,
	pub reason: String,
}

/// Outcome of a bulk copy: every item is attempted before returning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
	pub copied: Vec<PathBuf>,
	pub skipped: Vec<String>,
	pub failures: Vec<CopyFailure>,
}

impl CopyReport {
	pub fn is_complete(&self) -> bool {
		self.failures.is_empty()
	}

	fn fail(&mut self, item: impl Into<String>, reason: impl ToString) {
		let failure = CopyFailure {
			item: item.into(),
			reason: reason.to_string(),
		};
		warn!("Copy: {} failed: {}", failure.item, failure.reason);
		self.failures.push(failure);
	}
}

/// Copy every collected file found under `root` into `destination`.
///
/// Each file is located with the tree matcher (its hint directory first) and
/// written under the name it was found with. Missing files and per-file I/O
/// failures are listed in the report; a permission refusal stops the run.
pub async fn copy_collected_files<P: DirectoryProvider>(
	provider: &P,
	files: &[CollectedFile<P::Dir>],
	root: &P::Dir,
	destination: &P::Dir,
) -> DocResult<CopyReport> {
	info!("Copy: {} collected files to {:?}", files.len(), destination);
	if !ensure_permission(provider, destination, PermissionMode::ReadWrite).await? {
		return Err(ProviderError::PermissionDenied {
			path: PathBuf::from(format!("{destination:?}")),
		}
		.into());
	}

	let matcher = TreeMatcher::new(provider);
	let mut report = CopyReport::default();
	for file in files {
		let targets = MatchTargets::for_title(Some(file.file_name.as_str()), &file.title, TXT);
		let found = match matcher.find(root, file.hint.as_ref(), &targets).await? {
			MatchOutcome::Found(found) => found,
			MatchOutcome::NotFound => {
				report.fail(&file.title, "no matching file");
				continue;
			}
		};

		match copy_one(provider, &found.file, destination, &found.file_name).await {
			Ok(()) => {
				debug!("Copy: {} -> {}", file.title, found.file_name);
				report.copied.push(PathBuf::from(&found.file_name));
			}
			Err(e @ ProviderError::PermissionDenied { .. }) => return Err(e.into()),
			Err(e) => report.fail(&file.title, e),
		}
	}

	info!(
		"Copy: {} copied, {} failed",
		report.copied.len(),
		report.failures.len()
	);
	Ok(report)
}

async fn copy_one<P: DirectoryProvider>(
	provider: &P,
	source: &P::File,
	destination: &P::Dir,
	name: &str,
) -> Result<(), ProviderError> {
	let bytes = provider.read_all_bytes(source).await?;
	let target = provider.create_file(destination, name).await?;
	provider.write_all_bytes(&target, &bytes).await
}

/// One planned PDF copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfCopyTask {
	/// 1-based data row number
	pub row_number: usize,
	pub file_number: String,
	pub folder_segments: Vec<String>,
	pub final_name: Option<String>,
}

impl PdfCopyTask {
	/// Target name: the final name plus `.pdf`, else `<row:04>_<identifier>.pdf`
	pub fn target_name(&self) -> String {
		let raw = match &self.final_name {
			Some(name) => format!("{name}.pdf"),
			None => format!("{:04}_{}.pdf", self.row_number, self.file_number),
		};
		sanitize_copy_name(&raw)
	}

	/// [`Self::target_name`], rejected when it exceeds `max_len` characters
	pub fn checked_target_name(&self, max_len: usize) -> DocResult<String> {
		let name = self.target_name();
		let name_len = name.chars().count();
		if name_len > max_len {
			let preview: String = name.chars().take(50).collect();
			return Err(DocError::InvalidIdentifier {
				value: self.file_number.clone(),
				reason: format!("target name too long ({name_len} characters): {preview}..."),
			});
		}
		Ok(name)
	}
}

/// Replace runs of `<>:"/\|?*` with `_`, trim and cut to `max_len` characters.
///
/// An empty result becomes `_`.
pub fn sanitize_segment(segment: &str, max_len: usize) -> String {
	let replaced = UNSAFE_RUN.replace_all(segment, "_");
	let cut: String = replaced.trim().chars().take(max_len).collect();
	if cut.is_empty() { "_".to_string() } else { cut }
}

/// Split a folder value on `/` or `\` and sanitize each non-empty segment
pub fn folder_segments(folder: &str, max_len: usize) -> Vec<String> {
	PATH_SEPARATORS
		.split(folder)
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(|s| sanitize_segment(s, max_len))
		.collect()
}

/// Replace unsafe runs with `_` and trim; an empty name becomes [`FALLBACK_PDF_NAME`]
pub fn sanitize_copy_name(name: &str) -> String {
	let sanitized = UNSAFE_RUN.replace_all(name, "_").trim().to_string();
	if sanitized.is_empty() {
		FALLBACK_PDF_NAME.to_string()
	} else {
		sanitized
	}
}

/// Rows to copy: prefixed identifiers whose existence value holds the found mark.
///
/// The file-number and existence columns are required; folder and final-name
/// columns are used when present.
pub fn plan_pdf_copies(input: NamedDataset<'_>, config: &MatchConfig) -> DocResult<Vec<PdfCopyTask>> {
	let dataset: &TabularDataset = input.dataset;
	let missing = |column: &str| DocError::MissingColumn {
		dataset: input.name.to_string(),
		column: column.to_string(),
	};
	let number_col =
		find_file_number_column(dataset.headers()).ok_or_else(|| missing("FILE NUMBER"))?;
	let exist_col = dataset
		.find_column(&config.columns.exist)
		.ok_or_else(|| missing(&config.columns.exist))?;
	let folder_col = dataset.find_column(&config.columns.folder);
	let final_col = dataset.find_column(&config.columns.final_name);

	let tasks: Vec<PdfCopyTask> = dataset
		.rows()
		.iter()
		.enumerate()
		.filter_map(|(i, row)| {
			let file_number = row[number_col].trim();
			if !config.is_prefixed_file_number(file_number)
				|| !row[exist_col].contains(config.markers.found_symbol.as_str())
			{
				return None;
			}
			let folder = folder_col.map(|c| row[c].as_str()).unwrap_or("");
			let final_name = final_col
				.map(|c| row[c].trim())
				.filter(|n| !n.is_empty())
				.map(str::to_string);
			Some(PdfCopyTask {
				row_number: i + 1,
				file_number: file_number.to_string(),
				folder_segments: folder_segments(folder, config.max_segment_len),
				final_name,
			})
		})
		.collect();

	info!("Copy: planned {} PDF copies from {}", tasks.len(), input.name);
	Ok(tasks)
}

/// Copy each task's source PDF into `destination/<segments>/<target name>`.
///
/// Sources are resolved through `index` by identifier. Non-PDF sources are
/// skipped, oversized names and missing sources are failures, large sources
/// only log a warning. Directories are created as needed.
pub async fn execute_pdf_copies(
	tasks: &[PdfCopyTask],
	index: &FileIndex,
	destination: &Path,
	config: &MatchConfig,
) -> DocResult<CopyReport> {
	info!(
		"Copy: {} PDF tasks to {}",
		tasks.len(),
		destination.display()
	);
	let mut report = CopyReport::default();

	for task in tasks {
		let Some(source) = index.lookup_file_number(&task.file_number) else {
			report.fail(&task.file_number, "no file with this identifier");
			continue;
		};

		let is_pdf = source
			.path
			.extension()
			.is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
		if !is_pdf {
			warn!("Copy: skipping non-PDF source {}", source.path.display());
			report.skipped.push(task.file_number.clone());
			continue;
		}

		let name = match task.checked_target_name(config.max_file_name_len) {
			Ok(name) => name,
			Err(e) => {
				report.fail(&task.file_number, e);
				continue;
			}
		};
		if source.size > config.large_file_warn_bytes {
			warn!(
				"Copy: large file {} ({:.1} MB)",
				name,
				source.size as f64 / (1024.0 * 1024.0)
			);
		}

		let target_dir = task
			.folder_segments
			.iter()
			.fold(destination.to_path_buf(), |dir, segment| dir.join(segment));
		let target = target_dir.join(&name);
		let result = async {
			smol::fs::create_dir_all(&target_dir).await?;
			smol::fs::copy(&source.path, &target).await
		}
		.await;

		match result {
			Ok(_) => {
				debug!("Copy: {} -> {}", source.path.display(), target.display());
				report.copied.push(target);
			}
			Err(e) => report.fail(&task.file_number, e),
		}
	}

	info!(
		"Copy: {} copied, {} skipped, {} failed",
		report.copied.len(),
		report.skipped.len(),
		report.failures.len()
	);
	Ok(report)
}
