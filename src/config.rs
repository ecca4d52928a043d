//! Matching configuration: column names, markers, limits and default roots

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DocError, DocResult};

/// Column names the taggers read and write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
	/// Hierarchical folder column (`Tom 1/Tom 1.1`)
	pub folder: String,
	/// PDF existence column for file-number rows
	pub exist: String,
	/// Synthesized final file name column
	pub final_name: String,
	/// TXT existence column for CSV title rows
	pub file_exist: String,
	/// Anchor the TXT existence column is inserted after
	pub status_anchor: String,
	/// Merge dedup column
	pub link: String,
}

impl Default for ColumnNames {
	fn default() -> Self {
		Self {
			folder: "Folder".to_string(),
			exist: "Exist".to_string(),
			final_name: "Final File Name".to_string(),
			file_exist: "fileExist".to_string(),
			status_anchor: "status".to_string(),
			link: "link".to_string(),
		}
	}
}

/// Values written into existence columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExistMarkers {
	/// PDF found for a file-number row
	pub found: String,
	/// PDF missing for a file-number row
	pub missing: String,
	/// Substring a row's existence value must contain to be copied
	pub found_symbol: String,
	/// TXT found for a title row (missing rows get an empty cell)
	pub title_found: String,
}

impl Default for ExistMarkers {
	fn default() -> Self {
		Self {
			found: "✅ TAK".to_string(),
			missing: "❌ NIE".to_string(),
			found_symbol: "✅".to_string(),
			title_found: "yes".to_string(),
		}
	}
}

/// Name patterns of editor/browser scratch files that never count as matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempFileMarkers {
	pub contains: Vec<String>,
	pub prefixes: Vec<String>,
	pub suffixes: Vec<String>,
}

impl Default for TempFileMarkers {
	fn default() -> Self {
		Self {
			contains: vec![".crswap".to_string()],
			prefixes: vec!["~$".to_string()],
			suffixes: vec![".tmp".to_string(), ".temp".to_string()],
		}
	}
}

impl TempFileMarkers {
	pub fn is_temp(&self, file_name: &str) -> bool {
		self.contains.iter().any(|m| file_name.contains(m.as_str()))
			|| self.prefixes.iter().any(|p| file_name.starts_with(p.as_str()))
			|| self.suffixes.iter().any(|s| file_name.ends_with(s.as_str()))
	}
}

/// Settings shared by the taggers, the matcher and the copy routines.
///
/// Every field has a default, so a JSON file only needs to name what it
/// overrides:
///
/// ```json
/// { "source_path": "/data/pdf", "file_number_prefix": "P01" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
	/// Default root scanned for source files
	pub source_path: Option<PathBuf>,
	/// Default root copies are written under
	pub destination_path: Option<PathBuf>,
	/// Identifier prefix selecting rows for PDF checks and final names
	pub file_number_prefix: String,
	/// Longest file name a copy may create
	pub max_file_name_len: usize,
	/// Longest folder segment a copy may create
	pub max_segment_len: usize,
	/// Source size above which copies log a warning
	pub large_file_warn_bytes: u64,
	pub columns: ColumnNames,
	pub markers: ExistMarkers,
	pub temp_files: TempFileMarkers,
}

impl Default for MatchConfig {
	fn default() -> Self {
		Self {
			source_path: None,
			destination_path: None,
			file_number_prefix: "P00".to_string(),
			max_file_name_len: 250,
			max_segment_len: 255,
			large_file_warn_bytes: 50 * 1024 * 1024,
			columns: ColumnNames::default(),
			markers: ExistMarkers::default(),
			temp_files: TempFileMarkers::default(),
		}
	}
}

impl MatchConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Load a configuration from a JSON file and validate it
	pub fn from_json_file(path: impl AsRef<Path>) -> DocResult<Self> {
		let path = path.as_ref();
		debug!("Config: loading {}", path.display());
		let bytes = std::fs::read(path)?;
		let config: MatchConfig = serde_json::from_slice(&bytes)?;
		config.validate()?;
		Ok(config)
	}

	/// `<config dir>/docmatch/config.json`, if the platform has a config dir
	pub fn default_location() -> Option<PathBuf> {
		dirs::config_dir().map(|d| d.join("docmatch").join("config.json"))
	}

	/// Load from [`Self::default_location`] when that file exists, else defaults
	pub fn load_default() -> DocResult<Self> {
		match Self::default_location() {
			Some(path) if path.is_file() => Self::from_json_file(path),
			_ => Ok(Self::default()),
		}
	}

	pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.source_path = Some(path.into());
		self
	}

	pub fn with_destination_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.destination_path = Some(path.into());
		self
	}

	pub fn with_file_number_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.file_number_prefix = prefix.into();
		self
	}

	pub fn with_max_file_name_len(mut self, len: usize) -> Self {
		self.max_file_name_len = len;
		self
	}

	pub fn validate(&self) -> DocResult<()> {
		if self.file_number_prefix.trim().is_empty() {
			return Err(DocError::Config(
				"file_number_prefix must not be empty".to_string(),
			));
		}
		if self.max_file_name_len == 0 || self.max_segment_len == 0 {
			return Err(DocError::Config(
				"name length limits must be greater than 0".to_string(),
			));
		}
		let columns = &self.columns;
		for (label, value) in [
			("folder", &columns.folder),
			("exist", &columns.exist),
			("final_name", &columns.final_name),
			("file_exist", &columns.file_exist),
			("link", &columns.link),
		] {
			if value.trim().is_empty() {
				return Err(DocError::Config(format!(
					"column name {label} must not be empty"
				)));
			}
		}
		Ok(())
	}

	/// Identifier normalized for prefix checks and index lookups
	pub fn normalize_file_number(value: &str) -> String {
		value.trim().to_uppercase()
	}

	/// Whether an identifier passes the prefix filter
	pub fn is_prefixed_file_number(&self, value: &str) -> bool {
		Self::normalize_file_number(value)
			.starts_with(&Self::normalize_file_number(&self.file_number_prefix))
	}
}
