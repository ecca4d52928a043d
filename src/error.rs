//! Error types for matching, merging and tagging

use std::path::PathBuf;
use thiserror::Error;

/// Error type covering every failure a single user-initiated action can hit.
///
/// Nothing here is fatal to the process: each error is scoped to one action
/// (a merge, an existence check, a copy run) and leaves datasets produced by
/// earlier successful actions untouched.
///
/// ## Error Categories
///
/// ### Malformed input
/// Datasets that cannot take part in an operation:
/// - a required column (`link`, `FILE NUMBER`, `Folder`) is missing
/// - a dataset has no headers at all
/// - an identifier cannot be turned into a usable name
///
/// ### Provider failures
/// Directory/file access reported by a [`crate::provider::DirectoryProvider`].
/// `NotFound`-class provider errors are normally absorbed by the matcher and
/// only surface here when a caller asked for one specific entry.
///
/// ### Codec and index failures
/// CSV parsing, polars index construction, JSON configuration.
///
/// ```rust
/// use docmatch::{DocError, TabularDataset, merge_datasets, NamedDataset};
///
/// let a = TabularDataset::new(vec!["Title".into()], vec![]).unwrap();
/// let b = TabularDataset::new(vec!["Link".into()], vec![]).unwrap();
/// match merge_datasets(NamedDataset::new("a.csv", &a), NamedDataset::new("b.csv", &b)) {
///     Err(DocError::MissingColumn { dataset, column }) => {
///         assert_eq!(dataset, "a.csv");
///         assert_eq!(column, "link");
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DocError {
	/// Local filesystem I/O outside of a provider call
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// CSV codec failures
	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),

	/// Polars errors while building or querying a file index
	#[error("Polars error: {0}")]
	Polars(#[from] polars::error::PolarsError),

	/// Configuration file could not be parsed
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Directory/file provider failure
	#[error("Provider error: {0}")]
	Provider(#[from] ProviderError),

	/// A dataset lacks a column the operation depends on
	#[error("Dataset {dataset} has no \"{column}\" column")]
	MissingColumn { dataset: String, column: String },

	/// A dataset has no header row
	#[error("Dataset {dataset} has no headers")]
	EmptyHeaders { dataset: String },

	/// Rows whose width differs from the header list
	#[error("Row {row} has {found} cells, expected {expected}")]
	RowWidth {
		row: usize,
		found: usize,
		expected: usize,
	},

	/// Derived column values that do not cover every row
	#[error("Column \"{column}\" has {found} values for {expected} rows")]
	ColumnLength {
		column: String,
		found: usize,
		expected: usize,
	},

	/// Header names that collide after normalization
	#[error("Duplicate header \"{header}\"")]
	DuplicateHeader { header: String },

	/// An identifier that cannot be turned into a file name
	#[error("Invalid identifier \"{value}\": {reason}")]
	InvalidIdentifier { value: String, reason: String },

	/// Configuration validation errors
	#[error("Configuration error: {0}")]
	Config(String),
}

impl DocError {
	/// True when the underlying cause is a permission refusal.
	pub fn is_permission_denied(&self) -> bool {
		match self {
			DocError::Provider(ProviderError::PermissionDenied { .. }) => true,
			DocError::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
			_ => false,
		}
	}
}

/// Errors reported by directory/file providers
#[derive(Debug, Error)]
pub enum ProviderError {
	#[error("Entry not found: {name}")]
	NotFound { name: String },

	#[error("Invalid entry name: {name}")]
	InvalidName { name: String },

	#[error("Entry {name} has the wrong kind")]
	TypeMismatch { name: String },

	#[error("Permission denied: {path}")]
	PermissionDenied { path: PathBuf },

	#[error("Provider I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl ProviderError {
	/// Lookup failures the matcher treats as "try the next candidate".
	pub fn is_not_found_class(&self) -> bool {
		matches!(
			self,
			ProviderError::NotFound { .. }
				| ProviderError::InvalidName { .. }
				| ProviderError::TypeMismatch { .. }
		)
	}

	/// Map an io error for `path`, keeping the kinds callers branch on.
	pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		match err.kind() {
			std::io::ErrorKind::NotFound => ProviderError::NotFound {
				name: path.to_string_lossy().into_owned(),
			},
			std::io::ErrorKind::PermissionDenied => ProviderError::PermissionDenied { path },
			_ => ProviderError::Io(err),
		}
	}
}

/// Convenience alias used throughout the crate.
pub type DocResult<T> = Result<T, DocError>;

/// Convenience alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;
