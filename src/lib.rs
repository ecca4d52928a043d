//! # docmatch
//!
//! Matching spreadsheet and CSV rows against the files they describe.
//!
//! Rows carry titles, links or file-number identifiers; the library derives
//! candidate file names, searches directory trees through a
//! [`DirectoryProvider`], tags rows with existence flags, hierarchy folders
//! and final names, merges CSV files by link and copies matched files out.
//!
//! ```rust
//! use docmatch::codec::parse_csv;
//! use docmatch::columns::extract_title;
//! use docmatch::normalize::normalize_file_name_key;
//!
//! let ds = parse_csv("Link;Tytuł\nhttps://youtu.be/a;Odc. 1: Début\n").unwrap();
//! let title = extract_title(ds.headers(), &ds.rows()[0], None).unwrap();
//! assert_eq!(normalize_file_name_key(&format!("{title}.txt")), "odc1debut");
//! ```

pub mod candidates;
pub mod codec;
pub mod columns;
pub mod config;
pub mod copy;
pub mod dataset;
pub mod error;
pub mod index;
pub mod matcher;
pub mod merge;
pub mod normalize;
pub mod provider;
pub mod search;
pub mod session;
pub mod tagging;

pub use candidates::{FileCandidateSet, MatchTargets};
pub use config::MatchConfig;
pub use copy::{CopyFailure, CopyReport, PdfCopyTask};
pub use dataset::{ColumnPlacement, ColumnUpdate, TabularDataset};
pub use error::{DocError, DocResult, ProviderError, ProviderResult};
pub use index::FileIndex;
pub use matcher::{MatchOutcome, MatchResult, TreeMatcher};
pub use merge::{MergeOutcome, MergeSide, NamedDataset, merge_datasets, merge_datasets_on};
pub use provider::{DirectoryProvider, LocalFs, MemoryFs};
pub use session::Session;
