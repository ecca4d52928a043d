//! Derived columns for spreadsheet and CSV rows
//!
//! Every tagger follows one rule: add the column at a fixed position the
//! first time, refresh its cells in place on later runs, and return a new
//! dataset instead of touching the input.

pub mod existence;
pub mod final_name;
pub mod hierarchy;

pub use existence::{
	ExistStats, ExistenceReport, exist_stats, tag_file_number_existence, tag_title_existence,
};
pub use final_name::{add_final_name_column, compose_final_name};
pub use hierarchy::{
	add_folder_column, build_hierarchical_path, carry_forward_folders, compare_hierarchy,
	extract_folder, extract_hierarchy_code, folder_tags, tag_depth, transform_hierarchy_folder,
};
