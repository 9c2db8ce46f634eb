//! csvmerge-core: Core library for merging delimited text files
//!
//! This library provides functionality to:
//! - Resolve file and directory arguments into an ordered input list
//! - Sniff each file's delimiter and quoting dialect from its header line
//! - Build the output header as the ordered union of all input headers,
//!   with optional header renaming
//! - Pick the output delimiter from an explicit override or a majority
//!   vote over the inputs
//! - Stream every input row into one output file under the unified header

pub mod dialect;
pub mod error;
pub mod header;
pub mod merger;
pub mod resolver;

pub use dialect::{
    parse_delimiter_arg, printable_delimiter, resolve_delimiter, sniff_dialect, Dialect,
};
pub use error::{Error, Result};
pub use header::{unify_headers, HeaderPlan, RenameMap, SourceFile, FILENAME_COLUMN};
pub use merger::{merge, MergeOptions, MergeSummary};
pub use resolver::resolve_inputs;
