//! csvmerge CLI
//!
//! Command-line tool for merging delimited text files into one unified file.

mod logging;

use clap::Parser;
use csvmerge_core::{merge, parse_delimiter_arg, MergeOptions, RenameMap};
use std::path::PathBuf;
use tracing::error;

/// Merge delimited text files together.
///
/// Input encoding may be UTF-8 with or without BOM; the output is UTF-8
/// with BOM. The headers are combined, so the output contains every
/// header field from the input files.
#[derive(Parser)]
#[command(name = "csvmerge", version)]
struct Cli {
    /// Files or directories containing the delimited files
    #[arg(default_value = "data")]
    path: Vec<PathBuf>,

    /// Name of the merged output file
    #[arg(short, long, default_value = "mergedfile.csv")]
    out: PathBuf,

    /// Delimiter of the output file; "t" means TAB. Defaults to the
    /// delimiter most used in the input files
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Replace a header with another: source=target. May be repeated
    #[arg(short = 'r', long = "replace-header")]
    replace_header: Vec<String>,

    /// Log more about what is happening
    #[arg(short, long)]
    verbose: bool,

    /// Include the input filename as the first column of each row
    #[arg(short, long)]
    include_filenames: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> csvmerge_core::Result<()> {
    // Configuration errors surface before any file is opened
    let delimiter = cli
        .delimiter
        .as_deref()
        .map(parse_delimiter_arg)
        .transpose()?;
    let renames = RenameMap::parse(&cli.replace_header)?;

    merge(&MergeOptions {
        inputs: cli.path,
        output: cli.out,
        delimiter,
        renames,
        include_filenames: cli.include_filenames,
    })?;

    Ok(())
}
