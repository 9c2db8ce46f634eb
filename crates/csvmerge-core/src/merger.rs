//! Two-pass merge engine: header pass first, then streaming row transcription

use crate::dialect::{printable_delimiter, resolve_delimiter, strip_bom};
use crate::error::{Error, Result};
use crate::header::{unify_headers, HeaderPlan, RenameMap, FILENAME_COLUMN};
use crate::resolver::resolve_inputs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output files carry a UTF-8 BOM whether or not the inputs had one
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Configuration for one merge run
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Files or directories to merge, in order
    pub inputs: Vec<PathBuf>,
    /// Output file path, created fresh on every run
    pub output: PathBuf,
    /// Explicit output delimiter; picked from the inputs when None
    pub delimiter: Option<u8>,
    /// Header rename rules
    pub renames: RenameMap,
    /// Prepend the provenance column carrying each row's source file
    pub include_filenames: bool,
}

/// Summary of a completed merge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Number of input files merged
    pub files_merged: usize,
    /// Number of data rows written (header row excluded)
    pub rows_written: u64,
    /// Where the merged file was written
    pub output: PathBuf,
    /// Delimiter used in the output file
    pub delimiter: u8,
    /// Number of distinct rename rules that fired
    pub renames_applied: usize,
}

/// Merge the configured inputs into one unified output file.
///
/// Runs the header pass over every file, resolves the output delimiter,
/// then streams every data row into the output under the unified header.
pub fn merge(options: &MergeOptions) -> Result<MergeSummary> {
    let files = resolve_inputs(&options.inputs)?;
    let plan = unify_headers(&files, &options.renames, options.include_filenames)?;
    let delimiter = resolve_delimiter(options.delimiter, &plan.delimiter_tally);

    let rows_written = transcribe_rows(
        &plan,
        delimiter,
        &options.renames,
        options.include_filenames,
        &options.output,
    )?;

    info!(
        "merged {} files to {}, replaced {} headers",
        plan.sources.len(),
        options.output.display(),
        plan.renames_fired
    );
    debug!(
        "delimiter in the merged file: {}",
        printable_delimiter(delimiter)
    );

    Ok(MergeSummary {
        files_merged: plan.sources.len(),
        rows_written,
        output: options.output.clone(),
        delimiter,
        renames_applied: plan.renames_fired,
    })
}

/// Stream every source file's data rows into the output file.
///
/// Each row is placed by unified column position; columns the source file
/// does not have stay empty. Row order within a file and file order across
/// the run are preserved.
fn transcribe_rows(
    plan: &HeaderPlan,
    delimiter: u8,
    renames: &RenameMap,
    include_filenames: bool,
    output: &Path,
) -> Result<u64> {
    let file = File::create(output).map_err(|e| Error::FileWrite {
        path: output.to_path_buf(),
        source: e,
    })?;
    let mut sink = BufWriter::new(file);
    sink.write_all(UTF8_BOM).map_err(|e| Error::FileWrite {
        path: output.to_path_buf(),
        source: e,
    })?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(sink);
    writer.write_record(&plan.columns).map_err(|e| Error::Csv {
        path: output.to_path_buf(),
        source: e,
    })?;

    let column_index: HashMap<&str, usize> = plan
        .columns
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();
    let filename_index = if include_filenames {
        column_index.get(FILENAME_COLUMN).copied()
    } else {
        None
    };
    let width = plan.columns.len();

    let mut rows_written = 0u64;
    for source in &plan.sources {
        let file = File::open(&source.path).map_err(|e| Error::FileRead {
            path: source.path.clone(),
            source: e,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(source.dialect.delimiter)
            .quote(source.dialect.quote)
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(file));

        // Same rename substitution as the header pass, applied to the
        // field list positionally
        let headers = reader.headers().map_err(|e| Error::Csv {
            path: source.path.clone(),
            source: e,
        })?;
        let positions: Vec<Option<usize>> = headers
            .iter()
            .map(|cell| {
                let cell = strip_bom(cell);
                let name = renames.target(cell).unwrap_or(cell);
                column_index.get(name).copied()
            })
            .collect();

        info!("writing {}", source.path.display());
        let filename = source.path.display().to_string();

        for result in reader.records() {
            let record = result.map_err(|e| Error::Csv {
                path: source.path.clone(),
                source: e,
            })?;

            let mut row: Vec<&str> = vec![""; width];
            for (index, field) in record.iter().enumerate() {
                // Fields beyond this file's own header are dropped
                if let Some(Some(unified)) = positions.get(index) {
                    row[*unified] = field;
                }
            }
            if let Some(index) = filename_index {
                row[index] = &filename;
            }

            writer.write_record(&row).map_err(|e| Error::Csv {
                path: output.to_path_buf(),
                source: e,
            })?;
            rows_written += 1;
        }
    }

    writer.flush().map_err(|e| Error::FileWrite {
        path: output.to_path_buf(),
        source: e,
    })?;
    Ok(rows_written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_merge_summary_counts() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, "id,name\n1,x\n2,y\n").unwrap();
        fs::write(&b, "id,city\n3,rome\n").unwrap();

        let options = MergeOptions {
            inputs: vec![a, b],
            output: dir.path().join("out.csv"),
            delimiter: None,
            renames: RenameMap::default(),
            include_filenames: false,
        };
        let summary = merge(&options).unwrap();

        assert_eq!(summary.files_merged, 2);
        assert_eq!(summary.rows_written, 3);
        assert_eq!(summary.delimiter, b',');
        assert_eq!(summary.renames_applied, 0);
    }

    #[test]
    fn test_merge_no_inputs_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.csv");

        let options = MergeOptions {
            inputs: vec![dir.path().join("nothing-here")],
            output: output.clone(),
            delimiter: None,
            renames: RenameMap::default(),
            include_filenames: false,
        };
        let result = merge(&options);

        assert!(matches!(result, Err(Error::NoInputFiles)));
        assert!(!output.exists());
    }
}
