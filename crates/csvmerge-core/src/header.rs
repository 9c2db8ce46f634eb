//! Header pass: dialect caching, rename mapping, and header-union building

use crate::dialect::{sniff_dialect, strip_bom, Dialect};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the reserved provenance column
pub const FILENAME_COLUMN: &str = "filename";

/// User-supplied header renames, applied identically in both passes
#[derive(Debug, Clone, Default)]
pub struct RenameMap {
    map: HashMap<String, String>,
}

impl RenameMap {
    /// Parse `source=target` rules.
    ///
    /// Every malformed rule is collected so the error names all of them
    /// at once. Two sources mapping to the same target is allowed and
    /// merges those columns in the output.
    pub fn parse<S: AsRef<str>>(rules: &[S]) -> Result<Self> {
        let mut map = HashMap::new();
        let mut invalid = Vec::new();

        for rule in rules {
            let rule = rule.as_ref();
            match rule.split_once('=') {
                Some((source, target))
                    if !source.is_empty() && !target.is_empty() && !target.contains('=') =>
                {
                    map.insert(source.to_string(), target.to_string());
                }
                _ => invalid.push(rule),
            }
        }

        if !invalid.is_empty() {
            return Err(Error::InvalidRenameRule(invalid.join(", ")));
        }
        Ok(Self { map })
    }

    /// Replacement name for a header cell, if one is configured
    pub fn target(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// An input file with the dialect detected during the header pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Dialect reused by the data pass, so both passes agree
    pub dialect: Dialect,
}

/// Everything the header pass produces for the data pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderPlan {
    /// Unified output columns, first-seen order, post-rename, no duplicates
    pub columns: Vec<String>,
    /// Input files with their cached dialects, in resolver order
    pub sources: Vec<SourceFile>,
    /// (delimiter, file count) pairs in first-encountered order
    pub delimiter_tally: Vec<(u8, usize)>,
    /// Number of distinct rename rules that fired at least once
    pub renames_fired: usize,
}

/// Scan every file's header once: sniff and cache its dialect, tally the
/// delimiter, and fold its renamed header names into the unified header.
pub fn unify_headers(
    files: &[PathBuf],
    renames: &RenameMap,
    include_filenames: bool,
) -> Result<HeaderPlan> {
    let mut columns: Vec<String> = if include_filenames {
        vec![FILENAME_COLUMN.to_string()]
    } else {
        Vec::new()
    };
    let mut seen: HashSet<String> = columns.iter().cloned().collect();
    let mut sources = Vec::with_capacity(files.len());
    let mut delimiter_tally: Vec<(u8, usize)> = Vec::new();
    let mut fired: HashSet<String> = HashSet::new();

    for path in files {
        let line = read_header_line(path)?;
        let dialect = sniff_dialect(&line);

        match delimiter_tally
            .iter_mut()
            .find(|(delimiter, _)| *delimiter == dialect.delimiter)
        {
            Some((_, count)) => *count += 1,
            None => delimiter_tally.push((dialect.delimiter, 1)),
        }

        info!("reading {}", path.display());

        for cell in parse_header_cells(&line, dialect, path)? {
            let name = if let Some(target) = renames.target(&cell) {
                debug!("replacing header {} with {}", cell, target);
                let target = target.to_string();
                fired.insert(cell);
                target
            } else {
                cell
            };
            if seen.insert(name.clone()) {
                columns.push(name);
            }
        }

        sources.push(SourceFile {
            path: path.clone(),
            dialect,
        });
    }

    Ok(HeaderPlan {
        columns,
        sources,
        delimiter_tally,
        renames_fired: fired.len(),
    })
}

/// Read a file's first line, stripped of a leading BOM and the line break.
/// A file with nothing to read has no header and aborts the run.
fn read_header_line(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);

    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    if bytes_read == 0 {
        return Err(Error::EmptyHeader {
            path: path.to_path_buf(),
        });
    }

    Ok(strip_bom(line.trim_end_matches(['\r', '\n'])).to_string())
}

/// Split a header line into cells using the sniffed dialect
fn parse_header_cells(line: &str, dialect: Dialect, path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(dialect.delimiter)
        .quote(dialect.quote)
        .has_headers(false)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    let found = reader.read_record(&mut record).map_err(|e| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;
    if !found {
        // Blank header line: one nameless column, per the degenerate-sniff rule
        return Ok(vec![String::new()]);
    }

    Ok(record.iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_rename_map_parse() {
        let map = RenameMap::parse(&["old=new", "a=b"]).unwrap();
        assert_eq!(map.target("old"), Some("new"));
        assert_eq!(map.target("a"), Some("b"));
        assert_eq!(map.target("missing"), None);
    }

    #[test]
    fn test_rename_map_rejects_malformed() {
        for rule in ["noequals", "=target", "source=", "a=b=c", ""] {
            let result = RenameMap::parse(&[rule]);
            assert!(
                matches!(result, Err(Error::InvalidRenameRule(_))),
                "rule {rule:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rename_map_error_names_all_bad_rules() {
        let err = RenameMap::parse(&["ok=fine", "bad", "also=bad=bad"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad"));
        assert!(message.contains("also=bad=bad"));
    }

    #[test]
    fn test_unify_union_in_first_seen_order() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.csv", "id,name\n1,x\n");
        let b = write_file(dir.path(), "b.csv", "id,city,name\n2,rome,y\n");

        let plan = unify_headers(&[a, b], &RenameMap::default(), false).unwrap();
        assert_eq!(plan.columns, vec!["id", "name", "city"]);
    }

    #[test]
    fn test_unify_rename_collision_merges_columns() {
        let dir = tempdir().unwrap();
        let first = write_file(dir.path(), "first.csv", "a,c\n1,2\n");
        let second = write_file(dir.path(), "second.csv", "b,d\n3,4\n");

        let renames = RenameMap::parse(&["a=b"]).unwrap();
        let plan = unify_headers(&[first, second], &renames, false).unwrap();
        assert_eq!(plan.columns, vec!["b", "c", "d"]);
        assert_eq!(plan.renames_fired, 1);
    }

    #[test]
    fn test_unify_counts_distinct_fired_rules() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.csv", "x,y\n1,2\n");
        let b = write_file(dir.path(), "b.csv", "x,z\n3,4\n");

        // "x" fires in both files but counts once; "unused" never fires
        let renames = RenameMap::parse(&["x=renamed", "unused=gone"]).unwrap();
        let plan = unify_headers(&[a, b], &renames, false).unwrap();
        assert_eq!(plan.renames_fired, 1);
        assert_eq!(plan.columns, vec!["renamed", "y", "z"]);
    }

    #[test]
    fn test_unify_filename_column_first() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.csv", "id,name\n1,x\n");

        let plan = unify_headers(&[a], &RenameMap::default(), true).unwrap();
        assert_eq!(plan.columns, vec![FILENAME_COLUMN, "id", "name"]);
    }

    #[test]
    fn test_unify_filename_column_absorbs_data_column() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.csv", "filename,id\nx.bin,1\n");

        let plan = unify_headers(&[a], &RenameMap::default(), true).unwrap();
        assert_eq!(plan.columns, vec![FILENAME_COLUMN, "id"]);
    }

    #[test]
    fn test_unify_tallies_delimiters_in_order() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.csv", "x;y\n1;2\n");
        let b = write_file(dir.path(), "b.csv", "x,y\n1,2\n");
        let c = write_file(dir.path(), "c.csv", "x;z\n3;4\n");

        let plan = unify_headers(&[a, b, c], &RenameMap::default(), false).unwrap();
        assert_eq!(plan.delimiter_tally, vec![(b';', 2), (b',', 1)]);
    }

    #[test]
    fn test_unify_caches_dialect_per_file() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.csv", "x\ty\n1\t2\n");
        let b = write_file(dir.path(), "b.csv", "x,y\n1,2\n");

        let plan = unify_headers(&[a, b], &RenameMap::default(), false).unwrap();
        assert_eq!(plan.sources[0].dialect.delimiter, b'\t');
        assert_eq!(plan.sources[1].dialect.delimiter, b',');
    }

    #[test]
    fn test_unify_strips_input_bom() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.csv", "\u{feff}id,name\n1,x\n");

        let plan = unify_headers(&[a], &RenameMap::default(), false).unwrap();
        assert_eq!(plan.columns, vec!["id", "name"]);
    }

    #[test]
    fn test_unify_empty_file_aborts() {
        let dir = tempdir().unwrap();
        let good = write_file(dir.path(), "good.csv", "id\n1\n");
        let empty = write_file(dir.path(), "empty.csv", "");

        let result = unify_headers(&[good, empty], &RenameMap::default(), false);
        assert!(matches!(result, Err(Error::EmptyHeader { .. })));
    }

    #[test]
    fn test_unify_quoted_headers() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.csv", "\"first, name\",age\nx,1\n");

        let plan = unify_headers(&[a], &RenameMap::default(), false).unwrap();
        assert_eq!(plan.columns, vec!["first, name", "age"]);
        assert_eq!(plan.sources[0].dialect.delimiter, b',');
    }
}
