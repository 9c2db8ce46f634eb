//! Delimiter sniffing and output delimiter selection

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Delimiters considered by the sniffer, in preference order
const CANDIDATES: &[u8] = &[b',', b';', b'\t', b'|'];

/// The delimiter and quoting convention detected for one input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    /// Field delimiter
    pub delimiter: u8,
    /// Quote character (double-quote enclosure, doubled-quote escaping)
    pub quote: u8,
}

impl Dialect {
    fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            quote: b'"',
        }
    }
}

/// Infer a file's dialect from its header line.
///
/// Each candidate delimiter is scored by how often it occurs outside
/// double quotes; the highest count wins, ties broken by candidate order.
/// A header containing no candidate at all is treated as a single field
/// under the comma default.
pub fn sniff_dialect(header_line: &str) -> Dialect {
    let line = strip_bom(header_line);

    let mut best: Option<(u8, usize)> = None;
    for &candidate in CANDIDATES {
        let count = count_unquoted(line, candidate);
        if count == 0 {
            continue;
        }
        if best.is_none_or(|(_, n)| count > n) {
            best = Some((candidate, count));
        }
    }

    Dialect::new(best.map_or(b',', |(delimiter, _)| delimiter))
}

/// Count occurrences of `target` outside double-quoted spans
fn count_unquoted(line: &str, target: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == target && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Strip a leading UTF-8 byte-order mark
pub(crate) fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{feff}').unwrap_or(s)
}

/// Parse the CLI delimiter override.
///
/// The token "t" selects TAB; anything else must be exactly one ASCII
/// character.
pub fn parse_delimiter_arg(arg: &str) -> Result<u8> {
    if arg == "t" {
        return Ok(b'\t');
    }
    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(Error::InvalidDelimiter(arg.to_string())),
    }
}

/// Pick the output delimiter: the explicit override if given, otherwise
/// the delimiter observed in the most input files. Ties keep the
/// first-encountered delimiter, so the choice is deterministic for a
/// given input order.
pub fn resolve_delimiter(explicit: Option<u8>, tally: &[(u8, usize)]) -> u8 {
    if let Some(delimiter) = explicit {
        return delimiter;
    }

    let mut best: Option<(u8, usize)> = None;
    for &(delimiter, count) in tally {
        if best.is_none_or(|(_, n)| count > n) {
            best = Some((delimiter, count));
        }
    }
    best.map_or(b',', |(delimiter, _)| delimiter)
}

/// Render a delimiter for log output; TAB would otherwise be invisible
pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "TAB".to_string(),
        other => (other as char).to_string(),
    }
}
