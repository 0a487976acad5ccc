// ABOUTME: Vocabulary ingestion for the vocab-slides application
// ABOUTME: Reads word lists from CSV files or pasted terminal input

use crate::errors::{Result, VocabError};
use crate::utils::validate_file_exists;
use csv::{ReaderBuilder, Trim};
use log::{debug, info};
use std::path::Path;

/// A single vocabulary item: source text plus an optional translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub source_text: String,
    pub target_text: Option<String>,
}

impl VocabularyEntry {
    pub fn new(source_text: impl Into<String>, target_text: Option<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Read vocabulary entries from a CSV file.
///
/// The first column holds the source text and the second column an optional
/// translation. Rows with an empty first column are skipped. Header rows are
/// not expected; a file consisting only of blank rows yields an empty list.
pub fn read_vocab_csv(path: &Path) -> Result<Vec<VocabularyEntry>> {
    validate_file_exists(path)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let source = record.get(0).unwrap_or("").trim();
        if source.is_empty() {
            continue;
        }
        let target = record.get(1).map(|t| t.trim().to_string());
        entries.push(VocabularyEntry::new(source, target));
    }

    info!("Read {} vocabulary entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Parse a single pasted line into an entry.
///
/// The line is split on the first comma; text after it becomes the
/// translation. A line without a comma becomes a source-only entry.
/// Blank lines yield None.
pub fn parse_vocab_line(line: &str) -> Option<VocabularyEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(',') {
        Some((source, target)) => {
            let source = source.trim();
            if source.is_empty() {
                return None;
            }
            Some(VocabularyEntry::new(source, Some(target.trim().to_string())))
        }
        None => Some(VocabularyEntry::new(line, None)),
    }
}

/// Parse a batch of pasted lines, stopping at the end sentinel if present
pub fn parse_vocab_lines<I, S>(lines: I) -> Vec<VocabularyEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();
    for line in lines {
        let line = line.as_ref();
        if is_end_sentinel(line) {
            break;
        }
        if let Some(entry) = parse_vocab_line(line) {
            entries.push(entry);
        } else {
            debug!("Skipping blank input line");
        }
    }
    entries
}

/// Check whether a pasted line terminates input
pub fn is_end_sentinel(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("done")
}

/// Fail fast when there is nothing to build a deck from
pub fn ensure_not_empty(entries: &[VocabularyEntry]) -> Result<()> {
    if entries.is_empty() {
        return Err(VocabError::VocabularyError(
            "No vocabulary entries provided".to_string(),
        ));
    }
    Ok(())
}
