//! Shared append/read plumbing for both CSV ledgers.
//!
//! Appends are open-append-flush-close per row so a crash between polls
//! never holds a ledger open. Readers tolerate a truncated trailing line:
//! malformed rows are skipped with a warning instead of failing the whole
//! read, since the rest of the file is still good history.

use std::fs::{self, OpenOptions};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::warn;

use crate::entry::LedgerEntry;
use crate::error::LedgerError;

pub(crate) fn append_row(
    path: &Path,
    headers: &[&str],
    fields: &[String],
) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if needs_header {
        writer.write_record(headers)?;
    }
    writer.write_record(fields)?;
    writer.flush()?;
    Ok(())
}

/// Reads every parseable row, sorted by timestamp.
pub(crate) fn read_rows(path: &Path, has_month: bool) -> Result<Vec<LedgerEntry>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut entries = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                warn!(path = %path.display(), line, error = %error, "Skipping unreadable ledger row");
                continue;
            }
        };
        match LedgerEntry::parse_record(&record, has_month) {
            Ok(entry) => entries.push(entry),
            Err(error) => {
                warn!(path = %path.display(), line, error = %error, "Skipping malformed ledger row");
            }
        }
    }

    entries.sort_by_key(|e| e.timestamp);
    Ok(entries)
}
