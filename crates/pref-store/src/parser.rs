//! Parsers and writers for the boundary file formats.
//!
//! Two tab-delimited formats cross the boundary:
//! - preference files: `user \t item \t preference \t timestamp`, one
//!   line per (user, item, timestamp) observation, `-1` when the pair
//!   has no timestamp
//! - prediction files: `user \t item \t score`
//!
//! Malformed lines surface as `StoreError::ParseError` with file, line
//! and reason; `read_preferences_lossy` instead skips bad rows with a
//! warning so callers can choose skip-and-log over abort.

use crate::error::{Result, StoreError};
use crate::types::PreferenceStore;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::warn;

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|_| StoreError::FileNotFound {
        path: path.display().to_string(),
    })?;
    Ok(BufReader::new(file))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn parse_field<T: std::str::FromStr>(
    value: &str,
    field: &str,
    file: &str,
    line_no: usize,
) -> Result<T> {
    value.parse().map_err(|_| StoreError::ParseError {
        file: file.to_string(),
        line: line_no,
        reason: format!("Invalid {}: {}", field, value),
    })
}

/// Parse one preference line into (user, item, score, timestamp).
fn parse_preference_line(
    line: &str,
    file: &str,
    line_no: usize,
) -> Result<(u64, u64, f64, Option<i64>)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 4 {
        return Err(StoreError::FieldCountMismatch {
            expected: 4,
            found: fields.len(),
            line: line_no,
        });
    }
    let user = parse_field(fields[0], "user", file, line_no)?;
    let item = parse_field(fields[1], "item", file, line_no)?;
    let score = parse_field(fields[2], "preference", file, line_no)?;
    let timestamp: i64 = parse_field(fields[3], "timestamp", file, line_no)?;
    let timestamp = if timestamp == -1 { None } else { Some(timestamp) };
    Ok((user, item, score, timestamp))
}

/// Read a preference file, failing on the first malformed line.
pub fn read_preferences(path: &Path) -> Result<PreferenceStore> {
    let file = file_name(path);
    let mut store = PreferenceStore::new();
    for (idx, line) in open(path)?.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (user, item, score, timestamp) = parse_preference_line(trimmed, &file, idx + 1)?;
        store.add_preference(user, item, score);
        if let Some(t) = timestamp {
            store.add_timestamp(user, item, t);
        }
    }
    Ok(store)
}

/// Read a preference file, skipping malformed lines with a warning.
///
/// Returns the store and the number of skipped lines so a single bad
/// row never silently corrupts aggregate counts.
pub fn read_preferences_lossy(path: &Path) -> Result<(PreferenceStore, usize)> {
    let file = file_name(path);
    let mut store = PreferenceStore::new();
    let mut skipped = 0;
    for (idx, line) in open(path)?.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_preference_line(trimmed, &file, idx + 1) {
            Ok((user, item, score, timestamp)) => {
                store.add_preference(user, item, score);
                if let Some(t) = timestamp {
                    store.add_timestamp(user, item, t);
                }
            }
            Err(e) => {
                warn!("Skipping malformed line: {}", e);
                skipped += 1;
            }
        }
    }
    Ok((store, skipped))
}

/// Read a prediction file (`user \t item \t score`), failing on the
/// first malformed line.
pub fn read_predictions(path: &Path) -> Result<PreferenceStore> {
    let file = file_name(path);
    let mut store = PreferenceStore::new();
    for (idx, line) in open(path)?.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split('\t').collect();
        if fields.len() != 3 {
            return Err(StoreError::FieldCountMismatch {
                expected: 3,
                found: fields.len(),
                line: idx + 1,
            });
        }
        let user = parse_field(fields[0], "user", &file, idx + 1)?;
        let item = parse_field(fields[1], "item", &file, idx + 1)?;
        let score = parse_field(fields[2], "score", &file, idx + 1)?;
        store.add_preference(user, item, score);
    }
    Ok(store)
}

/// Write a store as a preference file: one line per (user, item,
/// timestamp) observation, `-1` for pairs without timestamps.
pub fn write_preferences<W: Write>(store: &PreferenceStore, w: &mut W) -> Result<()> {
    for (&user, items) in store.user_item_preferences() {
        for (&item, &score) in items {
            let timestamps = store.timestamps(user, item);
            if timestamps.is_empty() {
                writeln!(w, "{}\t{}\t{}\t-1", user, item, score)?;
            } else {
                for &t in timestamps {
                    writeln!(w, "{}\t{}\t{}\t{}", user, item, score, t)?;
                }
            }
        }
    }
    Ok(())
}
