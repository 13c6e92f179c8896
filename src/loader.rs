//! Delimited-table loading.
//!
//! The header row names the fields of every subsequent row. Short rows simply
//! lack the trailing columns; duplicate header names keep the last value.

use crate::errors::AppError;
use crate::models::RawRecord;
use std::fs::File;
use std::path::Path;

/// A loaded table: header order plus one [`RawRecord`] per row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// Loads a CSV table, failing with `MissingSource` or `UnreadableSource`.
pub fn load_table(path: &Path) -> Result<Table, AppError> {
    if !path.exists() {
        return Err(AppError::MissingSource(path.to_path_buf()));
    }

    let unreadable = |reason: String| AppError::UnreadableSource {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| unreadable(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result.map_err(|e| unreadable(format!("record {}: {}", idx, e)))?;
        records.push(RawRecord::from_pairs(
            headers.iter().map(String::as_str).zip(row.iter()),
        ));
    }

    tracing::debug!(
        "Loaded {} rows ({} columns) from {}",
        records.len(),
        headers.len(),
        path.display()
    );

    Ok(Table { headers, records })
}

/// Loads a CSV table's rows, never failing: a missing or unreadable file is
/// logged and yields an empty sequence.
pub fn load_csv(path: &Path) -> Vec<RawRecord> {
    match load_table(path) {
        Ok(table) => table.records,
        Err(AppError::MissingSource(p)) => {
            tracing::warn!("Warning: File not found: {}", p.display());
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("{}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(load_csv(&path).is_empty());
        assert!(matches!(load_table(&path), Err(AppError::MissingSource(_))));
    }

    #[test]
    fn test_header_defines_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "voters.csv",
            b"phoneNumber,ac_no,district\n9999,AC112,Chennai North\n8888,AC7\n",
        );

        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["phoneNumber", "ac_no", "district"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].get_safe("district"), "Chennai North");
        // short row: trailing column absent, read as empty
        assert_eq!(table.records[1].get_safe("ac_no"), "AC7");
        assert_eq!(table.records[1].get_safe("district"), "");
    }

    #[test]
    fn test_quoted_fields_keep_delimiters() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "volunteer.csv",
            b"campaignName,hashtags\n\"Vote, Today\",#tn #vote\n",
        );

        let rows = load_csv(&path);
        assert_eq!(rows[0].get_safe("campaignName"), "Vote, Today");
        assert_eq!(rows[0].get_safe("hashtags"), "#tn #vote");
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "broken.csv", b"a,b\n\xff\xfe,1\n");

        assert!(matches!(
            load_table(&path),
            Err(AppError::UnreadableSource { .. })
        ));
        assert!(load_csv(&path).is_empty());
    }
}
