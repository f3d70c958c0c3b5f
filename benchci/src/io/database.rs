//! `database.json`: the flat record array the report is built from.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, error, instrument};

use crate::core::record::EvaluationRecord;

/// Load the record array, failing on missing or malformed files.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_database(path: &Path) -> Result<Vec<EvaluationRecord>> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let records: Vec<EvaluationRecord> =
        serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    debug!(records = records.len(), "database loaded");
    Ok(records)
}

/// Load the record array; on any failure log it and show nothing.
pub fn load_database_or_empty(path: &Path) -> Vec<EvaluationRecord> {
    match load_database(path) {
        Ok(records) => records,
        Err(err) => {
            error!(path = %path.display(), error = ?err, "error loading data");
            Vec::new()
        }
    }
}

/// Write the record array as pretty JSON with a trailing newline.
pub fn save_database(path: &Path, records: &[EvaluationRecord]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut payload = serde_json::to_string_pretty(records).context("serialize database")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), records = records.len(), "database saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_records;

    #[test]
    fn save_then_load_preserves_records() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("reports/database.json");
        let records = sample_records();
        save_database(&path, &records).expect("save");
        let loaded = load_database(&path).expect("load");
        assert_eq!(loaded, records);
    }

    #[test]
    fn missing_file_yields_empty_view() {
        let temp = tempfile::tempdir().expect("tempdir");
        let records = load_database_or_empty(&temp.path().join("database.json"));
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_file_yields_empty_view() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("database.json");
        fs::write(&path, "{\"not\": \"an array\"}").expect("write");
        assert!(load_database(&path).is_err());
        assert!(load_database_or_empty(&path).is_empty());
    }
}
