//! Log compaction.
//!
//! Full logs carry every sample and reduction, which makes them too large to
//! check in. Compaction drops that content in place, keeps the metrics, and
//! marks the file with a `_compat` suffix so it is processed only once. The
//! dropped content cannot be recovered.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tracing::{info, instrument, warn};

use crate::io::logs::list_log_files;

/// Marker inserted before the extension of compacted logs.
pub const COMPAT_MARKER: &str = "_compat";

/// Top-level keys removed from each log.
const BULKY_KEYS: [&str; 2] = ["samples", "reductions"];

/// Compact every log in `dir` that is not already compacted.
///
/// Returns the paths of the newly written `_compat` files.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn compact_logs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for path in list_log_files(dir)? {
        if is_compacted(&path) {
            continue;
        }
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let mut document: Value = match serde_json::from_str(&contents) {
            Ok(document) => document,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not decode JSON, skipping");
                continue;
            }
        };

        strip_bulky_content(&mut document);
        sort_keys(&mut document);
        fs::write(&path, to_pretty_json(&document)?)
            .with_context(|| format!("write {}", path.display()))?;

        let target = compat_path(&path);
        fs::rename(&path, &target)
            .with_context(|| format!("rename {} to {}", path.display(), target.display()))?;
        info!(source = %path.display(), target = %target.display(), "log compacted");
        written.push(target);
    }
    Ok(written)
}

fn is_compacted(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.contains(COMPAT_MARKER))
}

fn strip_bulky_content(document: &mut Value) {
    if let Some(object) = document.as_object_mut() {
        for key in BULKY_KEYS {
            object.remove(key);
        }
    }
}

/// Reorder every object's keys lexicographically, recursively.
fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(object) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(object).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (_, child) in &mut entries {
                sort_keys(child);
            }
            *object = entries.into_iter().collect();
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// `results.json` -> `results_compat.json`.
fn compat_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}{COMPAT_MARKER}.{}", ext.to_string_lossy()),
        None => format!("{stem}{COMPAT_MARKER}"),
    };
    path.with_file_name(file_name)
}

/// Four-space indent.
fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .context("serialize compacted log")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compat_path_inserts_marker() {
        assert_eq!(
            compat_path(Path::new("/logs/results_a_mmlu.json")),
            PathBuf::from("/logs/results_a_mmlu_compat.json")
        );
    }

    #[test]
    fn compacts_and_renames_once() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = json!({
            "eval": {"task": "mmlu"},
            "results": {"scores": []},
            "samples": [{"input": "q"}],
            "reductions": [{"scorer": "s"}]
        });
        fs::write(temp.path().join("run.json"), log.to_string()).expect("write log");
        fs::write(temp.path().join("broken.json"), "{").expect("write broken");

        let written = compact_logs(temp.path()).expect("compact");
        assert_eq!(written, vec![temp.path().join("run_compat.json")]);
        assert!(!temp.path().join("run.json").exists());
        assert!(temp.path().join("broken.json").exists());

        let contents = fs::read_to_string(&written[0]).expect("read compacted");
        let compacted: Value = serde_json::from_str(&contents).expect("parse compacted");
        assert!(compacted.get("samples").is_none());
        assert!(compacted.get("reductions").is_none());
        assert_eq!(compacted["eval"]["task"], "mmlu");
        assert!(contents.contains("\n    \"eval\""));

        let again = compact_logs(temp.path()).expect("compact again");
        assert!(again.is_empty());
    }

    #[test]
    fn compacted_keys_are_sorted() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(
            temp.path().join("run.json"),
            r#"{"status": "success", "eval": {"task": "mmlu", "model": "m"}, "results": {}}"#,
        )
        .expect("write log");

        let written = compact_logs(temp.path()).expect("compact");
        let contents = fs::read_to_string(&written[0]).expect("read compacted");
        let position = |needle: &str| contents.find(needle).expect(needle);
        assert!(position("\"eval\"") < position("\"results\""));
        assert!(position("\"results\"") < position("\"status\""));
        assert!(position("\"model\"") < position("\"task\""));
    }
}
