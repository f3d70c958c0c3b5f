//! Raw evaluation logs and their conversion into database records.
//!
//! A log is one JSON document per evaluation run. Only a handful of paths are
//! read; everything else (samples, reductions, plan) is ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::record::{EvaluationRecord, Scalar, Timestamp};

const MISSING: &str = "N/A";
const ERROR_SCORE: &str = "Error";
const PRIMARY_METRIC: &str = "accuracy";

/// A decoded log file.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub path: PathBuf,
    pub document: Value,
}

/// List `*.json` files directly inside `dir`, sorted by path.
pub fn list_log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read logs dir {}", dir.display()))? {
        let entry = entry.context("read log entry")?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load every decodable log in `dir`. Files that are not valid JSON are
/// skipped with a warning.
pub fn load_logs(dir: &Path) -> Result<Vec<LogFile>> {
    let mut logs = Vec::new();
    for path in list_log_files(dir)? {
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        match serde_json::from_str::<Value>(&contents) {
            Ok(document) => logs.push(LogFile { path, document }),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not decode JSON, skipping");
            }
        }
    }
    debug!(dir = %dir.display(), logs = logs.len(), "logs loaded");
    Ok(logs)
}

/// Convert one raw log document into a database record.
pub fn convert_log(document: &Value) -> EvaluationRecord {
    let eval = document.get("eval");
    let eval_text = |key: &str| {
        eval.and_then(|eval| eval.get(key))
            .and_then(Value::as_str)
            .unwrap_or(MISSING)
            .to_string()
    };

    let timestamp = match eval.and_then(|eval| eval.get("created")) {
        Some(Value::String(text)) => Timestamp::Text(normalize_timestamp(text)),
        Some(Value::Number(seconds)) => Timestamp::Text(
            seconds
                .as_f64()
                .and_then(|seconds| DateTime::from_timestamp_millis((seconds * 1000.0) as i64))
                .map(|parsed| parsed.to_rfc3339_opts(SecondsFormat::AutoSi, false))
                .unwrap_or_else(|| seconds.to_string()),
        ),
        Some(other) if !other.is_null() => Timestamp::Text(other.to_string()),
        _ => Timestamp::Text(MISSING.to_string()),
    };

    let (score, additional_metrics) = extract_scores(document);

    let mut record = EvaluationRecord {
        model: eval_text("model"),
        timestamp,
        eval_name: eval_text("task"),
        score: Some(score),
        additional_metrics,
        total_input_tokens: Some(0),
        total_output_tokens: Some(0),
        total_tokens: Some(0),
        ..EvaluationRecord::default()
    };

    if let Some(usage) = document
        .get("stats")
        .and_then(|stats| stats.get("model_usage"))
        .and_then(Value::as_object)
    {
        let sum = |key: &str| -> u64 {
            usage
                .values()
                .filter_map(|entry| entry.get(key).and_then(Value::as_u64))
                .sum()
        };
        record.total_input_tokens = Some(sum("input_tokens"));
        record.total_output_tokens = Some(sum("output_tokens"));
        record.total_tokens = Some(sum("total_tokens"));
        // Maps keep document order, so this is the last entry as written.
        record.model_key = usage.keys().last().cloned();
    }

    record
}

/// Primary score plus every other metric of the first scorer.
///
/// Failed runs and runs without an accuracy metric score as `"Error"`.
fn extract_scores(document: &Value) -> (Scalar, BTreeMap<String, Scalar>) {
    let mut additional = BTreeMap::new();
    let error = || Scalar::Text(ERROR_SCORE.to_string());

    if document.get("status").and_then(Value::as_str) == Some("error") {
        return (error(), additional);
    }
    let Some(metrics) = document
        .pointer("/results/scores/0/metrics")
        .and_then(Value::as_object)
    else {
        return (error(), additional);
    };
    let Some(score) = metrics
        .get(PRIMARY_METRIC)
        .and_then(|metric| metric.get("value"))
        .and_then(scalar_from_json)
    else {
        return (error(), additional);
    };

    for (name, metric) in metrics {
        if name == PRIMARY_METRIC {
            continue;
        }
        if let Some(value) = metric.get("value").and_then(scalar_from_json) {
            additional.insert(name.clone(), value);
        }
    }
    (score, additional)
}

fn scalar_from_json(value: &Value) -> Option<Scalar> {
    match value {
        Value::Number(number) => number.as_f64().map(Scalar::Number),
        Value::String(text) => Some(Scalar::Text(text.clone())),
        _ => None,
    }
}

/// Normalize ISO-8601 text to RFC 3339; unparsable text is returned as is.
fn normalize_timestamp(text: &str) -> String {
    if text == MISSING {
        return text.to_string();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return parsed.to_rfc3339_opts(SecondsFormat::AutoSi, false);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return parsed.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return format!("{}T00:00:00", date.format("%Y-%m-%d"));
    }
    text.to_string()
}
