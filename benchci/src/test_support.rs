//! Test-only helpers for constructing evaluation records.

use crate::core::record::{EvaluationRecord, Scalar, Timestamp};

/// Create a deterministic record with no score and no token counts.
pub fn record(model: &str, eval_name: &str) -> EvaluationRecord {
    EvaluationRecord {
        model: model.to_string(),
        eval_name: eval_name.to_string(),
        timestamp: Timestamp::Text("2025-07-01T12:00:00+00:00".to_string()),
        ..EvaluationRecord::default()
    }
}

/// Create a record with an explicit score.
pub fn scored(model: &str, eval_name: &str, score: Scalar) -> EvaluationRecord {
    EvaluationRecord {
        score: Some(score),
        ..record(model, eval_name)
    }
}

/// Small mixed data set: two models, three evals, one failed run.
pub fn sample_records() -> Vec<EvaluationRecord> {
    let mut records = vec![
        scored("openai/gpt-4o", "mmlu", Scalar::Number(0.82)),
        scored("anthropic/claude-sonnet", "mmlu", Scalar::Number(0.86)),
        scored("openai/gpt-4o", "gpqa", Scalar::Number(0.48)),
        scored("anthropic/claude-sonnet", "gpqa", Scalar::from("Error")),
        scored("openai/gpt-4o", "mmlu", Scalar::Number(0.8)),
        scored("anthropic/claude-sonnet", "humaneval", Scalar::Number(0.91)),
    ];
    for (index, record) in records.iter_mut().enumerate() {
        record.timestamp = Timestamp::Text(format!("2025-07-0{}T09:30:00+00:00", index + 1));
        record.total_tokens = Some(1_000 * (index as u64 + 1));
    }
    records
}
