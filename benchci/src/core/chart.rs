//! Score aggregation for comparison charts.
//!
//! Output mirrors the Chart.js data shape (`labels` + `datasets`) so it can be
//! dropped into a page unchanged.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::record::{EvaluationRecord, Scalar};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(rename = "borderWidth")]
    pub border_width: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// Bar chart: one label per model, one dataset per eval.
///
/// Each value is the mean score of the model on that eval, or 0 when the
/// model never ran it. Text scores (`"Error"`) are skipped; a missing score
/// counts as 0.
pub fn bar_chart(records: &[EvaluationRecord]) -> ChartData {
    let mut scores: BTreeMap<&str, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
    let mut evals = BTreeSet::new();

    for record in records {
        let score = match &record.score {
            Some(Scalar::Number(value)) => *value,
            Some(Scalar::Text(_)) => continue,
            None => 0.0,
        };
        evals.insert(record.eval_name.as_str());
        scores
            .entry(record.model.as_str())
            .or_default()
            .entry(record.eval_name.as_str())
            .or_default()
            .push(score);
    }

    let datasets = evals
        .iter()
        .map(|eval_name| ChartDataset {
            label: eval_name.to_string(),
            data: scores
                .values()
                .map(|by_eval| by_eval.get(eval_name).map_or(0.0, |values| round4(mean(values))))
                .collect(),
            border_width: 1,
        })
        .collect();

    ChartData {
        labels: scores.keys().map(|model| model.to_string()).collect(),
        datasets,
    }
}

/// Spider (radar) chart: one label per eval, one dataset per model.
///
/// Per-eval means are min-max normalized across models. The running minimum
/// starts at 1 and the maximum at 0, so scores already inside `[0, 1]` are
/// stretched to the observed range. Records without a numeric score are
/// skipped.
pub fn spider_chart(records: &[EvaluationRecord]) -> ChartData {
    let mut models: Vec<(&str, BTreeMap<&str, Vec<f64>>)> = Vec::new();
    let mut evals = BTreeSet::new();

    for record in records {
        let Some(score) = record.score.as_ref().and_then(Scalar::as_number) else {
            continue;
        };
        let position = match models
            .iter()
            .position(|(model, _)| *model == record.model.as_str())
        {
            Some(position) => position,
            None => {
                models.push((record.model.as_str(), BTreeMap::new()));
                models.len() - 1
            }
        };
        models[position]
            .1
            .entry(record.eval_name.as_str())
            .or_default()
            .push(score);
        evals.insert(record.eval_name.as_str());
    }

    let mut bounds: BTreeMap<&str, (f64, f64)> =
        evals.iter().map(|eval_name| (*eval_name, (1.0, 0.0))).collect();
    for (_, by_eval) in &models {
        for (eval_name, values) in by_eval {
            let avg = mean(values);
            if let Some((min, max)) = bounds.get_mut(eval_name) {
                *min = min.min(avg);
                *max = max.max(avg);
            }
        }
    }

    let datasets = models
        .iter()
        .map(|(model, by_eval)| ChartDataset {
            label: model.to_string(),
            data: evals
                .iter()
                .map(|eval_name| {
                    let (Some(values), Some((min, max))) =
                        (by_eval.get(eval_name), bounds.get(eval_name))
                    else {
                        return 0.0;
                    };
                    if max > min {
                        round4((mean(values) - min) / (max - min))
                    } else {
                        0.0
                    }
                })
                .collect(),
            border_width: 1,
        })
        .collect();

    ChartData {
        labels: evals.iter().map(|eval_name| eval_name.to_string()).collect(),
        datasets,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
