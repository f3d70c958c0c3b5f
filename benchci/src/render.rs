//! Output formats for a query view (aligned text table, JSON, static HTML)
//! and the Chart.js pages for aggregated scores.

use anyhow::{Context, Result};
use chrono::DateTime;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::chart::ChartData;
use crate::core::record::{EvaluationRecord, Scalar};
use crate::core::value::parse_instant;
use crate::core::view::{RowExpansion, ViewSummary};

const REPORT_TEMPLATE: &str = include_str!("../templates/report.html.j2");
const REPORT_TITLE: &str = "Model Evaluation Report";
const BAR_CHART_TEMPLATE: &str = include_str!("../templates/chart.html.j2");
const SPIDER_CHART_TEMPLATE: &str = include_str!("../templates/spider_chart.html.j2");
const HEADERS: [&str; 5] = ["Model", "Timestamp", "Eval Name", "Score", "Total Tokens"];

/// Score cell: numbers to four places, text verbatim.
pub fn format_score(score: Option<&Scalar>) -> String {
    match score {
        Some(Scalar::Number(value)) => format!("{value:.4}"),
        Some(Scalar::Text(text)) => text.clone(),
        None => String::new(),
    }
}

/// Metric cell: numbers to six places, text verbatim.
pub fn format_metric(value: &Scalar) -> String {
    match value {
        Scalar::Number(value) => format!("{value:.6}"),
        Scalar::Text(text) => text.clone(),
    }
}

/// Token count with thousands separators; empty when absent.
pub fn format_tokens(count: Option<u64>) -> String {
    let Some(count) = count else {
        return String::new();
    };
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Timestamp cell in UTC; unparsable values are shown as stored.
pub fn format_timestamp(record: &EvaluationRecord) -> String {
    parse_instant(&record.timestamp)
        .and_then(DateTime::from_timestamp_millis)
        .map(|instant| instant.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.timestamp.to_string())
}

fn row_cells(record: &EvaluationRecord) -> [String; 5] {
    [
        record.model.clone(),
        format_timestamp(record),
        record.eval_name.clone(),
        format_score(record.score.as_ref()),
        format_tokens(record.total_tokens),
    ]
}

/// Aligned text table. The expanded row, if any, is followed by its details.
pub fn render_table(view: &[&EvaluationRecord], expansion: RowExpansion) -> String {
    let rows: Vec<[String; 5]> = view.iter().map(|record| row_cells(record)).collect();
    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(rule.join("  ").as_str());
    out.push('\n');
    for (index, (row, record)) in rows.iter().zip(view).enumerate() {
        push_line(&mut out, row, &widths);
        if expansion.is_expanded(index) {
            for line in render_details(record).lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

/// Detail panel for one record: token usage, primary and additional metrics.
pub fn render_details(record: &EvaluationRecord) -> String {
    let mut out = String::new();
    out.push_str("Token Usage\n");
    out.push_str(&format!(
        "  Input: {}\n",
        format_tokens(record.total_input_tokens)
    ));
    out.push_str(&format!(
        "  Output: {}\n",
        format_tokens(record.total_output_tokens)
    ));
    out.push_str(&format!("  Total: {}\n", format_tokens(record.total_tokens)));
    out.push_str("Primary Metrics\n");
    out.push_str(&format!(
        "  Score: {}\n",
        format_score(record.score.as_ref())
    ));
    if let Some(stderr) = record.additional_metrics.get("stderr") {
        out.push_str(&format!("  Std Error: {}\n", format_metric(stderr)));
    }
    if !record.additional_metrics.is_empty() {
        out.push_str("Additional Metrics\n");
        for (name, value) in &record.additional_metrics {
            out.push_str(&format!("  {name}: {}\n", format_metric(value)));
        }
    }
    out
}

pub fn render_json(view: &[&EvaluationRecord]) -> Result<String> {
    let mut payload = serde_json::to_string_pretty(view).context("serialize view")?;
    payload.push('\n');
    Ok(payload)
}

#[derive(Debug, Serialize)]
struct MetricContext {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct RowContext {
    model: String,
    timestamp: String,
    eval_name: String,
    score: String,
    total_tokens: String,
    input_tokens: String,
    output_tokens: String,
    stderr: Option<String>,
    metrics: Vec<MetricContext>,
    expanded: bool,
}

impl RowContext {
    fn new(record: &EvaluationRecord, expanded: bool) -> Self {
        Self {
            model: record.model.clone(),
            timestamp: format_timestamp(record),
            eval_name: record.eval_name.clone(),
            score: format_score(record.score.as_ref()),
            total_tokens: format_tokens(record.total_tokens),
            input_tokens: format_tokens(record.total_input_tokens),
            output_tokens: format_tokens(record.total_output_tokens),
            stderr: record.additional_metrics.get("stderr").map(format_metric),
            metrics: record
                .additional_metrics
                .iter()
                .map(|(name, value)| MetricContext {
                    name: name.clone(),
                    value: format_metric(value),
                })
                .collect(),
            expanded,
        }
    }
}

/// Static HTML page for the view.
pub fn render_html(
    view: &[&EvaluationRecord],
    summary: ViewSummary,
    expansion: RowExpansion,
) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("report.html", REPORT_TEMPLATE)
        .context("parse report template")?;
    let template = env.get_template("report.html")?;

    let rows: Vec<RowContext> = view
        .iter()
        .enumerate()
        .map(|(index, record)| RowContext::new(record, expansion.is_expanded(index)))
        .collect();
    let rendered = template
        .render(context! {
            title => REPORT_TITLE,
            summary => summary.to_string(),
            rows => rows,
        })
        .context("render report template")?;
    Ok(rendered)
}

/// Bar chart page: mean score per model, one bar group per eval.
pub fn render_bar_chart_html(data: &ChartData) -> Result<String> {
    render_chart_page("chart.html", BAR_CHART_TEMPLATE, "Model Performance Comparison", data)
}

/// Radar chart page: normalized per-eval scores, one polygon per model.
pub fn render_spider_chart_html(data: &ChartData) -> Result<String> {
    render_chart_page(
        "spider_chart.html",
        SPIDER_CHART_TEMPLATE,
        "Model Performance Spider Chart",
        data,
    )
}

fn render_chart_page(
    name: &'static str,
    source: &'static str,
    title: &str,
    data: &ChartData,
) -> Result<String> {
    let mut env = Environment::new();
    env.add_template(name, source)
        .with_context(|| format!("parse {name} template"))?;
    let template = env.get_template(name)?;
    let rendered = template
        .render(context! {
            title => title,
            labels_json => script_json(&data.labels)?,
            datasets_json => script_json(&data.datasets)?,
        })
        .with_context(|| format!("render {name} template"))?;
    Ok(rendered)
}

/// JSON for inlining in a `<script>` block; `</` cannot close the tag early.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("serialize chart data")?;
    Ok(json.replace("</", "<\\/"))
}
