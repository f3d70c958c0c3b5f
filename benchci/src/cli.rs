//! CLI command implementations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::ValueEnum;
use tracing::{debug, info};

use crate::core::chart::{bar_chart, spider_chart};
use crate::core::pipeline::run_query;
use crate::core::query::{Query, SortDirection, SortField, SortSpec};
use crate::core::record::EvaluationRecord;
use crate::core::view::{Facets, RowExpansion, ViewSummary};
use crate::io::compat::compact_logs;
use crate::io::config::BenchConfig;
use crate::io::database::{load_database_or_empty, save_database};
use crate::io::harness::{BENCH_PROGRAM, plan_invocations, run_invocation};
use crate::io::logs::{convert_log, load_logs};
use crate::render::{
    render_bar_chart_html, render_html, render_json, render_spider_chart_html, render_table,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Html,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ChartKind {
    #[default]
    Bar,
    Spider,
}

impl ChartKind {
    /// File name of the chart page inside the reports directory.
    pub fn page_name(self) -> &'static str {
        match self {
            Self::Bar => "chart.html",
            Self::Spider => "spider_chart.html",
        }
    }
}

/// `chart` output: JSON on stdout or a page in the reports directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ChartFormat {
    #[default]
    Json,
    Html,
}

/// Options for `benchci query`.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub database: Option<PathBuf>,
    pub search: String,
    pub model: Option<String>,
    pub eval: Option<String>,
    pub sort: Option<SortField>,
    pub descending: bool,
    pub expand: Option<usize>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl QueryOptions {
    fn to_query(&self, cfg: &BenchConfig) -> Query {
        let direction = if self.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Query {
            search_term: self.search.clone(),
            model_filter: self.model.clone(),
            eval_filter: self.eval.clone(),
            sort: SortSpec {
                field: self.sort,
                direction,
            },
            unordered: cfg.query.unordered,
        }
    }
}

fn database_path(cfg: &BenchConfig, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cfg.output.database_path())
}

/// Run the query pipeline over the database and print or write the view.
pub fn query_records(cfg: &BenchConfig, options: &QueryOptions) -> Result<()> {
    let records = load_database_or_empty(&database_path(cfg, options.database.as_deref()));
    let query = options.to_query(cfg);
    let view = run_query(&records, &query);
    let summary = ViewSummary {
        shown: view.len(),
        total: records.len(),
    };
    debug!(shown = summary.shown, total = summary.total, "query evaluated");

    let mut expansion = RowExpansion::default();
    if let Some(index) = options.expand {
        if index >= view.len() {
            bail!("--expand {index} is out of range ({} rows)", view.len());
        }
        expansion.toggle(index);
    }

    let contents = match options.format {
        OutputFormat::Table => format!("{summary}\n\n{}", render_table(&view, expansion)),
        OutputFormat::Json => render_json(&view)?,
        OutputFormat::Html => render_html(&view, summary, expansion)?,
    };
    emit(options.output.as_deref(), &contents)
}

/// Print the distinct models and evals available as filter values.
pub fn list_facets(cfg: &BenchConfig, database: Option<&Path>) -> Result<()> {
    let records = load_database_or_empty(&database_path(cfg, database));
    let facets = Facets::from_records(&records);
    for model in &facets.models {
        println!("model: {model}");
    }
    for eval_name in &facets.evals {
        println!("eval: {eval_name}");
    }
    Ok(())
}

/// Convert raw logs into `database.json` and a static `index.html`.
pub fn build_reports(cfg: &BenchConfig) -> Result<()> {
    let logs = load_logs(&cfg.output.logs)?;
    if logs.is_empty() {
        println!("No data found to generate a report.");
        return Ok(());
    }
    let records: Vec<EvaluationRecord> = logs.iter().map(|log| convert_log(&log.document)).collect();

    let database = cfg.output.database_path();
    save_database(&database, &records)?;
    println!("build: database={} records={}", database.display(), records.len());

    let view: Vec<&EvaluationRecord> = records.iter().collect();
    let summary = ViewSummary {
        shown: view.len(),
        total: records.len(),
    };
    let page = render_html(&view, summary, RowExpansion::default())?;
    let index = cfg.output.reports.join("index.html");
    fs::write(&index, page).with_context(|| format!("write {}", index.display()))?;
    println!("build: page={}", index.display());
    Ok(())
}

/// Strip samples from raw logs in place.
pub fn compact(cfg: &BenchConfig) -> Result<()> {
    let written = compact_logs(&cfg.output.logs)?;
    for path in &written {
        println!("compact: {}", path.display());
    }
    println!("compact: logs={} compacted={}", cfg.output.logs.display(), written.len());
    Ok(())
}

/// Aggregate scores for a chart and print them as JSON or write the page.
pub fn chart(
    cfg: &BenchConfig,
    kind: ChartKind,
    format: ChartFormat,
    database: Option<&Path>,
) -> Result<()> {
    let records = load_database_or_empty(&database_path(cfg, database));
    let data = match kind {
        ChartKind::Bar => bar_chart(&records),
        ChartKind::Spider => spider_chart(&records),
    };
    if format == ChartFormat::Json {
        let payload = serde_json::to_string_pretty(&data).context("serialize chart data")?;
        println!("{payload}");
        return Ok(());
    }

    if data.labels.is_empty() || data.datasets.is_empty() {
        println!("No valid data to display in charts.");
        return Ok(());
    }
    let page = match kind {
        ChartKind::Bar => render_bar_chart_html(&data)?,
        ChartKind::Spider => render_spider_chart_html(&data)?,
    };
    let path = cfg.output.reports.join(kind.page_name());
    emit(Some(&path), &page)?;
    println!("chart: page={}", path.display());
    Ok(())
}

/// Run every configured evaluation; stops at the first failure.
pub fn evaluate(cfg: &BenchConfig) -> Result<()> {
    let invocations = plan_invocations(cfg, Local::now());
    if invocations.is_empty() {
        println!("evaluate: no runnable entries in [runs]");
        return Ok(());
    }
    info!(count = invocations.len(), "starting evaluations");
    for invocation in &invocations {
        run_invocation(BENCH_PROGRAM, invocation, &cfg.output.logs)?;
        println!(
            "evaluate: run={} model={} eval={} ok",
            invocation.run_name, invocation.model, invocation.eval_name
        );
    }
    Ok(())
}

fn emit(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "view written");
        }
        None => print!("{contents}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::UnorderedPlacement;
    use crate::io::config::QueryConfig;

    #[test]
    fn options_map_to_query() {
        let cfg = BenchConfig {
            query: QueryConfig {
                unordered: UnorderedPlacement::First,
            },
            ..BenchConfig::default()
        };
        let options = QueryOptions {
            search: "gpt".to_string(),
            model: Some("m".to_string()),
            sort: Some(SortField::Timestamp),
            descending: true,
            ..QueryOptions::default()
        };
        let query = options.to_query(&cfg);
        assert_eq!(query.search_term, "gpt");
        assert_eq!(query.model_filter.as_deref(), Some("m"));
        assert_eq!(
            query.sort,
            SortSpec::by(SortField::Timestamp, SortDirection::Descending)
        );
        assert_eq!(query.unordered, UnorderedPlacement::First);
    }

    #[test]
    fn query_writes_requested_format() {
        let temp = tempfile::tempdir().expect("tempdir");
        let database = temp.path().join("database.json");
        save_database(&database, &crate::test_support::sample_records()).expect("save");
        let output = temp.path().join("out/view.json");

        let options = QueryOptions {
            database: Some(database),
            eval: Some("gpqa".to_string()),
            format: OutputFormat::Json,
            output: Some(output.clone()),
            ..QueryOptions::default()
        };
        query_records(&BenchConfig::default(), &options).expect("query");

        let written: Vec<EvaluationRecord> =
            serde_json::from_str(&fs::read_to_string(&output).expect("read")).expect("parse");
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|record| record.eval_name == "gpqa"));
    }

    #[test]
    fn expand_out_of_range_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let options = QueryOptions {
            database: Some(temp.path().join("missing.json")),
            expand: Some(0),
            ..QueryOptions::default()
        };
        let err = query_records(&BenchConfig::default(), &options).expect_err("out of range");
        assert!(err.to_string().contains("--expand"));
    }

    #[test]
    fn build_writes_database_and_page() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut cfg = BenchConfig::default();
        cfg.output.logs = temp.path().join("logs");
        cfg.output.reports = temp.path().join("reports");
        fs::create_dir_all(&cfg.output.logs).expect("logs dir");
        fs::write(
            cfg.output.logs.join("run.json"),
            r#"{"eval": {"model": "m", "task": "mmlu", "created": "2025-07-01T00:00:00Z"},
                "results": {"scores": [{"metrics": {"accuracy": {"value": 0.7}}}]}}"#,
        )
        .expect("write log");

        build_reports(&cfg).expect("build");

        let records = load_database_or_empty(&cfg.output.database_path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "m");
        assert!(cfg.output.reports.join("index.html").exists());
    }

    #[test]
    fn chart_html_writes_pages_to_reports_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut cfg = BenchConfig::default();
        cfg.output.reports = temp.path().join("reports");
        save_database(
            &cfg.output.database_path(),
            &crate::test_support::sample_records(),
        )
        .expect("save");

        chart(&cfg, ChartKind::Bar, ChartFormat::Html, None).expect("bar chart");
        chart(&cfg, ChartKind::Spider, ChartFormat::Html, None).expect("spider chart");

        let bar = fs::read_to_string(cfg.output.reports.join("chart.html")).expect("chart.html");
        assert!(bar.contains(r#"["anthropic/claude-sonnet","openai/gpt-4o"]"#));
        let spider = fs::read_to_string(cfg.output.reports.join("spider_chart.html"))
            .expect("spider_chart.html");
        assert!(spider.contains(r#"["gpqa","humaneval","mmlu"]"#));
    }

    #[test]
    fn chart_html_without_scores_writes_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut cfg = BenchConfig::default();
        cfg.output.reports = temp.path().join("reports");

        chart(&cfg, ChartKind::Bar, ChartFormat::Html, None).expect("bar chart");
        assert!(!cfg.output.reports.join("chart.html").exists());
    }
}
