//! `benchci`: query, build, and chart model-evaluation reports.

use std::path::PathBuf;

use anyhow::Result;
use benchci::cli::{self, ChartFormat, ChartKind, OutputFormat, QueryOptions};
use benchci::core::query::SortField;
use benchci::io::config::{CONFIG_FILE, load_config};
use benchci::logging;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "benchci",
    version,
    about = "Query and report model-evaluation results"
)]
struct Cli {
    /// Path to the TOML config (missing file means defaults).
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// More diagnostics on stderr (`-v` info, `-vv` debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter and sort records from `database.json`.
    Query {
        /// Database file (defaults to `<reports>/database.json`).
        #[arg(long)]
        database: Option<PathBuf>,
        /// Case-insensitive substring of model or eval name.
        #[arg(long, default_value = "")]
        search: String,
        /// Exact model name.
        #[arg(long)]
        model: Option<String>,
        /// Exact eval name.
        #[arg(long = "eval")]
        eval_name: Option<String>,
        /// Column to sort by: model, timestamp, eval_name, score, total_tokens.
        #[arg(long)]
        sort: Option<SortField>,
        /// Sort descending instead of ascending.
        #[arg(long, requires = "sort")]
        descending: bool,
        /// Show details for this row of the view (0-based).
        #[arg(long)]
        expand: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List distinct models and evals.
    Facets {
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Convert raw logs into `database.json` and `index.html`.
    Build,
    /// Drop samples from raw logs, keeping metrics only.
    Compact,
    /// Print bar or spider chart data as JSON, or write the chart page.
    Chart {
        #[arg(long, value_enum, default_value_t = ChartKind::Bar)]
        kind: ChartKind,
        /// `html` writes `chart.html` or `spider_chart.html` to the reports dir.
        #[arg(long, value_enum, default_value_t = ChartFormat::Json)]
        format: ChartFormat,
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Run every configured evaluation with the `bench` CLI.
    Evaluate,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    match cli.command {
        Command::Query {
            database,
            search,
            model,
            eval_name,
            sort,
            descending,
            expand,
            format,
            output,
        } => cli::query_records(
            &cfg,
            &QueryOptions {
                database,
                search,
                model,
                eval: eval_name,
                sort,
                descending,
                expand,
                format,
                output,
            },
        ),
        Command::Facets { database } => cli::list_facets(&cfg, database.as_deref()),
        Command::Build => cli::build_reports(&cfg),
        Command::Compact => cli::compact(&cfg),
        Command::Chart {
            kind,
            format,
            database,
        } => cli::chart(&cfg, kind, format, database.as_deref()),
        Command::Evaluate => cli::evaluate(&cfg),
    }
}
