use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::io::config::BenchConfig;

/// External benchmark CLI.
pub const BENCH_PROGRAM: &str = "bench";

/// One `bench eval` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalInvocation {
    pub run_name: String,
    pub model: String,
    pub eval_name: String,
    pub limit: u32,
    /// Set when the run asks for JSON logs.
    pub logfile: Option<String>,
}

impl EvalInvocation {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "eval".to_string(),
            self.eval_name.clone(),
            "--model".to_string(),
            self.model.clone(),
            "--limit".to_string(),
            self.limit.to_string(),
            "--log-level".to_string(),
            "debug".to_string(),
        ];
        if let Some(logfile) = &self.logfile {
            args.push("--logfile".to_string());
            args.push(logfile.clone());
            args.push("--json".to_string());
        }
        args
    }
}

/// Expand configured runs into invocations, one per eval.
///
/// Runs without a model, a positive limit, or at least one eval are skipped.
pub fn plan_invocations(cfg: &BenchConfig, now: DateTime<Local>) -> Vec<EvalInvocation> {
    let stamp = now.format("%Y%m%d%H%M%S").to_string();
    let mut invocations = Vec::new();
    for (run_name, run) in &cfg.runs {
        let (Some(model), Some(limit), Some(evals)) = (&run.model, run.limit, &run.evals) else {
            warn!(run = %run_name, "skipping run: missing model, limit, or evals");
            continue;
        };
        if model.trim().is_empty() || limit == 0 || evals.is_empty() {
            warn!(run = %run_name, "skipping run: missing model, limit, or evals");
            continue;
        }
        for eval_name in evals {
            invocations.push(EvalInvocation {
                run_name: run_name.clone(),
                model: model.clone(),
                eval_name: eval_name.clone(),
                limit,
                logfile: run
                    .json
                    .then(|| logfile_name(model, eval_name, &stamp)),
            });
        }
    }
    invocations
}

/// `results_<model>_<eval>_<stamp>` with path-hostile characters replaced.
pub fn logfile_name(model: &str, eval_name: &str, stamp: &str) -> String {
    format!("results_{}_{}_{}", sanitize_model_name(model), eval_name, stamp)
}

pub fn sanitize_model_name(model: &str) -> String {
    model.replace(['/', '-', '.', ':'], "_")
}

/// Run one invocation with `logs_dir` as working directory so log files land
/// next to the others.
pub fn run_invocation(program: &str, invocation: &EvalInvocation, logs_dir: &Path) -> Result<()> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("create logs dir {}", logs_dir.display()))?;

    let args = invocation.args();
    info!(
        run = %invocation.run_name,
        model = %invocation.model,
        eval = %invocation.eval_name,
        command = %format!("{program} {}", args.join(" ")),
        "executing evaluation"
    );
    let output = Command::new(program)
        .args(&args)
        .current_dir(logs_dir)
        .output()
        .with_context(|| format!("run {program} {:?}", args))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!(stdout = %stdout.trim(), stderr = %stderr.trim(), "evaluation output");

    if !output.status.success() {
        bail!(
            "evaluation of {} on {} failed ({}): {}",
            invocation.model,
            invocation.eval_name,
            output.status,
            stderr.trim()
        );
    }
    info!(model = %invocation.model, eval = %invocation.eval_name, "evaluation completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::RunConfig;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 7, 1, 9, 5, 3)
            .single()
            .expect("unambiguous time")
    }

    fn run(model: Option<&str>, limit: Option<u32>, evals: &[&str], json: bool) -> RunConfig {
        RunConfig {
            model: model.map(str::to_string),
            limit,
            evals: Some(evals.iter().map(|eval| eval.to_string()).collect()),
            json,
        }
    }

    #[test]
    fn sanitizes_model_names() {
        assert_eq!(
            sanitize_model_name("openrouter/openai/gpt-4.1:free"),
            "openrouter_openai_gpt_4_1_free"
        );
    }

    #[test]
    fn plans_one_invocation_per_eval() {
        let mut cfg = BenchConfig::default();
        cfg.runs.insert(
            "a".to_string(),
            run(Some("openai/gpt-4o"), Some(5), &["mmlu", "gpqa"], true),
        );
        cfg.runs
            .insert("b".to_string(), run(Some("m"), Some(1), &["mmlu"], false));

        let plan = plan_invocations(&cfg, fixed_now());
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan[0].logfile.as_deref(),
            Some("results_openai_gpt_4o_mmlu_20250701090503")
        );
        assert_eq!(plan[1].eval_name, "gpqa");
        assert!(plan[2].logfile.is_none());
    }

    #[test]
    fn skips_incomplete_runs() {
        let mut cfg = BenchConfig::default();
        cfg.runs
            .insert("no-model".to_string(), run(None, Some(5), &["mmlu"], false));
        cfg.runs
            .insert("zero-limit".to_string(), run(Some("m"), Some(0), &["mmlu"], false));
        cfg.runs
            .insert("no-evals".to_string(), run(Some("m"), Some(5), &[], false));
        assert!(plan_invocations(&cfg, fixed_now()).is_empty());
    }

    #[test]
    fn builds_bench_arguments() {
        let invocation = EvalInvocation {
            run_name: "a".to_string(),
            model: "m".to_string(),
            eval_name: "mmlu".to_string(),
            limit: 10,
            logfile: Some("results_m_mmlu_1".to_string()),
        };
        assert_eq!(
            invocation.args(),
            vec![
                "eval",
                "mmlu",
                "--model",
                "m",
                "--limit",
                "10",
                "--log-level",
                "debug",
                "--logfile",
                "results_m_mmlu_1",
                "--json"
            ]
        );
    }

    #[test]
    fn reports_missing_program() {
        let temp = tempfile::tempdir().expect("tempdir");
        let invocation = EvalInvocation {
            run_name: "a".to_string(),
            model: "m".to_string(),
            eval_name: "mmlu".to_string(),
            limit: 1,
            logfile: None,
        };
        let err = run_invocation("benchci-missing-program", &invocation, temp.path())
            .expect_err("missing program");
        assert!(format!("{err:#}").contains("benchci-missing-program"));
    }
}
