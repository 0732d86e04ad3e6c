//! Evaluation execution: single runs and rayon-parallel grids.

use dispatch_core::agent::build_agent;
use dispatch_core::environment::RunReport;
use dispatch_core::error::HarnessError;
use dispatch_core::evaluator::EvaluationSummary;
use dispatch_core::requests::{GenerationStats, Request};
use dispatch_core::scenario::build_environment;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::error::EvalError;
use crate::inputs::EvaluationInputs;
use crate::sweep::RunSpec;

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct EvaluationRun {
    pub spec: RunSpec,
    pub requests: Vec<Request>,
    pub generation: GenerationStats,
    pub report: RunReport,
    pub summary: EvaluationSummary,
}

/// Generates requests, builds the environment and agent, runs the simulation and scores it.
pub fn run_evaluation(
    spec: &RunSpec,
    inputs: &EvaluationInputs,
) -> Result<EvaluationRun, HarnessError> {
    let config = &spec.config;
    config.validate()?;

    let generated = inputs.generate(config)?;
    let mut env = build_environment(config, &generated)?;
    let mut agent = build_agent(&config.agent, &inputs.zones, config.seed)?;
    tracing::info!(
        run = %spec.label,
        requests = generated.requests.len(),
        vehicles = config.num_vehicles,
        "evaluation run starting"
    );

    let report = env.run(&generated.requests, agent.as_mut(), &config.run_options());
    let summary = config.evaluator().evaluate(
        &report.agent,
        &generated.requests,
        &report.assignments,
        &report.outcomes,
    );

    Ok(EvaluationRun {
        spec: spec.clone(),
        requests: generated.requests,
        generation: generated.stats,
        report,
        summary,
    })
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Runs every spec on a rayon pool. Results keep the order of `specs`; a failed run does
/// not stop the others.
pub fn run_parallel_evaluations(
    specs: &[RunSpec],
    inputs: &EvaluationInputs,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Result<Vec<Result<EvaluationRun, HarnessError>>, EvalError> {
    let pb = (show_progress && !specs.is_empty()).then(|| progress_bar(specs.len()));

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    let results: Vec<Result<EvaluationRun, HarnessError>> = pool.install(|| {
        specs
            .par_iter()
            .map(|spec| {
                let result = run_evaluation(spec, inputs);
                if let Err(err) = &result {
                    tracing::warn!(run = %spec.label, error = %err, "evaluation run failed");
                }
                if let Some(progress_bar) = &pb {
                    progress_bar.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(progress_bar) = &pb {
        progress_bar.finish_with_message("Completed");
    }
    Ok(results)
}
