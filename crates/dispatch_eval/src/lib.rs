//! Batch evaluation of dispatch agents.
//!
//! Runs one configuration or a grid of agents and seeds in parallel, scores every run with
//! the core evaluator, and writes per-run artifacts plus a comparison table.
//!
//! # Quick Start
//!
//! ```no_run
//! use dispatch_core::agent::AgentKind;
//! use dispatch_core::scenario::HarnessConfig;
//! use dispatch_eval::{find_best_run_index, run_parallel_evaluations, EvaluationGrid, EvaluationInputs};
//!
//! let inputs = EvaluationInputs::load("taxi_zones.csv", "trips.csv").unwrap();
//! let specs = EvaluationGrid::new(HarnessConfig::default())
//!     .agents(vec![AgentKind::default(), AgentKind::Regex])
//!     .seeds(vec![1, 2, 3])
//!     .generate();
//!
//! let runs: Vec<_> = run_parallel_evaluations(&specs, &inputs, None, true)
//!     .unwrap()
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//! let best = find_best_run_index(&runs).unwrap();
//! println!("best run: {}", runs[best].spec.label);
//! ```
//!
//! # Architecture
//!
//! - [`inputs`]: zone table and trip records shared by all runs
//! - [`sweep`]: agent by seed grids
//! - [`runner`]: single and rayon-parallel runs
//! - [`export`]: JSON, CSV, GeoJSON and Parquet artifacts

pub mod error;
pub mod export;
pub mod inputs;
pub mod runner;
pub mod sweep;

#[cfg(test)]
mod test_support;

pub use error::EvalError;
pub use export::{export_comparison_csv, find_best_run_index, write_run_artifacts, RunArtifacts};
pub use inputs::EvaluationInputs;
pub use runner::{run_evaluation, run_parallel_evaluations, EvaluationRun};
pub use sweep::{agent_label, EvaluationGrid, RunSpec};
