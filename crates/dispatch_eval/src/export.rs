//! Result export and comparison utilities.
//!
//! Each run writes a directory of artifacts: the evaluation summary as JSON, trip outcomes as
//! CSV, trajectories as JSON (and optionally GeoJSON for map viewers), plus the Parquet tables
//! produced by `dispatch_core::telemetry_export`. Grids add a comparison CSV across runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dispatch_core::evaluator::EvaluationSummary;
use dispatch_core::telemetry::{TrajectoryPoint, TripOutcome};
use dispatch_core::telemetry_export::{
    write_assignments_parquet, write_trajectories_parquet, write_trip_outcomes_parquet,
};
use dispatch_core::vehicle::VehicleId;

use crate::error::EvalError;
use crate::runner::EvaluationRun;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/geojson.rs"]
mod geojson;
#[path = "export/json.rs"]
mod json;
#[path = "export/ranking.rs"]
mod ranking;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export the summary of one run (config, generation stats, run counters and scores) as
/// pretty-printed JSON.
pub fn export_summary_json(run: &EvaluationRun, path: impl AsRef<Path>) -> Result<(), EvalError> {
    let file = writer_utils::create_output_file(path)?;
    json::summary_json_impl(run, file)
}

/// Export several evaluation summaries as one JSON array.
pub fn export_summaries_json(
    summaries: &[&EvaluationSummary],
    path: impl AsRef<Path>,
) -> Result<(), EvalError> {
    writer_utils::ensure_not_empty(summaries)?;
    let file = writer_utils::create_output_file(path)?;
    json::summaries_json_impl(summaries, file)
}

/// Export trajectories as a JSON array of `{vehicle_id, points}` objects, ordered by vehicle.
pub fn export_trajectories_json(
    trajectories: &BTreeMap<VehicleId, Vec<TrajectoryPoint>>,
    path: impl AsRef<Path>,
) -> Result<(), EvalError> {
    let file = writer_utils::create_output_file(path)?;
    json::trajectories_json_impl(trajectories, file)
}

/// Export trajectories as a GeoJSON FeatureCollection of LineStrings.
pub fn export_trajectories_geojson(
    trajectories: &BTreeMap<VehicleId, Vec<TrajectoryPoint>>,
    path: impl AsRef<Path>,
) -> Result<(), EvalError> {
    let file = writer_utils::create_output_file(path)?;
    geojson::trajectory_geojson_impl(trajectories, file)
}

/// Export completed trips to CSV. An empty slice still writes the header.
pub fn export_outcomes_csv(outcomes: &[TripOutcome], path: impl AsRef<Path>) -> Result<(), EvalError> {
    let file = writer_utils::create_output_file(path)?;
    csv::outcomes_csv_impl(outcomes, file)
}

/// Export one row per run with its headline metrics.
///
/// # Errors
///
/// Returns [`EvalError::Empty`] when `runs` is empty.
pub fn export_comparison_csv(runs: &[EvaluationRun], path: impl AsRef<Path>) -> Result<(), EvalError> {
    writer_utils::ensure_not_empty(runs)?;
    let file = writer_utils::create_output_file(path)?;
    csv::comparison_csv_impl(runs, file)
}

/// Index of the run with the highest overall score, or `None` if `runs` is empty.
pub fn find_best_run_index(runs: &[EvaluationRun]) -> Option<usize> {
    ranking::find_best_index_by_score(runs)
}

/// Files written by [`write_run_artifacts`].
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub dir: PathBuf,
    pub summary: PathBuf,
    pub outcomes_csv: PathBuf,
    pub trajectories: PathBuf,
    pub geojson: Option<PathBuf>,
    pub parquet: Vec<PathBuf>,
}

fn parquet_error(err: Box<dyn std::error::Error>) -> EvalError {
    EvalError::Parquet(err.to_string())
}

/// Writes every artifact of `run` into `<out_dir>/<label>/`.
pub fn write_run_artifacts(
    run: &EvaluationRun,
    out_dir: impl AsRef<Path>,
    include_map: bool,
) -> Result<RunArtifacts, EvalError> {
    let dir = out_dir.as_ref().join(&run.spec.label);
    std::fs::create_dir_all(&dir)?;
    let report = &run.report;

    let summary = dir.join("summary.json");
    export_summary_json(run, &summary)?;

    let outcomes_csv = dir.join("trip_outcomes.csv");
    export_outcomes_csv(&report.outcomes, &outcomes_csv)?;

    let trajectories = dir.join("trajectories.json");
    export_trajectories_json(&report.trajectories, &trajectories)?;

    let geojson = if include_map {
        let path = dir.join("trajectories.geojson");
        export_trajectories_geojson(&report.trajectories, &path)?;
        Some(path)
    } else {
        None
    };

    let outcomes_parquet = dir.join("trip_outcomes.parquet");
    write_trip_outcomes_parquet(&outcomes_parquet, &report.outcomes).map_err(parquet_error)?;
    let assignments_parquet = dir.join("assignments.parquet");
    write_assignments_parquet(&assignments_parquet, &report.assignments).map_err(parquet_error)?;
    let trajectories_parquet = dir.join("trajectories.parquet");
    write_trajectories_parquet(&trajectories_parquet, &report.trajectories)
        .map_err(parquet_error)?;

    tracing::debug!(run = %run.spec.label, dir = %dir.display(), "artifacts written");

    Ok(RunArtifacts {
        dir,
        summary,
        outcomes_csv,
        trajectories,
        geojson,
        parquet: vec![outcomes_parquet, assignments_parquet, trajectories_parquet],
    })
}
