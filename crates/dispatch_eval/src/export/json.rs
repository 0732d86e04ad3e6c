use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;

use dispatch_core::evaluator::EvaluationSummary;
use dispatch_core::requests::GenerationStats;
use dispatch_core::scenario::HarnessConfig;
use dispatch_core::telemetry::TrajectoryPoint;
use dispatch_core::vehicle::VehicleId;
use serde::Serialize;

use crate::error::EvalError;
use crate::runner::EvaluationRun;

#[derive(Serialize)]
struct SummaryDocument<'a> {
    label: &'a str,
    agent: &'a str,
    config: &'a HarnessConfig,
    generation: &'a GenerationStats,
    epoch_ms: i64,
    final_time_ms: u64,
    unfinished_trips: usize,
    events_processed: usize,
    events_discarded: usize,
    evaluation: &'a EvaluationSummary,
}

pub(crate) fn summary_json_impl(run: &EvaluationRun, file: File) -> Result<(), EvalError> {
    let report = &run.report;
    let document = SummaryDocument {
        label: &run.spec.label,
        agent: &report.agent,
        config: &run.spec.config,
        generation: &run.generation,
        epoch_ms: report.epoch_ms,
        final_time_ms: report.final_time_ms,
        unfinished_trips: report.unfinished_trips,
        events_processed: report.events_processed,
        events_discarded: report.events_discarded,
        evaluation: &run.summary,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &document)?;
    Ok(())
}

#[derive(Serialize)]
struct VehicleTrajectory<'a> {
    vehicle_id: VehicleId,
    points: &'a [TrajectoryPoint],
}

pub(crate) fn trajectories_json_impl(
    trajectories: &BTreeMap<VehicleId, Vec<TrajectoryPoint>>,
    file: File,
) -> Result<(), EvalError> {
    let document: Vec<VehicleTrajectory<'_>> = trajectories
        .iter()
        .map(|(vehicle_id, points)| VehicleTrajectory {
            vehicle_id: *vehicle_id,
            points,
        })
        .collect();
    serde_json::to_writer_pretty(BufWriter::new(file), &document)?;
    Ok(())
}

pub(crate) fn summaries_json_impl(
    summaries: &[&EvaluationSummary],
    file: File,
) -> Result<(), EvalError> {
    serde_json::to_writer_pretty(BufWriter::new(file), summaries)?;
    Ok(())
}
