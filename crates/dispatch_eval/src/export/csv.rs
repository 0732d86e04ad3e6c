use std::fs::File;

use dispatch_core::telemetry::TripOutcome;

use crate::error::EvalError;
use crate::runner::EvaluationRun;
use crate::sweep::agent_label;

pub(crate) fn outcomes_csv_impl(outcomes: &[TripOutcome], file: File) -> Result<(), EvalError> {
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "trip_id",
        "vehicle_id",
        "passengers",
        "deadhead_miles",
        "loaded_miles",
        "revenue",
        "requested_at",
        "assigned_at",
        "pickup_at",
        "dropoff_at",
        "wait_secs",
    ])?;

    for outcome in outcomes {
        wtr.write_record(&[
            outcome.trip_id.clone(),
            outcome.vehicle_id.0.to_string(),
            outcome.passengers.to_string(),
            format!("{:.4}", outcome.deadhead_miles),
            format!("{:.4}", outcome.loaded_miles),
            format!("{:.2}", outcome.revenue),
            outcome.requested_at.to_string(),
            outcome.assigned_at.to_string(),
            outcome.pickup_at.to_string(),
            outcome.dropoff_at.to_string(),
            (outcome.wait_ms() / 1000).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub(crate) fn comparison_csv_impl(runs: &[EvaluationRun], file: File) -> Result<(), EvalError> {
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "run_id",
        "label",
        "agent",
        "seed",
        "requests",
        "assigned",
        "completed_trips",
        "assignment_rate",
        "parsing_accuracy",
        "deadhead_ratio",
        "revenue_per_mile",
        "net_revenue",
        "unfinished_trips",
        "overall_score",
    ])?;

    for run in runs {
        let parsing = &run.summary.parsing;
        let routing = &run.summary.routing;
        wtr.write_record(&[
            run.spec.run_id.to_string(),
            run.spec.label.clone(),
            agent_label(&run.spec.config.agent).to_string(),
            run.spec.config.seed.to_string(),
            routing.total_requests.to_string(),
            routing.assigned.to_string(),
            routing.completed_trips.to_string(),
            format!("{:.4}", routing.assignment_rate),
            format!("{:.4}", parsing.overall_accuracy),
            format!("{:.4}", routing.deadhead_ratio),
            format!("{:.4}", routing.revenue_per_mile),
            format!("{:.2}", routing.net_revenue),
            run.report.unfinished_trips.to_string(),
            format!("{:.4}", run.summary.overall_score),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
