mod support;

use dispatch_core::agent::AgentKind;
use dispatch_core::scenario::HarnessConfig;
use dispatch_eval::{
    export_comparison_csv, find_best_run_index, run_evaluation, run_parallel_evaluations,
    write_run_artifacts, EvaluationGrid, EvaluationInputs, RunSpec,
};

fn base_config() -> HarnessConfig {
    HarnessConfig::default()
        .with_num_vehicles(3)
        .with_num_requests(6)
}

fn load_inputs(dir: &std::path::Path) -> EvaluationInputs {
    let (zones, trips) = support::write_inputs(dir);
    EvaluationInputs::load(zones, trips).expect("inputs should load")
}

#[test]
fn run_writes_every_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inputs = load_inputs(dir.path());
    let run = run_evaluation(&RunSpec::single(base_config()), &inputs).expect("run");

    let out = dir.path().join("results");
    let artifacts = write_run_artifacts(&run, &out, true).expect("artifacts");
    assert_eq!(artifacts.dir, out.join("nearest-seed42"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&artifacts.summary).expect("summary"))
            .expect("summary json");
    assert_eq!(summary["evaluation"]["parsing"]["total_requests"], 6);
    assert_eq!(
        summary["evaluation"]["routing"]["completed_trips"],
        run.report.outcomes.len()
    );

    let mut reader = csv::Reader::from_path(&artifacts.outcomes_csv).expect("outcomes csv");
    assert_eq!(reader.records().count(), run.report.outcomes.len());

    let trajectories: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&artifacts.trajectories).expect("read"))
            .expect("trajectories json");
    assert_eq!(trajectories.len(), run.report.trajectories.len());

    let geojson_path = artifacts.geojson.expect("map requested");
    let geojson: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(geojson_path).expect("read"))
            .expect("geojson");
    assert_eq!(geojson["type"], "FeatureCollection");

    assert_eq!(artifacts.parquet.len(), 3);
    assert!(artifacts.parquet.iter().all(|path| path.exists()));
}

#[test]
fn run_without_map_skips_geojson() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inputs = load_inputs(dir.path());
    let run = run_evaluation(&RunSpec::single(base_config()), &inputs).expect("run");
    let artifacts = write_run_artifacts(&run, dir.path(), false).expect("artifacts");
    assert!(artifacts.geojson.is_none());
    assert!(!artifacts.dir.join("trajectories.geojson").exists());
}

#[test]
fn sweep_comparison_has_one_row_per_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inputs = load_inputs(dir.path());
    let specs = EvaluationGrid::new(base_config())
        .agents(vec![AgentKind::default(), AgentKind::Regex])
        .seeds(vec![7, 8])
        .generate();

    let runs: Vec<_> = run_parallel_evaluations(&specs, &inputs, Some(2), false)
        .expect("pool")
        .into_iter()
        .map(|result| result.expect("run"))
        .collect();

    let path = dir.path().join("comparison.csv");
    export_comparison_csv(&runs, &path).expect("comparison");

    let mut reader = csv::Reader::from_path(&path).expect("reader");
    let labels: Vec<String> = reader
        .records()
        .map(|record| record.expect("record")[1].to_string())
        .collect();
    assert_eq!(
        labels,
        ["nearest-seed7", "nearest-seed8", "regex-seed7", "regex-seed8"]
    );

    let best = find_best_run_index(&runs).expect("best");
    assert!(runs
        .iter()
        .all(|run| run.summary.overall_score <= runs[best].summary.overall_score));
}

#[test]
fn missing_trip_file_is_a_data_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (zones, _) = support::write_inputs(dir.path());
    assert!(EvaluationInputs::load(zones, dir.path().join("missing.csv")).is_err());
}
