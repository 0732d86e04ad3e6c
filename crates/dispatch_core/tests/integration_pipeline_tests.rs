mod support;

use dispatch_core::agent::{build_agent, AgentKind};
use dispatch_core::environment::RunReport;
use dispatch_core::evaluator::EvaluationSummary;
use dispatch_core::requests::{GeneratedRequests, RequestGenerator};
use dispatch_core::scenario::{build_environment, HarnessConfig};

use support::data::{trip_records, zones};

fn config() -> HarnessConfig {
    HarnessConfig::default()
        .with_num_vehicles(3)
        .with_num_requests(6)
        .with_seed(7)
}

fn generate(config: &HarnessConfig) -> GeneratedRequests {
    let zones = zones();
    RequestGenerator::new(&zones, config.generator_params())
        .generate(&trip_records())
        .expect("requests should generate")
}

fn run(config: &HarnessConfig) -> (GeneratedRequests, RunReport, EvaluationSummary) {
    let generated = generate(config);
    let mut env = build_environment(config, &generated).expect("environment");
    let mut agent = build_agent(&config.agent, &zones(), config.seed).expect("agent");
    let report = env.run(&generated.requests, agent.as_mut(), &config.run_options());
    let summary = config.evaluator().evaluate(
        &report.agent,
        &generated.requests,
        &report.assignments,
        &report.outcomes,
    );
    (generated, report, summary)
}

#[test]
fn nearest_agent_end_to_end() {
    let config = config();
    let (generated, report, summary) = run(&config);

    assert_eq!(generated.requests.len(), 6);
    assert_eq!(report.agent, "nearest");
    assert_eq!(report.assignments.len(), 6);
    assert_eq!(report.vehicles.len(), 3);

    let assigned = report
        .assignments
        .iter()
        .filter(|a| a.outcome.is_assigned())
        .count();
    assert!(assigned > 0);
    assert_eq!(report.outcomes.len() + report.unfinished_trips, assigned);
    assert_eq!(report.unfinished_trips, 0);

    // Ground-truth parsing.
    assert!((summary.parsing.overall_accuracy - 1.0).abs() < 1e-12);
    assert_eq!(summary.routing.assigned, assigned);
    assert!((0.0..=1.0).contains(&summary.overall_score));
    assert!(summary.routing.total_revenue >= 8.0 * report.outcomes.len() as f64);

    for outcome in &report.outcomes {
        assert!(outcome.pickup_at >= outcome.assigned_at);
        assert!(outcome.dropoff_at > outcome.pickup_at);
        assert!(outcome.assigned_at >= outcome.requested_at);
    }
}

#[test]
fn same_seed_reproduces_the_run() {
    let config = config();
    let (_, a, sa) = run(&config);
    let (_, b, sb) = run(&config);
    assert_eq!(a.assignments, b.assignments);
    assert_eq!(a.outcomes, b.outcomes);
    assert_eq!(a.vehicles, b.vehicles);
    assert_eq!(sa.overall_score, sb.overall_score);
}

#[test]
fn random_agent_is_seeded() {
    let config = config().with_agent(AgentKind::Random {
        use_ground_truth: true,
    });
    let (_, a, _) = run(&config);
    let (_, b, _) = run(&config);
    assert_eq!(a.agent, "random");
    assert_eq!(a.assignments, b.assignments);
}

#[test]
fn regex_agent_reads_template_prompts() {
    let config = config().with_agent(AgentKind::Regex).with_template_ratio(1.0);
    let (_, report, summary) = run(&config);

    assert_eq!(report.agent, "regex");
    assert_eq!(summary.parsing.parsed_requests, 6);
    assert!((summary.parsing.zone_accuracy - 1.0).abs() < 1e-12);
    assert!((summary.parsing.passenger_count_accuracy - 1.0).abs() < 1e-12);
    assert!((summary.parsing.time_constraint_accuracy - 1.0).abs() < 1e-12);
}

#[test]
fn run_without_matrix_matches_point_queries() {
    let mut config = config();
    config.precompute_matrix = false;
    let (_, without, _) = run(&config);
    config.precompute_matrix = true;
    let (_, with, _) = run(&config);
    assert_eq!(without.assignments.len(), with.assignments.len());
    for (a, b) in without.outcomes.iter().zip(&with.outcomes) {
        assert!((a.loaded_miles - b.loaded_miles).abs() < 1e-9);
    }
}
