//! Example: compare the built-in agents across a few seeds.
//!
//! Usage: `cargo run -p dispatch_eval --example agent_comparison -- <zones.csv> <trips.csv>`

use dispatch_core::agent::AgentKind;
use dispatch_core::scenario::HarnessConfig;
use dispatch_eval::{
    export_comparison_csv, find_best_run_index, run_parallel_evaluations, EvaluationGrid,
    EvaluationInputs,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(zones), Some(trips)) = (args.next(), args.next()) else {
        eprintln!("usage: agent_comparison <zones.csv> <trips.csv>");
        std::process::exit(2);
    };

    let inputs = EvaluationInputs::load(zones, trips)?;
    let base = HarnessConfig::default()
        .with_num_vehicles(20)
        .with_num_requests(100);
    let specs = EvaluationGrid::new(base)
        .agents(vec![
            AgentKind::default(),
            AgentKind::Random {
                use_ground_truth: true,
            },
            AgentKind::Regex,
        ])
        .seeds(vec![1, 2, 3])
        .generate();

    println!("Running {} evaluations...", specs.len());
    let runs: Vec<_> = run_parallel_evaluations(&specs, &inputs, None, true)?
        .into_iter()
        .filter_map(Result::ok)
        .collect();

    for run in &runs {
        println!(
            "{:<20} parse {:>5.1}%  deadhead {:.3}  $/mile {:>5.2}  score {:.4}",
            run.spec.label,
            run.summary.parsing.overall_accuracy * 100.0,
            run.summary.routing.deadhead_ratio,
            run.summary.routing.revenue_per_mile,
            run.summary.overall_score
        );
    }

    if let Some(best) = find_best_run_index(&runs) {
        println!("\nBest: {}", runs[best].spec.label);
    }
    export_comparison_csv(&runs, "agent_comparison.csv")?;
    println!("Comparison written to agent_comparison.csv");
    Ok(())
}
