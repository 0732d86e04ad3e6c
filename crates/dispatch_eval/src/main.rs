use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dispatch_core::agent::AgentKind;
use dispatch_core::scenario::HarnessConfig;
use dispatch_eval::export::export_summaries_json;
use dispatch_eval::{
    export_comparison_csv, find_best_run_index, run_evaluation, run_parallel_evaluations,
    write_run_artifacts, EvaluationGrid, EvaluationInputs, EvaluationRun, RunSpec,
};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "dispatch_eval",
    about = "Evaluate dispatch agents against a simulated ride-hailing fleet",
    long_about = "Generates ride requests from historical trip records, lets an agent parse\n\
                  and dispatch each one, simulates the fleet and scores the result."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one agent on one seed
    Run {
        #[command(flatten)]
        common: CommonArgs,
        /// Seed for request generation, fleet placement and randomized agents
        #[arg(long)]
        seed: Option<u64>,
        /// Reuse the travel-time matrix stored here; requires the `precomputed` feature
        #[arg(long)]
        matrix_path: Option<PathBuf>,
    },
    /// Evaluate every listed agent against every listed seed
    Sweep {
        #[command(flatten)]
        common: CommonArgs,
        /// Agents to compare (defaults to the configured agent)
        #[arg(long, value_enum, value_delimiter = ',')]
        agents: Vec<AgentChoice>,
        /// Seeds to run (defaults to the configured seed)
        #[arg(long, value_delimiter = ',')]
        seeds: Vec<u64>,
        /// Worker threads (defaults to the number of CPUs)
        #[arg(long)]
        threads: Option<usize>,
        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// JSON configuration file; flags override its values
    #[arg(long, env = "DISPATCH_EVAL_CONFIG")]
    config: Option<PathBuf>,
    /// Taxi zone table (LocationID, Borough, Zone, latitude, longitude)
    #[arg(long, env = "DISPATCH_EVAL_ZONES")]
    zones: PathBuf,
    /// Historical trip records CSV
    #[arg(long, env = "DISPATCH_EVAL_TRIPS")]
    trips: PathBuf,
    /// Directory for run artifacts
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,
    /// Agent to evaluate
    #[arg(long, value_enum)]
    agent: Option<AgentChoice>,
    /// Endpoint of a remote agent
    #[arg(long)]
    endpoint: Option<String>,
    /// Let the agent read the structured request instead of parsing the prompt
    #[arg(long)]
    ground_truth: Option<bool>,
    #[arg(long)]
    num_vehicles: Option<usize>,
    #[arg(long)]
    num_requests: Option<usize>,
    /// Time after the last request before the run stops
    #[arg(long)]
    horizon_hours: Option<u64>,
    /// Pause between requests, for rate-limited agents
    #[arg(long)]
    inter_request_delay_ms: Option<u64>,
    /// Share of prompts written from templates; the rest use the phrasebook
    #[arg(long)]
    template_ratio: Option<f64>,
    /// Jitter pickup and dropoff points inside their zone
    #[arg(long)]
    augment_locations: bool,
    /// Also write trajectories as GeoJSON
    #[arg(long)]
    map: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AgentChoice {
    Nearest,
    Random,
    Regex,
    /// Requires the `remote` feature
    Remote,
}

// ── Config assembly ────────────────────────────────────────────────

fn agent_kind(choice: AgentChoice, endpoint: Option<&str>) -> Result<AgentKind> {
    Ok(match choice {
        AgentChoice::Nearest => AgentKind::default(),
        AgentChoice::Random => AgentKind::Random {
            use_ground_truth: false,
        },
        AgentChoice::Regex => AgentKind::Regex,
        AgentChoice::Remote => remote_agent(endpoint)?,
    })
}

#[cfg(feature = "remote")]
fn remote_agent(endpoint: Option<&str>) -> Result<AgentKind> {
    let Some(endpoint) = endpoint else {
        bail!("--endpoint is required for the remote agent");
    };
    Ok(AgentKind::Remote {
        endpoint: endpoint.to_string(),
        timeout_secs: dispatch_core::agent::remote::default_timeout_secs(),
        use_ground_truth: false,
    })
}

#[cfg(not(feature = "remote"))]
fn remote_agent(_endpoint: Option<&str>) -> Result<AgentKind> {
    bail!("the remote agent needs dispatch_eval built with the `remote` feature")
}

fn set_ground_truth(kind: &mut AgentKind, value: bool) {
    match kind {
        AgentKind::Nearest { use_ground_truth } | AgentKind::Random { use_ground_truth } => {
            *use_ground_truth = value;
        }
        #[cfg(feature = "remote")]
        AgentKind::Remote {
            use_ground_truth, ..
        } => *use_ground_truth = value,
        AgentKind::Regex => {
            if value {
                tracing::warn!("the regex agent always parses the prompt; --ground-truth ignored");
            }
        }
    }
}

fn build_config(common: &CommonArgs) -> Result<HarnessConfig> {
    let mut config = match &common.config {
        Some(path) => HarnessConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    if let Some(choice) = common.agent {
        config = config.with_agent(agent_kind(choice, common.endpoint.as_deref())?);
    }
    if let Some(value) = common.ground_truth {
        set_ground_truth(&mut config.agent, value);
    }
    if let Some(n) = common.num_vehicles {
        config = config.with_num_vehicles(n);
    }
    if let Some(n) = common.num_requests {
        config = config.with_num_requests(n);
    }
    if let Some(hours) = common.horizon_hours {
        config = config.with_horizon_hours(hours);
    }
    if let Some(delay) = common.inter_request_delay_ms {
        config = config.with_inter_request_delay_ms(delay);
    }
    if let Some(ratio) = common.template_ratio {
        config = config.with_template_ratio(ratio);
    }
    if common.augment_locations {
        config = config.with_augment_locations(true);
    }
    Ok(config)
}

fn load_inputs(common: &CommonArgs) -> Result<EvaluationInputs> {
    EvaluationInputs::load(&common.zones, &common.trips).with_context(|| {
        format!(
            "loading zones from {} and trips from {}",
            common.zones.display(),
            common.trips.display()
        )
    })
}

// ── Reporting ──────────────────────────────────────────────────────

fn print_run(run: &EvaluationRun) {
    let parsing = &run.summary.parsing;
    let routing = &run.summary.routing;
    println!("{}", run.spec.label);
    println!(
        "  requests:        {} ({} assigned, {} completed, {} unfinished)",
        routing.total_requests, routing.assigned, routing.completed_trips, run.report.unfinished_trips
    );
    println!("  parsing:         {:.1}%", parsing.overall_accuracy * 100.0);
    println!("  assignment rate: {:.1}%", routing.assignment_rate * 100.0);
    println!("  deadhead ratio:  {:.3}", routing.deadhead_ratio);
    println!("  revenue/mile:    ${:.2}", routing.revenue_per_mile);
    println!("  net revenue:     ${:.2}", routing.net_revenue);
    println!("  overall score:   {:.4}", run.summary.overall_score);
}

fn write_artifacts(run: &EvaluationRun, output_dir: &Path, map: bool) -> Result<()> {
    let artifacts = write_run_artifacts(run, output_dir, map)
        .with_context(|| format!("writing artifacts for {}", run.spec.label))?;
    tracing::info!(run = %run.spec.label, dir = %artifacts.dir.display(), "artifacts written");
    Ok(())
}

// ── Commands ───────────────────────────────────────────────────────

fn cmd_run(common: CommonArgs, seed: Option<u64>, matrix_path: Option<PathBuf>) -> Result<()> {
    let mut config = build_config(&common)?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if let Some(path) = matrix_path {
        config = config.with_matrix_path(path);
    }
    config.validate().context("invalid configuration")?;
    let inputs = load_inputs(&common)?;

    let run = run_evaluation(&RunSpec::single(config), &inputs)?;
    write_artifacts(&run, &common.output_dir, common.map)?;
    print_run(&run);
    Ok(())
}

fn cmd_sweep(
    common: CommonArgs,
    agents: Vec<AgentChoice>,
    seeds: Vec<u64>,
    threads: Option<usize>,
    show_progress: bool,
) -> Result<()> {
    let mut base = build_config(&common)?;
    base.validate().context("invalid configuration")?;
    if let Some(path) = base.matrix_path.take() {
        // Parallel runs would race on one file.
        tracing::warn!(path = %path.display(), "matrix_path ignored for sweeps");
    }
    let mut kinds = agents
        .into_iter()
        .map(|choice| agent_kind(choice, common.endpoint.as_deref()))
        .collect::<Result<Vec<_>>>()?;
    if let Some(value) = common.ground_truth {
        kinds.iter_mut().for_each(|kind| set_ground_truth(kind, value));
    }
    let specs = EvaluationGrid::new(base).agents(kinds).seeds(seeds).generate();
    let inputs = load_inputs(&common)?;
    tracing::info!(runs = specs.len(), "starting sweep");

    let mut runs = Vec::with_capacity(specs.len());
    for (spec, result) in specs
        .iter()
        .zip(run_parallel_evaluations(&specs, &inputs, threads, show_progress)?)
    {
        match result {
            Ok(run) => runs.push(run),
            Err(err) => tracing::error!(run = %spec.label, error = %err, "run failed"),
        }
    }
    if runs.is_empty() {
        bail!("every run failed");
    }

    for run in &runs {
        write_artifacts(run, &common.output_dir, common.map)?;
    }
    export_comparison_csv(&runs, common.output_dir.join("comparison.csv"))?;
    let summaries: Vec<_> = runs.iter().map(|run| &run.summary).collect();
    export_summaries_json(&summaries, common.output_dir.join("summaries.json"))?;

    for run in &runs {
        print_run(run);
    }
    if let Some(best) = find_best_run_index(&runs) {
        println!(
            "\nbest: {} (score {:.4})",
            runs[best].spec.label, runs[best].summary.overall_score
        );
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            common,
            seed,
            matrix_path,
        } => cmd_run(common, seed, matrix_path),
        Commands::Sweep {
            common,
            agents,
            seeds,
            threads,
            no_progress,
        } => cmd_sweep(common, agents, seeds, threads, !no_progress),
    }
}
