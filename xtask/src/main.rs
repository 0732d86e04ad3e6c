use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the dispatch evaluation workspace",
    long_about = "A unified CLI for running evaluations, agent comparisons, benchmarks,\n\
                  and CI checks in the dispatch evaluation workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the nearest-vehicle agent on the given data
    Run {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Evaluate every built-in agent over three seeds
    Sweep {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Run the agent comparison example
    Compare {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, examples, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(clap::Args)]
struct DataArgs {
    /// Taxi zone table
    #[arg(long, env = "DISPATCH_EVAL_ZONES")]
    zones: String,
    /// Historical trip records
    #[arg(long, env = "DISPATCH_EVAL_TRIPS")]
    trips: String,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build the examples
    Examples,
    /// Run benchmarks
    Bench,
    /// Run check + examples + bench
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn spawn(program: &str, args: &[&str]) -> ExitStatus {
    eprintln!("+ {program} {}", args.join(" "));
    Command::new(program)
        .args(args)
        .status()
        .unwrap_or_else(|err| {
            eprintln!("failed to execute {program}: {err}");
            exit(1);
        })
}

fn run(program: &str, args: &[&str]) {
    let status = spawn(program, args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_cargo(args: &[&str]) {
    run("cargo", args);
}

fn run_git(args: &[&str]) {
    run("git", args);
}

fn run_eval(subcommand: &str, data: &DataArgs, extra: &[&str]) {
    let mut args = vec![
        "run",
        "-p",
        "dispatch_eval",
        "--release",
        "--",
        subcommand,
        "--zones",
        data.zones.as_str(),
        "--trips",
        data.trips.as_str(),
    ];
    args.extend_from_slice(extra);
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test dispatch_core");
    run_cargo(&["test", "-p", "dispatch_core"]);

    step("Test dispatch_eval");
    run_cargo(&["test", "-p", "dispatch_eval"]);
}

fn ci_examples() {
    step("Build examples");
    run_cargo(&["build", "--workspace", "--examples", "--release"]);
}

fn ci_bench() {
    step("Run benchmarks");
    run_cargo(&["bench", "--package", "dispatch_core", "--bench", "performance"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { data } => run_eval("run", &data, &["--map"]),
        Commands::Sweep { data } => run_eval(
            "sweep",
            &data,
            &["--agents", "nearest,random,regex", "--seeds", "1,2,3"],
        ),
        Commands::Compare { data } => {
            run_cargo(&[
                "run",
                "-p",
                "dispatch_eval",
                "--release",
                "--example",
                "agent_comparison",
                "--",
                &data.zones,
                &data.trips,
            ]);
        }
        Commands::Bench => {
            run_cargo(&["bench", "--package", "dispatch_core", "--bench", "performance"]);
        }
        Commands::BenchCompare => {
            let baseline_dir = Path::new("target/criterion");
            if baseline_dir.exists() {
                step("Removing existing benchmark data");
                if let Err(err) = std::fs::remove_dir_all(baseline_dir) {
                    eprintln!("failed to remove target/criterion: {err}");
                    exit(1);
                }
            }

            step("Stashing current changes");
            run_git(&[
                "stash",
                "push",
                "-m",
                "Temporary stash for benchmark comparison",
            ]);

            step("Running benchmark to create baseline");
            run_cargo(&[
                "bench",
                "--package",
                "dispatch_core",
                "--bench",
                "performance",
                "--",
                "--save-baseline",
                "main",
            ]);

            step("Reapplying changes");
            run_git(&["stash", "pop"]);

            step("Running benchmark comparing against baseline");
            run_cargo(&[
                "bench",
                "--package",
                "dispatch_core",
                "--bench",
                "performance",
                "--",
                "--baseline",
                "main",
            ]);

            eprintln!("\nDone! Check the output above to see performance comparison.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Examples => ci_examples(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_examples();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
