//! Maneuver Queue Simulator CLI
//!
//! Run deterministic tracking-station scenarios against the queue.

use clap::Parser;
use maneuver_sim::scenarios::ScenarioId;
use maneuver_sim::{ScenarioResult, ScenarioRunner};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Maneuver Queue Deterministic Simulation CLI
#[derive(Parser, Debug)]
#[command(name = "maneuver-sim")]
#[command(about = "Run deterministic simulation scenarios for the maneuver queue", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Vessels launched at the start of each run
    #[arg(short = 'n', long, default_value = "12")]
    vessels: usize,

    /// Scenario to run (baseline, node_rush, fleet_churn, time_slip, blackout, mode_flip, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Real seconds simulated per run
    #[arg(short, long, default_value = "10")]
    duration: f64,

    /// Simulation steps per real second
    #[arg(short = 't', long, default_value = "30")]
    tick_rate: u32,

    /// Warp rate the scripted player asks for
    #[arg(short, long, default_value = "1000")]
    warp: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export captured frames to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn base_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

fn report(result: &ScenarioResult) {
    if result.passed {
        info!(
            publishes = result.metrics.publishes,
            clamps = result.metrics.clamps,
            "✓ {} (seed={}) PASSED",
            result.scenario.name(),
            result.seed
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

fn run_export(runner: &ScenarioRunner, scenario: ScenarioId, path: &str) -> bool {
    info!("Running with export to: {}", path);

    let (result, export) = runner.run_with_export(scenario);
    report(&result);

    match export {
        Some(export) => match export.write_to_file(path) {
            Ok(()) => info!("Exported {} frames to {}", export.frames.len(), path),
            Err(e) => {
                error!("Failed to write export: {}", e);
                return false;
            }
        },
        None => error!("Scenario produced no frames"),
    }
    result.passed
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("Maneuver Queue Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(id) => vec![id],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!(
                    "Available scenarios: baseline, node_rush, fleet_churn, time_slip, blackout, mode_flip, all"
                );
                std::process::exit(1);
            }
        }
    };

    let base_seed = base_seed(args.seed);

    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }
        let runner = ScenarioRunner::new(base_seed, args.vessels)
            .with_tick_rate(args.tick_rate)
            .with_duration(args.duration)
            .with_warp_rate(args.warp);
        if !run_export(&runner, scenarios[0], export_path) {
            std::process::exit(1);
        }
        return;
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed, args.vessels)
            .with_tick_rate(args.tick_rate)
            .with_duration(args.duration)
            .with_warp_rate(args.warp);

        for scenario in &scenarios {
            let result = runner.run(*scenario);
            if !args.json {
                report(&result);
            }
            all_results.push(result);
        }
    }

    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed_count,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "vessels": r.final_vessel_count,
                    "publishes": r.metrics.publishes,
                    "clamps": r.metrics.clamps,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    if failed_count > 0 {
        std::process::exit(1);
    }
}
