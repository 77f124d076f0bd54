// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop Bench Runner
// Headless soak: every scenario through the real loop on a software raster,
// N seeds each, invariants checked after every frame.
//
// Usage:
//   cargo run --release --features cli --bin bench                  # all scenarios, 5 seeds
//   cargo run --release --features cli --bin bench -- storm         # filter by name
//   cargo run --release --features cli --bin bench -- --ticks 500   # override frame count
//   cargo run --release --features cli --bin bench -- --json out.json --png last.png

mod invariants;
mod report;
mod runs;
mod scenarios;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use neural_backdrop::BackdropConfig;
use report::{BenchReport, Summary};
use scenarios::{scenarios, Scenario};

#[derive(Parser)]
#[command(
    name = "bench",
    about = "Headless soak runner for the neural backdrop animation",
    version
)]
struct Cli {
    /// Only run scenarios whose name contains this string
    filter: Option<String>,

    /// Frames per run (defaults to each scenario's own length)
    #[arg(long)]
    ticks: Option<u64>,

    /// Seeds per scenario
    #[arg(long, default_value_t = 5)]
    runs: usize,

    /// First seed; runs use seed, seed+1, ...
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write the full report as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the last rendered frame as PNG
    #[arg(long)]
    png: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let all = scenarios();
    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f = f.to_lowercase();
            all.iter().filter(|s| s.name.contains(&f)).collect()
        }
        None => all.iter().collect(),
    };
    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        return Ok(ExitCode::FAILURE);
    }

    println!("\n  Neural Backdrop Bench");
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!(
        "  {:<36} {:>6} {:>7} {:>9} {:>8} {:>7} {:>8} {:>9}",
        "Scenario", "Pass%", "Ticks", "Delivered", "Dropped", "Peak", "Energy", "Frames/s"
    );
    println!("  {}", "-".repeat(98));

    let suite_start = Instant::now();
    let mut reports = Vec::new();
    let mut last_frame = None;
    for scenario in to_run {
        let ticks = cli.ticks.unwrap_or(scenario.ticks);
        let (report, frame) = runs::run_seeds(scenario, cli.runs, cli.seed, ticks);
        println!(
            "  {:<36} {:>5.0}% {:>7} {:>9.0} {:>8.0} {:>7.0} {:>8.3} {:>9.0}  {}",
            report.label,
            report.pass_rate * 100.0,
            ticks,
            report.delivered.mean,
            report.dropped.mean,
            report.peak_packets.max,
            report.final_mean_energy.mean,
            report.frames_per_sec.mean,
            if report.all_passed() { "PASS" } else { "FAIL" },
        );
        for run in report.individual_runs.iter().filter(|r| !r.pass) {
            for violation in &run.violations {
                println!("      seed {}: {}", run.seed, violation);
            }
        }
        if frame.as_ref().is_some_and(|f| f.width() > 0 && f.height() > 0) {
            last_frame = frame;
        }
        reports.push(report);
    }

    let total = reports.len();
    let passed = reports.iter().filter(|r| r.all_passed()).count();
    let summary = Summary {
        total,
        passed,
        failed: total - passed,
        total_violations: reports
            .iter()
            .flat_map(|r| &r.individual_runs)
            .map(|r| r.violation_count)
            .sum(),
    };
    println!("  {}", "-".repeat(98));
    println!(
        "  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        summary.total,
        summary.passed,
        summary.failed,
        suite_start.elapsed().as_secs_f64()
    );

    if let Some(path) = &cli.png {
        match last_frame.as_ref().and_then(|f| f.to_image()) {
            Some(image) => {
                image.save(path)?;
                println!("  Last frame saved to: {}", path.display());
            }
            None => eprintln!("  No non-empty frame to save"),
        }
    }

    let failed = summary.failed;
    if let Some(path) = &cli.json {
        let report = BenchReport {
            version: env!("CARGO_PKG_VERSION"),
            prng: "ChaCha8Rng",
            base_seed: cli.seed,
            n_runs_per_scenario: cli.runs,
            default_config: BackdropConfig::default(),
            summary,
            scenarios: reports,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("  Report saved to: {}\n", path.display());
    }

    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
