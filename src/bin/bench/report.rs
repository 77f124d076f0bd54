// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bench report types
// Structured output for comparing runs across seeds and builds

use neural_backdrop::BackdropConfig;
use serde::Serialize;

// ─── Statistics (per-metric aggregation over seeds) ─────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        Self {
            mean,
            std_dev: variance.sqrt(),
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub seed: u64,
    pub pass: bool,
    pub ticks: u64,
    pub frames: u64,
    pub skipped_frames: u64,
    pub nodes: usize,
    pub edges: usize,
    pub emissions: u64,
    pub created: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub peak_packets: usize,
    pub final_mean_energy: f64,
    pub violation_count: u64,
    pub violations: Vec<String>,
    pub elapsed_ms: f64,
    pub frames_per_sec: f64,
}

// ─── Scenario Report (aggregation over seeds) ───────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario_name: String,
    pub label: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub peak_packets: Stats,
    pub delivered: Stats,
    pub dropped: Stats,
    pub final_mean_energy: Stats,
    pub frames_per_sec: Stats,
    pub individual_runs: Vec<BenchResult>,
}

impl ScenarioReport {
    pub fn from_runs(name: &str, label: &str, runs: Vec<BenchResult>) -> Self {
        let metric = |f: fn(&BenchResult) -> f64| {
            Stats::from_samples(&runs.iter().map(f).collect::<Vec<_>>())
        };
        let passed = runs.iter().filter(|r| r.pass).count();
        Self {
            scenario_name: name.to_string(),
            label: label.to_string(),
            n_runs: runs.len(),
            pass_rate: if runs.is_empty() { 0.0 } else { passed as f64 / runs.len() as f64 },
            peak_packets: metric(|r| r.peak_packets as f64),
            delivered: metric(|r| r.delivered as f64),
            dropped: metric(|r| r.dropped as f64),
            final_mean_energy: metric(|r| r.final_mean_energy),
            frames_per_sec: metric(|r| r.frames_per_sec),
            individual_runs: runs,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.individual_runs.iter().all(|r| r.pass)
    }
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub version: &'static str,
    pub prng: &'static str,
    pub base_seed: u64,
    pub n_runs_per_scenario: usize,
    pub default_config: BackdropConfig,
    pub summary: Summary,
    pub scenarios: Vec<ScenarioReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_violations: u64,
}
