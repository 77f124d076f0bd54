// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Seeded runs: one scenario, N seeds, each driven through the real loop

use std::time::Instant;

use neural_backdrop::{LoopPhase, ManualHost, Raster, SimulationLoop};

use crate::invariants::InvariantChecker;
use crate::report::{BenchResult, ScenarioReport};
use crate::scenarios::Scenario;

/// Run a single scenario with one seed. Returns the result and the last
/// rendered frame.
pub fn run_single(scenario: &Scenario, seed: u64, ticks: u64) -> (BenchResult, Option<Raster>) {
    let start = Instant::now();
    let config = (scenario.config)(seed);
    let mut result = BenchResult {
        scenario: scenario.name.to_string(),
        seed,
        pass: false,
        ticks,
        frames: 0,
        skipped_frames: 0,
        nodes: 0,
        edges: 0,
        emissions: 0,
        created: 0,
        dropped: 0,
        delivered: 0,
        peak_packets: 0,
        final_mean_energy: 0.0,
        violation_count: 0,
        violations: Vec::new(),
        elapsed_ms: 0.0,
        frames_per_sec: 0.0,
    };

    let mut lp = match SimulationLoop::new(config, ManualHost::new()) {
        Ok(lp) => lp,
        Err(err) => {
            result.violations.push(format!("invalid config: {err}"));
            result.violation_count = 1;
            return (result, None);
        }
    };
    if lp.start(Raster::new(scenario.width, scenario.height)) != LoopPhase::Running {
        result.violations.push("loop did not start".to_string());
        result.violation_count = 1;
        return (result, None);
    }

    let mut checker = InvariantChecker::new();
    let mut hit_cap = false;
    for tick in 0..ticks {
        if let Some(event) = scenario.event {
            event(&mut lp, tick, ticks);
        }
        lp.frame();
        if let Some(sim) = lp.simulation() {
            checker.check(sim);
            hit_cap |= sim.packets().len() >= sim.config().packet_cap;
        }
    }
    lp.stop();

    let elapsed = start.elapsed().as_secs_f64();
    let stats = *lp.stats();
    if let Some(sim) = lp.simulation() {
        result.nodes = sim.nodes().len();
        result.edges = sim.edge_count();
        result.final_mean_energy = sim.mean_energy();
    }
    result.frames = stats.frames;
    result.skipped_frames = stats.skipped_frames;
    result.emissions = stats.emissions;
    result.created = stats.created;
    result.dropped = stats.dropped;
    result.delivered = stats.delivered;
    result.peak_packets = stats.peak_packets;
    result.elapsed_ms = elapsed * 1000.0;
    result.frames_per_sec = if elapsed > 0.0 { stats.frames as f64 / elapsed } else { 0.0 };

    let expect = scenario.expect;
    if expect.no_nodes && result.nodes != 0 {
        checker.violations.push(format!("expected no nodes, found {}", result.nodes));
        checker.violation_count += 1;
    }
    if expect.hits_cap && result.edges > 0 && !hit_cap {
        checker.violations.push("packet cap never reached".to_string());
        checker.violation_count += 1;
    }
    if expect.delivers && result.edges > 0 && result.delivered == 0 {
        checker.violations.push("no packet was delivered".to_string());
        checker.violation_count += 1;
    }
    if result.skipped_frames > 0 {
        checker.violations.push(format!("{} frames skipped", result.skipped_frames));
        checker.violation_count += 1;
    }

    result.pass = checker.passed();
    result.violation_count = checker.violation_count;
    result.violations = checker.violations;
    (result, lp.surface().cloned())
}

/// Run `runs` seeds starting at `base_seed`.
pub fn run_seeds(
    scenario: &Scenario,
    runs: usize,
    base_seed: u64,
    ticks: u64,
) -> (ScenarioReport, Option<Raster>) {
    let mut results = Vec::with_capacity(runs);
    let mut last_frame = None;
    for i in 0..runs as u64 {
        let seed = base_seed.wrapping_add(i);
        let (result, frame) = run_single(scenario, seed, ticks);
        tracing::debug!(
            scenario = scenario.name,
            seed,
            pass = result.pass,
            delivered = result.delivered,
            "run finished"
        );
        results.push(result);
        last_frame = frame;
    }
    (ScenarioReport::from_runs(scenario.name, scenario.label, results), last_frame)
}
