// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bench scenario definitions
//
// Each scenario is a config recipe, a surface size and optional per-tick
// events (pointer paths, resizes) applied through the loop's public API.

use neural_backdrop::{BackdropConfig, ManualHost, Raster, SimulationLoop, Vec2};

pub type BenchLoop = SimulationLoop<Raster, ManualHost>;

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub ticks: u64,
    pub config: fn(u64) -> BackdropConfig,
    /// Called before each frame with the frame index.
    pub event: Option<fn(&mut BenchLoop, u64, u64)>,
    pub expect: Expectation,
}

/// Scenario-specific outcome checks on top of the per-frame invariants.
#[derive(Debug, Clone, Copy, Default)]
pub struct Expectation {
    pub no_nodes: bool,
    pub hits_cap: bool,
    pub delivers: bool,
}

// ─── Configs ────────────────────────────────────────────────────────────────

fn ambient(seed: u64) -> BackdropConfig {
    BackdropConfig::seeded(seed)
}

fn dense(seed: u64) -> BackdropConfig {
    BackdropConfig {
        node_count: 260,
        packet_cap: 600,
        ..BackdropConfig::seeded(seed)
    }
}

/// Every node fires every frame on every edge.
fn storm(seed: u64) -> BackdropConfig {
    BackdropConfig {
        node_count: 10,
        emission_threshold: 0.0,
        emission_cooldown: 0.0,
        emission_probability: 1.0,
        packet_cap: 40,
        ..BackdropConfig::seeded(seed)
    }
}

// ─── Events ─────────────────────────────────────────────────────────────────

/// Pointer sweeps a circle around the centre, leaving for a while each lap.
fn orbiting_pointer(lp: &mut BenchLoop, tick: u64, _total: u64) {
    let lap = tick % 600;
    if lap >= 480 {
        lp.notify_pointer(None);
        return;
    }
    let angle = lap as f64 / 480.0 * std::f64::consts::TAU;
    lp.notify_pointer(Some(Vec2::new(
        400.0 + angle.cos() * 200.0,
        300.0 + angle.sin() * 150.0,
    )));
}

/// Shrink, grow, collapse to nothing and come back.
fn resize_sequence(lp: &mut BenchLoop, tick: u64, total: u64) {
    let step = (total / 5).max(1);
    if tick % step != 0 || tick == 0 {
        return;
    }
    match tick / step {
        1 => lp.notify_resize(400, 300),
        2 => lp.notify_resize(1280, 720),
        3 => lp.notify_resize(0, 0),
        4 => lp.notify_resize(800, 600),
        _ => {}
    }
}

// ─── Registry ───────────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "ambient",
            label: "Ambient (defaults, pointer orbit)",
            width: 800,
            height: 600,
            ticks: 3600,
            config: ambient,
            event: Some(orbiting_pointer),
            expect: Expectation::default(),
        },
        Scenario {
            name: "dense",
            label: "Dense (260 nodes)",
            width: 640,
            height: 480,
            ticks: 1800,
            config: dense,
            event: None,
            expect: Expectation::default(),
        },
        Scenario {
            name: "empty",
            label: "Empty (0x0 surface)",
            width: 0,
            height: 0,
            ticks: 600,
            config: ambient,
            event: None,
            expect: Expectation {
                no_nodes: true,
                ..Expectation::default()
            },
        },
        Scenario {
            name: "storm",
            label: "Storm (10 nodes, always firing)",
            width: 300,
            height: 200,
            ticks: 1000,
            config: storm,
            event: None,
            expect: Expectation {
                hits_cap: true,
                delivers: true,
                ..Expectation::default()
            },
        },
        Scenario {
            name: "resize",
            label: "Resize (rescale through zero area)",
            width: 800,
            height: 600,
            ticks: 2000,
            config: ambient,
            event: Some(resize_sequence),
            expect: Expectation::default(),
        },
    ]
}
