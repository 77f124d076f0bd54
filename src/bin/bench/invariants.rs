// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Per-frame invariant checks

use neural_backdrop::topology::first_invalid_node;
use neural_backdrop::{Packet, Simulation};

/// At most this many violation messages are kept per run.
const MAX_RECORDED: usize = 20;

#[derive(Debug, Default)]
pub struct InvariantChecker {
    previous: Vec<Packet>,
    pub violations: Vec<String>,
    pub violation_count: u64,
}

impl InvariantChecker {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, tick: u64, message: String) {
        self.violation_count += 1;
        if self.violations.len() < MAX_RECORDED {
            self.violations.push(format!("tick {tick}: {message}"));
        }
    }

    pub fn check(&mut self, sim: &Simulation) {
        let tick = sim.tick_count();
        let bounds = sim.bounds();
        let config = sim.config();

        for (i, node) in sim.nodes().iter().enumerate() {
            if !(0.0..=1.0).contains(&node.energy) {
                self.fail(tick, format!("node {i} energy {}", node.energy));
            }
            if bounds.has_area() && !bounds.contains(node.position) {
                self.fail(
                    tick,
                    format!("node {i} at ({}, {}) outside bounds", node.position.x, node.position.y),
                );
            }
        }
        if let Some(node) = first_invalid_node(sim.nodes(), config) {
            self.fail(tick, format!("node {node} has an invalid connection set"));
        }

        let packets = sim.packets();
        if packets.len() > config.packet_cap {
            self.fail(tick, format!("{} packets exceed cap {}", packets.len(), config.packet_cap));
        }
        for (i, p) in packets.iter().enumerate() {
            if !(0.0..1.0).contains(&p.progress) {
                self.fail(tick, format!("packet {i} progress {}", p.progress));
            }
        }
        self.check_monotonic(tick, packets);
        self.previous.clear();
        self.previous.extend_from_slice(packets);
    }

    /// Survivors keep their relative order and new packets are appended,
    /// so the previous frame's packets are matched as a subsequence.
    fn check_monotonic(&mut self, tick: u64, packets: &[Packet]) {
        let mut cursor = 0;
        let mut regressions = Vec::new();
        for (i, p) in packets.iter().enumerate() {
            let matched = self.previous[cursor..].iter().position(|q| same_packet(p, q));
            if let Some(offset) = matched {
                let q = &self.previous[cursor + offset];
                if p.progress <= q.progress {
                    regressions.push(format!("packet {i} progress {} -> {}", q.progress, p.progress));
                }
                cursor += offset + 1;
            }
        }
        for message in regressions {
            self.fail(tick, message);
        }
    }

    pub fn passed(&self) -> bool {
        self.violation_count == 0
    }
}

fn same_packet(a: &Packet, b: &Packet) -> bool {
    a.from_node == b.from_node
        && a.to_node == b.to_node
        && a.speed == b.speed
        && a.size == b.size
        && a.hue == b.hue
}
