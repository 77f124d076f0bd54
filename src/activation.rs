// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Activation Model
//
// Per-node oscillator, bounded energy random walk and packet emission.

use rand::Rng;

use crate::config::BackdropConfig;
use crate::packets::PacketSystem;
use crate::types::{Node, NodeIndex, Vec2};

/// Size multiplier for a given phase. Two incommensurate sinusoids keep the
/// pulse from looking periodic; the result stays within `[0.55, 1.45]`.
pub fn pulse_factor(phase: f64) -> f64 {
    1.0 + phase.sin() * 0.3 + (phase * 2.7).sin() * 0.15
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmissionStats {
    /// Nodes that fired this tick.
    pub emissions: u32,
    pub created: u32,
    /// Packets requested but skipped by the soft cap.
    pub dropped: u32,
}

#[derive(Debug, Clone)]
pub struct ActivationModel {
    energy_drift: f64,
    emission_threshold: f64,
    emission_cooldown: f64,
    emission_probability: f64,
    pointer_radius: f64,
    pointer_boost: f64,
}

impl ActivationModel {
    pub fn new(config: &BackdropConfig) -> Self {
        Self {
            energy_drift: config.energy_drift,
            emission_threshold: config.emission_threshold,
            emission_cooldown: config.emission_cooldown,
            emission_probability: config.emission_probability,
            pointer_radius: config.pointer_radius,
            pointer_boost: config.pointer_boost,
        }
    }

    /// Advance every node in array order and launch packets for nodes that fire.
    pub fn update<R: Rng + ?Sized>(
        &self,
        nodes: &mut [Node],
        packets: &mut PacketSystem,
        pointer: Option<Vec2>,
        clock: f64,
        rng: &mut R,
    ) -> EmissionStats {
        let mut stats = EmissionStats::default();
        for (i, node) in nodes.iter_mut().enumerate() {
            node.phase += node.phase_speed;

            node.energy += rng.gen_range(-self.energy_drift..=self.energy_drift);
            if let Some(p) = pointer {
                node.energy += self.pointer_influence(node.position, p);
            }
            node.energy = node.energy.clamp(0.0, 1.0);

            node.size = node.base_size * pulse_factor(node.phase);

            if !self.should_fire(node, clock) {
                continue;
            }
            node.last_activation = Some(clock);
            stats.emissions += 1;
            for &to in &node.connections {
                if !rng.gen_bool(self.emission_probability) {
                    continue;
                }
                if packets.create(i as NodeIndex, to, node.hue, rng) {
                    stats.created += 1;
                } else {
                    stats.dropped += 1;
                }
            }
        }
        stats
    }

    fn should_fire(&self, node: &Node, clock: f64) -> bool {
        node.energy > self.emission_threshold
            && node
                .since_activation(clock)
                .map_or(true, |elapsed| elapsed > self.emission_cooldown)
    }

    /// Per-frame energy boost for a node at `at` with the pointer at `pointer`.
    pub fn pointer_influence(&self, at: Vec2, pointer: Vec2) -> f64 {
        if self.pointer_radius <= 0.0 {
            return 0.0;
        }
        let d = at.distance(pointer);
        if d < self.pointer_radius {
            (1.0 - d / self.pointer_radius) * self.pointer_boost
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
