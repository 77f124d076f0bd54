// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Random Topology
//
// Builds the node set and the directed connection graph once per
// simulation instance (or per rebuild). Edges are admitted by distance
// and a per-type acceptance draw, in candidate index order, until the
// owning node's fan-out is exhausted.

use std::f64::consts::TAU;

use rand::Rng;

use crate::config::BackdropConfig;
use crate::types::{Bounds, Node, NodeIndex, NodeType, Vec2};

pub struct RandomTopologyBuilder<'a> {
    config: &'a BackdropConfig,
}

impl<'a> RandomTopologyBuilder<'a> {
    pub fn new(config: &'a BackdropConfig) -> Self {
        Self { config }
    }

    /// Place `node_count` nodes in `bounds` and wire them.
    ///
    /// A zero-area surface yields an empty node set.
    pub fn build<R: Rng + ?Sized>(&self, bounds: Bounds, rng: &mut R) -> Vec<Node> {
        if !bounds.has_area() || self.config.node_count == 0 {
            return Vec::new();
        }
        let mut nodes = self.place(bounds, rng);
        self.connect(&mut nodes, rng);
        nodes
    }

    /// Uniform placement with type assigned by index ratio. No edges.
    pub fn place<R: Rng + ?Sized>(&self, bounds: Bounds, rng: &mut R) -> Vec<Node> {
        let (primary, secondary) = self.config.type_counts();
        (0..self.config.node_count)
            .map(|i| {
                let node_type = NodeType::for_index(i, primary, secondary);
                let profile = self.config.profiles.get(node_type);
                let position = Vec2::new(
                    rng.gen::<f64>() * bounds.width,
                    rng.gen::<f64>() * bounds.height,
                );
                let velocity = Vec2::new(
                    (rng.gen::<f64>() - 0.5) * profile.speed,
                    (rng.gen::<f64>() - 0.5) * profile.speed,
                );
                Node {
                    position,
                    velocity,
                    base_size: profile.base_size,
                    size: profile.base_size,
                    phase: rng.gen::<f64>() * TAU,
                    phase_speed: self.config.phase_speed.sample(rng),
                    energy: rng.gen::<f64>(),
                    hue: self.config.hue.sample(rng),
                    node_type,
                    connections: Vec::new(),
                    last_activation: None,
                }
            })
            .collect()
    }

    /// Replace every node's outbound edges with a fresh random wiring.
    pub fn connect<R: Rng + ?Sized>(&self, nodes: &mut [Node], rng: &mut R) {
        let positions: Vec<Vec2> = nodes.iter().map(|n| n.position).collect();
        for (i, node) in nodes.iter_mut().enumerate() {
            let profile = self.config.profiles.get(node.node_type);
            node.connections.clear();
            for (j, &target) in positions.iter().enumerate() {
                if node.connections.len() >= profile.max_fan_out {
                    break;
                }
                if i == j {
                    continue;
                }
                if node.position.distance(target) >= profile.max_distance {
                    continue;
                }
                if rng.gen_bool(profile.acceptance) {
                    node.connections.push(j as NodeIndex);
                }
            }
        }
    }
}

/// Check the structural edge invariants of a node array.
///
/// Returns the index of the first node whose connection set contains a
/// self-loop, a duplicate, a dangling target or exceeds `max_fan_out`.
pub fn first_invalid_node(nodes: &[Node], config: &BackdropConfig) -> Option<NodeIndex> {
    nodes.iter().enumerate().find_map(|(i, n)| {
        let max = config.profiles.get(n.node_type).max_fan_out;
        let mut seen = std::collections::HashSet::with_capacity(n.connections.len());
        let bad = n.connections.len() > max
            || n.connections.iter().any(|&to| {
                to as usize == i || to as usize >= nodes.len() || !seen.insert(to)
            });
        bad.then_some(i as NodeIndex)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
