// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Simulation Core
//
// One context per animation instance: nodes, packets, the single RNG
// stream and the simulated clock. `tick` runs kinematics, activation and
// packet transport in that order; rendering reads the result through
// `scene`.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::activation::ActivationModel;
use crate::config::{BackdropConfig, ResizePolicy};
use crate::error::{ConfigError, FrameError, SnapshotError};
use crate::kinematics::KinematicsUpdater;
use crate::packets::PacketSystem;
use crate::render::Scene;
use crate::topology::{self, RandomTopologyBuilder};
use crate::types::{Bounds, FrameStats, Node, NodeIndex, Packet, Vec2};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Complete resumable state. The RNG is included so a restored run draws
/// the same numbers the original would have.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub width: f64,
    pub height: f64,
    pub clock: f64,
    pub tick: u64,
    pub nodes: Vec<Node>,
    pub packets: Vec<Packet>,
    pub rng: ChaCha8Rng,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

// ─── Simulation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Simulation {
    config: BackdropConfig,
    bounds: Bounds,
    nodes: Vec<Node>,
    packets: PacketSystem,
    rng: ChaCha8Rng,
    clock: f64,
    tick: u64,
    pointer: Option<Vec2>,
    kinematics: KinematicsUpdater,
    activation: ActivationModel,
}

impl Simulation {
    /// Build a fresh network for a `width x height` surface.
    pub fn new(config: BackdropConfig, width: f64, height: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut sim = Self::assemble(config, Bounds::new(width, height), Vec::new(), Vec::new(), rng);
        sim.rebuild();
        Ok(sim)
    }

    /// Resume from a snapshot taken with [`Simulation::snapshot`].
    pub fn restore(config: BackdropConfig, snapshot: Snapshot) -> Result<Self, SnapshotError> {
        config.validate()?;
        let len = snapshot.nodes.len();
        for (i, node) in snapshot.nodes.iter().enumerate() {
            if let Some(&to) = node.connections.iter().find(|&&to| to as usize >= len) {
                return Err(SnapshotError::DanglingEdge {
                    from: i as NodeIndex,
                    to,
                    len,
                });
            }
        }
        if let Some(node) = topology::first_invalid_node(&snapshot.nodes, &config) {
            return Err(SnapshotError::InvalidConnections { node });
        }
        if let Some(index) = snapshot
            .packets
            .iter()
            .position(|p| p.from_node as usize >= len || p.to_node as usize >= len)
        {
            return Err(SnapshotError::DanglingPacket { index });
        }

        let mut sim = Self::assemble(
            config,
            Bounds::new(snapshot.width, snapshot.height),
            snapshot.nodes,
            snapshot.packets,
            snapshot.rng,
        );
        sim.clock = snapshot.clock;
        sim.tick = snapshot.tick;
        tracing::debug!(tick = sim.tick, nodes = sim.nodes.len(), "simulation restored");
        Ok(sim)
    }

    pub fn from_json(config: BackdropConfig, json: &str) -> Result<Self, SnapshotError> {
        Self::restore(config, Snapshot::from_json(json)?)
    }

    fn assemble(
        config: BackdropConfig,
        bounds: Bounds,
        nodes: Vec<Node>,
        packets: Vec<Packet>,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            packets: PacketSystem::with_packets(&config, packets),
            kinematics: KinematicsUpdater::new(config.bounce_damping),
            activation: ActivationModel::new(&config),
            config,
            bounds,
            nodes,
            rng,
            clock: 0.0,
            tick: 0,
            pointer: None,
        }
    }

    fn rebuild(&mut self) {
        self.nodes = RandomTopologyBuilder::new(&self.config).build(self.bounds, &mut self.rng);
        for node in &mut self.nodes {
            node.last_activation = Some(self.clock);
        }
        self.packets.clear();
        tracing::debug!(
            width = self.bounds.width,
            height = self.bounds.height,
            nodes = self.nodes.len(),
            edges = self.edge_count(),
            "topology built"
        );
    }

    /// Advance one fixed step.
    ///
    /// The state is fully updated even when an error is returned; the error
    /// only reports that the frame should not be trusted.
    pub fn tick(&mut self) -> Result<FrameStats, FrameError> {
        self.clock += self.config.time_step;
        self.tick += 1;

        self.kinematics.update(&mut self.nodes, self.bounds);
        let emission = self.activation.update(
            &mut self.nodes,
            &mut self.packets,
            self.pointer,
            self.clock,
            &mut self.rng,
        );

        let nodes = &mut self.nodes;
        let bump = self.config.arrival_energy;
        let mut dangling = None;
        let delivered = self.packets.advance(1.0, |p| match nodes.get_mut(p.to_node as usize) {
            Some(dest) => dest.energy = (dest.energy + bump).min(1.0),
            None => dangling = dangling.or(Some(p.to_node)),
        });
        if let Some(node) = dangling {
            return Err(FrameError::DanglingPacket {
                node,
                len: self.nodes.len(),
            });
        }
        if let Some(i) = self.nodes.iter().position(|n| !is_finite(n)) {
            return Err(FrameError::NonFinite {
                node: i as NodeIndex,
            });
        }

        Ok(FrameStats {
            tick: self.tick,
            clock: self.clock,
            live_packets: self.packets.len(),
            emissions: emission.emissions,
            created: emission.created,
            dropped: emission.dropped,
            delivered,
            mean_energy: self.mean_energy(),
        })
    }

    /// Apply a new surface extent according to the configured policy.
    ///
    /// A zero-area extent is ignored and the last usable one is kept. An
    /// empty network (built while the surface had no area) is built now.
    pub fn resize(&mut self, width: f64, height: f64) {
        let next = Bounds::new(width, height);
        if !next.has_area() {
            tracing::debug!(width, height, "ignoring resize to zero area");
            return;
        }
        if next == self.bounds {
            return;
        }
        let previous = std::mem::replace(&mut self.bounds, next);
        if self.nodes.is_empty() || !previous.has_area() {
            self.rebuild();
            return;
        }
        match self.config.resize_policy {
            ResizePolicy::Rebuild => self.rebuild(),
            ResizePolicy::Rescale => {
                let sx = next.width / previous.width;
                let sy = next.height / previous.height;
                for node in &mut self.nodes {
                    node.position =
                        next.clamp(Vec2::new(node.position.x * sx, node.position.y * sy));
                }
                tracing::debug!(sx, sy, "rescaled node positions");
            }
        }
    }

    /// Latest pointer position in surface space, or `None` when it left.
    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer.filter(|p| p.is_finite());
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.bounds.width,
            height: self.bounds.height,
            clock: self.clock,
            tick: self.tick,
            nodes: self.nodes.clone(),
            packets: self.packets.packets().to_vec(),
            rng: self.rng.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        self.snapshot().to_json()
    }

    pub fn scene(&self) -> Scene<'_> {
        Scene {
            nodes: &self.nodes,
            packets: self.packets.packets(),
            clock: self.clock,
        }
    }

    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn packets(&self) -> &[Packet] {
        self.packets.packets()
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.connections.len()).sum()
    }

    pub fn mean_energy(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        self.nodes.iter().map(|n| n.energy).sum::<f64>() / self.nodes.len() as f64
    }
}

fn is_finite(node: &Node) -> bool {
    node.position.is_finite()
        && node.velocity.is_finite()
        && node.energy.is_finite()
        && node.size.is_finite()
        && node.phase.is_finite()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(seed: u64) -> Simulation {
        Simulation::new(BackdropConfig::seeded(seed), 800.0, 600.0).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let cfg = BackdropConfig {
            emission_probability: 1.5,
            ..BackdropConfig::default()
        };
        assert!(matches!(
            Simulation::new(cfg, 10.0, 10.0),
            Err(ConfigError::OutOfRange { field: "emission_probability", .. })
        ));
    }

    #[test]
    fn test_clock_advances_by_fixed_step() {
        let mut s = sim(1);
        for _ in 0..10 {
            s.tick().unwrap();
        }
        assert_eq!(s.tick_count(), 10);
        assert!((s.clock() - 0.16).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let mut a = sim(42);
        let mut b = sim(42);
        for _ in 0..300 {
            assert_eq!(a.tick().unwrap(), b.tick().unwrap());
        }
        assert_eq!(a.nodes(), b.nodes());
        assert_eq!(a.packets(), b.packets());
    }

    #[test]
    fn test_fresh_network_waits_one_cooldown() {
        let cfg = BackdropConfig {
            emission_threshold: 0.0,
            emission_cooldown: 0.5,
            ..BackdropConfig::seeded(4)
        };
        let mut s = Simulation::new(cfg, 800.0, 600.0).unwrap();
        assert!(s.nodes().iter().all(|n| n.last_activation == Some(0.0)));
        // 0.5 / 0.016 = 31.25 ticks
        for _ in 0..31 {
            assert_eq!(s.tick().unwrap().emissions, 0, "fired at {}", s.clock());
        }
        assert!(s.tick().unwrap().emissions > 0);
    }

    #[test]
    fn test_arrival_bumps_destination_energy() {
        let cfg = BackdropConfig {
            energy_drift: 0.0,
            emission_threshold: 1.0,
            arrival_energy: 0.25,
            ..BackdropConfig::seeded(3)
        };
        let mut s = Simulation::new(cfg, 800.0, 600.0).unwrap();
        let dest = s.nodes.iter().position(|n| n.energy < 0.5).unwrap();
        let before = s.nodes[dest].energy;
        s.packets.clear();
        let mut snap = s.snapshot();
        snap.packets.push(Packet {
            from_node: 0,
            to_node: dest as NodeIndex,
            progress: 0.999,
            speed: 1.0,
            size: 1.0,
            hue: 200.0,
        });
        let mut s = Simulation::restore(s.config.clone(), snap).unwrap();
        let stats = s.tick().unwrap();
        assert_eq!(stats.delivered, 1);
        assert!((s.nodes[dest].energy - (before + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_rescale_keeps_topology() {
        let mut s = sim(5);
        for _ in 0..50 {
            s.tick().unwrap();
        }
        let edges: Vec<_> = s.nodes().iter().map(|n| n.connections.clone()).collect();
        let x0 = s.nodes()[0].position.x;
        let packets = s.packets().len();
        s.resize(400.0, 600.0);
        assert_eq!(s.bounds(), Bounds::new(400.0, 600.0));
        assert!((s.nodes()[0].position.x - x0 / 2.0).abs() < 1e-9);
        assert_eq!(s.packets().len(), packets);
        for (n, e) in s.nodes().iter().zip(&edges) {
            assert_eq!(&n.connections, e);
            assert!(s.bounds().contains(n.position));
        }
    }

    #[test]
    fn test_rebuild_policy_drops_packets() {
        let cfg = BackdropConfig {
            resize_policy: ResizePolicy::Rebuild,
            emission_threshold: 0.0,
            emission_cooldown: 0.0,
            emission_probability: 1.0,
            ..BackdropConfig::seeded(6)
        };
        let mut s = Simulation::new(cfg, 800.0, 600.0).unwrap();
        s.tick().unwrap();
        assert!(!s.packets().is_empty());
        s.resize(300.0, 200.0);
        assert!(s.packets().is_empty());
        assert_eq!(s.nodes().len(), 90);
        assert!(s.nodes().iter().all(|n| s.bounds().contains(n.position)));
    }

    #[test]
    fn test_zero_area_builds_on_first_real_resize() {
        let mut s = Simulation::new(BackdropConfig::seeded(7), 0.0, 0.0).unwrap();
        assert!(s.nodes().is_empty());
        s.tick().unwrap();
        s.resize(0.0, 500.0);
        assert!(s.nodes().is_empty());
        s.resize(640.0, 480.0);
        assert_eq!(s.nodes().len(), 90);
    }

    #[test]
    fn test_zero_area_resize_is_ignored() {
        let mut s = sim(8);
        let before = s.nodes().to_vec();
        s.resize(0.0, 0.0);
        assert_eq!(s.bounds(), Bounds::new(800.0, 600.0));
        assert_eq!(s.nodes(), &before[..]);
    }

    #[test]
    fn test_pointer_ignores_non_finite() {
        let mut s = sim(9);
        s.set_pointer(Some(Vec2::new(f64::NAN, 1.0)));
        assert_eq!(s.pointer(), None);
        s.set_pointer(Some(Vec2::new(3.0, 4.0)));
        assert_eq!(s.pointer(), Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn test_snapshot_resume_is_bit_identical() {
        let mut original = sim(11);
        for _ in 0..120 {
            original.tick().unwrap();
        }
        let json = original.to_json().unwrap();
        let mut resumed = Simulation::from_json(original.config().clone(), &json).unwrap();
        for _ in 0..240 {
            assert_eq!(original.tick().unwrap(), resumed.tick().unwrap());
        }
        assert_eq!(original.to_json().unwrap(), resumed.to_json().unwrap());
    }

    #[test]
    fn test_restore_rejects_inconsistent_snapshots() {
        let s = sim(12);
        let cfg = s.config().clone();

        let mut snap = s.snapshot();
        snap.nodes[0].connections.push(999);
        assert!(matches!(
            Simulation::restore(cfg.clone(), snap),
            Err(SnapshotError::DanglingEdge { from: 0, to: 999, .. })
        ));

        let mut snap = s.snapshot();
        snap.nodes[1].connections = vec![1];
        assert!(matches!(
            Simulation::restore(cfg.clone(), snap),
            Err(SnapshotError::InvalidConnections { node: 1 })
        ));

        let mut snap = s.snapshot();
        snap.packets.push(Packet {
            from_node: 0,
            to_node: 500,
            progress: 0.0,
            speed: 1.0,
            size: 1.0,
            hue: 0.0,
        });
        assert!(matches!(
            Simulation::restore(cfg, snap),
            Err(SnapshotError::DanglingPacket { .. })
        ));

        assert!(matches!(
            Simulation::from_json(BackdropConfig::default(), "{"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn test_non_finite_state_is_reported() {
        let mut s = sim(13);
        s.nodes[4].velocity.x = f64::NAN;
        assert_eq!(s.tick(), Err(FrameError::NonFinite { node: 4 }));
    }
}
