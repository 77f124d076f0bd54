// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Kinematics

use crate::types::{Bounds, Node};

/// Advances positions and reflects nodes off the surface walls.
#[derive(Debug, Clone, Copy)]
pub struct KinematicsUpdater {
    /// Multiplier on the reflected velocity component. 1.0 keeps speed.
    pub bounce_damping: f64,
}

impl Default for KinematicsUpdater {
    fn default() -> Self {
        Self { bounce_damping: 1.0 }
    }
}

impl KinematicsUpdater {
    pub fn new(bounce_damping: f64) -> Self {
        Self { bounce_damping }
    }

    pub fn update(&self, nodes: &mut [Node], bounds: Bounds) {
        for node in nodes.iter_mut() {
            self.step(node, bounds);
        }
    }

    fn step(&self, node: &mut Node, bounds: Bounds) {
        node.position.x += node.velocity.x;
        node.position.y += node.velocity.y;

        // Reflected component always points back inside.
        if node.position.x < 0.0 {
            node.velocity.x = node.velocity.x.abs() * self.bounce_damping;
        } else if node.position.x > bounds.width {
            node.velocity.x = -node.velocity.x.abs() * self.bounce_damping;
        }
        if node.position.y < 0.0 {
            node.velocity.y = node.velocity.y.abs() * self.bounce_damping;
        } else if node.position.y > bounds.height {
            node.velocity.y = -node.velocity.y.abs() * self.bounce_damping;
        }

        node.position = bounds.clamp(node.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeType, Vec2};

    fn node_at(x: f64, y: f64, vx: f64, vy: f64) -> Node {
        Node {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
            base_size: 2.0,
            size: 2.0,
            phase: 0.0,
            phase_speed: 0.02,
            energy: 0.5,
            hue: 200.0,
            node_type: NodeType::Secondary,
            connections: Vec::new(),
            last_activation: None,
        }
    }

    #[test]
    fn test_free_motion() {
        let mut nodes = vec![node_at(10.0, 10.0, 0.2, -0.1)];
        KinematicsUpdater::default().update(&mut nodes, Bounds::new(100.0, 100.0));
        assert!((nodes[0].position.x - 10.2).abs() < 1e-12);
        assert!((nodes[0].position.y - 9.9).abs() < 1e-12);
        assert_eq!(nodes[0].velocity, Vec2::new(0.2, -0.1));
    }

    #[test]
    fn test_reflect_off_each_wall() {
        let bounds = Bounds::new(100.0, 50.0);
        let mut nodes = vec![
            node_at(0.1, 25.0, -0.3, 0.0),
            node_at(99.9, 25.0, 0.3, 0.0),
            node_at(50.0, 0.1, 0.0, -0.3),
            node_at(50.0, 49.9, 0.0, 0.3),
        ];
        KinematicsUpdater::default().update(&mut nodes, bounds);
        assert_eq!(nodes[0].position.x, 0.0);
        assert_eq!(nodes[0].velocity.x, 0.3);
        assert_eq!(nodes[1].position.x, 100.0);
        assert_eq!(nodes[1].velocity.x, -0.3);
        assert_eq!(nodes[2].position.y, 0.0);
        assert_eq!(nodes[2].velocity.y, 0.3);
        assert_eq!(nodes[3].position.y, 50.0);
        assert_eq!(nodes[3].velocity.y, -0.3);
    }

    #[test]
    fn test_damping_scales_reflection() {
        let mut nodes = vec![node_at(0.1, 5.0, -0.5, 0.0)];
        KinematicsUpdater::new(0.8).update(&mut nodes, Bounds::new(10.0, 10.0));
        assert!((nodes[0].velocity.x - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_outside_after_shrink_is_pulled_in() {
        let mut nodes = vec![node_at(500.0, 500.0, 0.3, 0.3)];
        let bounds = Bounds::new(100.0, 100.0);
        let k = KinematicsUpdater::default();
        k.update(&mut nodes, bounds);
        assert!(bounds.contains(nodes[0].position));
        k.update(&mut nodes, bounds);
        assert!(nodes[0].velocity.x < 0.0 && nodes[0].velocity.y < 0.0);
        assert!(bounds.contains(nodes[0].position));
    }

    #[test]
    fn test_long_run_stays_in_bounds() {
        let bounds = Bounds::new(37.0, 11.0);
        let mut nodes = vec![node_at(5.0, 5.0, 0.37, -0.29), node_at(36.0, 1.0, -0.4, 0.11)];
        let k = KinematicsUpdater::default();
        for _ in 0..10_000 {
            k.update(&mut nodes, bounds);
            assert!(nodes.iter().all(|n| bounds.contains(n.position)));
        }
    }
}
