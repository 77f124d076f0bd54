// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Type Definitions

use serde::{Deserialize, Serialize};

// ─── Geometry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation from `self` towards `to`; `t = 0` is `self`.
    pub fn lerp(self, to: Vec2, t: f64) -> Vec2 {
        Vec2 {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pixel extent of the drawing surface. Nodes live in `[0,width] x [0,height]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: sanitize_extent(width),
            height: sanitize_extent(height),
        }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn contains(&self, p: Vec2) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2 {
            x: p.x.clamp(0.0, self.width),
            y: p.y.clamp(0.0, self.height),
        }
    }
}

fn sanitize_extent(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

// ─── Node Type ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Primary = 0,
    Secondary = 1,
    Tertiary = 2,
}

impl NodeType {
    pub const ALL: [NodeType; 3] = [Self::Primary, Self::Secondary, Self::Tertiary];

    /// Type for the node at `index` given how many primaries and secondaries
    /// lead the array. Types are assigned by index, primaries first.
    pub fn for_index(index: usize, primary: usize, secondary: usize) -> Self {
        if index < primary {
            Self::Primary
        } else if index < primary + secondary {
            Self::Secondary
        } else {
            Self::Tertiary
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────────

pub type NodeIndex = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub position: Vec2,
    pub velocity: Vec2,
    pub base_size: f64,
    /// Rendered radius, recomputed every tick from `base_size` and `phase`.
    pub size: f64,
    /// Unbounded oscillator phase in radians.
    pub phase: f64,
    pub phase_speed: f64,
    pub energy: f64,
    pub hue: f64,
    pub node_type: NodeType,
    /// Outbound edges. No self-reference, no duplicates, fixed after build.
    pub connections: Vec<NodeIndex>,
    /// Simulation clock of the last emission. Stamped with the build clock when
    /// the network is built, so a fresh node waits out one cooldown.
    #[serde(default)]
    pub last_activation: Option<f64>,
}

impl Node {
    /// Seconds since the node last fired, if it ever has.
    pub fn since_activation(&self, clock: f64) -> Option<f64> {
        self.last_activation.map(|t| clock - t)
    }
}

// ─── Packet ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub from_node: NodeIndex,
    pub to_node: NodeIndex,
    /// Fraction of the edge traversed, in `[0,1)` while live.
    pub progress: f64,
    pub speed: f64,
    pub size: f64,
    pub hue: f64,
}

// ─── FrameStats ──────────────────────────────────────────────────────────────

/// What one tick did. Returned by `Simulation::tick` and accumulated by the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    pub tick: u64,
    pub clock: f64,
    pub live_packets: usize,
    pub emissions: u32,
    pub created: u32,
    pub dropped: u32,
    pub delivered: u32,
    pub mean_energy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        let a = Vec2::new(0.0, 10.0);
        let b = Vec2::new(10.0, 30.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(5.0, 20.0));
    }

    #[test]
    fn test_bounds_reject_degenerate_extents() {
        let b = Bounds::new(-5.0, f64::NAN);
        assert_eq!(b.width, 0.0);
        assert_eq!(b.height, 0.0);
        assert!(!b.has_area());
        assert!(b.contains(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_node_type_by_index() {
        assert_eq!(NodeType::for_index(0, 2, 3), NodeType::Primary);
        assert_eq!(NodeType::for_index(2, 2, 3), NodeType::Secondary);
        assert_eq!(NodeType::for_index(4, 2, 3), NodeType::Secondary);
        assert_eq!(NodeType::for_index(5, 2, 3), NodeType::Tertiary);
    }
}
