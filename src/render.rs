// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Renderer
//
// Read-only pass over the simulation state: background, edges, nodes,
// then packets with their trails. Draw order matters for the glow look.

use serde::Serialize;

use crate::color::Hsla;
use crate::config::BackdropConfig;
use crate::error::SurfaceError;
use crate::surface::Surface;
use crate::types::{Node, NodeType, Packet, Vec2};

/// Borrowed view of everything the renderer reads.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub nodes: &'a [Node],
    pub packets: &'a [Packet],
    pub clock: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub edges: u32,
    pub nodes: u32,
    pub packets: u32,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    edge_cutoff: f64,
    recency_window: f64,
    trail_len: usize,
    trail_spacing: f64,
    background: Hsla,
}

impl Renderer {
    pub fn new(config: &BackdropConfig) -> Self {
        Self {
            edge_cutoff: config.edge_cutoff,
            recency_window: config.recency_window,
            trail_len: config.trail_len,
            trail_spacing: config.trail_spacing,
            background: Hsla::new(240.0, 100.0, 1.0, config.background_alpha),
        }
    }

    /// Repaint the whole surface. A zero-area surface draws nothing.
    pub fn render<S: Surface + ?Sized>(
        &self,
        scene: &Scene<'_>,
        surface: &mut S,
    ) -> Result<RenderStats, SurfaceError> {
        let mut stats = RenderStats::default();
        let (width, height) = surface.size();
        if !(width > 0.0 && height > 0.0) {
            return Ok(stats);
        }

        surface.fill_rect(Vec2::default(), width, height, self.background)?;

        for (i, node) in scene.nodes.iter().enumerate() {
            for &to in &node.connections {
                let Some(other) = scene.nodes.get(to as usize) else {
                    continue;
                };
                if to as usize == i {
                    continue;
                }
                if self.draw_edge(node, other, scene.clock, surface)? {
                    stats.edges += 1;
                }
            }
        }

        for node in scene.nodes {
            self.draw_node(node, scene.clock, surface)?;
            stats.nodes += 1;
        }

        for packet in scene.packets {
            let (Some(from), Some(to)) = (
                scene.nodes.get(packet.from_node as usize),
                scene.nodes.get(packet.to_node as usize),
            ) else {
                continue;
            };
            self.draw_packet(packet, from.position, to.position, surface)?;
            stats.packets += 1;
        }

        Ok(stats)
    }

    /// Brightness in `[0,1]` from how recently the edge's owner fired.
    pub fn recency(&self, node: &Node, clock: f64) -> f64 {
        if self.recency_window <= 0.0 {
            return 0.0;
        }
        match node.since_activation(clock) {
            Some(dt) if (0.0..self.recency_window).contains(&dt) => 1.0 - dt / self.recency_window,
            _ => 0.0,
        }
    }

    fn draw_edge<S: Surface + ?Sized>(
        &self,
        node: &Node,
        other: &Node,
        clock: f64,
        surface: &mut S,
    ) -> Result<bool, SurfaceError> {
        let distance = node.position.distance(other.position);
        if distance >= self.edge_cutoff {
            return Ok(false);
        }
        let closeness = 1.0 - distance / self.edge_cutoff;
        let recent = self.recency(node, clock);
        let opacity = (closeness * 0.4 * (node.energy + other.energy) / 2.0
            + recent * 0.5 * closeness)
            .min(1.0);
        let hue = (node.hue + other.hue) / 2.0 + (clock + distance * 0.01).sin() * 20.0;
        let width = 0.5 + node.energy * 1.5 + recent * 1.5;

        surface.stroke_line(
            node.position,
            other.position,
            width,
            Hsla::new(hue, 80.0, 65.0 + recent * 15.0, opacity),
        )?;
        if node.energy > 0.6 || other.energy > 0.6 {
            surface.stroke_line(
                node.position,
                other.position,
                0.2,
                Hsla::new(hue, 100.0, 85.0, opacity * 0.5),
            )?;
        }
        Ok(true)
    }

    fn draw_node<S: Surface + ?Sized>(
        &self,
        node: &Node,
        clock: f64,
        surface: &mut S,
    ) -> Result<(), SurfaceError> {
        let intensity = 0.5 + node.energy * 0.5;
        let hue = node.hue + (node.phase + clock).sin() * 15.0;
        let saturation = 70.0 + node.energy * 30.0;
        let lightness = 45.0 + node.energy * 25.0 + (node.phase * 3.0).sin() * 10.0;
        let body = Hsla::new(hue, saturation, lightness, 1.0);

        let glow = node.size * (2.0 + node.energy * 2.0);
        surface.fill_circle(node.position, glow, body.with_alpha(0.1 * intensity))?;
        surface.fill_circle(
            node.position,
            node.size,
            body.with_alpha((0.8 + intensity * 0.2).min(1.0)),
        )?;

        if node.node_type == NodeType::Primary || node.energy > 0.7 {
            surface.fill_circle(
                node.position,
                node.size * 0.6,
                Hsla::new(hue + 30.0, 100.0, 80.0, 0.6 * intensity),
            )?;
        }
        Ok(())
    }

    fn draw_packet<S: Surface + ?Sized>(
        &self,
        packet: &Packet,
        from: Vec2,
        to: Vec2,
        surface: &mut S,
    ) -> Result<(), SurfaceError> {
        let len = self.trail_len.max(1) as f64;
        let fade = 1.0 - packet.progress * 0.5;
        for k in 0..self.trail_len.max(1) {
            let k = k as f64;
            let t = (packet.progress - k * self.trail_spacing).max(0.0);
            let alpha = (1.0 - k * 0.9 / len) * fade;
            let radius = packet.size * (1.0 - k * 0.6 / len);
            surface.fill_circle(
                from.lerp(to, t),
                radius,
                Hsla::new(packet.hue, 100.0, 75.0, alpha),
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
