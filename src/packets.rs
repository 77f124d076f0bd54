// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Signal Packets
//
// Live packets sit in one vector allocated up front at the soft cap.
// Creation past the cap is skipped, and expiry compacts in place, so
// steady-state ticks do not allocate.

use rand::Rng;

use crate::config::{BackdropConfig, Span};
use crate::types::{NodeIndex, Packet};

/// Upper bound on the slots reserved up front; larger caps grow on demand.
const MAX_PREALLOCATED: usize = 4096;

#[derive(Debug, Clone)]
pub struct PacketSystem {
    packets: Vec<Packet>,
    cap: usize,
    speed: Span,
    size: Span,
    hue_jitter: f64,
    progress_scale: f64,
}

impl PacketSystem {
    pub fn new(config: &BackdropConfig) -> Self {
        Self {
            packets: Vec::with_capacity(config.packet_cap.min(MAX_PREALLOCATED)),
            cap: config.packet_cap,
            speed: config.packet_speed,
            size: config.packet_size,
            hue_jitter: config.packet_hue_jitter,
            progress_scale: config.packet_progress_scale,
        }
    }

    /// Rehydrate from a snapshot. Packets past the cap are discarded, oldest kept.
    pub fn with_packets(config: &BackdropConfig, mut packets: Vec<Packet>) -> Self {
        let mut system = Self::new(config);
        packets.truncate(system.cap);
        system.packets.extend(packets);
        system
    }

    /// Launch a packet along `from -> to`. Returns `false` when the soft cap
    /// is reached and the packet was not created.
    pub fn create<R: Rng + ?Sized>(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        source_hue: f64,
        rng: &mut R,
    ) -> bool {
        if self.packets.len() >= self.cap {
            return false;
        }
        let speed = self.speed.sample(rng);
        let size = self.size.sample(rng);
        let hue = source_hue + (rng.gen::<f64>() - 0.5) * 2.0 * self.hue_jitter;
        self.packets.push(Packet {
            from_node: from,
            to_node: to,
            progress: 0.0,
            speed,
            size,
            hue,
        });
        true
    }

    /// Move every packet along its edge. Packets reaching the end are handed
    /// to `on_arrival` and removed in the same call. Returns the arrival count.
    pub fn advance<F>(&mut self, dt_scale: f64, mut on_arrival: F) -> u32
    where
        F: FnMut(&Packet),
    {
        let step = self.progress_scale * dt_scale;
        let mut arrived = 0;
        self.packets.retain_mut(|p| {
            p.progress += p.speed * step;
            if p.progress >= 1.0 {
                on_arrival(p);
                arrived += 1;
                false
            } else {
                true
            }
        });
        arrived
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
