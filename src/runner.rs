// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Simulation Loop
//
// Uninitialized -> Running -> Stopped. One frame at a time: pending
// resize, tick, render, reschedule. A failing frame is logged and
// skipped; the schedule continues.

use serde::Serialize;

use crate::config::BackdropConfig;
use crate::error::{ConfigError, FrameError, SurfaceError};
use crate::host::{FrameHandle, FrameHost};
use crate::render::{RenderStats, Renderer};
use crate::simulation::Simulation;
use crate::surface::Surface;
use crate::types::{FrameStats, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopPhase {
    Uninitialized,
    Running,
    Stopped,
}

/// Totals across every frame since the loop was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoopStats {
    pub frames: u64,
    pub skipped_frames: u64,
    pub emissions: u64,
    pub created: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub peak_packets: usize,
    pub last_frame: Option<FrameStats>,
    pub last_render: RenderStats,
}

impl LoopStats {
    fn record(&mut self, frame: &FrameStats, render: RenderStats) {
        self.frames += 1;
        self.emissions += u64::from(frame.emissions);
        self.created += u64::from(frame.created);
        self.dropped += u64::from(frame.dropped);
        self.delivered += u64::from(frame.delivered);
        self.peak_packets = self.peak_packets.max(frame.live_packets);
        self.last_frame = Some(*frame);
        self.last_render = render;
    }
}

pub struct SimulationLoop<S: Surface, H: FrameHost> {
    config: BackdropConfig,
    renderer: Renderer,
    host: H,
    surface: Option<S>,
    simulation: Option<Simulation>,
    phase: LoopPhase,
    stats: LoopStats,
    pending_frame: Option<FrameHandle>,
    pending_resize: Option<(u32, u32)>,
}

impl<S: Surface, H: FrameHost> SimulationLoop<S, H> {
    /// The only place an invalid configuration is reported to a caller.
    pub fn new(config: BackdropConfig, host: H) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            renderer: Renderer::new(&config),
            config,
            host,
            surface: None,
            simulation: None,
            phase: LoopPhase::Uninitialized,
            stats: LoopStats::default(),
            pending_frame: None,
            pending_resize: None,
        })
    }

    /// Build a network sized to `surface` and schedule the first frame.
    ///
    /// Starting a running loop is a no-op. If the host cannot attach or
    /// schedule, the phase is left unchanged so a later `start` can retry.
    pub fn start(&mut self, surface: S) -> LoopPhase {
        if self.phase == LoopPhase::Running {
            tracing::debug!("start ignored: already running");
            return self.phase;
        }
        if let Err(err) = self.host.attach() {
            tracing::warn!(%err, "host unavailable, animation not started");
            return self.phase;
        }
        let (width, height) = surface.size();
        let simulation = match Simulation::new(self.config.clone(), width, height) {
            Ok(sim) => sim,
            Err(err) => {
                tracing::warn!(%err, "simulation could not be built");
                self.host.detach();
                return self.phase;
            }
        };
        match self.host.request_frame() {
            Ok(handle) => self.pending_frame = Some(handle),
            Err(err) => {
                tracing::warn!(%err, "first frame could not be scheduled");
                self.host.detach();
                return self.phase;
            }
        }

        self.simulation = Some(simulation);
        self.surface = Some(surface);
        self.pending_resize = None;
        self.phase = LoopPhase::Running;
        tracing::debug!(width, height, "simulation loop running");
        self.phase
    }

    /// Run one scheduled frame. Returns `None` when not running or when the
    /// frame was skipped because of an error.
    pub fn frame(&mut self) -> Option<FrameStats> {
        if self.phase != LoopPhase::Running {
            return None;
        }
        self.pending_frame = None;

        let result = self.step();
        let frame = match result {
            Ok((frame, render)) => {
                self.stats.record(&frame, render);
                Some(frame)
            }
            Err(err) => {
                self.stats.skipped_frames += 1;
                tracing::warn!(%err, skipped = self.stats.skipped_frames, "frame skipped");
                None
            }
        };

        match self.host.request_frame() {
            Ok(handle) => self.pending_frame = Some(handle),
            Err(err) => {
                tracing::warn!(%err, "host stopped scheduling frames");
                self.stop();
            }
        }
        frame
    }

    fn step(&mut self) -> Result<(FrameStats, RenderStats), FrameError> {
        let (Some(simulation), Some(surface)) = (self.simulation.as_mut(), self.surface.as_mut())
        else {
            return Err(FrameError::Surface(SurfaceError::Unavailable));
        };
        if let Some((width, height)) = self.pending_resize {
            // a failed surface resize stays queued and is retried next frame
            surface.resize(width, height)?;
            self.pending_resize = None;
            simulation.resize(f64::from(width), f64::from(height));
            tracing::debug!(width, height, "resize applied");
        }
        let frame = simulation.tick()?;
        let render = self.renderer.render(&simulation.scene(), surface)?;
        Ok((frame, render))
    }

    /// Cancel the pending frame and remove listeners. Idempotent.
    pub fn stop(&mut self) {
        if self.phase == LoopPhase::Stopped {
            return;
        }
        if let Some(handle) = self.pending_frame.take() {
            self.host.cancel_frame(handle);
        }
        self.host.detach();
        self.pending_resize = None;
        self.phase = LoopPhase::Stopped;
        tracing::debug!(frames = self.stats.frames, "simulation loop stopped");
    }

    /// Queue a resize; applied at the start of the next frame. Only the
    /// latest notification is kept.
    pub fn notify_resize(&mut self, width: u32, height: u32) {
        if self.phase == LoopPhase::Running {
            self.pending_resize = Some((width, height));
        }
    }

    pub fn notify_pointer(&mut self, pointer: Option<Vec2>) {
        if self.phase != LoopPhase::Running {
            return;
        }
        if let Some(sim) = self.simulation.as_mut() {
            sim.set_pointer(pointer);
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == LoopPhase::Running
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
