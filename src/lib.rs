// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop
//
// Procedural neural-network background: drifting nodes, a fixed random
// graph, and signal packets travelling along its edges.

pub mod types;
pub mod config;
pub mod error;
pub mod color;

// Simulation stages, in tick order
pub mod topology;
pub mod kinematics;
pub mod activation;
pub mod packets;

pub mod surface;
pub mod render;
pub mod simulation;
pub mod host;
pub mod runner;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use color::Hsla;
pub use config::{BackdropConfig, ResizePolicy, Span, TypeProfile, TypeProfiles};
pub use error::{ConfigError, FrameError, HostError, SnapshotError, SurfaceError};
pub use host::{FrameHandle, FrameHost, ManualHost};
pub use render::{RenderStats, Renderer, Scene};
pub use runner::{LoopPhase, LoopStats, SimulationLoop};
pub use simulation::{Simulation, Snapshot};
pub use surface::{DrawCommand, Raster, Recorder, Surface};
pub use types::*;

#[cfg(target_arch = "wasm32")]
pub use web::NeuralBackdrop;
