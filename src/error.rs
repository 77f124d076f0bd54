// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Errors

use crate::types::NodeIndex;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} span is invalid: min {min} > max {max} or not finite")]
    InvalidSpan {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("type ratios overflow: primary {primary} + secondary {secondary} > 1")]
    RatioOverflow { primary: f64, secondary: f64 },
}

// ---------------------------------------------------------------------------
// Surface / host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("drawing context unavailable")]
    Unavailable,
    #[error("surface backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("host environment unavailable")]
    Unavailable,
    #[error("failed to schedule frame: {0}")]
    Schedule(String),
    #[error("failed to register listener: {0}")]
    Listener(String),
}

// ---------------------------------------------------------------------------
// Per-frame
// ---------------------------------------------------------------------------

/// A tick that could not complete. Caught and logged by the loop, never fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("node {node} has non-finite state")]
    NonFinite { node: NodeIndex },
    #[error("packet references node {node} but only {len} nodes exist")]
    DanglingPacket { node: NodeIndex, len: usize },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("node {from} has an edge to {to} but only {len} nodes exist")]
    DanglingEdge {
        from: NodeIndex,
        to: NodeIndex,
        len: usize,
    },
    #[error("node {node} has an invalid connection set")]
    InvalidConnections { node: NodeIndex },
    #[error("packet {index} references a missing node")]
    DanglingPacket { index: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
