// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Frame Host
//
// The environment that schedules frames and delivers resize/pointer
// events. The browser implementation lives in `web`; `ManualHost` drives
// the loop in-process.

use serde::Serialize;

use crate::error::HostError;

/// Opaque id of a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameHandle(pub i32);

pub trait FrameHost {
    /// Schedule exactly one future frame callback.
    fn request_frame(&mut self) -> Result<FrameHandle, HostError>;

    /// Unregister a scheduled callback. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Register resize and pointer listeners.
    fn attach(&mut self) -> Result<(), HostError>;

    /// Remove everything `attach` registered. Safe to call when detached.
    fn detach(&mut self);
}

/// Host driven by hand. Frames "fire" when the owner calls
/// [`SimulationLoop::frame`](crate::runner::SimulationLoop::frame).
#[derive(Debug, Clone, Default)]
pub struct ManualHost {
    unavailable: bool,
    refuse_frames: bool,
    attached: bool,
    next_handle: i32,
    pending: Option<FrameHandle>,
    requested: u64,
    cancelled: u64,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose `attach` fails, as when no window is present.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.unavailable = !available;
    }

    /// Make `request_frame` fail until switched back.
    pub fn refuse_frames(&mut self, refuse: bool) {
        self.refuse_frames = refuse;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameHost for ManualHost {
    fn request_frame(&mut self) -> Result<FrameHandle, HostError> {
        if self.unavailable {
            return Err(HostError::Unavailable);
        }
        if self.refuse_frames {
            return Err(HostError::Schedule("frame requests refused".into()));
        }
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = FrameHandle(self.next_handle);
        self.pending = Some(handle);
        self.requested += 1;
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }

    fn attach(&mut self) -> Result<(), HostError> {
        if self.unavailable {
            return Err(HostError::Unavailable);
        }
        self.attached = true;
        Ok(())
    }

    fn detach(&mut self) {
        self.attached = false;
    }
}
