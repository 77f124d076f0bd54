// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Browser Host
//
// `NeuralBackdrop` is the JS-facing handle. It owns a SimulationLoop that
// draws into a 2D canvas and is driven by requestAnimationFrame. Event
// listeners only queue notifications; all state changes happen inside
// the frame callback.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::io;
use std::rc::{Rc, Weak};
use std::sync::Once;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, Window};

use crate::color::Hsla;
use crate::config::BackdropConfig;
use crate::error::{HostError, SurfaceError};
use crate::host::{FrameHandle, FrameHost};
use crate::runner::SimulationLoop;
use crate::surface::Surface;
use crate::types::Vec2;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

// ─── Logging ─────────────────────────────────────────────────────────────────

/// Buffers one formatted event and hands it to `console.log` when dropped.
#[derive(Default)]
struct ConsoleWriter(Vec<u8>);

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if !self.0.is_empty() {
            log(String::from_utf8_lossy(&self.0).trim_end());
        }
    }
}

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        // No clock or terminal in the browser.
        let _ = tracing_subscriber::fmt()
            .with_writer(ConsoleWriter::default)
            .without_time()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .try_init();
    });
}

// ─── Canvas surface ──────────────────────────────────────────────────────────

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, SurfaceError> {
        let context = canvas
            .get_context("2d")
            .map_err(|e| SurfaceError::Backend(js_message(&e)))?
            .ok_or(SurfaceError::Unavailable)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SurfaceError::Unavailable)?;
        Ok(Self { canvas, context })
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (f64, f64) {
        (f64::from(self.canvas.width()), f64::from(self.canvas.height()))
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        Ok(())
    }

    fn fill_rect(
        &mut self,
        origin: Vec2,
        width: f64,
        height: f64,
        color: Hsla,
    ) -> Result<(), SurfaceError> {
        self.context.set_fill_style_str(&color.to_css());
        self.context.fill_rect(origin.x, origin.y, width, height);
        Ok(())
    }

    fn stroke_line(
        &mut self,
        from: Vec2,
        to: Vec2,
        width: f64,
        color: Hsla,
    ) -> Result<(), SurfaceError> {
        self.context.set_stroke_style_str(&color.to_css());
        self.context.set_line_width(width);
        self.context.begin_path();
        self.context.move_to(from.x, from.y);
        self.context.line_to(to.x, to.y);
        self.context.stroke();
        Ok(())
    }

    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Hsla) -> Result<(), SurfaceError> {
        if !(radius > 0.0) {
            return Ok(());
        }
        self.context.set_fill_style_str(&color.to_css());
        self.context.begin_path();
        self.context
            .arc(center.x, center.y, radius, 0.0, TAU)
            .map_err(|e| SurfaceError::Backend(js_message(&e)))?;
        self.context.fill();
        Ok(())
    }
}

// ─── Animation frame host ────────────────────────────────────────────────────

type Slot<T> = Rc<RefCell<Option<Closure<T>>>>;

/// Closures are created after the shared loop exists, so the host holds
/// empty slots that `NeuralBackdrop::start` fills.
#[derive(Clone, Default)]
struct Callbacks {
    frame: Slot<dyn FnMut(f64)>,
    resize: Slot<dyn FnMut()>,
    pointer_move: Slot<dyn FnMut(MouseEvent)>,
    pointer_leave: Slot<dyn FnMut(MouseEvent)>,
}

pub struct AnimationFrameHost {
    window: Window,
    callbacks: Callbacks,
}

impl AnimationFrameHost {
    /// Window listeners for the slots that are filled.
    fn listeners(&self) -> Vec<(&'static str, js_sys::Function)> {
        fn function<T: ?Sized>(slot: &Slot<T>) -> Option<js_sys::Function> {
            slot.borrow()
                .as_ref()
                .map(|c| c.as_ref().unchecked_ref::<js_sys::Function>().clone())
        }
        [
            ("resize", function(&self.callbacks.resize)),
            ("mousemove", function(&self.callbacks.pointer_move)),
            ("mouseout", function(&self.callbacks.pointer_leave)),
        ]
        .into_iter()
        .filter_map(|(event, f)| f.map(|f| (event, f)))
        .collect()
    }
}

impl FrameHost for AnimationFrameHost {
    fn request_frame(&mut self) -> Result<FrameHandle, HostError> {
        let slot = self.callbacks.frame.borrow();
        let callback = slot.as_ref().ok_or(HostError::Unavailable)?;
        self.window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map(FrameHandle)
            .map_err(|e| HostError::Schedule(js_message(&e)))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            tracing::warn!(error = %js_message(&e), "cancelAnimationFrame failed");
        }
    }

    fn attach(&mut self) -> Result<(), HostError> {
        for (event, listener) in self.listeners() {
            self.window
                .add_event_listener_with_callback(event, &listener)
                .map_err(|e| HostError::Listener(js_message(&e)))?;
        }
        Ok(())
    }

    fn detach(&mut self) {
        for (event, listener) in self.listeners() {
            if let Err(e) = self.window.remove_event_listener_with_callback(event, &listener) {
                tracing::debug!(event, error = %js_message(&e), "listener removal failed");
            }
        }
    }
}

// ─── JS handle ───────────────────────────────────────────────────────────────

type Runner = SimulationLoop<CanvasSurface, AnimationFrameHost>;
type SharedLoop = Rc<RefCell<Runner>>;

fn window_size(window: &Window) -> (u32, u32) {
    let extent = |v: Result<JsValue, JsValue>| {
        v.ok()
            .and_then(|v| v.as_f64())
            .filter(|v| v.is_finite() && *v > 0.0)
            .map_or(0, |v| v as u32)
    };
    (extent(window.inner_width()), extent(window.inner_height()))
}

/// Run `f` on the loop if it is still alive and not already borrowed.
fn with_loop(weak: &Weak<RefCell<Runner>>, f: impl FnOnce(&mut Runner)) {
    if let Some(shared) = weak.upgrade() {
        if let Ok(mut lp) = shared.try_borrow_mut() {
            f(&mut lp);
        }
    }
}

#[wasm_bindgen]
pub struct NeuralBackdrop {
    config: BackdropConfig,
    shared: Option<SharedLoop>,
}

#[wasm_bindgen]
impl NeuralBackdrop {
    /// `config` may be `undefined` or a partial object; missing fields
    /// take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<NeuralBackdrop, JsValue> {
        init_logging();
        let config: BackdropConfig = if config.is_undefined() || config.is_null() {
            BackdropConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            config,
            shared: None,
        })
    }

    /// Size `canvas` to the window and start animating. Does nothing when
    /// already running or when no window or 2D context is available.
    pub fn start(&mut self, canvas: HtmlCanvasElement) {
        if self.is_running() {
            return;
        }
        let Some(window) = web_sys::window() else {
            tracing::warn!("no window, backdrop not started");
            return;
        };
        let (width, height) = window_size(&window);
        canvas.set_width(width);
        canvas.set_height(height);
        let surface = match CanvasSurface::new(canvas.clone()) {
            Ok(surface) => surface,
            Err(err) => {
                tracing::warn!(%err, "canvas unusable, backdrop not started");
                return;
            }
        };

        let callbacks = Callbacks::default();
        let host = AnimationFrameHost {
            window: window.clone(),
            callbacks: callbacks.clone(),
        };
        let runner = match SimulationLoop::new(self.config.clone(), host) {
            Ok(runner) => runner,
            Err(err) => {
                tracing::warn!(%err, "invalid configuration");
                return;
            }
        };
        let shared: SharedLoop = Rc::new(RefCell::new(runner));

        let weak = Rc::downgrade(&shared);
        *callbacks.frame.borrow_mut() = Some(Closure::new(move |_: f64| {
            with_loop(&weak, |lp| {
                lp.frame();
            });
        }));

        let weak = Rc::downgrade(&shared);
        let resize_window = window.clone();
        *callbacks.resize.borrow_mut() = Some(Closure::new(move || {
            let (w, h) = window_size(&resize_window);
            with_loop(&weak, |lp| lp.notify_resize(w, h));
        }));

        let weak = Rc::downgrade(&shared);
        *callbacks.pointer_move.borrow_mut() = Some(Closure::new(move |event: MouseEvent| {
            let rect = canvas.get_bounding_client_rect();
            let at = Vec2::new(
                f64::from(event.client_x()) - rect.left(),
                f64::from(event.client_y()) - rect.top(),
            );
            with_loop(&weak, |lp| lp.notify_pointer(Some(at)));
        }));

        let weak = Rc::downgrade(&shared);
        *callbacks.pointer_leave.borrow_mut() = Some(Closure::new(move |event: MouseEvent| {
            // mouseout with no related target: the pointer left the window
            if event.related_target().is_none() {
                with_loop(&weak, |lp| lp.notify_pointer(None));
            }
        }));

        let phase = shared.borrow_mut().start(surface);
        tracing::info!(?phase, width, height, "neural backdrop started");
        self.shared = Some(shared);
    }

    /// Cancel the pending frame and remove listeners. Idempotent.
    pub fn stop(&mut self) {
        if let Some(shared) = &self.shared {
            shared.borrow_mut().stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| shared.borrow().is_running())
    }

    /// Current state as a JSON string, or `null` before the first start.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let Some(shared) = &self.shared else {
            return Ok(JsValue::NULL);
        };
        let lp = shared.borrow();
        match lp.simulation() {
            Some(sim) => sim
                .to_json()
                .map(|json| JsValue::from_str(&json))
                .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn stats(&self) -> JsValue {
        match &self.shared {
            Some(shared) => {
                serde_wasm_bindgen::to_value(shared.borrow().stats()).unwrap_or(JsValue::NULL)
            }
            None => JsValue::NULL,
        }
    }
}

impl Drop for NeuralBackdrop {
    fn drop(&mut self) {
        self.stop();
    }
}
