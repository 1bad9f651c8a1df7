use std::cell::{Cell, RefCell};
use std::rc::Rc;

use herd_core::{CancelToken, Error, FrameLoop, FrameStats, Renderer, Tick, Viewport};
use herd_shared::RenderSettings;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

mod canvas;
mod logger;
mod simulation;

pub use canvas::{CanvasSurface, CanvasTarget};
pub use simulation::JsSimulation;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

type CanvasLoop = FrameLoop<JsSimulation, CanvasSurface>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Draws a JS simulation's animals on a canvas, one step per display frame.
#[wasm_bindgen]
pub struct Viewer {
    frames: Rc<RefCell<CanvasLoop>>,
    // Copied out after every tick so the accessors never borrow `frames`,
    // which is mutably borrowed while the simulation runs.
    stats: Rc<Cell<FrameStats>>,
    viewport: Viewport,
    token: CancelToken,
    callback: FrameCallback,
    pending: Rc<Cell<Option<i32>>>,
    running: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl Viewer {
    /// `simulation` is any object with `step()` and `world()` methods;
    /// `settings` is an optional JSON object of render settings.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        simulation: JsValue,
        settings: Option<String>,
    ) -> Result<Viewer, JsValue> {
        let window = web_sys::window().ok_or("no global window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| {
                to_js(Error::MissingSurface(format!(
                    "no element with id `{}`",
                    canvas_id
                )))
            })?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| {
                to_js(Error::MissingSurface(format!(
                    "element `{}` is not a canvas",
                    canvas_id
                )))
            })?;

        Self::from_canvas(canvas, simulation, settings)
    }

    #[wasm_bindgen(js_name = fromCanvas)]
    pub fn from_canvas(
        canvas: HtmlCanvasElement,
        simulation: JsValue,
        settings: Option<String>,
    ) -> Result<Viewer, JsValue> {
        let settings = match settings {
            Some(json) => RenderSettings::from_json(&json).map_err(|e| to_js(Error::from(e)))?,
            None => RenderSettings::default(),
        };
        logger::init(logger::parse_level(&settings.log_level));

        let window = web_sys::window().ok_or("no global window")?;
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| to_js(Error::MissingSurface("no 2d context".into())))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let simulation = JsSimulation::from_value(simulation).map_err(to_js)?;

        let mut target = CanvasTarget::new(canvas);
        let mut surface = CanvasSurface::new(context);
        let viewport = Viewport::install(&mut target, &mut surface, window.device_pixel_ratio())
            .map_err(to_js)?;

        console_log!(
            "Initializing herd viewer: {}x{} at {}x density",
            viewport.width(),
            viewport.height(),
            viewport.scale()
        );

        let frames = FrameLoop::new(simulation, surface, viewport, Renderer::new(settings));
        let token = frames.cancel_token();

        Ok(Viewer {
            frames: Rc::new(RefCell::new(frames)),
            stats: Rc::new(Cell::new(FrameStats::default())),
            viewport,
            token,
            callback: Rc::new(RefCell::new(None)),
            pending: Rc::new(Cell::new(None)),
            running: Rc::new(Cell::new(false)),
        })
    }

    /// Start the requestAnimationFrame loop. A no-op while already running;
    /// a stopped viewer cannot be restarted.
    pub fn start(&self) -> Result<(), JsValue> {
        if self.token.is_cancelled() {
            return Err(JsValue::from_str("viewer has been stopped"));
        }
        if self.running.get() {
            return Ok(());
        }

        let frames = self.frames.clone();
        let stats = self.stats.clone();
        let next = self.callback.clone();
        let pending = self.pending.clone();
        let running = self.running.clone();

        *self.callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            pending.set(None);

            let tick = match frames.try_borrow_mut() {
                Ok(mut frames) => {
                    let tick = frames.tick();
                    stats.set(frames.stats());
                    tick
                }
                Err(_) => {
                    log::warn!("frame callback re-entered; skipping");
                    Tick::Continue
                }
            };

            let scheduled = match tick {
                Tick::Continue => match next.borrow().as_ref() {
                    Some(callback) => request_animation_frame(callback)
                        .map_err(|e| log::error!("requestAnimationFrame failed: {}", describe(&e)))
                        .ok(),
                    None => None,
                },
                Tick::Stopped => None,
            };

            match scheduled {
                Some(handle) => pending.set(Some(handle)),
                None => {
                    running.set(false);
                    // Releases this closure and everything it captured.
                    let _ = next.borrow_mut().take();
                }
            }
        }) as Box<dyn FnMut()>));

        let requested = self
            .callback
            .borrow()
            .as_ref()
            .map(request_animation_frame)
            .unwrap_or_else(|| Err(JsValue::from_str("frame callback missing")));
        let handle = match requested {
            Ok(handle) => handle,
            Err(e) => {
                let _ = self.callback.borrow_mut().take();
                return Err(e);
            }
        };
        self.pending.set(Some(handle));
        self.running.set(true);
        log::debug!("requestAnimationFrame loop scheduled");

        Ok(())
    }

    /// Cancel the loop: no step or draw happens after this returns.
    pub fn stop(&self) {
        self.token.cancel();

        if let Some(handle) = self.pending.take() {
            if let Some(window) = web_sys::window() {
                if let Err(e) = window.cancel_animation_frame(handle) {
                    log::warn!("cancelAnimationFrame failed: {}", describe(&e));
                }
            }
        }

        self.running.set(false);
        let _ = self.callback.borrow_mut().take();
        log::debug!("render loop stopped");
    }

    /// Run one frame synchronously. Returns `false` once the viewer is stopped.
    #[wasm_bindgen(js_name = renderFrame)]
    pub fn render_frame(&self) -> Result<bool, JsValue> {
        let mut frames = self
            .frames
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("a frame is already in progress"))?;
        let tick = frames.tick();
        self.stats.set(frames.stats());
        Ok(tick == Tick::Continue)
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn frames(&self) -> usize {
        self.stats.get().frames as usize
    }

    pub fn faults(&self) -> usize {
        self.stats.get().faults as usize
    }

    #[wasm_bindgen(js_name = agentsDrawn)]
    pub fn agents_drawn(&self) -> usize {
        self.stats.get().agents_drawn as usize
    }

    pub fn width(&self) -> f64 {
        self.viewport.width()
    }

    pub fn height(&self) -> f64 {
        self.viewport.height()
    }

    pub fn scale(&self) -> f64 {
        self.viewport.scale()
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn request_animation_frame(callback: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or("no global window")?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Best-effort text for a thrown JS value
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::logger;
    use log::LevelFilter;

    #[test]
    fn test_parse_level() {
        assert_eq!(logger::parse_level("debug"), LevelFilter::Debug);
        assert_eq!(logger::parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(logger::parse_level("off"), LevelFilter::Off);
        assert_eq!(logger::parse_level("chatty"), LevelFilter::Info);
    }
}
