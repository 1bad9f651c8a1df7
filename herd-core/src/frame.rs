use std::cell::Cell;
use std::rc::Rc;

use crate::{Renderer, Result, Simulation, Surface, Viewport};

/// Shared stop flag for a [`FrameLoop`].
///
/// Single-threaded: clones share one flag through an `Rc`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Outcome of one [`FrameLoop::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Request another frame.
    Continue,
    /// The loop was cancelled; do not reschedule.
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Ticks that ran a frame body, faulted or not
    pub frames: u64,
    /// Frames skipped because the simulation or the surface failed
    pub faults: u64,
    pub agents_drawn: u64,
}

/// Clear, step, read the world and draw it: once per tick.
///
/// The host drives the loop by calling [`tick`](Self::tick) from its frame
/// callback and rescheduling while it returns [`Tick::Continue`].
pub struct FrameLoop<Sim, Surf> {
    simulation: Sim,
    surface: Surf,
    viewport: Viewport,
    renderer: Renderer,
    token: CancelToken,
    stats: FrameStats,
}

impl<Sim, Surf> FrameLoop<Sim, Surf>
where
    Sim: Simulation,
    Surf: Surface,
{
    pub fn new(simulation: Sim, surface: Surf, viewport: Viewport, renderer: Renderer) -> Self {
        Self {
            simulation,
            surface,
            viewport,
            renderer,
            token: CancelToken::new(),
            stats: FrameStats::default(),
        }
    }

    pub fn tick(&mut self) -> Tick {
        if self.token.is_cancelled() {
            return self.stopped();
        }

        if self.stats.frames == 0 {
            log::debug!(
                "frame loop started on a {}x{} viewport",
                self.viewport.width(),
                self.viewport.height()
            );
        }

        self.stats.frames += 1;
        match self.frame() {
            Ok(drawn) => {
                self.stats.agents_drawn += drawn as u64;
                log::trace!("frame {}: {} agents", self.stats.frames, drawn);
            }
            Err(err) => {
                self.stats.faults += 1;
                log::warn!("frame {} skipped: {}", self.stats.frames, err);
            }
        }

        if self.token.is_cancelled() {
            self.stopped()
        } else {
            Tick::Continue
        }
    }

    fn stopped(&self) -> Tick {
        log::debug!(
            "frame loop on a {}x{} viewport stopped after {} frames",
            self.viewport.width(),
            self.viewport.height(),
            self.stats.frames
        );
        Tick::Stopped
    }

    fn frame(&mut self) -> Result<usize> {
        self.renderer.clear(&mut self.surface, &self.viewport);
        self.simulation.step()?;
        let world = self.simulation.world()?;
        self.renderer.draw(&mut self.surface, &self.viewport, &world)
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn simulation(&self) -> &Sim {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Sim {
        &mut self.simulation
    }

    pub fn surface(&self) -> &Surf {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Agent, Error, Point, World};
    use std::sync::Mutex;

    /// Keeps every formatted record so tests can look for lifecycle messages.
    struct CaptureLogger;

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());
    static CAPTURE: CaptureLogger = CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            CAPTURED.lock().unwrap().push(record.args().to_string());
        }

        fn flush(&self) {}
    }

    fn captured(prefix: &str) -> usize {
        CAPTURED
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    #[derive(Default)]
    struct NullSurface {
        clears: usize,
        strokes: usize,
    }

    impl Surface for NullSurface {
        fn clear_rect(&mut self, _: f64, _: f64, _: f64, _: f64) {
            self.clears += 1;
        }
        fn fill_rect(&mut self, _: f64, _: f64, _: f64, _: f64) {}
        fn begin_path(&mut self) {}
        fn move_to(&mut self, _: f64, _: f64) {}
        fn line_to(&mut self, _: f64, _: f64) {}
        fn close_path(&mut self) {}
        fn arc(&mut self, _: f64, _: f64, _: f64, _: f64, _: f64) -> Result<()> {
            Ok(())
        }
        fn stroke(&mut self) {
            self.strokes += 1;
        }
        fn fill(&mut self) {}
        fn scale(&mut self, _: f64, _: f64) -> Result<()> {
            Ok(())
        }
        fn set_stroke_style(&mut self, _: &str) {}
        fn set_fill_style(&mut self, _: &str) {}
        fn set_line_width(&mut self, _: f64) {}
    }

    /// Moves a single agent right by 0.1 per step; fails on the steps listed.
    struct Walker {
        steps: u32,
        fail_on: Vec<u32>,
    }

    impl Simulation for Walker {
        fn step(&mut self) -> Result<()> {
            self.steps += 1;
            if self.fail_on.contains(&self.steps) {
                return Err(Error::Simulation(format!("step {} exploded", self.steps)));
            }
            Ok(())
        }

        fn world(&self) -> Result<World> {
            Ok(World::new(vec![Agent::new(self.steps as f64 * 0.1, 0.5, 0.0)]))
        }
    }

    fn frame_loop(fail_on: Vec<u32>) -> FrameLoop<Walker, NullSurface> {
        FrameLoop::new(
            Walker { steps: 0, fail_on },
            NullSurface::default(),
            Viewport::new(100, 100, 1.0),
            Renderer::default(),
        )
    }

    #[test]
    fn test_tick_steps_once_and_draws() {
        let mut frames = frame_loop(vec![]);
        assert_eq!(frames.tick(), Tick::Continue);
        assert_eq!(frames.simulation().steps, 1);
        assert_eq!(frames.surface().clears, 1);
        assert_eq!(frames.surface().strokes, 1);
        assert_eq!(
            frames.stats(),
            FrameStats {
                frames: 1,
                faults: 0,
                agents_drawn: 1
            }
        );
    }

    #[test]
    fn test_cancelled_loop_does_no_work() {
        let mut frames = frame_loop(vec![]);
        frames.cancel_token().cancel();
        assert_eq!(frames.tick(), Tick::Stopped);
        assert_eq!(frames.simulation().steps, 0);
        assert_eq!(frames.stats().frames, 0);
    }

    #[test]
    fn test_faulty_frame_is_skipped_not_fatal() {
        let mut frames = frame_loop(vec![2]);
        for _ in 0..4 {
            assert_eq!(frames.tick(), Tick::Continue);
        }
        let stats = frames.stats();
        assert_eq!(stats.frames, 4);
        assert_eq!(stats.faults, 1);
        assert_eq!(stats.agents_drawn, 3);
        assert_eq!(frames.surface().clears, 4);
    }

    #[test]
    fn test_start_and_stop_are_logged() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Trace);

        let mut frames = FrameLoop::new(
            Walker {
                steps: 0,
                fail_on: vec![],
            },
            NullSurface::default(),
            Viewport::new(321, 123, 1.0),
            Renderer::default(),
        );
        frames.tick();
        frames.tick();
        frames.cancel_token().cancel();
        frames.tick();

        assert_eq!(captured("frame loop started on a 321x123 viewport"), 1);
        assert_eq!(
            captured("frame loop on a 321x123 viewport stopped after 2 frames"),
            1
        );
        assert_eq!(frames.stats().frames, 2);
    }

    #[test]
    fn test_token_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_viewport_accessor() {
        let frames = frame_loop(vec![]);
        assert_eq!(frames.viewport().to_backing(Point::new(1.0, 1.0)), Point::new(1.0, 1.0));
    }
}
