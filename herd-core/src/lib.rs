//! Host-agnostic rendering core for the herd viewer.
//!
//! The core never talks to a browser directly. It draws through the
//! [`Surface`] trait, sizes the drawing area through [`ViewportTarget`] and
//! pulls world state from a [`Simulation`]. The wasm crate supplies the
//! browser-backed implementations.

use herd_shared::SettingsError;
use thiserror::Error;

mod frame;
mod render;
mod viewport;

pub use frame::{CancelToken, FrameLoop, FrameStats, Tick};
pub use herd_shared::{Agent, Food, RenderSettings, World};
pub use render::Renderer;
pub use viewport::Viewport;

/// Errors raised by the rendering core and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    #[error("drawing surface unavailable: {0}")]
    MissingSurface(String),

    #[error("simulation failed: {0}")]
    Simulation(String),

    #[error("malformed agent #{index}: {reason}")]
    MalformedAgent { index: usize, reason: String },

    #[error("surface operation failed: {0}")]
    Surface(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A point in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset by `distance` along `angle` (radians).
    pub fn polar_offset(&self, angle: f64, distance: f64) -> Self {
        Self {
            x: self.x + angle.cos() * distance,
            y: self.y + angle.sin() * distance,
        }
    }
}

/// The 2D drawing context. Coordinates are logical pixels once a
/// [`Viewport`] has been installed on it.
pub trait Surface {
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> Result<()>;
    fn stroke(&mut self);
    fn fill(&mut self);
    fn scale(&mut self, x: f64, y: f64) -> Result<()>;
    fn set_stroke_style(&mut self, style: &str);
    fn set_fill_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
}

/// The element that owns the drawing surface (a canvas, in the browser).
pub trait ViewportTarget {
    /// Declared size in logical pixels, before any density scaling.
    fn logical_size(&self) -> (u32, u32);
    /// Resolution of the backing store in physical pixels.
    fn set_backing_size(&mut self, width: u32, height: u32);
    /// Size the element is displayed at, in logical pixels.
    fn set_display_size(&mut self, width: u32, height: u32) -> Result<()>;
}

/// The external simulation collaborator.
///
/// `step` advances the simulation by one tick; `world` returns the state
/// after the most recent step.
pub trait Simulation {
    fn step(&mut self) -> Result<()>;
    fn world(&self) -> Result<World>;
}

impl<T: Simulation + ?Sized> Simulation for Box<T> {
    fn step(&mut self) -> Result<()> {
        (**self).step()
    }

    fn world(&self) -> Result<World> {
        (**self).world()
    }
}

/// Sprite geometry
pub mod geometry {
    use super::*;
    use std::f64::consts::PI;

    /// Pixel position of an agent's center: `(x * width, y * height)`.
    pub fn agent_center(agent: &Agent, width: f64, height: f64) -> Point {
        Point::new(agent.x * width, agent.y * height)
    }

    pub fn food_center(food: &Food, width: f64, height: f64) -> Point {
        Point::new(food.x * width, food.y * height)
    }

    /// Vertices of the heading triangle in path order: nose, left rear, right rear.
    ///
    /// The nose sits `nose_ratio * size` ahead of the center along `rotation`,
    /// the rear corners `size` away at +120° and +240°.
    pub fn triangle(center: Point, size: f64, rotation: f64, nose_ratio: f64) -> [Point; 3] {
        [
            center.polar_offset(rotation, size * nose_ratio),
            center.polar_offset(rotation + 2.0 / 3.0 * PI, size),
            center.polar_offset(rotation + 4.0 / 3.0 * PI, size),
        ]
    }

    /// Strokes a closed outline through `vertices`.
    pub fn draw_triangle<S: Surface + ?Sized>(surface: &mut S, vertices: &[Point; 3]) {
        let [nose, left, right] = vertices;

        surface.begin_path();
        surface.move_to(nose.x, nose.y);
        surface.line_to(left.x, left.y);
        surface.line_to(right.x, right.y);
        surface.line_to(nose.x, nose.y);
        surface.close_path();
        surface.stroke();
    }

    pub fn draw_circle<S: Surface + ?Sized>(
        surface: &mut S,
        center: Point,
        radius: f64,
    ) -> Result<()> {
        surface.begin_path();
        surface.arc(center.x, center.y, radius, 0.0, 2.0 * PI)?;
        surface.fill();
        Ok(())
    }
}
