use crate::{Point, Result, Surface, ViewportTarget};

/// Logical drawing area plus the device pixel scale it is rendered at.
///
/// Created once by [`Viewport::install`]; there is no resize handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    scale: f64,
}

impl Viewport {
    /// A zero dimension is allowed; nothing drawn on it is visible.
    pub fn new(width: u32, height: u32, scale: f64) -> Self {
        if width == 0 || height == 0 {
            log::warn!("viewport has no drawable area ({}x{})", width, height);
        }

        Self {
            width,
            height,
            scale: Self::sanitize_scale(scale),
        }
    }

    /// Size the target's backing store for `scale` and scale the surface so
    /// that every later draw call can use logical pixels.
    ///
    /// The backing size must be set before the transform: resizing a canvas
    /// resets its context state.
    pub fn install<T, S>(target: &mut T, surface: &mut S, scale: f64) -> Result<Self>
    where
        T: ViewportTarget + ?Sized,
        S: Surface + ?Sized,
    {
        let (width, height) = target.logical_size();
        let viewport = Self::new(width, height, scale);
        let (backing_width, backing_height) = viewport.backing_size();

        target.set_backing_size(backing_width, backing_height);
        target.set_display_size(width, height)?;
        surface.scale(viewport.scale, viewport.scale)?;

        log::debug!(
            "viewport {}x{} at scale {} (backing {}x{})",
            width,
            height,
            viewport.scale,
            backing_width,
            backing_height
        );

        Ok(viewport)
    }

    /// Missing, non-finite or non-positive ratios fall back to 1.
    pub fn sanitize_scale(scale: f64) -> f64 {
        if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        }
    }

    pub fn width(&self) -> f64 {
        self.width as f64
    }

    pub fn height(&self) -> f64 {
        self.height as f64
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Backing resolution, truncated the same way a canvas truncates
    /// fractional dimensions.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.scale) as u32,
            (self.height as f64 * self.scale) as u32,
        )
    }

    pub fn to_backing(&self, point: Point) -> Point {
        Point::new(point.x * self.scale, point.y * self.scale)
    }
}
