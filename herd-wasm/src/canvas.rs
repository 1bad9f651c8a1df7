use herd_core::{Error, Result, Surface, ViewportTarget};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::describe;

/// The `<canvas>` element side of the viewport.
pub struct CanvasTarget {
    canvas: HtmlCanvasElement,
}

impl CanvasTarget {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl ViewportTarget for CanvasTarget {
    fn logical_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn set_display_size(&mut self, width: u32, height: u32) -> Result<()> {
        let style = self.canvas.style();
        style
            .set_property("width", &format!("{}px", width))
            .map_err(|e| Error::Surface(describe(&e)))?;
        style
            .set_property("height", &format!("{}px", height))
            .map_err(|e| Error::Surface(describe(&e)))?;
        Ok(())
    }
}

/// [`Surface`] over a 2D canvas context.
pub struct CanvasSurface {
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        Self { context }
    }
}

impl Surface for CanvasSurface {
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.context.clear_rect(x, y, width, height);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.context.fill_rect(x, y, width, height);
    }

    fn begin_path(&mut self) {
        self.context.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.context.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.context.line_to(x, y);
    }

    fn close_path(&mut self) {
        self.context.close_path();
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> Result<()> {
        self.context
            .arc(x, y, radius, start, end)
            .map_err(|e| Error::Surface(describe(&e)))
    }

    fn stroke(&mut self) {
        self.context.stroke();
    }

    fn fill(&mut self) {
        self.context.fill();
    }

    fn scale(&mut self, x: f64, y: f64) -> Result<()> {
        self.context
            .scale(x, y)
            .map_err(|e| Error::Surface(describe(&e)))
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.context.set_stroke_style_str(style);
    }

    fn set_fill_style(&mut self, style: &str) {
        self.context.set_fill_style_str(style);
    }

    fn set_line_width(&mut self, width: f64) {
        self.context.set_line_width(width);
    }
}
