use crate::geometry;
use crate::{RenderSettings, Result, Surface, Viewport, World};

/// Draws world snapshots onto a [`Surface`].
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    settings: RenderSettings,
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Clear the whole logical area, then paint the background if one is set.
    pub fn clear<S: Surface + ?Sized>(&self, surface: &mut S, viewport: &Viewport) {
        surface.clear_rect(0.0, 0.0, viewport.width(), viewport.height());

        if let Some(background) = &self.settings.background {
            surface.set_fill_style(background);
            surface.fill_rect(0.0, 0.0, viewport.width(), viewport.height());
        }
    }

    /// Draw foods, then agents on top. Returns how many agents were drawn;
    /// records with non-finite fields are skipped.
    pub fn draw<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        viewport: &Viewport,
        world: &World,
    ) -> Result<usize> {
        let (width, height) = (viewport.width(), viewport.height());

        if self.settings.draw_foods && !world.foods.is_empty() {
            let radius = self.settings.food_radius_ratio * width;
            surface.set_fill_style(&self.settings.food_fill);

            for food in world.foods.iter().filter(|food| food.is_finite()) {
                geometry::draw_circle(surface, geometry::food_center(food, width, height), radius)?;
            }
        }

        let size = self.settings.agent_size_ratio * width;
        surface.set_stroke_style(&self.settings.agent_stroke);
        surface.set_line_width(self.settings.line_width);

        let mut drawn = 0;
        for (index, agent) in world.animals.iter().enumerate() {
            if !agent.is_finite() {
                log::trace!("skipping agent #{} with non-finite fields: {:?}", index, agent);
                continue;
            }

            let center = geometry::agent_center(agent, width, height);
            let vertices =
                geometry::triangle(center, size, agent.rotation, self.settings.nose_ratio);
            geometry::draw_triangle(surface, &vertices);
            drawn += 1;
        }

        Ok(drawn)
    }
}
