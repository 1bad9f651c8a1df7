use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A simulated animal as seen by the renderer.
///
/// `x` and `y` are normalized to the unit square, `rotation` is the heading
/// in radians (0 points along +x, π/2 along +y in canvas space).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

impl Agent {
    pub fn new(x: f64, y: f64, rotation: f64) -> Self {
        Self { x, y, rotation }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.rotation.is_finite()
    }
}

/// A food pellet, normalized like [`Agent`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Food {
    pub x: f64,
    pub y: f64,
}

impl Food {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Snapshot of the simulated world taken once per frame
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct World {
    pub animals: Vec<Agent>,
    #[serde(default)]
    pub foods: Vec<Food>,
}

impl World {
    pub fn new(animals: Vec<Agent>) -> Self {
        Self {
            animals,
            foods: Vec::new(),
        }
    }

    pub fn with_foods(mut self, foods: Vec<Food>) -> Self {
        self.foods = foods;
        self
    }
}

/// Errors produced while loading [`RenderSettings`].
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Rendering configuration passed in by the host page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Agent size as a fraction of the logical viewport width
    pub agent_size_ratio: f64,
    /// Length of the nose relative to the flanks
    pub nose_ratio: f64,
    pub agent_stroke: String,
    pub line_width: f64,
    pub draw_foods: bool,
    pub food_radius_ratio: f64,
    pub food_fill: String,
    /// Painted after every clear; `None` leaves the canvas transparent.
    pub background: Option<String>,
    pub log_level: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            agent_size_ratio: 0.01,
            nose_ratio: 1.5,
            agent_stroke: "rgb(0, 0, 0)".to_string(),
            line_width: 1.0,
            draw_foods: true,
            food_radius_ratio: 0.005,
            food_fill: "rgb(0, 255, 128)".to_string(),
            background: None,
            log_level: "info".to_string(),
        }
    }
}

impl RenderSettings {
    /// Parse a (possibly partial) JSON object; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        positive("agent_size_ratio", self.agent_size_ratio)?;
        positive("nose_ratio", self.nose_ratio)?;
        positive("line_width", self.line_width)?;
        positive("food_radius_ratio", self.food_radius_ratio)?;

        match self.log_level.to_ascii_lowercase().as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            other => Err(SettingsError::InvalidValue {
                field: "log_level",
                reason: format!("unknown level {:?}", other),
            }),
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue {
            field,
            reason: format!("expected a positive finite number, got {}", value),
        })
    }
}
