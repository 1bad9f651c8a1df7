use herd_core::{Error, Result, Simulation};
use herd_shared::{Agent, Food, World};
use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::describe;

// Structural binding: any object with `step()` and `world()` methods works,
// including classes exported by another wasm module.
#[wasm_bindgen]
extern "C" {
    pub type JsSimulation;

    #[wasm_bindgen(method, catch, js_name = step)]
    fn js_step(this: &JsSimulation) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = world)]
    fn js_world(this: &JsSimulation) -> std::result::Result<JsValue, JsValue>;
}

impl JsSimulation {
    /// Check that `value` has callable `step` and `world` members.
    pub fn from_value(value: JsValue) -> Result<Self> {
        if value.is_null() || value.is_undefined() {
            return Err(Error::Simulation("no simulation object given".into()));
        }

        for method in ["step", "world"] {
            let member = Reflect::get(&value, &JsValue::from_str(method))
                .map_err(|e| Error::Simulation(describe(&e)))?;
            if !member.is_function() {
                return Err(Error::Simulation(format!(
                    "simulation object has no callable `{}`",
                    method
                )));
            }
        }

        Ok(value.unchecked_into())
    }
}

impl Simulation for JsSimulation {
    fn step(&mut self) -> Result<()> {
        self.js_step()
            .map_err(|e| Error::Simulation(format!("step() threw: {}", describe(&e))))
    }

    fn world(&self) -> Result<World> {
        let world = self
            .js_world()
            .map_err(|e| Error::Simulation(format!("world() threw: {}", describe(&e))))?;

        let animals = records(&world, "animals")?
            .ok_or_else(|| Error::Simulation("world has no `animals`".into()))?
            .iter()
            .enumerate()
            .map(|(index, record)| -> Result<Agent> {
                let field = |key: &str| {
                    number(record, key).ok_or_else(|| Error::MalformedAgent {
                        index,
                        reason: format!("missing numeric `{}`", key),
                    })
                };
                Ok(Agent::new(field("x")?, field("y")?, field("rotation")?))
            })
            .collect::<Result<Vec<_>>>()?;

        let foods = records(&world, "foods")?
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, record)| -> Result<Food> {
                match (number(record, "x"), number(record, "y")) {
                    (Some(x), Some(y)) => Ok(Food::new(x, y)),
                    _ => Err(Error::Simulation(format!(
                        "malformed food #{}: missing numeric `x` or `y`",
                        index
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(World { animals, foods })
    }
}

/// Collect an iterable property; `None` if it is missing.
fn records(object: &JsValue, key: &str) -> Result<Option<Vec<JsValue>>> {
    let value =
        Reflect::get(object, &JsValue::from_str(key)).map_err(|e| Error::Simulation(describe(&e)))?;
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }

    let iter = js_sys::try_iter(&value)
        .map_err(|e| Error::Simulation(describe(&e)))?
        .ok_or_else(|| Error::Simulation(format!("`{}` is not iterable", key)))?;

    iter.map(|item| item.map_err(|e| Error::Simulation(describe(&e))))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn number(record: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(record, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.as_f64())
}
