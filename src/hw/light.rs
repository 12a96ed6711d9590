//! Render-time light description and binding.
//!
//! A [`LightHandler`] owns the application's light setup: which node
//! definition backs each opaque light type id, and the concrete
//! [`LightSource`] instances with their parameter values. Construction and
//! mutation both go through the handler so every stored parameter is
//! validated against the backing definition.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::errors::{GenError, Result};
use crate::generator::GenOptions;
use crate::graph::NodeDef;
use crate::value::Value;

use super::{HwGenerator, LightTypeId};

/// One light source instance: its type id and validated parameter values.
#[derive(Debug, Clone)]
pub struct LightSource {
    type_id: LightTypeId,
    def: Arc<NodeDef>,
    values: FxHashMap<String, Value>,
}

impl LightSource {
    #[must_use]
    pub fn type_id(&self) -> LightTypeId {
        self.type_id
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Owns light shaders per type id and the created light sources.
#[derive(Default)]
pub struct LightHandler {
    light_shaders: FxHashMap<LightTypeId, Arc<NodeDef>>,
    light_sources: Vec<LightSource>,
}

impl LightHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a light node definition with a type id. Re-associating a
    /// type id replaces the previous definition; existing sources keep the
    /// definition they were created with.
    pub fn add_light_shader(&mut self, light_type_id: LightTypeId, def: Arc<NodeDef>) {
        self.light_shaders.insert(light_type_id, def);
    }

    /// Create a light source of a registered type, seeded with the
    /// definition's parameter defaults. Returns the source's index.
    pub fn create_light_source(&mut self, light_type_id: LightTypeId) -> Result<usize> {
        let def = self
            .light_shaders
            .get(&light_type_id)
            .ok_or(GenError::UnboundLightType {
                type_id: light_type_id,
            })?;
        let values = def
            .ports
            .iter()
            .filter_map(|p| p.value.clone().map(|v| (p.name.clone(), v)))
            .collect();
        self.light_sources.push(LightSource {
            type_id: light_type_id,
            def: Arc::clone(def),
            values,
        });
        Ok(self.light_sources.len() - 1)
    }

    #[must_use]
    pub fn light_sources(&self) -> &[LightSource] {
        &self.light_sources
    }

    /// Set a parameter on a created light source. The name and value type
    /// are validated against the source's node definition.
    pub fn set_parameter(&mut self, index: usize, name: &str, value: Value) -> Result<()> {
        let source = self
            .light_sources
            .get_mut(index)
            .ok_or(GenError::LightSourceOutOfRange { index })?;
        let port =
            source
                .def
                .port(name)
                .ok_or_else(|| GenError::UnknownLightParameter {
                    type_id: source.type_id,
                    name: name.to_string(),
                })?;
        if port.ty != value.ty() {
            return Err(GenError::LightParameterType {
                name: name.to_string(),
                expected: port.ty,
                actual: value.ty(),
            });
        }
        source.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Bind every registered light shader on a generator, in ascending
    /// type-id order.
    pub fn bind_light_shaders(
        &self,
        generator: &mut HwGenerator,
        options: &GenOptions,
    ) -> Result<()> {
        let mut ids: Vec<LightTypeId> = self.light_shaders.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            generator.bind_light_shader(&self.light_shaders[&id], id, options)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;

    fn point_light_def() -> Arc<NodeDef> {
        Arc::new(
            NodeDef::new("ND_point_light", "point_light", DataType::Light)
                .with_input(
                    "color",
                    DataType::Color3,
                    Some(Value::Color3(glam::Vec3::ONE)),
                )
                .with_parameter("intensity", DataType::Float, Some(Value::Float(1.0)))
                .with_file("point_light.glsl", "point_light"),
        )
    }

    #[test]
    fn creating_a_source_for_an_unbound_type_fails() {
        let mut handler = LightHandler::new();
        let err = handler.create_light_source(42).unwrap_err();
        assert!(matches!(err, GenError::UnboundLightType { type_id: 42 }));
    }

    #[test]
    fn sources_are_seeded_with_definition_defaults() {
        let mut handler = LightHandler::new();
        handler.add_light_shader(1, point_light_def());
        let index = handler.create_light_source(1).unwrap();
        let source = &handler.light_sources()[index];
        assert_eq!(source.parameter("intensity"), Some(&Value::Float(1.0)));
        assert_eq!(
            source.parameter("color"),
            Some(&Value::Color3(glam::Vec3::ONE))
        );
    }

    #[test]
    fn set_parameter_validates_name_and_type() {
        let mut handler = LightHandler::new();
        handler.add_light_shader(1, point_light_def());
        let index = handler.create_light_source(1).unwrap();

        handler
            .set_parameter(index, "intensity", Value::Float(3.0))
            .unwrap();
        assert_eq!(
            handler.light_sources()[index].parameter("intensity"),
            Some(&Value::Float(3.0))
        );

        let err = handler
            .set_parameter(index, "falloff", Value::Float(1.0))
            .unwrap_err();
        assert!(matches!(err, GenError::UnknownLightParameter { .. }));

        let err = handler
            .set_parameter(index, "intensity", Value::Boolean(true))
            .unwrap_err();
        assert!(matches!(err, GenError::LightParameterType { .. }));

        let err = handler
            .set_parameter(99, "intensity", Value::Float(1.0))
            .unwrap_err();
        assert!(matches!(err, GenError::LightSourceOutOfRange { index: 99 }));
    }
}
