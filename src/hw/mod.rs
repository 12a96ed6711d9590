//! Hardware (rasterization) extension of the generic generator.
//!
//! [`HwGenerator`] wraps a [`Generator`] and adds the two-stage pipeline
//! contract: seeded vertex inputs and matrices, the vertex-to-pixel
//! connector block, light-shader binding per opaque light type id, and the
//! per-stage assembly that turns the accumulated blocks and statements into
//! complete vertex and pixel sources.

use rustc_hash::FxHashMap;

use crate::errors::{GenError, Result};
use crate::generator::{self, GenOptions, Generator};
use crate::graph::{NodeDef, NodeGraph, NodeKey};
use crate::registry::{ImplRegistry, NodeImpl};
use crate::shader::{Shader, Stage};
use crate::value::{DataType, Value};

pub mod light;

pub use crate::shader::blocks;
pub use light::{LightHandler, LightSource};

/// Opaque per-application light type identifier.
pub type LightTypeId = u64;

/// Default cap on concurrently active light sources.
pub const DEFAULT_MAX_ACTIVE_LIGHT_SOURCES: u32 = 3;

/// Generator for two-stage rasterization pipelines.
pub struct HwGenerator {
    base: Generator,
    max_active_light_sources: u32,
    bound_light_shaders: FxHashMap<LightTypeId, NodeImpl>,
}

impl HwGenerator {
    #[must_use]
    pub fn new(base: Generator) -> Self {
        Self {
            base,
            max_active_light_sources: DEFAULT_MAX_ACTIVE_LIGHT_SOURCES,
            bound_light_shaders: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn base(&self) -> &Generator {
        &self.base
    }

    pub fn registry_mut(&mut self) -> &mut ImplRegistry {
        self.base.registry_mut()
    }

    #[must_use]
    pub fn max_active_light_sources(&self) -> u32 {
        self.max_active_light_sources
    }

    /// Set the cap on active light sources. Clamped to at least one so the
    /// light array declaration stays well-formed.
    pub fn set_max_active_light_sources(&mut self, count: u32) {
        self.max_active_light_sources = count.max(1);
    }

    /// Compile and bind a light shader for a light type id. Rebinding a
    /// type id replaces the previous implementation.
    pub fn bind_light_shader(
        &mut self,
        def: &NodeDef,
        light_type_id: LightTypeId,
        _options: &GenOptions,
    ) -> Result<()> {
        let imp = self.base.registry_mut().register_light_shader(def)?;
        if self
            .bound_light_shaders
            .insert(light_type_id, imp)
            .is_some()
        {
            log::debug!("light type {light_type_id} rebound to '{}'", def.name);
        }
        Ok(())
    }

    #[must_use]
    pub fn bound_light_shader(&self, light_type_id: LightTypeId) -> Option<&NodeImpl> {
        self.bound_light_shaders.get(&light_type_id)
    }

    /// Run one full pass and assemble both stages.
    pub fn generate(
        &self,
        name: &str,
        graph: &NodeGraph,
        root: Option<NodeKey>,
        options: &GenOptions,
    ) -> Result<Shader> {
        let root = Generator::resolve_root(graph, root)?;
        let root_ty = graph
            .node(root)
            .map(|n| n.def.output_type)
            .ok_or_else(|| {
                GenError::InvalidGraph(format!("root '{}' does not exist", graph.node_path(root)))
            })?;

        let mut shader = Shader::new(name);
        self.seed_stages(&mut shader)?;

        let lights_active = root_ty == DataType::Surface && !self.bound_light_shaders.is_empty();
        if lights_active {
            // Stable declaration order regardless of map iteration order.
            let mut ids: Vec<LightTypeId> = self.bound_light_shaders.keys().copied().collect();
            ids.sort_unstable();
            for id in ids {
                generator::declare_light_uniforms(&self.bound_light_shaders[&id], &mut shader)?;
            }
        }

        let ctx = self.base.generate_into(&mut shader, graph, root, options)?;

        self.assemble_vertex(&mut shader)?;
        self.assemble_pixel(&mut shader, graph, root, options, &ctx, lights_active)?;
        Ok(shader)
    }

    /// Variables every two-stage pipeline needs before traversal starts.
    fn seed_stages(&self, shader: &mut Shader) -> Result<()> {
        shader.create_uniform(
            Stage::Vertex,
            blocks::VERTEX_INPUTS,
            DataType::Vector3,
            "i_position",
            None,
            None,
        )?;
        shader.create_uniform(
            Stage::Vertex,
            blocks::PRIVATE_UNIFORMS,
            DataType::Matrix44,
            "u_world_matrix",
            None,
            Some(Value::Matrix44(glam::Mat4::IDENTITY)),
        )?;
        shader.create_uniform(
            Stage::Vertex,
            blocks::PRIVATE_UNIFORMS,
            DataType::Matrix44,
            "u_view_projection_matrix",
            None,
            Some(Value::Matrix44(glam::Mat4::IDENTITY)),
        )?;
        // Connector block, mirrored into both stages.
        for stage in Stage::ALL {
            shader.create_uniform(
                stage,
                blocks::VERTEX_DATA,
                DataType::Vector3,
                "position_world",
                None,
                None,
            )?;
        }
        shader.create_uniform(
            Stage::Pixel,
            blocks::PIXEL_OUTPUTS,
            DataType::Color4,
            "out_color",
            None,
            None,
        )?;
        Ok(())
    }

    fn assemble_vertex(&self, shader: &mut Shader) -> Result<()> {
        let statements = shader.take_statements(Stage::Vertex)?;
        let syntax = self.base.syntax();
        let mut src = String::new();
        src.push_str(syntax.preamble());
        src.push('\n');
        src.push_str(&format!(
            "// generated vertex stage '{}' ({}/{})\n\n",
            shader.name(),
            self.base.language(),
            self.base.target()
        ));

        for def in self
            .base
            .collect_type_definitions(shader, Stage::Vertex, &[])?
        {
            src.push_str(def);
            src.push('\n');
        }

        for block in shader.stage(Stage::Vertex).blocks() {
            if block.is_empty() {
                continue;
            }
            let qualifier = match block.name() {
                blocks::VERTEX_INPUTS => "in",
                blocks::VERTEX_DATA => "out",
                _ => "uniform",
            };
            let with_init = qualifier == "uniform";
            src.push_str(&format!("// {}\n", block.name()));
            for var in block {
                src.push_str(&self.base.declaration(qualifier, var, with_init)?);
                src.push('\n');
            }
            src.push('\n');
        }

        for (_, function) in shader.stage(Stage::Vertex).functions() {
            src.push_str(function);
            src.push_str("\n\n");
        }

        src.push_str("void main()\n{\n");
        src.push_str("    vec4 h_position_world = u_world_matrix * vec4(i_position, 1.0);\n");
        src.push_str("    position_world = h_position_world.xyz;\n");
        src.push_str("    gl_Position = u_view_projection_matrix * h_position_world;\n");
        src.push_str(&statements);
        src.push_str("}\n");

        shader.set_source(Stage::Vertex, src)
    }

    fn assemble_pixel(
        &self,
        shader: &mut Shader,
        graph: &NodeGraph,
        root: NodeKey,
        options: &GenOptions,
        ctx: &generator::EmitContext,
        lights_active: bool,
    ) -> Result<()> {
        let root_node = graph.node(root).ok_or_else(|| {
            GenError::InvalidGraph(format!("root '{}' does not exist", graph.node_path(root)))
        })?;
        let root_ty = root_node.def.output_type;
        let root_expr = ctx
            .results
            .get(root)
            .ok_or_else(|| {
                GenError::InvalidGraph(format!(
                    "root '{}' produced no result",
                    graph.node_path(root)
                ))
            })?
            .clone();

        let statements = shader.take_statements(Stage::Pixel)?;
        let syntax = self.base.syntax();
        let mut src = String::new();
        src.push_str(syntax.preamble());
        src.push('\n');
        src.push_str(&format!(
            "// generated pixel stage '{}' ({}/{})\n\n",
            shader.name(),
            self.base.language(),
            self.base.target()
        ));

        // The dispatcher's out parameter needs the light closure struct.
        let extra_types: &[DataType] = if lights_active {
            &[root_ty, DataType::Light]
        } else {
            &[root_ty]
        };
        for def in self
            .base
            .collect_type_definitions(shader, Stage::Pixel, extra_types)?
        {
            src.push_str(def);
            src.push('\n');
        }
        src.push('\n');

        // Light uniforms travel as an array of per-source structs; the
        // bound type id is dispatched on at runtime.
        if let Some(light_block) = shader.block(Stage::Pixel, blocks::LIGHT_UNIFORMS)
            && !light_block.is_empty()
        {
            src.push_str("struct LightData\n{\n    int type;\n");
            for var in light_block {
                src.push_str(&format!("    {} {};\n", syntax.spelling(var.ty)?, var.name));
            }
            src.push_str("};\n");
            src.push_str(&format!(
                "uniform LightData u_light_data[{}];\n\n",
                self.max_active_light_sources
            ));
        }

        for block in shader.stage(Stage::Pixel).blocks() {
            if block.is_empty() {
                continue;
            }
            let qualifier = match block.name() {
                blocks::VERTEX_DATA => "in",
                blocks::PIXEL_OUTPUTS => "out",
                blocks::LIGHT_UNIFORMS => continue,
                _ => "uniform",
            };
            let with_init = qualifier == "uniform";
            src.push_str(&format!("// {}\n", block.name()));
            for var in block {
                src.push_str(&self.base.declaration(qualifier, var, with_init)?);
                src.push('\n');
            }
            src.push('\n');
        }

        for (_, function) in shader.stage(Stage::Pixel).functions() {
            src.push_str(function);
            src.push_str("\n\n");
        }

        if lights_active {
            src.push_str(&self.light_dispatcher());
            src.push('\n');
        }

        src.push_str("void main()\n{\n");
        src.push_str("    vec3 position = position_world;\n");
        src.push_str(&statements);
        let (_, wiring) = generator::wire_output(root_ty, &root_expr, "out_color", options)?;
        src.push_str(&format!("    {wiring}\n"));
        src.push_str("}\n");

        shader.set_source(Stage::Pixel, src)
    }

    /// The runtime light dispatcher: zeroes the result, then switches on
    /// the source's bound type id.
    fn light_dispatcher(&self) -> String {
        let mut src = String::new();
        src.push_str("void light_shader(LightData light, vec3 position, out lightshader result)\n{\n");
        src.push_str("    result.intensity = vec3(0.0);\n");
        src.push_str("    result.direction = vec3(0.0);\n");
        src.push_str("    switch (light.type)\n    {\n");
        let mut ids: Vec<(&LightTypeId, &NodeImpl)> = self.bound_light_shaders.iter().collect();
        ids.sort_unstable_by_key(|(id, _)| **id);
        for (id, imp) in ids {
            if let crate::registry::NodeImplKind::LightShader { function_name, .. } = &imp.kind {
                src.push_str(&format!(
                    "    case {id}:\n        {function_name}(light, position, result);\n        break;\n"
                ));
            }
        }
        src.push_str("    }\n}\n");
        src
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SearchPaths;
    use crate::syntax::glsl;
    use std::sync::Arc;

    fn hw_generator() -> HwGenerator {
        let registry = ImplRegistry::new("glsl", "generic", SearchPaths::new());
        HwGenerator::new(Generator::new(Arc::new(glsl::glsl_syntax()), registry))
    }

    #[test]
    fn max_active_light_sources_is_clamped_to_one() {
        let mut generator = hw_generator();
        assert_eq!(
            generator.max_active_light_sources(),
            DEFAULT_MAX_ACTIVE_LIGHT_SOURCES
        );
        generator.set_max_active_light_sources(0);
        assert_eq!(generator.max_active_light_sources(), 1);
        generator.set_max_active_light_sources(8);
        assert_eq!(generator.max_active_light_sources(), 8);
    }

    #[test]
    fn binding_a_light_type_twice_replaces_the_shader() {
        let dir = std::env::temp_dir().join("shadegraph_hw_tests");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("light_a.glsl"), "void light_a() {}").unwrap();
        std::fs::write(dir.join("light_b.glsl"), "void light_b() {}").unwrap();

        let registry = ImplRegistry::new("glsl", "generic", SearchPaths::from_iter([dir]));
        let mut generator =
            HwGenerator::new(Generator::new(Arc::new(glsl::glsl_syntax()), registry));
        let options = GenOptions::default();

        let def_a = NodeDef::new("ND_light_a", "light", DataType::Light)
            .with_file("light_a.glsl", "light_a");
        let def_b = NodeDef::new("ND_light_b", "light", DataType::Light)
            .with_file("light_b.glsl", "light_b");

        generator.bind_light_shader(&def_a, 7, &options).unwrap();
        generator.bind_light_shader(&def_b, 7, &options).unwrap();
        assert_eq!(
            generator.bound_light_shader(7).unwrap().node_def,
            "ND_light_b"
        );
    }
}
