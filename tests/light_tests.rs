//! Light Binding Integration Tests
//!
//! Tests for:
//! - Light-shader binding per light type id, rebinding semantics
//! - Light uniform declaration: union across bound types, single count uniform
//! - Runtime dispatcher emission over bound type ids
//! - LightHandler: source creation, parameter validation, generator binding

use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec3;
use shadegraph::syntax::glsl;
use shadegraph::{
    DataType, GenError, GenOptions, Generator, HwGenerator, ImplRegistry, LightHandler, NodeDef,
    NodeGraph, SearchPaths, Stage, Value, blocks,
};

const SURFACE_FN: &str = "\
void mx_diffuse_surface(vec3 base_color, out surfaceshader result)
{
    result.color = base_color;
    result.transparency = vec3(0.0);
}
";

const POINT_LIGHT_FN: &str = "\
void mx_point_light(LightData light, vec3 position, out lightshader result)
{
    vec3 to_light = light.position - position;
    result.intensity = light.color * light.intensity / dot(to_light, to_light);
    result.direction = normalize(to_light);
}
";

const DIRECTIONAL_LIGHT_FN: &str = "\
void mx_directional_light(LightData light, vec3 position, out lightshader result)
{
    result.intensity = light.color * light.intensity;
    result.direction = -light.direction;
}
";

fn source_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("shadegraph_light_tests").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("diffuse_surface.glsl"), SURFACE_FN).unwrap();
    std::fs::write(dir.join("point_light.glsl"), POINT_LIGHT_FN).unwrap();
    std::fs::write(dir.join("directional_light.glsl"), DIRECTIONAL_LIGHT_FN).unwrap();
    dir
}

fn surface_def() -> Arc<NodeDef> {
    Arc::new(
        NodeDef::new("ND_diffuse_surface", "diffuse_surface", DataType::Surface)
            .with_input(
                "base_color",
                DataType::Color3,
                Some(Value::Color3(Vec3::splat(0.8))),
            )
            .with_file("diffuse_surface.glsl", "mx_diffuse_surface"),
    )
}

fn point_light_def() -> Arc<NodeDef> {
    Arc::new(
        NodeDef::new("ND_point_light", "point_light", DataType::Light)
            .with_input("color", DataType::Color3, Some(Value::Color3(Vec3::ONE)))
            .with_input("intensity", DataType::Float, Some(Value::Float(1.0)))
            .with_input("position", DataType::Vector3, Some(Value::Vector3(Vec3::ZERO)))
            .with_file("point_light.glsl", "mx_point_light"),
    )
}

fn directional_light_def() -> Arc<NodeDef> {
    Arc::new(
        NodeDef::new("ND_directional_light", "directional_light", DataType::Light)
            .with_input("color", DataType::Color3, Some(Value::Color3(Vec3::ONE)))
            .with_input("intensity", DataType::Float, Some(Value::Float(1.0)))
            .with_input(
                "direction",
                DataType::Vector3,
                Some(Value::Vector3(Vec3::NEG_Y)),
            )
            .with_file("directional_light.glsl", "mx_directional_light"),
    )
}

fn hw_generator(dir: PathBuf) -> HwGenerator {
    let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::from_iter([dir]));
    registry.register(&surface_def()).unwrap();
    HwGenerator::new(Generator::new(Arc::new(glsl::glsl_syntax()), registry))
}

fn surface_graph() -> NodeGraph {
    let mut g = NodeGraph::new("mat");
    let surface = g.add("surface1", &surface_def());
    g.set_output(surface);
    g
}

// ============================================================================
// Light Uniform Declaration
// ============================================================================

#[test]
fn bound_light_types_declare_the_union_of_their_parameters() {
    let dir = source_dir("union");
    let mut generator = hw_generator(dir);
    let options = GenOptions::default();
    generator
        .bind_light_shader(&point_light_def(), 1, &options)
        .unwrap();
    generator
        .bind_light_shader(&directional_light_def(), 2, &options)
        .unwrap();

    let shader = generator
        .generate("main", &surface_graph(), None, &options)
        .unwrap();

    let lights = shader.block(Stage::Pixel, blocks::LIGHT_UNIFORMS).unwrap();
    // color and intensity are shared, position and direction are per-type.
    assert_eq!(lights.len(), 4);
    assert_eq!(lights.get("color").unwrap().ty, DataType::Color3);
    assert!(lights.get("position").is_some());
    assert!(lights.get("direction").is_some());
    assert_eq!(
        lights.get("color").unwrap().source_path.as_deref(),
        Some("ND_point_light/color")
    );
}

#[test]
fn active_light_count_uniform_is_declared_exactly_once() {
    let dir = source_dir("count");
    let mut generator = hw_generator(dir);
    let options = GenOptions::default();
    generator
        .bind_light_shader(&point_light_def(), 1, &options)
        .unwrap();
    generator
        .bind_light_shader(&directional_light_def(), 2, &options)
        .unwrap();

    let mut shader = generator
        .generate("main", &surface_graph(), None, &options)
        .unwrap();

    let privates = shader.block(Stage::Pixel, blocks::PRIVATE_UNIFORMS).unwrap();
    assert_eq!(privates.len(), 1);
    assert!(privates.get("u_num_active_light_sources").is_some());
    let pixel = shader.source_code(Stage::Pixel).to_string();
    assert_eq!(
        pixel.matches("uniform int u_num_active_light_sources").count(),
        1
    );
}

#[test]
fn non_surface_roots_declare_no_light_uniforms() {
    let dir = source_dir("no_lights");
    let constant = Arc::new(
        NodeDef::new("ND_constant_color3", "constant", DataType::Color3)
            .with_input("value", DataType::Color3, Some(Value::Color3(Vec3::ONE)))
            .with_inline("{{value}}"),
    );
    let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::from_iter([dir]));
    registry.register(&constant).unwrap();
    let mut generator =
        HwGenerator::new(Generator::new(Arc::new(glsl::glsl_syntax()), registry));
    let options = GenOptions::default();
    generator
        .bind_light_shader(&point_light_def(), 1, &options)
        .unwrap();

    let mut g = NodeGraph::new("mat");
    let c = g.add("tint", &constant);
    g.set_output(c);

    let shader = generator.generate("main", &g, None, &options).unwrap();
    assert!(shader.block(Stage::Pixel, blocks::LIGHT_UNIFORMS).is_none());
}

#[test]
fn light_nodes_are_rejected_in_material_graphs() {
    let dir = source_dir("light_node");
    let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::from_iter([dir]));
    registry.register_light_shader(&point_light_def()).unwrap();
    let generator = Generator::new(Arc::new(glsl::glsl_syntax()), registry);

    let mut g = NodeGraph::new("mat");
    let key = g.add("key_light", &point_light_def());
    g.set_output(key);

    let err = generator
        .generate("main", &g, None, &GenOptions::default())
        .unwrap_err();
    match err {
        GenError::InvalidGraph(message) => assert!(message.contains("mat/key_light")),
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Dispatcher Emission
// ============================================================================

#[test]
fn dispatcher_switches_over_every_bound_type_id() {
    let dir = source_dir("dispatch");
    let mut generator = hw_generator(dir);
    let options = GenOptions::default();
    generator
        .bind_light_shader(&point_light_def(), 1, &options)
        .unwrap();
    generator
        .bind_light_shader(&directional_light_def(), 5, &options)
        .unwrap();
    generator.set_max_active_light_sources(8);

    let mut shader = generator
        .generate("main", &surface_graph(), None, &options)
        .unwrap();
    let pixel = shader.source_code(Stage::Pixel).to_string();

    assert!(pixel.contains("struct LightData"));
    assert!(pixel.contains("uniform LightData u_light_data[8];"));
    assert!(pixel.contains(
        "void light_shader(LightData light, vec3 position, out lightshader result)"
    ));
    assert!(pixel.contains("case 1:"));
    assert!(pixel.contains("mx_point_light(light, position, result);"));
    assert!(pixel.contains("case 5:"));
    assert!(pixel.contains("mx_directional_light(light, position, result);"));
}

#[test]
fn rebinding_a_type_id_replaces_the_dispatch_entry() {
    let dir = source_dir("rebind");
    let mut generator = hw_generator(dir);
    let options = GenOptions::default();
    generator
        .bind_light_shader(&point_light_def(), 1, &options)
        .unwrap();
    generator
        .bind_light_shader(&directional_light_def(), 1, &options)
        .unwrap();

    let mut shader = generator
        .generate("main", &surface_graph(), None, &options)
        .unwrap();
    let pixel = shader.source_code(Stage::Pixel).to_string();
    assert!(pixel.contains("mx_directional_light(light, position, result);"));
    assert!(!pixel.contains("mx_point_light(light, position, result);"));
}

// ============================================================================
// Light Handler
// ============================================================================

#[test]
fn handler_binds_its_registered_shaders_on_the_generator() {
    let dir = source_dir("handler_bind");
    let mut generator = hw_generator(dir);
    let options = GenOptions::default();

    let mut handler = LightHandler::new();
    handler.add_light_shader(1, point_light_def());
    handler.add_light_shader(2, directional_light_def());
    handler.bind_light_shaders(&mut generator, &options).unwrap();

    assert!(generator.bound_light_shader(1).is_some());
    assert!(generator.bound_light_shader(2).is_some());
    assert!(generator.bound_light_shader(3).is_none());
}

#[test]
fn handler_rejects_invalid_parameter_updates() {
    let mut handler = LightHandler::new();
    handler.add_light_shader(1, point_light_def());
    let index = handler.create_light_source(1).unwrap();

    handler
        .set_parameter(index, "intensity", Value::Float(10.0))
        .unwrap();
    assert_eq!(
        handler.light_sources()[index].parameter("intensity"),
        Some(&Value::Float(10.0))
    );

    let err = handler
        .set_parameter(index, "cutoff", Value::Float(0.5))
        .unwrap_err();
    assert!(matches!(
        err,
        GenError::UnknownLightParameter { type_id: 1, .. }
    ));

    let err = handler
        .set_parameter(index, "intensity", Value::Vector3(Vec3::ONE))
        .unwrap_err();
    assert!(matches!(
        err,
        GenError::LightParameterType {
            expected: DataType::Float,
            actual: DataType::Vector3,
            ..
        }
    ));
}

#[test]
fn handler_rejects_sources_of_unregistered_types() {
    let mut handler = LightHandler::new();
    let err = handler.create_light_source(9).unwrap_err();
    assert!(matches!(err, GenError::UnboundLightType { type_id: 9 }));
}
