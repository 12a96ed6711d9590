//! Builds a small lit material graph and prints both generated stages.
//!
//! Run with `RUST_LOG=debug` to see registration and traversal logging.

use std::sync::Arc;

use glam::Vec3;
use shadegraph::syntax::glsl;
use shadegraph::{
    DataType, GenOptions, Generator, HwGenerator, ImplRegistry, LightHandler, NodeDef, NodeGraph,
    SearchPaths, Stage, Value,
};

const SURFACE_FN: &str = "\
void mx_diffuse_surface(vec3 base_color, float roughness, out surfaceshader result)
{
    result.color = base_color * (1.0 - roughness);
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

fn main() -> shadegraph::Result<()> {
    env_logger::init();

    let dir = std::env::temp_dir().join("shadegraph_demo");
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("diffuse_surface.glsl"), SURFACE_FN)?;
    std::fs::write(dir.join("point_light.glsl"), POINT_LIGHT_FN)?;

    let surface = Arc::new(
        NodeDef::new("ND_diffuse_surface", "diffuse_surface", DataType::Surface)
            .with_input(
                "base_color",
                DataType::Color3,
                Some(Value::Color3(Vec3::new(0.8, 0.2, 0.2))),
            )
            .with_input("roughness", DataType::Float, Some(Value::Float(0.4)))
            .with_file("diffuse_surface.glsl", "mx_diffuse_surface"),
    );
    let point_light = Arc::new(
        NodeDef::new("ND_point_light", "point_light", DataType::Light)
            .with_input("color", DataType::Color3, Some(Value::Color3(Vec3::ONE)))
            .with_input("intensity", DataType::Float, Some(Value::Float(1.0)))
            .with_input(
                "position",
                DataType::Vector3,
                Some(Value::Vector3(Vec3::new(0.0, 4.0, 0.0))),
            )
            .with_file("point_light.glsl", "mx_point_light"),
    );

    let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::from_iter([dir]));
    registry.register(&surface)?;
    let mut generator = HwGenerator::new(Generator::new(
        Arc::new(glsl::glsl_syntax()),
        registry,
    ));

    let mut lights = LightHandler::new();
    lights.add_light_shader(1, point_light);
    let key = lights.create_light_source(1)?;
    lights.set_parameter(key, "intensity", Value::Float(20.0))?;
    let options = GenOptions::default();
    lights.bind_light_shaders(&mut generator, &options)?;

    let mut graph = NodeGraph::new("demo");
    let root = graph.add("surface1", &surface);
    graph.set_output(root);

    let mut shader = generator.generate("lit_material", &graph, None, &options)?;
    println!("// ---- vertex stage ----");
    println!("{}", shader.source_code(Stage::Vertex));
    println!("// ---- pixel stage ----");
    println!("{}", shader.source_code(Stage::Pixel));
    Ok(())
}
