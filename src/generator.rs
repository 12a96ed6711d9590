//! Generator orchestration: one compilation pass over a resolved graph.
//!
//! A [`Generator`] is bound to exactly one (language, target) pair through
//! its syntax table and implementation registry. `generate()` performs one
//! synchronous in-memory traversal, upstream-first so every node's inputs
//! have produced their result before the node is visited, and returns a
//! complete [`Shader`] or a fatal error. There is no partial-success path.
//!
//! Instances are cheap to construct per call; the syntax table is shared
//! read-only via `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use slotmap::SecondaryMap;

use crate::errors::{GenError, Result};
use crate::graph::{InputBinding, Node, NodeGraph, NodeKey};
use crate::registry::{ImplRegistry, NodeImpl, NodeImplKind};
use crate::shader::{Shader, Stage, blocks};
use crate::syntax::Syntax;
use crate::value::{DataType, Value};

/// Color-space math collaborator. The generator forwards the target
/// color-space option here and never does color math itself.
pub trait ColorManagement: Send + Sync {
    /// Transform `value` into `to_space`, or `None` if no transform applies.
    fn transform_value(&self, value: &Value, to_space: &str) -> Option<Value>;
}

/// No-op color management.
#[derive(Debug, Default)]
pub struct DefaultColorManagement;

impl ColorManagement for DefaultColorManagement {
    fn transform_value(&self, _value: &Value, _to_space: &str) -> Option<Value> {
        None
    }
}

/// How much of the parameter surface becomes public uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderInterface {
    /// Every unconnected value-bearing input becomes a public uniform.
    #[default]
    Complete,
    /// Defaulted inputs are folded into call-site literals.
    Reduced,
}

/// Recognized generation options.
#[derive(Debug, Clone, Default)]
pub struct GenOptions {
    /// Target color space, forwarded to the color-management collaborator.
    pub target_color_space: Option<String>,
    /// Interface-reduction mode.
    pub shader_interface: ShaderInterface,
    /// Hardware transparency; derive with
    /// [`graph::is_transparent`](crate::graph::is_transparent).
    pub hw_transparency: bool,
}

/// Per-pass emission state: expression text per visited node and the public
/// uniform name chosen for each folded input.
#[derive(Default)]
pub(crate) struct EmitContext {
    pub results: SecondaryMap<NodeKey, String>,
    pub input_uniforms: FxHashMap<(NodeKey, String), String>,
}

/// Orchestrates one compilation pass for one (language, target).
pub struct Generator {
    syntax: Arc<Syntax>,
    registry: ImplRegistry,
    color_management: Arc<dyn ColorManagement>,
}

impl Generator {
    #[must_use]
    pub fn new(syntax: Arc<Syntax>, registry: ImplRegistry) -> Self {
        Self {
            syntax,
            registry,
            color_management: Arc::new(DefaultColorManagement),
        }
    }

    /// Replace the color-management collaborator.
    #[must_use]
    pub fn with_color_management(mut self, cm: Arc<dyn ColorManagement>) -> Self {
        self.color_management = cm;
        self
    }

    #[must_use]
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    #[must_use]
    pub fn language(&self) -> &str {
        self.syntax.language()
    }

    #[must_use]
    pub fn target(&self) -> &str {
        self.syntax.target()
    }

    #[must_use]
    pub fn registry(&self) -> &ImplRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ImplRegistry {
        &mut self.registry
    }

    /// Resolve the root element to a concrete output-bearing node.
    pub fn resolve_root(graph: &NodeGraph, root: Option<NodeKey>) -> Result<NodeKey> {
        let key = root
            .or_else(|| graph.output())
            .ok_or_else(|| GenError::InvalidGraph("graph has no output".to_string()))?;
        if graph.node(key).is_none() {
            return Err(GenError::InvalidGraph(format!(
                "root '{}' does not exist",
                graph.node_path(key)
            )));
        }
        Ok(key)
    }

    /// Run one full pass and return the assembled shader.
    pub fn generate(
        &self,
        name: &str,
        graph: &NodeGraph,
        root: Option<NodeKey>,
        options: &GenOptions,
    ) -> Result<Shader> {
        let root = Self::resolve_root(graph, root)?;
        let mut shader = Shader::new(name);
        let ctx = self.generate_into(&mut shader, graph, root, options)?;
        self.assemble_pixel(&mut shader, graph, root, options, &ctx)?;
        Ok(shader)
    }

    /// Traversal and per-node emission into an existing shader. Used by
    /// extension layers that seed their own stage content.
    pub(crate) fn generate_into(
        &self,
        shader: &mut Shader,
        graph: &NodeGraph,
        root: NodeKey,
        options: &GenOptions,
    ) -> Result<EmitContext> {
        let order = topo_order(graph, root)?;
        log::debug!(
            "generating '{}' for {}/{}: {} nodes",
            shader.name(),
            self.language(),
            self.target(),
            order.len()
        );

        let mut ctx = EmitContext::default();

        // Declaration phase: run once per node before any emission.
        for &key in &order {
            let node = expect_node(graph, key)?;
            let imp = self.registry.require(node, &graph.node_path(key))?;
            self.create_variables(imp, key, node, graph, options, shader, &mut ctx)?;
        }

        // Emission phase, in traversal order.
        for &key in &order {
            let node = expect_node(graph, key)?;
            let imp = self.registry.require(node, &graph.node_path(key))?;
            self.emit_function_call(imp, key, node, graph, shader, &mut ctx)?;
        }

        Ok(ctx)
    }

    /// Idempotent declaration phase for one node.
    fn create_variables(
        &self,
        imp: &NodeImpl,
        key: NodeKey,
        node: &Node,
        graph: &NodeGraph,
        options: &GenOptions,
        shader: &mut Shader,
        ctx: &mut EmitContext,
    ) -> Result<()> {
        match &imp.kind {
            NodeImplKind::LightShader { .. } => Err(light_node_rejection(imp, graph, key)),
            NodeImplKind::Inline { .. } | NodeImplKind::SourceFunction { .. } => {
                if let NodeImplKind::SourceFunction {
                    function_name,
                    source,
                } = &imp.kind
                {
                    shader.add_function(Stage::Pixel, function_name, source)?;
                }
                for binding in &node.inputs {
                    if binding.connection.is_some() {
                        continue;
                    }
                    let Some(port) = node.def.port(&binding.port) else {
                        continue;
                    };
                    if port.ty.is_closure() {
                        continue;
                    }
                    // Samplers have no literal form, so they stay uniforms
                    // even under the reduced interface.
                    if options.shader_interface == ShaderInterface::Reduced
                        && port.ty != DataType::Filename
                    {
                        continue;
                    }
                    let Some(value) = binding
                        .value
                        .clone()
                        .or_else(|| Value::default_for(port.ty))
                    else {
                        continue;
                    };
                    let value = self.resolve_value(value, options);
                    let mut name = format!("{}_{}", node.name, port.name);
                    self.syntax
                        .make_unique(&mut name, port.ty, shader.unique_names_mut());
                    let path = format!("{}.{}", graph.node_path(key), port.name);
                    let stored = shader.create_uniform_for(
                        Stage::Pixel,
                        blocks::PUBLIC_UNIFORMS,
                        port.ty,
                        &name,
                        port.semantic.clone(),
                        Some(value),
                        &path,
                    )?;
                    ctx.input_uniforms.insert((key, binding.port.clone()), stored);
                }
                Ok(())
            }
        }
    }

    /// Emission phase for one node: exactly one call into the active stage,
    /// or an expression handed to consumers for inline implementations.
    fn emit_function_call(
        &self,
        imp: &NodeImpl,
        key: NodeKey,
        node: &Node,
        graph: &NodeGraph,
        shader: &mut Shader,
        ctx: &mut EmitContext,
    ) -> Result<()> {
        match &imp.kind {
            NodeImplKind::Inline { expression } => {
                let mut inputs = BTreeMap::new();
                for binding in &node.inputs {
                    inputs.insert(
                        binding.port.clone(),
                        self.input_expr(key, node, binding, graph, ctx)?,
                    );
                }
                let expr =
                    self.registry
                        .render_inline(expression, &inputs, &graph.node_path(key))?;
                ctx.results.insert(key, expr);
                Ok(())
            }
            NodeImplKind::SourceFunction { function_name, .. } => {
                shader.add_comment(&graph.node_path(key))?;
                let ts = self.syntax.type_syntax(node.def.output_type)?;
                let spelling = ts.name;
                let default = ts.default_value;
                let mut result = format!("{}_out", node.name);
                self.syntax.make_unique(
                    &mut result,
                    node.def.output_type,
                    shader.unique_names_mut(),
                );
                shader.add_line(&format!("{spelling} {result} = {default}"))?;
                let mut args = Vec::with_capacity(node.inputs.len() + 1);
                for binding in &node.inputs {
                    args.push(self.input_expr(key, node, binding, graph, ctx)?);
                }
                args.push(result.clone());
                shader.add_line(&format!("{function_name}({})", args.join(", ")))?;
                ctx.results.insert(key, result);
                Ok(())
            }
            NodeImplKind::LightShader { .. } => Err(light_node_rejection(imp, graph, key)),
        }
    }

    /// Expression text for one input: upstream result, published uniform, or
    /// a literal.
    fn input_expr(
        &self,
        key: NodeKey,
        node: &Node,
        binding: &InputBinding,
        graph: &NodeGraph,
        ctx: &EmitContext,
    ) -> Result<String> {
        if let Some(upstream) = binding.connection {
            return ctx.results.get(upstream).cloned().ok_or_else(|| {
                GenError::InvalidGraph(format!(
                    "input '{}' of '{}' references a node that produced no result",
                    binding.port,
                    graph.node_path(key)
                ))
            });
        }
        if let Some(name) = ctx.input_uniforms.get(&(key, binding.port.clone())) {
            return Ok(name.clone());
        }
        let port = node.def.port(&binding.port).ok_or_else(|| {
            GenError::InvalidGraph(format!(
                "unbound port '{}' on '{}'",
                binding.port,
                graph.node_path(key)
            ))
        })?;
        match binding.value.clone().or_else(|| Value::default_for(port.ty)) {
            Some(value) => self.syntax.get_value(&value, false),
            None => Ok(self.syntax.default_value(port.ty, false)?.to_string()),
        }
    }

    fn resolve_value(&self, value: Value, options: &GenOptions) -> Value {
        if let Some(space) = &options.target_color_space
            && value.ty().is_color()
            && let Some(transformed) = self.color_management.transform_value(&value, space)
        {
            return transformed;
        }
        value
    }

    /// Type declarations required by the stage's variables plus the root
    /// output, in first-use order.
    pub(crate) fn collect_type_definitions(
        &self,
        shader: &Shader,
        stage: Stage,
        extra: &[DataType],
    ) -> Result<Vec<&'static str>> {
        let mut defs: Vec<&'static str> = Vec::new();
        let mut push = |def: Option<&'static str>| {
            if let Some(def) = def
                && !defs.contains(&def)
            {
                defs.push(def);
            }
        };
        for block in shader.stage(stage).blocks() {
            for var in block {
                push(self.syntax.type_syntax(var.ty)?.type_definition);
            }
        }
        for &ty in extra {
            push(self.syntax.type_syntax(ty)?.type_definition);
        }
        Ok(defs)
    }

    /// Declaration text for one variable, e.g.
    /// `uniform vec3 base_color = vec3(0.0);`.
    pub(crate) fn declaration(
        &self,
        qualifier: &str,
        var: &crate::shader::Variable,
        with_initializer: bool,
    ) -> Result<String> {
        let ts = self.syntax.type_syntax(var.ty)?;
        let init = if with_initializer {
            match &var.value {
                Some(value) => self.syntax.get_value(value, false)?,
                None => ts.default_value.to_string(),
            }
        } else {
            String::new()
        };
        if init.is_empty() {
            Ok(format!("{qualifier} {} {};", ts.name, var.name))
        } else {
            Ok(format!("{qualifier} {} {} = {init};", ts.name, var.name))
        }
    }

    /// Generic single-stage assembly: preamble, type definitions, block
    /// declarations, function definitions, then an entry point wiring the
    /// root result to the stage output.
    fn assemble_pixel(
        &self,
        shader: &mut Shader,
        graph: &NodeGraph,
        root: NodeKey,
        options: &GenOptions,
        ctx: &EmitContext,
    ) -> Result<()> {
        let root_node = expect_node(graph, root)?;
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
        let mut src = String::new();
        src.push_str(self.syntax.preamble());
        src.push('\n');
        src.push_str(&format!(
            "// generated shader '{}' ({}/{})\n\n",
            shader.name(),
            self.language(),
            self.target()
        ));

        for def in self.collect_type_definitions(shader, Stage::Pixel, &[root_ty])? {
            src.push_str(def);
            src.push('\n');
        }

        for block in shader.stage(Stage::Pixel).blocks() {
            if block.is_empty() {
                continue;
            }
            src.push_str(&format!("\n// {}\n", block.name()));
            for var in block {
                src.push_str(&self.declaration("uniform", var, true)?);
                src.push('\n');
            }
        }
        src.push('\n');

        for (_, function) in shader.stage(Stage::Pixel).functions() {
            src.push_str(function);
            src.push_str("\n\n");
        }

        let (out_decl, wiring) = wire_output(root_ty, &root_expr, "out_result", options)?;
        src.push_str(&out_decl);
        src.push_str("\nvoid main()\n{\n");
        src.push_str(&statements);
        src.push_str(&format!("    {wiring}\n"));
        src.push_str("}\n");

        shader.set_source(Stage::Pixel, src)
    }
}

/// Output declaration and final assignment for a stage output. Every
/// representable root type is widened to the vec4 output explicitly; root
/// types with no color projection abort the pass.
pub(crate) fn wire_output(
    root_ty: DataType,
    root_expr: &str,
    out_name: &str,
    options: &GenOptions,
) -> Result<(String, String)> {
    if root_ty.is_closure() {
        let alpha = if options.hw_transparency {
            format!("clamp(1.0 - dot({root_expr}.transparency, vec3(0.3333)), 0.0, 1.0)")
        } else {
            "1.0".to_string()
        };
        return Ok((
            format!("out vec4 {out_name};"),
            format!("{out_name} = vec4({root_expr}.color, {alpha});"),
        ));
    }
    let rhs = match root_ty {
        DataType::Color4 | DataType::Vector4 => root_expr.to_string(),
        DataType::Color3 | DataType::Vector3 => format!("vec4({root_expr}, 1.0)"),
        DataType::Color2 | DataType::Vector2 => format!("vec4({root_expr}, 0.0, 1.0)"),
        DataType::Float => format!("vec4(vec3({root_expr}), 1.0)"),
        DataType::Integer | DataType::Boolean => {
            format!("vec4(vec3(float({root_expr})), 1.0)")
        }
        other => {
            return Err(GenError::InvalidGraph(format!(
                "root of type {other:?} cannot be wired to the color output"
            )));
        }
    };
    Ok((
        format!("out vec4 {out_name};"),
        format!("{out_name} = {rhs};"),
    ))
}

fn expect_node<'a>(graph: &'a NodeGraph, key: NodeKey) -> Result<&'a Node> {
    graph.node(key).ok_or_else(|| {
        GenError::InvalidGraph(format!("node '{}' does not exist", graph.node_path(key)))
    })
}

/// Upstream-first traversal order (reverse topological) from `root`.
/// Deterministic: upstream nodes are visited in port order.
pub(crate) fn topo_order(graph: &NodeGraph, root: NodeKey) -> Result<Vec<NodeKey>> {
    enum Visit {
        Enter(NodeKey),
        Exit(NodeKey),
    }

    let mut order = Vec::new();
    let mut done: SecondaryMap<NodeKey, ()> = SecondaryMap::new();
    let mut on_stack: SecondaryMap<NodeKey, ()> = SecondaryMap::new();
    let mut stack = vec![Visit::Enter(root)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(key) => {
                if done.contains_key(key) {
                    continue;
                }
                if expect_node(graph, key).is_err() {
                    return Err(GenError::InvalidGraph(format!(
                        "connection references missing node '{}'",
                        graph.node_path(key)
                    )));
                }
                if on_stack.insert(key, ()).is_some() {
                    return Err(GenError::InvalidGraph(format!(
                        "cycle detected at '{}'",
                        graph.node_path(key)
                    )));
                }
                stack.push(Visit::Exit(key));
                let upstream: Vec<NodeKey> = graph.upstream(key).collect();
                for up in upstream.into_iter().rev() {
                    if !done.contains_key(up) {
                        stack.push(Visit::Enter(up));
                    }
                }
            }
            Visit::Exit(key) => {
                on_stack.remove(key);
                done.insert(key, ());
                order.push(key);
            }
        }
    }

    Ok(order)
}

/// Declare the light uniforms of a light-shader implementation: one
/// LIGHT_UNIFORMS entry per nodedef port plus the active-light-count
/// uniform. Idempotent via `create_uniform`.
pub(crate) fn declare_light_uniforms(imp: &NodeImpl, shader: &mut Shader) -> Result<()> {
    let NodeImplKind::LightShader {
        function_name,
        source,
        light_uniforms,
    } = &imp.kind
    else {
        return Err(GenError::InvalidGraph(format!(
            "'{}' is not a light-shader implementation",
            imp.node_def
        )));
    };
    shader.add_function(Stage::Pixel, function_name, source)?;
    for uniform in light_uniforms {
        match &uniform.source_path {
            Some(path) => shader.create_uniform_for(
                Stage::Pixel,
                blocks::LIGHT_UNIFORMS,
                uniform.ty,
                &uniform.name,
                uniform.semantic.clone(),
                uniform.value.clone(),
                path,
            )?,
            None => shader.create_uniform(
                Stage::Pixel,
                blocks::LIGHT_UNIFORMS,
                uniform.ty,
                &uniform.name,
                uniform.semantic.clone(),
                uniform.value.clone(),
            )?,
        };
    }
    shader.create_uniform(
        Stage::Pixel,
        blocks::PRIVATE_UNIFORMS,
        DataType::Integer,
        "u_num_active_light_sources",
        None,
        Some(Value::Integer(0)),
    )?;
    Ok(())
}

/// Light shaders are emitted through the hardware generator's dispatcher,
/// never as material graph nodes.
fn light_node_rejection(imp: &NodeImpl, graph: &NodeGraph, key: NodeKey) -> GenError {
    GenError::InvalidGraph(format!(
        "light shader '{}' at '{}' cannot be emitted as a graph node; bind it on the hardware generator instead",
        imp.node_def,
        graph.node_path(key)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeDef;
    use crate::registry::SearchPaths;
    use crate::syntax::glsl;

    fn constant_def() -> Arc<NodeDef> {
        Arc::new(
            NodeDef::new("ND_constant_float", "constant", DataType::Float)
                .with_input("value", DataType::Float, Some(Value::Float(1.0)))
                .with_inline("{{value}}"),
        )
    }

    fn add_def() -> Arc<NodeDef> {
        Arc::new(
            NodeDef::new("ND_add_float", "add", DataType::Float)
                .with_input("in1", DataType::Float, Some(Value::Float(0.0)))
                .with_input("in2", DataType::Float, Some(Value::Float(0.0)))
                .with_inline("{{in1}} + {{in2}}"),
        )
    }

    fn generator_for(defs: &[&NodeDef]) -> Generator {
        let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::new());
        for def in defs {
            registry.register(def).unwrap();
        }
        Generator::new(Arc::new(glsl::glsl_syntax()), registry)
    }

    #[test]
    fn topo_order_visits_inputs_first() {
        let mut graph = NodeGraph::new("g");
        let a = graph.add("a", &constant_def());
        let b = graph.add("b", &constant_def());
        let sum = graph.add("sum", &add_def());
        graph.connect(a, sum, "in1").unwrap();
        graph.connect(b, sum, "in2").unwrap();

        let order = topo_order(&graph, sum).unwrap();
        let pos = |key| order.iter().position(|&k| k == key).unwrap();
        assert!(pos(a) < pos(sum));
        assert!(pos(b) < pos(sum));
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn diamond_graph_emits_shared_input_once() {
        let mut graph = NodeGraph::new("g");
        let shared = graph.add("shared", &constant_def());
        let left = graph.add("left", &add_def());
        let right = graph.add("right", &add_def());
        let sum = graph.add("sum", &add_def());
        graph.connect(shared, left, "in1").unwrap();
        graph.connect(shared, right, "in1").unwrap();
        graph.connect(left, sum, "in1").unwrap();
        graph.connect(right, sum, "in2").unwrap();

        let order = topo_order(&graph, sum).unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order.iter().filter(|&&k| k == shared).count(), 1);
    }

    #[test]
    fn missing_implementation_aborts_with_node_path() {
        let orphan = Arc::new(
            NodeDef::new("ND_orphan", "orphan", DataType::Float)
                .with_input("value", DataType::Float, Some(Value::Float(0.0)))
                .with_inline("{{value}}"),
        );
        let mut graph = NodeGraph::new("mat");
        let key = graph.add("lonely", &orphan);
        graph.set_output(key);

        let generator = generator_for(&[]);
        let err = generator
            .generate("s", &graph, None, &GenOptions::default())
            .unwrap_err();
        match err {
            GenError::MissingImplementation { node, .. } => assert_eq!(node, "mat/lonely"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reduced_interface_folds_defaults_into_literals() {
        let mut graph = NodeGraph::new("g");
        let c = graph.add("c", &constant_def());
        graph.set_output(c);

        let generator = generator_for(&[&constant_def()]);
        let options = GenOptions {
            shader_interface: ShaderInterface::Reduced,
            ..GenOptions::default()
        };
        let mut shader = generator.generate("s", &graph, None, &options).unwrap();
        assert!(shader.block(Stage::Pixel, blocks::PUBLIC_UNIFORMS).is_none());
        assert!(shader.source_code(Stage::Pixel).contains("out_result = vec4(vec3(1.0), 1.0);"));
    }

    #[test]
    fn complete_interface_publishes_defaults_as_uniforms() {
        let mut graph = NodeGraph::new("g");
        let c = graph.add("c", &constant_def());
        graph.set_output(c);

        let generator = generator_for(&[&constant_def()]);
        let mut shader = generator
            .generate("s", &graph, None, &GenOptions::default())
            .unwrap();
        let block = shader.block(Stage::Pixel, blocks::PUBLIC_UNIFORMS).unwrap();
        assert_eq!(block.len(), 1);
        assert_eq!(block.iter().next().unwrap().name, "c_value");
        assert!(shader.source_code(Stage::Pixel).contains("uniform float c_value = 1.0;"));
    }

    #[test]
    fn stage_output_wiring_widens_every_representable_root_type() {
        let options = GenOptions::default();
        let wiring = |ty| wire_output(ty, "r", "out_result", &options).unwrap().1;
        assert_eq!(wiring(DataType::Color4), "out_result = r;");
        assert_eq!(wiring(DataType::Vector3), "out_result = vec4(r, 1.0);");
        assert_eq!(wiring(DataType::Vector2), "out_result = vec4(r, 0.0, 1.0);");
        assert_eq!(wiring(DataType::Float), "out_result = vec4(vec3(r), 1.0);");
        assert_eq!(
            wiring(DataType::Integer),
            "out_result = vec4(vec3(float(r)), 1.0);"
        );
        assert_eq!(
            wiring(DataType::Boolean),
            "out_result = vec4(vec3(float(r)), 1.0);"
        );
    }

    #[test]
    fn matrix_roots_cannot_reach_the_color_output() {
        let err =
            wire_output(DataType::Matrix44, "r", "out_result", &GenOptions::default()).unwrap_err();
        assert!(matches!(err, GenError::InvalidGraph(_)));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut graph = NodeGraph::new("g");
        let a = graph.add("a", &add_def());
        let b = graph.add("b", &add_def());
        graph.connect(a, b, "in1").unwrap();
        graph.connect(b, a, "in1").unwrap();
        let err = topo_order(&graph, a).unwrap_err();
        assert!(matches!(err, GenError::InvalidGraph(_)));
    }
}
