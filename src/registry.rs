//! Node implementation registry and dispatch data.
//!
//! At registration time each node definition's declared implementation is
//! compiled into a [`NodeImpl`]: a closed tagged variant selecting one of
//! the three emission strategies (inline expression, external source
//! function, light shader). Source-function bodies are located on the
//! caller-registered search paths, read once and cached, so no I/O happens
//! during traversal.
//!
//! Inline expressions are minijinja templates whose placeholders name the
//! node's inputs, e.g. `{{in1}} * {{in2}}`; they are rendered with the
//! already-produced expression text of each connected input.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use minijinja::{Environment, UndefinedBehavior};
use rustc_hash::FxHashMap;

use crate::errors::{GenError, Result};
use crate::graph::{ImplElement, Node, NodeDef};
use crate::shader::Variable;

/// The three emission strategies, with per-variant data.
#[derive(Debug, Clone)]
pub enum NodeImplKind {
    /// Expression template substituted with input expressions; contributes
    /// no declaration.
    Inline { expression: String },
    /// External function body plus a call site.
    SourceFunction {
        function_name: String,
        source: String,
    },
    /// Source-function variant restricted to the pixel stage, carrying the
    /// light uniforms derived from its node definition.
    LightShader {
        function_name: String,
        source: String,
        light_uniforms: Vec<Variable>,
    },
}

/// A compiled implementation for one node type signature on one
/// (language, target).
#[derive(Debug, Clone)]
pub struct NodeImpl {
    /// Name of the node definition this implementation backs.
    pub node_def: String,
    pub kind: NodeImplKind,
}

impl NodeImpl {
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self.kind, NodeImplKind::Inline { .. })
    }

    #[must_use]
    pub fn is_light_shader(&self) -> bool {
        matches!(self.kind, NodeImplKind::LightShader { .. })
    }
}

/// Ordered list of directories used to locate source-function bodies.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    paths: Vec<PathBuf>,
}

impl SearchPaths {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// First existing absolute path for a relative filename.
    #[must_use]
    pub fn resolve(&self, file: &str) -> Option<PathBuf> {
        self.paths.iter().map(|p| p.join(file)).find(|p| p.exists())
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for SearchPaths {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Registry mapping node type signatures to compiled implementations for
/// one (language, target). Expensive to build, immutable once generation
/// starts, shareable read-only across generator instances.
pub struct ImplRegistry {
    language: String,
    target: String,
    search_paths: SearchPaths,
    impls: FxHashMap<String, NodeImpl>,
    source_cache: FxHashMap<String, String>,
    inline_env: Environment<'static>,
}

impl ImplRegistry {
    #[must_use]
    pub fn new(language: &str, target: &str, search_paths: SearchPaths) -> Self {
        let mut inline_env = Environment::new();
        inline_env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self {
            language: language.to_string(),
            target: target.to_string(),
            search_paths,
            impls: FxHashMap::default(),
            source_cache: FxHashMap::default(),
            inline_env,
        }
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Compile and register the implementation a node definition declares.
    /// Re-registering a definition replaces its implementation.
    pub fn register(&mut self, def: &NodeDef) -> Result<()> {
        let kind = match &def.implementation {
            None => {
                return Err(GenError::MissingImplementationElement {
                    node_def: def.name.clone(),
                });
            }
            Some(ImplElement::Inline { expression }) => NodeImplKind::Inline {
                expression: expression.clone(),
            },
            Some(ImplElement::File { file, function }) => {
                let source = self.load_source(file)?;
                NodeImplKind::SourceFunction {
                    function_name: function.clone(),
                    source,
                }
            }
        };
        log::debug!(
            "registered implementation for '{}' ({}/{})",
            def.name,
            self.language,
            self.target
        );
        self.impls.insert(
            def.name.clone(),
            NodeImpl {
                node_def: def.name.clone(),
                kind,
            },
        );
        Ok(())
    }

    /// Compile a light-shader implementation from a node definition. Light
    /// shaders require a concrete source-function implementation; one light
    /// uniform is derived per nodedef input/parameter.
    pub fn compile_light_shader(&mut self, def: &NodeDef) -> Result<NodeImpl> {
        let (file, function) = match &def.implementation {
            None => {
                return Err(GenError::MissingImplementationElement {
                    node_def: def.name.clone(),
                });
            }
            Some(ImplElement::Inline { .. }) => {
                return Err(GenError::InlineLightShader {
                    node_def: def.name.clone(),
                });
            }
            Some(ImplElement::File { file, function }) => (file, function),
        };
        let source = self.load_source(file)?;
        let light_uniforms = def
            .ports
            .iter()
            .map(|port| Variable {
                ty: port.ty,
                name: port.name.clone(),
                semantic: port.semantic.clone(),
                value: port.value.clone(),
                source_path: Some(format!("{}/{}", def.name, port.name)),
            })
            .collect();
        Ok(NodeImpl {
            node_def: def.name.clone(),
            kind: NodeImplKind::LightShader {
                function_name: function.clone(),
                source,
                light_uniforms,
            },
        })
    }

    /// Compile a light-shader implementation and make it resolvable through
    /// [`find`](Self::find). Light implementations are emitted through the
    /// hardware generator's dispatcher; the generic emission path rejects
    /// them as graph nodes.
    pub fn register_light_shader(&mut self, def: &NodeDef) -> Result<NodeImpl> {
        let imp = self.compile_light_shader(def)?;
        self.impls.insert(def.name.clone(), imp.clone());
        Ok(imp)
    }

    /// Look up the implementation for a node type signature.
    #[must_use]
    pub fn find(&self, node_def: &str) -> Option<&NodeImpl> {
        self.impls.get(node_def)
    }

    /// Resolve dispatch for a concrete node or fail with a node-located
    /// diagnostic.
    pub fn require(&self, node: &Node, node_path: &str) -> Result<&NodeImpl> {
        self.find(&node.def.name)
            .ok_or_else(|| GenError::MissingImplementation {
                node: node_path.to_string(),
                node_type: node.def.name.clone(),
                language: self.language.clone(),
                target: self.target.clone(),
            })
    }

    /// Render an inline expression template with input expression text.
    pub fn render_inline(
        &self,
        expression: &str,
        inputs: &BTreeMap<String, String>,
        node_path: &str,
    ) -> Result<String> {
        self.inline_env
            .render_str(expression, inputs)
            .map_err(|e| GenError::InlineSubstitution {
                node: node_path.to_string(),
                message: e.to_string(),
            })
    }

    fn load_source(&mut self, file: &str) -> Result<String> {
        if let Some(cached) = self.source_cache.get(file) {
            return Ok(cached.clone());
        }
        let path = self
            .search_paths
            .resolve(file)
            .ok_or_else(|| GenError::SourceFileNotFound {
                file: file.to_string(),
            })?;
        let source = read_source(&path)?;
        log::debug!("loaded source function body '{file}' from {}", path.display());
        self.source_cache.insert(file.to_string(), source.clone());
        Ok(source)
    }
}

fn read_source(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeDef;
    use crate::value::DataType;

    fn write_temp(file: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("shadegraph_registry_tests");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), contents).unwrap();
        dir
    }

    #[test]
    fn inline_registration_keeps_expression() {
        let def = NodeDef::new("ND_add", "add", DataType::Float).with_inline("{{in1}} + {{in2}}");
        let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::new());
        registry.register(&def).unwrap();
        assert!(registry.find("ND_add").unwrap().is_inline());
    }

    #[test]
    fn missing_implementation_element_is_fatal() {
        let def = NodeDef::new("ND_bare", "bare", DataType::Float);
        let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::new());
        let err = registry.register(&def).unwrap_err();
        assert!(matches!(err, GenError::MissingImplementationElement { .. }));
    }

    #[test]
    fn source_bodies_are_cached_per_file() {
        let dir = write_temp("cached.glsl", "void cached(out float result) { result = 1.0; }");
        let mut registry =
            ImplRegistry::new("glsl", "generic", SearchPaths::from_iter([dir.clone()]));
        let def_a =
            NodeDef::new("ND_a", "a", DataType::Float).with_file("cached.glsl", "cached");
        let def_b =
            NodeDef::new("ND_b", "b", DataType::Float).with_file("cached.glsl", "cached");
        registry.register(&def_a).unwrap();
        // Removing the file proves the second registration hits the cache.
        std::fs::remove_file(dir.join("cached.glsl")).unwrap();
        registry.register(&def_b).unwrap();
        assert!(registry.find("ND_b").is_some());
    }

    #[test]
    fn unlocatable_source_file_is_fatal() {
        let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::new());
        let def = NodeDef::new("ND_x", "x", DataType::Float).with_file("nope.glsl", "nope");
        let err = registry.register(&def).unwrap_err();
        assert!(matches!(err, GenError::SourceFileNotFound { .. }));
    }

    #[test]
    fn light_shader_rejects_inline_implementations() {
        let def = NodeDef::new("ND_light", "light", DataType::Light).with_inline("{{color}}");
        let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::new());
        let err = registry.compile_light_shader(&def).unwrap_err();
        assert!(matches!(err, GenError::InlineLightShader { .. }));
    }

    #[test]
    fn light_shader_collects_uniforms_from_ports() {
        let dir = write_temp(
            "point_light.glsl",
            "void point_light(LightData light, vec3 position, out lightshader result) {}",
        );
        let def = NodeDef::new("ND_point_light", "point_light", DataType::Light)
            .with_input("color", DataType::Color3, None)
            .with_parameter("intensity", DataType::Float, None)
            .with_file("point_light.glsl", "point_light");
        let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::from_iter([dir]));
        let imp = registry.compile_light_shader(&def).unwrap();
        let NodeImplKind::LightShader { light_uniforms, .. } = &imp.kind else {
            panic!("expected light shader");
        };
        assert_eq!(light_uniforms.len(), 2);
        assert_eq!(light_uniforms[0].name, "color");
        assert_eq!(
            light_uniforms[0].source_path.as_deref(),
            Some("ND_point_light/color")
        );
    }

    #[test]
    fn registered_light_shaders_resolve_through_find() {
        let dir = write_temp(
            "spot_light.glsl",
            "void spot_light(LightData light, vec3 position, out lightshader result) {}",
        );
        let def = NodeDef::new("ND_spot_light", "spot_light", DataType::Light)
            .with_input("color", DataType::Color3, None)
            .with_file("spot_light.glsl", "spot_light");
        let mut registry = ImplRegistry::new("glsl", "generic", SearchPaths::from_iter([dir]));
        registry.register_light_shader(&def).unwrap();
        assert!(registry.find("ND_spot_light").unwrap().is_light_shader());
    }

    #[test]
    fn strict_inline_rendering_fails_on_unknown_placeholder() {
        let registry = ImplRegistry::new("glsl", "generic", SearchPaths::new());
        let mut inputs = BTreeMap::new();
        inputs.insert("in1".to_string(), "a".to_string());
        let ok = registry.render_inline("{{in1}} * 2.0", &inputs, "g/n").unwrap();
        assert_eq!(ok, "a * 2.0");
        let err = registry.render_inline("{{in2}}", &inputs, "g/n").unwrap_err();
        assert!(matches!(err, GenError::InlineSubstitution { .. }));
    }
}
