//! Resolved node graph consumed by the generator.
//!
//! This is the already-validated, already-flattened form of a material
//! graph: typed nodes with ports bound either to an upstream node or to a
//! value. Document parsing, reference resolution and subgraph flattening
//! belong to an external collaborator; the generator only walks what is
//! here and fails fast on anything that looks unresolved.

use std::sync::Arc;

use bitflags::bitflags;
use slotmap::{SlotMap, new_key_type};

use crate::errors::{GenError, Result};
use crate::value::{DataType, Value};

new_key_type! {
    /// Key of a node inside a [`NodeGraph`].
    pub struct NodeKey;
}

bitflags! {
    /// Per-node attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u32 {
        /// The node produces a transparent shading result.
        const TRANSPARENT = 1 << 0;
    }
}

/// Whether a port is a connectable input or a value-only parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Input,
    Parameter,
}

/// A typed port on a node definition.
#[derive(Debug, Clone)]
pub struct PortDef {
    pub name: String,
    pub ty: DataType,
    pub kind: PortKind,
    pub value: Option<Value>,
    pub semantic: Option<String>,
}

/// The implementation a node definition declares for a target.
#[derive(Debug, Clone)]
pub enum ImplElement {
    /// An expression template with `{{input}}` placeholders.
    Inline { expression: String },
    /// An external function body plus the function to call.
    File { file: String, function: String },
}

/// Type signature for a node category: ports, types, defaults and the
/// declared implementation.
#[derive(Debug, Clone)]
pub struct NodeDef {
    pub name: String,
    pub node_type: String,
    pub output_type: DataType,
    pub ports: Vec<PortDef>,
    pub implementation: Option<ImplElement>,
}

impl NodeDef {
    #[must_use]
    pub fn new(name: &str, node_type: &str, output_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            node_type: node_type.to_string(),
            output_type,
            ports: Vec::new(),
            implementation: None,
        }
    }

    /// Add a connectable input port.
    #[must_use]
    pub fn with_input(mut self, name: &str, ty: DataType, value: Option<Value>) -> Self {
        self.ports.push(PortDef {
            name: name.to_string(),
            ty,
            kind: PortKind::Input,
            value,
            semantic: None,
        });
        self
    }

    /// Add a value-only parameter port.
    #[must_use]
    pub fn with_parameter(mut self, name: &str, ty: DataType, value: Option<Value>) -> Self {
        self.ports.push(PortDef {
            name: name.to_string(),
            ty,
            kind: PortKind::Parameter,
            value,
            semantic: None,
        });
        self
    }

    /// Declare an inline expression implementation.
    #[must_use]
    pub fn with_inline(mut self, expression: &str) -> Self {
        self.implementation = Some(ImplElement::Inline {
            expression: expression.to_string(),
        });
        self
    }

    /// Declare an external source-function implementation.
    #[must_use]
    pub fn with_file(mut self, file: &str, function: &str) -> Self {
        self.implementation = Some(ImplElement::File {
            file: file.to_string(),
            function: function.to_string(),
        });
        self
    }

    #[must_use]
    pub fn port(&self, name: &str) -> Option<&PortDef> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// Binding of one node port: either connected upstream or carrying a value.
#[derive(Debug, Clone)]
pub struct InputBinding {
    pub port: String,
    pub connection: Option<NodeKey>,
    pub value: Option<Value>,
}

/// One operation node in the graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub def: Arc<NodeDef>,
    pub inputs: Vec<InputBinding>,
    pub flags: NodeFlags,
}

impl Node {
    /// Create a node with bindings seeded from the definition's port
    /// defaults.
    #[must_use]
    pub fn from_def(name: &str, def: &Arc<NodeDef>) -> Self {
        let inputs = def
            .ports
            .iter()
            .map(|p| InputBinding {
                port: p.name.clone(),
                connection: None,
                value: p.value.clone(),
            })
            .collect();
        Self {
            name: name.to_string(),
            def: Arc::clone(def),
            inputs,
            flags: NodeFlags::empty(),
        }
    }

    #[must_use]
    pub fn input(&self, port: &str) -> Option<&InputBinding> {
        self.inputs.iter().find(|b| b.port == port)
    }

    fn input_mut(&mut self, port: &str) -> Option<&mut InputBinding> {
        self.inputs.iter_mut().find(|b| b.port == port)
    }
}

/// DAG of typed operation nodes with data-flow edges.
#[derive(Debug, Default)]
pub struct NodeGraph {
    name: String,
    nodes: SlotMap<NodeKey, Node>,
    output: Option<NodeKey>,
}

impl NodeGraph {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: SlotMap::with_key(),
            output: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_node(&mut self, node: Node) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Convenience: create a node from a definition and insert it.
    pub fn add(&mut self, name: &str, def: &Arc<NodeDef>) -> NodeKey {
        self.add_node(Node::from_def(name, def))
    }

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Path of a node for diagnostics: `graph/node`.
    #[must_use]
    pub fn node_path(&self, key: NodeKey) -> String {
        match self.nodes.get(key) {
            Some(node) => format!("{}/{}", self.name, node.name),
            None => format!("{}/<missing>", self.name),
        }
    }

    /// Connect `from`'s output to the named input of `to`.
    pub fn connect(&mut self, from: NodeKey, to: NodeKey, input: &str) -> Result<()> {
        if !self.nodes.contains_key(from) {
            return Err(GenError::InvalidGraph(format!(
                "connection source does not exist (input '{input}')"
            )));
        }
        let to_path = self.node_path(to);
        let node = self
            .nodes
            .get_mut(to)
            .ok_or_else(|| GenError::InvalidGraph(format!("node '{to_path}' does not exist")))?;
        match node.def.port(input) {
            None => {
                return Err(GenError::InvalidGraph(format!(
                    "node '{to_path}' has no input '{input}'"
                )));
            }
            Some(port) if port.kind == PortKind::Parameter => {
                return Err(GenError::InvalidGraph(format!(
                    "port '{input}' on node '{to_path}' is a parameter and cannot be connected"
                )));
            }
            Some(_) => {}
        }
        let binding = node
            .input_mut(input)
            .ok_or_else(|| GenError::InvalidGraph(format!("unbound input '{input}' on '{to_path}'")))?;
        binding.connection = Some(from);
        Ok(())
    }

    /// Override the value of an unconnected port.
    pub fn set_input_value(&mut self, key: NodeKey, port: &str, value: Value) -> Result<()> {
        let path = self.node_path(key);
        let node = self
            .nodes
            .get_mut(key)
            .ok_or_else(|| GenError::InvalidGraph(format!("node '{path}' does not exist")))?;
        let binding = node
            .input_mut(port)
            .ok_or_else(|| GenError::InvalidGraph(format!("node '{path}' has no port '{port}'")))?;
        binding.value = Some(value);
        Ok(())
    }

    pub fn set_flags(&mut self, key: NodeKey, flags: NodeFlags) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.flags = flags;
        }
    }

    pub fn set_output(&mut self, key: NodeKey) {
        self.output = Some(key);
    }

    #[must_use]
    pub fn output(&self) -> Option<NodeKey> {
        self.output
    }

    /// Keys of the nodes connected into `key`, in port order.
    pub fn upstream(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes
            .get(key)
            .into_iter()
            .flat_map(|n| n.inputs.iter().filter_map(|b| b.connection))
    }
}

/// Whether any node reachable upstream from `root` (inclusive) is tagged
/// transparent. Used to derive the hardware-transparency option.
#[must_use]
pub fn is_transparent(graph: &NodeGraph, root: NodeKey) -> bool {
    let mut stack = vec![root];
    let mut visited: slotmap::SecondaryMap<NodeKey, ()> = slotmap::SecondaryMap::new();
    while let Some(key) = stack.pop() {
        if visited.insert(key, ()).is_some() {
            continue;
        }
        let Some(node) = graph.node(key) else { continue };
        if node.flags.contains(NodeFlags::TRANSPARENT) {
            return true;
        }
        stack.extend(graph.upstream(key));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_def() -> Arc<NodeDef> {
        Arc::new(
            NodeDef::new("ND_constant_float", "constant", DataType::Float)
                .with_input("value", DataType::Float, Some(Value::Float(1.0)))
                .with_inline("{{value}}"),
        )
    }

    #[test]
    fn from_def_seeds_bindings_with_defaults() {
        let def = constant_def();
        let node = Node::from_def("c1", &def);
        assert_eq!(node.inputs.len(), 1);
        assert_eq!(node.input("value").unwrap().value, Some(Value::Float(1.0)));
        assert!(node.input("value").unwrap().connection.is_none());
    }

    #[test]
    fn connect_rejects_parameters_and_unknown_ports() {
        let def = Arc::new(
            NodeDef::new("ND_image", "image", DataType::Color3)
                .with_parameter("file", DataType::Filename, None),
        );
        let mut graph = NodeGraph::new("g");
        let a = graph.add("a", &constant_def());
        let b = graph.add("b", &def);
        assert!(graph.connect(a, b, "file").is_err());
        assert!(graph.connect(a, b, "nope").is_err());
    }

    #[test]
    fn transparency_scan_reaches_upstream_nodes() {
        let def = constant_def();
        let mix = Arc::new(
            NodeDef::new("ND_add_float", "add", DataType::Float)
                .with_input("in1", DataType::Float, Some(Value::Float(0.0)))
                .with_input("in2", DataType::Float, Some(Value::Float(0.0)))
                .with_inline("{{in1}} + {{in2}}"),
        );
        let mut graph = NodeGraph::new("g");
        let a = graph.add("a", &def);
        let b = graph.add("b", &def);
        let sum = graph.add("sum", &mix);
        graph.connect(a, sum, "in1").unwrap();
        graph.connect(b, sum, "in2").unwrap();

        assert!(!is_transparent(&graph, sum));
        graph.set_flags(b, NodeFlags::TRANSPARENT);
        assert!(is_transparent(&graph, sum));
        assert!(!is_transparent(&graph, a));
    }

    #[test]
    fn node_path_includes_graph_name() {
        let mut graph = NodeGraph::new("mat1");
        let key = graph.add("base", &constant_def());
        assert_eq!(graph.node_path(key), "mat1/base");
    }
}
