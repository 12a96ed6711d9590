#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod generator;
pub mod graph;
pub mod hw;
pub mod registry;
pub mod shader;
pub mod syntax;
pub mod value;

pub use errors::{GenError, Result};
pub use generator::{
    ColorManagement, DefaultColorManagement, GenOptions, Generator, ShaderInterface,
};
pub use graph::{ImplElement, Node, NodeDef, NodeFlags, NodeGraph, NodeKey, PortDef, PortKind};
pub use hw::{HwGenerator, LightHandler, LightSource, LightTypeId};
pub use registry::{ImplRegistry, NodeImpl, NodeImplKind, SearchPaths};
pub use shader::{Shader, Stage, StageGuard, Variable, VariableBlock, blocks};
pub use syntax::{Dialect, Syntax, TypeSyntax, UniqueNameMap, ValueConstructSyntax};
pub use value::{DataType, Value};
