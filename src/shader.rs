//! Shader output object: per-stage source buffers and variable blocks.
//!
//! A [`Shader`] owns one [`StageBuffer`] per pipeline [`Stage`] plus an
//! active-stage cursor. Node implementations write statements into the
//! active stage and declare [`Variable`]s into named [`VariableBlock`]s;
//! after traversal the generator assembles each stage's final source, and
//! the first call to [`Shader::source_code`] finalizes that stage. A
//! finalized stage accepts no further writes.
//!
//! Scoped stage selection uses [`StageGuard`], whose `Drop` restores the
//! previous active stage unconditionally, so an early fatal return cannot
//! leave the cursor pointed at the wrong stage.

use std::ops::{Deref, DerefMut};

use rustc_hash::FxHashMap;

use crate::errors::{GenError, Result};
use crate::syntax::UniqueNameMap;
use crate::value::{DataType, Value};

/// Standard variable-block identifiers for rasterization targets.
pub mod blocks {
    /// Geometric inputs for the vertex stage.
    pub const VERTEX_INPUTS: &str = "VertexInputs";
    /// Connector block for data transfer from vertex to pixel stage.
    pub const VERTEX_DATA: &str = "VertexData";
    /// Uniforms set privately by the application.
    pub const PRIVATE_UNIFORMS: &str = "PrivateUniforms";
    /// Uniforms visible in UI and set by users.
    pub const PUBLIC_UNIFORMS: &str = "PublicUniforms";
    /// Uniforms for light sources.
    pub const LIGHT_UNIFORMS: &str = "LightUniforms";
    /// Outputs from the pixel stage.
    pub const PIXEL_OUTPUTS: &str = "PixelOutputs";
}

/// A pipeline stage with its own declarations and statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Pixel,
}

impl Stage {
    pub const ALL: [Stage; 2] = [Stage::Vertex, Stage::Pixel];

    #[must_use]
    pub(crate) fn index(self) -> usize {
        match self {
            Stage::Vertex => 0,
            Stage::Pixel => 1,
        }
    }
}

/// A declared shader variable.
#[derive(Debug, Clone)]
pub struct Variable {
    pub ty: DataType,
    pub name: String,
    pub semantic: Option<String>,
    pub value: Option<Value>,
    /// Path of the graph element this variable was created for, if any.
    pub source_path: Option<String>,
}

/// Named, insertion-ordered group of variables sharing a binding category.
/// Names are unique within a block.
#[derive(Debug, Default)]
pub struct VariableBlock {
    name: String,
    variables: Vec<Variable>,
    index: FxHashMap<String, usize>,
}

impl VariableBlock {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variables: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&i| &self.variables[i])
    }

    /// Update a variable's value after generation. Returns false if the
    /// variable does not exist.
    pub fn set_value(&mut self, name: &str, value: Value) -> bool {
        match self.index.get(name) {
            Some(&i) => {
                self.variables[i].value = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    fn insert(&mut self, variable: Variable) {
        self.index.insert(variable.name.clone(), self.variables.len());
        self.variables.push(variable);
    }
}

impl<'a> IntoIterator for &'a VariableBlock {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageState {
    Uninitialized,
    Accumulating,
    Finalized,
}

/// Accumulates one stage's statements, variable blocks and function
/// definitions.
#[derive(Debug)]
pub struct StageBuffer {
    code: String,
    blocks: Vec<VariableBlock>,
    functions: Vec<(String, String)>,
    state: StageState,
    indent: usize,
}

const INDENT: &str = "    ";

impl StageBuffer {
    fn new() -> Self {
        Self {
            code: String::new(),
            blocks: Vec::new(),
            functions: Vec::new(),
            state: StageState::Uninitialized,
            indent: 1,
        }
    }

    fn ensure_writable(&mut self, stage: Stage) -> Result<()> {
        if self.state == StageState::Finalized {
            return Err(GenError::StageFinalized { stage });
        }
        self.state = StageState::Accumulating;
        Ok(())
    }

    #[must_use]
    pub fn block(&self, name: &str) -> Option<&VariableBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    fn block_mut(&mut self, name: &str) -> &mut VariableBlock {
        if let Some(i) = self.blocks.iter().position(|b| b.name == name) {
            return &mut self.blocks[i];
        }
        self.blocks.push(VariableBlock::new(name));
        self.blocks.last_mut().expect("just pushed")
    }

    /// Blocks in creation order; insertion order within each block is
    /// declaration order.
    #[must_use]
    pub fn blocks(&self) -> &[VariableBlock] {
        &self.blocks
    }

    /// Deduplicated function definitions in first-seen order.
    #[must_use]
    pub fn functions(&self) -> &[(String, String)] {
        &self.functions
    }
}

/// The generated shader: all stages, the active-stage cursor and the
/// per-shader unique-name map.
#[derive(Debug)]
pub struct Shader {
    name: String,
    stages: [StageBuffer; 2],
    active: Stage,
    unique_names: UniqueNameMap,
}

impl Shader {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stages: [StageBuffer::new(), StageBuffer::new()],
            active: Stage::Pixel,
            unique_names: UniqueNameMap::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn active_stage(&self) -> Stage {
        self.active
    }

    /// Switch the active stage for the lifetime of the returned guard; the
    /// previous stage is restored when the guard drops.
    pub fn push_stage(&mut self, stage: Stage) -> StageGuard<'_> {
        let prev = self.active;
        self.active = stage;
        StageGuard { shader: self, prev }
    }

    pub(crate) fn unique_names_mut(&mut self) -> &mut UniqueNameMap {
        &mut self.unique_names
    }

    /// Insert a variable into the named block of a stage, or return the
    /// existing one if an identical (name, type) is already present.
    /// Returns the stored variable name.
    pub fn create_uniform(
        &mut self,
        stage: Stage,
        block: &str,
        ty: DataType,
        name: &str,
        semantic: Option<String>,
        value: Option<Value>,
    ) -> Result<String> {
        let buffer = &mut self.stages[stage.index()];
        buffer.ensure_writable(stage)?;
        let block_name = block.to_string();
        let block = buffer.block_mut(block);
        if let Some(existing) = block.get(name) {
            if existing.ty == ty {
                return Ok(existing.name.clone());
            }
            return Err(GenError::VariableTypeClash {
                block: block_name,
                name: name.to_string(),
            });
        }
        block.insert(Variable {
            ty,
            name: name.to_string(),
            semantic,
            value,
            source_path: None,
        });
        Ok(name.to_string())
    }

    /// Like [`create_uniform`](Self::create_uniform) but records the graph
    /// element the variable was created for.
    pub fn create_uniform_for(
        &mut self,
        stage: Stage,
        block: &str,
        ty: DataType,
        name: &str,
        semantic: Option<String>,
        value: Option<Value>,
        source_path: &str,
    ) -> Result<String> {
        let stored = self.create_uniform(stage, block, ty, name, semantic, value)?;
        if let Some(block) = self.stages[stage.index()]
            .blocks
            .iter_mut()
            .find(|b| b.name == block)
            && let Some(&i) = block.index.get(&stored)
            && block.variables[i].source_path.is_none()
        {
            block.variables[i].source_path = Some(source_path.to_string());
        }
        Ok(stored)
    }

    /// Append one terminated, indented statement to the active stage.
    pub fn add_line(&mut self, line: &str) -> Result<()> {
        let stage = self.active;
        let buffer = &mut self.stages[stage.index()];
        buffer.ensure_writable(stage)?;
        for _ in 0..buffer.indent {
            buffer.code.push_str(INDENT);
        }
        buffer.code.push_str(line);
        buffer.code.push_str(";\n");
        Ok(())
    }

    /// Append an unterminated comment line to the active stage.
    pub fn add_comment(&mut self, text: &str) -> Result<()> {
        let stage = self.active;
        let buffer = &mut self.stages[stage.index()];
        buffer.ensure_writable(stage)?;
        for _ in 0..buffer.indent {
            buffer.code.push_str(INDENT);
        }
        buffer.code.push_str("// ");
        buffer.code.push_str(text);
        buffer.code.push('\n');
        Ok(())
    }

    /// Register a function definition for the given stage, deduplicated by
    /// key.
    pub fn add_function(&mut self, stage: Stage, key: &str, source: &str) -> Result<()> {
        let buffer = &mut self.stages[stage.index()];
        buffer.ensure_writable(stage)?;
        if buffer.functions.iter().any(|(k, _)| k == key) {
            return Ok(());
        }
        buffer
            .functions
            .push((key.to_string(), source.to_string()));
        Ok(())
    }

    /// Read access to one stage's buffer (blocks and functions).
    #[must_use]
    pub fn stage(&self, stage: Stage) -> &StageBuffer {
        &self.stages[stage.index()]
    }

    /// Shorthand for a block lookup on one stage.
    #[must_use]
    pub fn block(&self, stage: Stage, name: &str) -> Option<&VariableBlock> {
        self.stage(stage).block(name)
    }

    /// Update a declared variable's value after generation. Allowed on
    /// finalized stages; values are read by the render-time collaborator.
    pub fn set_value(&mut self, stage: Stage, block: &str, name: &str, value: Value) -> bool {
        self.stages[stage.index()]
            .blocks
            .iter_mut()
            .find(|b| b.name == block)
            .is_some_and(|b| b.set_value(name, value))
    }

    /// The stage's source. The first call finalizes the stage: afterwards
    /// no writes are accepted.
    pub fn source_code(&mut self, stage: Stage) -> &str {
        let buffer = &mut self.stages[stage.index()];
        buffer.state = StageState::Finalized;
        &buffer.code
    }

    /// Accumulated statements, taken for assembly.
    pub(crate) fn take_statements(&mut self, stage: Stage) -> Result<String> {
        let buffer = &mut self.stages[stage.index()];
        buffer.ensure_writable(stage)?;
        Ok(std::mem::take(&mut buffer.code))
    }

    /// Replace a stage's source with the assembled text.
    pub(crate) fn set_source(&mut self, stage: Stage, source: String) -> Result<()> {
        let buffer = &mut self.stages[stage.index()];
        buffer.ensure_writable(stage)?;
        buffer.code = source;
        Ok(())
    }
}

/// RAII guard for scoped stage selection. Dereferences to [`Shader`].
pub struct StageGuard<'a> {
    shader: &'a mut Shader,
    prev: Stage,
}

impl Deref for StageGuard<'_> {
    type Target = Shader;

    fn deref(&self) -> &Shader {
        self.shader
    }
}

impl DerefMut for StageGuard<'_> {
    fn deref_mut(&mut self) -> &mut Shader {
        self.shader
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        self.shader.active = self.prev;
    }
}
