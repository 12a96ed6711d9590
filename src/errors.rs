//! Error Types
//!
//! This module defines the error types used throughout the generator.
//!
//! # Overview
//!
//! The main error type [`GenError`] covers all failure modes including:
//! - Registration-time failures (unsupported type syntax, missing or
//!   ill-formed implementation elements, unlocatable source files)
//! - Generation-time failures (unresolved dispatch, writes to a finalized
//!   stage, inline substitution errors)
//! - Light binding failures
//!
//! Generation is all-or-nothing: any error aborts the whole pass and no
//! partial shader is returned. Diagnostics name the offending node's path
//! and the active (language, target) pair wherever they are known.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, GenError>`.

use thiserror::Error;

use crate::shader::Stage;
use crate::value::DataType;

/// The main error type for shader generation.
///
/// This enum covers all possible error conditions that can occur while
/// registering implementations and generating shader source. Each variant
/// provides specific context about what went wrong.
#[derive(Error, Debug)]
pub enum GenError {
    // ========================================================================
    // Syntax & Type Errors
    // ========================================================================
    /// No syntax entry is registered for a data type on the active target.
    /// This is a registration-time bug, not a recoverable condition.
    #[error("Unsupported data type {ty:?} for target {language}/{target}")]
    UnsupportedType {
        /// The data type with no syntax entry
        ty: DataType,
        /// Active shading language
        language: String,
        /// Active target dialect
        target: String,
    },

    /// A value of an aggregate type has no construct syntax registered.
    #[error("No value construct syntax for data type {ty:?}")]
    NoConstructSyntax {
        /// The data type with no construct syntax entry
        ty: DataType,
    },

    // ========================================================================
    // Registration Errors
    // ========================================================================
    /// A node definition declares no implementation element at all.
    #[error("Node definition '{node_def}' declares no implementation")]
    MissingImplementationElement {
        /// Name of the offending node definition
        node_def: String,
    },

    /// No implementation is registered for a node's type signature on the
    /// active target. Aborts the whole pass.
    #[error("Node '{node}' of type '{node_type}' has no implementation for {language}/{target}")]
    MissingImplementation {
        /// Path of the offending node
        node: String,
        /// The node's type signature (node definition name)
        node_type: String,
        /// Active shading language
        language: String,
        /// Active target dialect
        target: String,
    },

    /// Light shaders require a concrete source-function implementation.
    #[error("Light shaders do not support inline implementations (node definition '{node_def}')")]
    InlineLightShader {
        /// Name of the offending node definition
        node_def: String,
    },

    /// A source-function body could not be located on the search paths.
    #[error("Source file '{file}' not found on any registered search path")]
    SourceFileNotFound {
        /// The per-implementation relative filename
        file: String,
    },

    /// File I/O error while reading a source-function body.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Emission Errors
    // ========================================================================
    /// A write was attempted against a finalized stage. Programming-error
    /// class; stage source is read-only once requested after traversal.
    #[error("Stage {stage:?} is finalized and accepts no further writes")]
    StageFinalized {
        /// The finalized stage
        stage: Stage,
    },

    /// A variable was re-declared in a block with a conflicting type.
    #[error("Variable '{name}' already exists in block '{block}' with a different type")]
    VariableTypeClash {
        /// The owning block
        block: String,
        /// The clashing variable name
        name: String,
    },

    /// An inline expression template failed to render.
    #[error("Inline expression for node '{node}' failed to render: {message}")]
    InlineSubstitution {
        /// Path of the offending node
        node: String,
        /// Underlying template error
        message: String,
    },

    /// The input graph violated a precondition owned by the graph
    /// collaborator. Checked defensively so invalid source is never emitted.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    // ========================================================================
    // Light Errors
    // ========================================================================
    /// No light shader is bound for a light type id.
    #[error("No light shader bound for light type {type_id}")]
    UnboundLightType {
        /// The opaque light type id
        type_id: u64,
    },

    /// A light parameter name does not exist on the light's node definition.
    #[error("Unknown parameter '{name}' for light type {type_id}")]
    UnknownLightParameter {
        /// The opaque light type id
        type_id: u64,
        /// The unknown parameter name
        name: String,
    },

    /// A light source index does not name a created light source.
    #[error("Light source index {index} is out of range")]
    LightSourceOutOfRange {
        /// The rejected index
        index: usize,
    },

    /// A light parameter was set with a value of the wrong type.
    #[error("Light parameter '{name}' expects {expected:?}, got {actual:?}")]
    LightParameterType {
        /// The parameter name
        name: String,
        /// The declared parameter type
        expected: DataType,
        /// The type of the rejected value
        actual: DataType,
    },
}

/// Alias for `Result<T, GenError>`.
pub type Result<T> = std::result::Result<T, GenError>;
