//! Per-target type and syntax tables.
//!
//! A [`Syntax`] maps each [`DataType`] to its spelling, default literals and
//! aggregate construction rules for one (language, target) pair. The table
//! is built once at generator construction and read-only afterwards; a
//! missing entry is a registration-time bug surfaced as
//! [`GenError::UnsupportedType`].
//!
//! Name uniquification is two-phase: a [`Dialect`] supplies only the
//! target-specific canonicalization (phase 1), while the generic collision
//! resolution against a [`UniqueNameMap`] (phase 2) is implemented once in
//! [`Syntax::make_unique`]. Dialects cannot skip phase 2 because
//! `make_unique` is the only public entry point.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{GenError, Result};
use crate::value::{DataType, Value};

pub mod glsl;

/// Spelling and literal syntax for one data type on one target.
#[derive(Debug, Clone)]
pub struct TypeSyntax {
    /// Type spelling in source, e.g. `vec3`.
    pub name: &'static str,
    /// Default value literal, e.g. `vec3(0.0)`.
    pub default_value: &'static str,
    /// Default literal in parameter-initializer position, e.g. `{0.0, 0.0, 0.0}`.
    pub default_param_value: &'static str,
    /// Output-parameter spelling, e.g. `out vec3`.
    pub output_qualifier: &'static str,
    /// Declaration required for non-builtin types, emitted once per stage.
    pub type_definition: Option<&'static str>,
}

impl TypeSyntax {
    #[must_use]
    pub const fn new(
        name: &'static str,
        default_value: &'static str,
        default_param_value: &'static str,
        output_qualifier: &'static str,
    ) -> Self {
        Self {
            name,
            default_value,
            default_param_value,
            output_qualifier,
            type_definition: None,
        }
    }

    #[must_use]
    pub const fn with_definition(mut self, definition: &'static str) -> Self {
        self.type_definition = Some(definition);
        self
    }
}

/// Aggregate construction/destructuring rule for one data type.
#[derive(Debug, Clone)]
pub struct ValueConstructSyntax {
    /// Constructor opening token, e.g. `vec3(`.
    pub open: &'static str,
    /// Constructor closing token, e.g. `)`.
    pub close: &'static str,
    /// Initializer-list opening token, e.g. `{`.
    pub param_open: &'static str,
    /// Initializer-list closing token, e.g. `}`.
    pub param_close: &'static str,
    /// Component accessors, e.g. `.r`, `.g`, `.b`.
    pub accessors: SmallVec<[&'static str; 4]>,
}

impl ValueConstructSyntax {
    #[must_use]
    pub fn new(
        open: &'static str,
        close: &'static str,
        param_open: &'static str,
        param_close: &'static str,
        accessors: &[&'static str],
    ) -> Self {
        Self {
            open,
            close,
            param_open,
            param_close,
            accessors: SmallVec::from_slice(accessors),
        }
    }
}

/// Running map of reserved names used by phase 2 of [`Syntax::make_unique`].
/// The value tracks the next numeric suffix to try for a base name.
pub type UniqueNameMap = FxHashMap<String, u32>;

/// Target-specific name canonicalization (phase 1 of uniquification).
///
/// Implementations only rewrite the candidate name; collision resolution is
/// applied afterwards by [`Syntax::make_unique`].
pub trait Dialect: Send + Sync {
    fn canonicalize(&self, _name: &mut String, _ty: DataType) {}
}

/// No-op phase-1 canonicalization.
#[derive(Debug, Default)]
pub struct PlainDialect;

impl Dialect for PlainDialect {}

/// Immutable per-(language, target) syntax table.
pub struct Syntax {
    language: String,
    target: String,
    preamble: String,
    type_syntax: FxHashMap<DataType, TypeSyntax>,
    construct_syntax: FxHashMap<DataType, ValueConstructSyntax>,
    dialect: Box<dyn Dialect>,
}

impl Syntax {
    #[must_use]
    pub fn new(language: &str, target: &str, dialect: Box<dyn Dialect>) -> Self {
        Self {
            language: language.to_string(),
            target: target.to_string(),
            preamble: String::new(),
            type_syntax: FxHashMap::default(),
            construct_syntax: FxHashMap::default(),
            dialect,
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

    /// Language/version directive emitted at the top of each stage.
    #[must_use]
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn set_preamble(&mut self, preamble: &str) {
        self.preamble = preamble.to_string();
    }

    /// Register (or override) the syntax entry for a type.
    pub fn add_type_syntax(&mut self, ty: DataType, syntax: TypeSyntax) {
        self.type_syntax.insert(ty, syntax);
    }

    /// Register (or override) the construct syntax for a type.
    pub fn add_construct_syntax(&mut self, ty: DataType, syntax: ValueConstructSyntax) {
        self.construct_syntax.insert(ty, syntax);
    }

    pub fn type_syntax(&self, ty: DataType) -> Result<&TypeSyntax> {
        self.type_syntax.get(&ty).ok_or_else(|| GenError::UnsupportedType {
            ty,
            language: self.language.clone(),
            target: self.target.clone(),
        })
    }

    pub fn construct_syntax(&self, ty: DataType) -> Result<&ValueConstructSyntax> {
        self.construct_syntax
            .get(&ty)
            .ok_or(GenError::NoConstructSyntax { ty })
    }

    /// Type spelling in source.
    pub fn spelling(&self, ty: DataType) -> Result<&str> {
        Ok(self.type_syntax(ty)?.name)
    }

    /// Default literal for a type. `param_init` selects the
    /// parameter-initializer form.
    pub fn default_value(&self, ty: DataType, param_init: bool) -> Result<&str> {
        let ts = self.type_syntax(ty)?;
        Ok(if param_init {
            ts.default_param_value
        } else {
            ts.default_value
        })
    }

    /// Format a runtime value as source literal text, recursing into
    /// aggregates via the construct syntax.
    pub fn get_value(&self, value: &Value, param_init: bool) -> Result<String> {
        match value {
            Value::Boolean(b) => Ok(if *b { "true" } else { "false" }.to_string()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(format_float(*f)),
            // String and filename values have no literal form in shader
            // source; the table entry stands in. Enum mapping and texture
            // binding are render-time concerns.
            Value::String(_) | Value::Filename(_) => {
                Ok(self.default_value(value.ty(), param_init)?.to_string())
            }
            _ => {
                let components = value
                    .components()
                    .ok_or(GenError::NoConstructSyntax { ty: value.ty() })?;
                let cs = self.construct_syntax(value.ty())?;
                let body = components
                    .iter()
                    .map(|c| format_float(*c))
                    .collect::<Vec<_>>()
                    .join(", ");
                if param_init {
                    Ok(format!("{}{body}{}", cs.param_open, cs.param_close))
                } else {
                    Ok(format!("{}{body}{}", cs.open, cs.close))
                }
            }
        }
    }

    /// Uniquify `name` against `names`: dialect canonicalization first,
    /// then generic collision resolution. The final name is reserved in the
    /// map before returning.
    pub fn make_unique(&self, name: &mut String, ty: DataType, names: &mut UniqueNameMap) {
        self.dialect.canonicalize(name, ty);

        let seen = names.get(name.as_str()).copied().unwrap_or(0) + 1;
        names.insert(name.clone(), seen);
        if seen == 1 {
            return;
        }

        let base = std::mem::take(name);
        let mut suffix = seen;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !names.contains_key(&candidate) {
                names.insert(candidate.clone(), 1);
                names.insert(base, suffix);
                *name = candidate;
                return;
            }
            suffix += 1;
        }
    }
}

/// Format a float so it always reads as a float literal.
#[must_use]
pub(crate) fn format_float(v: f32) -> String {
    let s = format!("{v}");
    if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{s}.0")
    }
}
