//! GLSL syntax tables and dialects.

use crate::value::DataType;

use super::{Dialect, PlainDialect, Syntax, TypeSyntax, ValueConstructSyntax};

/// Shading language identifier for the tables in this module.
pub const LANGUAGE: &str = "glsl";
/// Plain desktop GLSL.
pub const TARGET_GENERIC: &str = "generic";
/// OGS effect framework dialect.
pub const TARGET_OGSFX: &str = "ogsfx";

/// OgsFx phase-1 canonicalization.
///
/// OGS gives any color parameter whose name ends in `Color` a color-picker
/// widget, so color3 names are rewritten to carry that suffix exactly once.
#[derive(Debug, Default)]
pub struct OgsFxDialect;

impl Dialect for OgsFxDialect {
    fn canonicalize(&self, name: &mut String, ty: DataType) {
        if ty != DataType::Color3 {
            return;
        }
        if name.len() >= 5 {
            let tail = name[name.len() - 5..].to_ascii_lowercase();
            if tail == "color" {
                name.truncate(name.len() - 5);
                if name.ends_with('_') {
                    name.pop();
                }
            }
        }
        name.push_str("Color");
    }
}

fn base_table(mut syntax: Syntax) -> Syntax {
    syntax.set_preamble("#version 400");

    syntax.add_type_syntax(
        DataType::Boolean,
        TypeSyntax::new("bool", "false", "false", "out bool"),
    );
    syntax.add_type_syntax(
        DataType::Integer,
        TypeSyntax::new("int", "0", "0", "out int"),
    );
    syntax.add_type_syntax(
        DataType::Float,
        TypeSyntax::new("float", "0.0", "0.0", "out float"),
    );
    syntax.add_type_syntax(
        DataType::Vector2,
        TypeSyntax::new("vec2", "vec2(0.0)", "{0.0, 0.0}", "out vec2"),
    );
    syntax.add_type_syntax(
        DataType::Vector3,
        TypeSyntax::new("vec3", "vec3(0.0)", "{0.0, 0.0, 0.0}", "out vec3"),
    );
    syntax.add_type_syntax(
        DataType::Vector4,
        TypeSyntax::new("vec4", "vec4(0.0)", "{0.0, 0.0, 0.0, 0.0}", "out vec4"),
    );
    syntax.add_type_syntax(
        DataType::Color2,
        TypeSyntax::new("vec2", "vec2(0.0)", "{0.0, 0.0}", "out vec2"),
    );
    syntax.add_type_syntax(
        DataType::Color3,
        TypeSyntax::new("vec3", "vec3(0.0)", "{0.0, 0.0, 0.0}", "out vec3"),
    );
    syntax.add_type_syntax(
        DataType::Color4,
        TypeSyntax::new("vec4", "vec4(0.0)", "{0.0, 0.0, 0.0, 0.0}", "out vec4"),
    );
    syntax.add_type_syntax(
        DataType::Matrix44,
        TypeSyntax::new("mat4", "mat4(1.0)", "mat4(1.0)", "out mat4"),
    );
    // Strings carry enum-style values on GLSL targets.
    syntax.add_type_syntax(
        DataType::String,
        TypeSyntax::new("int", "0", "0", "out int"),
    );
    // Filenames become texture samplers.
    syntax.add_type_syntax(
        DataType::Filename,
        TypeSyntax::new("sampler2D", "", "", "out sampler2D"),
    );
    syntax.add_type_syntax(
        DataType::Bsdf,
        TypeSyntax::new("BSDF", "BSDF(vec3(0.0))", "BSDF(vec3(0.0))", "out BSDF")
            .with_definition("struct BSDF { vec3 response; };"),
    );
    syntax.add_type_syntax(
        DataType::Edf,
        TypeSyntax::new("EDF", "EDF(vec3(0.0))", "EDF(vec3(0.0))", "out EDF")
            .with_definition("struct EDF { vec3 emission; };"),
    );
    syntax.add_type_syntax(
        DataType::Surface,
        TypeSyntax::new(
            "surfaceshader",
            "surfaceshader(vec3(0.0), vec3(0.0))",
            "surfaceshader(vec3(0.0), vec3(0.0))",
            "out surfaceshader",
        )
        .with_definition("struct surfaceshader { vec3 color; vec3 transparency; };"),
    );
    syntax.add_type_syntax(
        DataType::Light,
        TypeSyntax::new(
            "lightshader",
            "lightshader(vec3(0.0), vec3(0.0))",
            "lightshader(vec3(0.0), vec3(0.0))",
            "out lightshader",
        )
        .with_definition("struct lightshader { vec3 intensity; vec3 direction; };"),
    );

    syntax.add_construct_syntax(
        DataType::Vector2,
        ValueConstructSyntax::new("vec2(", ")", "{", "}", &[".x", ".y"]),
    );
    syntax.add_construct_syntax(
        DataType::Vector3,
        ValueConstructSyntax::new("vec3(", ")", "{", "}", &[".x", ".y", ".z"]),
    );
    syntax.add_construct_syntax(
        DataType::Vector4,
        ValueConstructSyntax::new("vec4(", ")", "{", "}", &[".x", ".y", ".z", ".w"]),
    );
    syntax.add_construct_syntax(
        DataType::Color2,
        ValueConstructSyntax::new("vec2(", ")", "{", "}", &[".r", ".g"]),
    );
    syntax.add_construct_syntax(
        DataType::Color3,
        ValueConstructSyntax::new("vec3(", ")", "{", "}", &[".r", ".g", ".b"]),
    );
    syntax.add_construct_syntax(
        DataType::Color4,
        ValueConstructSyntax::new("vec4(", ")", "{", "}", &[".r", ".g", ".b", ".a"]),
    );
    syntax.add_construct_syntax(
        DataType::Matrix44,
        ValueConstructSyntax::new("mat4(", ")", "{", "}", &[]),
    );

    syntax
}

/// Syntax table for plain GLSL.
#[must_use]
pub fn glsl_syntax() -> Syntax {
    base_table(Syntax::new(LANGUAGE, TARGET_GENERIC, Box::new(PlainDialect)))
}

/// Syntax table for the OgsFx dialect: GLSL spellings with the color-picker
/// name canonicalization.
#[must_use]
pub fn ogsfx_syntax() -> Syntax {
    base_table(Syntax::new(LANGUAGE, TARGET_OGSFX, Box::new(OgsFxDialect)))
}
