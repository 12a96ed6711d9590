//! Semantic data types and runtime values.
//!
//! [`DataType`] is the fixed set of port/variable types the generator
//! understands; [`Value`] carries a concrete runtime value for one of them.
//! How a value is spelled in shader source is a per-target concern and lives
//! in the [`syntax`](crate::syntax) module.

use glam::{Mat4, Vec2, Vec3, Vec4};
use smallvec::SmallVec;

/// Semantic type of a port, variable or value.
///
/// Closure types (`Bsdf`, `Edf`, `Surface`, `Light`) mark shading closures
/// and carry no runtime value. `MultiOutput` marks nodes with more than one
/// output and is never the type of a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    Vector2,
    Vector3,
    Vector4,
    Color2,
    Color3,
    Color4,
    Matrix44,
    String,
    Filename,
    Bsdf,
    Edf,
    Surface,
    Light,
    MultiOutput,
}

impl DataType {
    /// Whether this type is a shading closure marker.
    #[must_use]
    pub fn is_closure(self) -> bool {
        matches!(
            self,
            DataType::Bsdf | DataType::Edf | DataType::Surface | DataType::Light
        )
    }

    /// Whether this type is a color type.
    #[must_use]
    pub fn is_color(self) -> bool {
        matches!(self, DataType::Color2 | DataType::Color3 | DataType::Color4)
    }

    /// Number of scalar components for aggregate types.
    #[must_use]
    pub fn component_count(self) -> Option<usize> {
        match self {
            DataType::Vector2 | DataType::Color2 => Some(2),
            DataType::Vector3 | DataType::Color3 => Some(3),
            DataType::Vector4 | DataType::Color4 => Some(4),
            DataType::Matrix44 => Some(16),
            _ => None,
        }
    }

    /// Whether this type is built from scalar components.
    #[must_use]
    pub fn is_aggregate(self) -> bool {
        self.component_count().is_some()
    }
}

/// A runtime value for a [`DataType`].
///
/// Values appear as port defaults on node definitions and as defaults on
/// declared [`Variable`](crate::shader::Variable)s, where a render-time
/// collaborator updates them after generation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i32),
    Float(f32),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    Color2(Vec2),
    Color3(Vec3),
    Color4(Vec4),
    Matrix44(Mat4),
    String(String),
    Filename(String),
}

impl Value {
    /// The semantic type of this value.
    #[must_use]
    pub fn ty(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Vector2(_) => DataType::Vector2,
            Value::Vector3(_) => DataType::Vector3,
            Value::Vector4(_) => DataType::Vector4,
            Value::Color2(_) => DataType::Color2,
            Value::Color3(_) => DataType::Color3,
            Value::Color4(_) => DataType::Color4,
            Value::Matrix44(_) => DataType::Matrix44,
            Value::String(_) => DataType::String,
            Value::Filename(_) => DataType::Filename,
        }
    }

    /// Scalar components for aggregate values, in declaration order.
    /// Matrices yield column-major components.
    #[must_use]
    pub fn components(&self) -> Option<SmallVec<[f32; 4]>> {
        match self {
            Value::Vector2(v) | Value::Color2(v) => Some(SmallVec::from_slice(&v.to_array())),
            Value::Vector3(v) | Value::Color3(v) => Some(SmallVec::from_slice(&v.to_array())),
            Value::Vector4(v) | Value::Color4(v) => Some(SmallVec::from_slice(&v.to_array())),
            Value::Matrix44(m) => Some(SmallVec::from_slice(&m.to_cols_array())),
            _ => None,
        }
    }

    /// The zero/default value for a data type, if the type carries values.
    #[must_use]
    pub fn default_for(ty: DataType) -> Option<Value> {
        match ty {
            DataType::Boolean => Some(Value::Boolean(false)),
            DataType::Integer => Some(Value::Integer(0)),
            DataType::Float => Some(Value::Float(0.0)),
            DataType::Vector2 => Some(Value::Vector2(Vec2::ZERO)),
            DataType::Vector3 => Some(Value::Vector3(Vec3::ZERO)),
            DataType::Vector4 => Some(Value::Vector4(Vec4::ZERO)),
            DataType::Color2 => Some(Value::Color2(Vec2::ZERO)),
            DataType::Color3 => Some(Value::Color3(Vec3::ZERO)),
            DataType::Color4 => Some(Value::Color4(Vec4::ZERO)),
            DataType::Matrix44 => Some(Value::Matrix44(Mat4::IDENTITY)),
            DataType::String => Some(Value::String(String::new())),
            DataType::Filename => Some(Value::Filename(String::new())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_reports_its_type() {
        assert_eq!(Value::Float(1.0).ty(), DataType::Float);
        assert_eq!(Value::Color3(Vec3::ONE).ty(), DataType::Color3);
        assert_eq!(Value::Filename("a.png".into()).ty(), DataType::Filename);
    }

    #[test]
    fn components_only_for_aggregates() {
        assert!(Value::Float(1.0).components().is_none());
        let comps = Value::Color3(Vec3::new(0.1, 0.2, 0.3)).components().unwrap();
        assert_eq!(comps.as_slice(), &[0.1, 0.2, 0.3]);
        assert_eq!(Value::Matrix44(Mat4::IDENTITY).components().unwrap().len(), 16);
    }

    #[test]
    fn closure_types_have_no_default_value() {
        assert!(Value::default_for(DataType::Surface).is_none());
        assert!(Value::default_for(DataType::Bsdf).is_none());
        assert_eq!(Value::default_for(DataType::Integer), Some(Value::Integer(0)));
    }
}
