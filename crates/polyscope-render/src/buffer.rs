//! Typed attribute and uniform data handed to shader programs.

use std::fmt;

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Type of a shader attribute, uniform, or varying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderDataType {
    Float,
    UInt,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl ShaderDataType {
    /// WGSL spelling of the type.
    #[must_use]
    pub fn wgsl_name(self) -> &'static str {
        match self {
            Self::Float => "f32",
            Self::UInt => "u32",
            Self::Vec2 => "vec2<f32>",
            Self::Vec3 => "vec3<f32>",
            Self::Vec4 => "vec4<f32>",
            Self::Mat4 => "mat4x4<f32>",
        }
    }
}

impl fmt::Display for ShaderDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wgsl_name())
    }
}

/// Per-instance attribute data.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    Float(Vec<f32>),
    Vec3(Vec<Vec3>),
    Vec4(Vec<Vec4>),
}

impl AttributeData {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
        }
    }

    /// Returns true if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type.
    #[must_use]
    pub fn data_type(&self) -> ShaderDataType {
        match self {
            Self::Float(_) => ShaderDataType::Float,
            Self::Vec3(_) => ShaderDataType::Vec3,
            Self::Vec4(_) => ShaderDataType::Vec4,
        }
    }

    /// Raw bytes suitable for uploading into a vertex buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Float(v) => bytemuck::cast_slice(v),
            Self::Vec3(v) => bytemuck::cast_slice(v),
            Self::Vec4(v) => bytemuck::cast_slice(v),
        }
    }
}

impl From<Vec<f32>> for AttributeData {
    fn from(v: Vec<f32>) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<Vec3>> for AttributeData {
    fn from(v: Vec<Vec3>) -> Self {
        Self::Vec3(v)
    }
}

/// A single uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    UInt(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// Value type.
    #[must_use]
    pub fn data_type(&self) -> ShaderDataType {
        match self {
            Self::Float(_) => ShaderDataType::Float,
            Self::UInt(_) => ShaderDataType::UInt,
            Self::Vec2(_) => ShaderDataType::Vec2,
            Self::Vec3(_) => ShaderDataType::Vec3,
            Self::Vec4(_) => ShaderDataType::Vec4,
            Self::Mat4(_) => ShaderDataType::Mat4,
        }
    }

    /// Raw bytes of the value.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Float(v) => bytemuck::bytes_of(v),
            Self::UInt(v) => bytemuck::bytes_of(v),
            Self::Vec2(v) => bytemuck::bytes_of(v),
            Self::Vec3(v) => bytemuck::bytes_of(v),
            Self::Vec4(v) => bytemuck::bytes_of(v),
            Self::Mat4(v) => bytemuck::bytes_of(v),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_bytes() {
        let data = AttributeData::from(vec![Vec3::ONE, Vec3::ZERO]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.data_type(), ShaderDataType::Vec3);
        assert_eq!(data.as_bytes().len(), 2 * 12);
    }

    #[test]
    fn test_uniform_bytes() {
        assert_eq!(UniformValue::from(Mat4::IDENTITY).as_bytes().len(), 64);
        assert_eq!(UniformValue::Float(1.0).data_type().wgsl_name(), "f32");
    }
}
