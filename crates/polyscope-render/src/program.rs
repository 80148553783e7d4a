//! Backend seam: shader programs, program slots, and the backend trait.

use std::fmt;

use crate::buffer::{AttributeData, UniformValue};
use crate::color_maps::ColorMap;
use crate::error::{RenderError, RenderResult};
use crate::shader::ComposedShader;

/// A program built by a backend from a [`ComposedShader`].
///
/// Attributes are per-instance and stay bound until the program is dropped;
/// uniforms are set before every draw.
pub trait ShaderProgram: Send + Sync {
    /// Label of the variant this program was built from.
    fn label(&self) -> &str;

    /// Uploads per-instance attribute data.
    fn set_attribute(&mut self, name: &str, data: AttributeData) -> RenderResult<()>;

    /// Sets a uniform value.
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()>;

    /// Binds a color map as the named texture.
    fn set_texture_from_colormap(&mut self, texture: &str, color_map: &ColorMap) -> RenderResult<()>;

    /// Binds the matcap textures of a material.
    fn set_material(&mut self, material: &str) -> RenderResult<()>;

    /// Issues the draw call.
    fn draw(&mut self) -> RenderResult<()>;
}

/// Compiles composed shaders into programs.
pub trait RenderBackend {
    fn request_program(&mut self, shader: &ComposedShader) -> RenderResult<Box<dyn ShaderProgram>>;
}

/// Lazily-built program owned by exactly one structure or quantity.
#[derive(Default)]
pub enum ProgramSlot {
    /// Nothing built yet, or invalidated since the last build.
    #[default]
    Absent,
    /// A live program.
    Built(Box<dyn ShaderProgram>),
}

impl ProgramSlot {
    /// Returns the program, building it first if the slot is absent.
    pub fn get_or_build<F>(&mut self, build: F) -> RenderResult<&mut dyn ShaderProgram>
    where
        F: FnOnce() -> RenderResult<Box<dyn ShaderProgram>>,
    {
        if matches!(self, Self::Absent) {
            let program = build()?;
            log::debug!("built program '{}'", program.label());
            *self = Self::Built(program);
        }
        match self {
            Self::Built(program) => Ok(program.as_mut()),
            Self::Absent => Err(RenderError::ProgramBuildFailed(
                "program slot empty after build".into(),
            )),
        }
    }

    /// Drops the program so the next draw rebuilds it.
    pub fn invalidate(&mut self) {
        if let Self::Built(program) = std::mem::take(self) {
            log::debug!("dropped program '{}'", program.label());
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built(_))
    }

    /// The live program, if any.
    pub fn get_mut(&mut self) -> Option<&mut dyn ShaderProgram> {
        match self {
            Self::Built(program) => Some(program.as_mut()),
            Self::Absent => None,
        }
    }
}

impl fmt::Debug for ProgramSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Built(program) => f.debug_tuple("Built").field(&program.label()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    impl ShaderProgram for Nop {
        fn label(&self) -> &str {
            "nop"
        }
        fn set_attribute(&mut self, _: &str, _: AttributeData) -> RenderResult<()> {
            Ok(())
        }
        fn set_uniform(&mut self, _: &str, _: UniformValue) -> RenderResult<()> {
            Ok(())
        }
        fn set_texture_from_colormap(&mut self, _: &str, _: &ColorMap) -> RenderResult<()> {
            Ok(())
        }
        fn set_material(&mut self, _: &str) -> RenderResult<()> {
            Ok(())
        }
        fn draw(&mut self) -> RenderResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_slot_builds_once() {
        let mut slot = ProgramSlot::default();
        let mut builds = 0;
        for _ in 0..3 {
            slot.get_or_build(|| {
                builds += 1;
                Ok(Box::new(Nop))
            })
            .unwrap();
        }
        assert_eq!(builds, 1);
        assert!(slot.is_built());

        slot.invalidate();
        assert!(!slot.is_built());
        assert!(slot.get_mut().is_none());
    }

    #[test]
    fn test_failed_build_leaves_slot_absent() {
        let mut slot = ProgramSlot::Absent;
        let result = slot.get_or_build(|| Err(RenderError::ProgramBuildFailed("boom".into())));
        assert!(result.is_err());
        assert!(!slot.is_built());
        assert_eq!(format!("{slot:?}"), "Absent");
    }
}
