//! Rendering seam for polyscope-rs.
//!
//! This crate sits between structures and whatever actually talks to the GPU:
//! - Shader composition from WGSL base templates and rules, validated at registration
//! - The built-in cuboid network program variants
//! - [`ProgramSlot`]s that build programs lazily and drop them on invalidation
//! - The [`RenderBackend`] / [`ShaderProgram`] traits a real backend implements
//! - A recording [`HeadlessBackend`] for running the draw path without a GPU
//! - Color maps, materials, and pick color encoding

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod buffer;
pub mod color_maps;
pub mod cuboid_programs;
pub mod error;
pub mod headless;
pub mod materials;
pub mod pick;
pub mod program;
pub mod shader;

use glam::{Mat4, Vec4};
use polyscope_core::PickAllocator;

pub use buffer::{AttributeData, ShaderDataType, UniformValue};
pub use color_maps::{ColorMap, ColorMapRegistry};
pub use cuboid_programs::{ProgramVariant, PICK_END_FRACTION};
pub use error::{RenderError, RenderResult, ShaderRuleError};
pub use headless::{BackendEvent, HeadlessBackend};
pub use materials::{Material, MaterialRegistry, DEFAULT_MATERIAL};
pub use pick::{color_to_index, index_to_color, index_to_vec, vec_to_index, MAX_PICK_INDEX};
pub use program::{ProgramSlot, RenderBackend, ShaderProgram};
pub use shader::{
    ComposedShader, ReplacementDefaults, ShaderDecl, ShaderLibrary, ShaderRule, ShaderTemplate,
};

/// Camera state for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParameters {
    /// World to view transform.
    pub view: Mat4,
    /// View to clip transform.
    pub projection: Mat4,
    /// Viewport as `(x, y, width, height)` in pixels.
    pub viewport: Vec4,
}

impl Default for ViewParameters {
    fn default() -> Self {
        Self {
            view: Mat4::look_at_rh(glam::Vec3::new(0.0, 0.0, 3.0), glam::Vec3::ZERO, glam::Vec3::Y),
            projection: Mat4::perspective_rh(45_f32.to_radians(), 800.0 / 600.0, 0.01, 100.0),
            viewport: Vec4::new(0.0, 0.0, 800.0, 600.0),
        }
    }
}

/// Render context passed to structures during drawing.
pub struct RenderContext<'a> {
    /// Builds programs.
    pub backend: &'a mut dyn RenderBackend,
    /// Composed program variants.
    pub shaders: &'a ShaderLibrary,
    /// The current camera.
    pub view: &'a ViewParameters,
    /// Global pick index ranges.
    pub pick: &'a mut PickAllocator,
}

impl RenderContext<'_> {
    /// Builds a program for one of the built-in variants.
    pub fn build_program(
        &mut self,
        variant: ProgramVariant,
        depth_write: bool,
    ) -> RenderResult<Box<dyn ShaderProgram>> {
        let shader = self.shaders.program(variant, depth_write)?;
        self.backend.request_program(shader)
    }

    /// Sets the camera uniforms every template declares.
    pub fn set_view_uniforms(&self, program: &mut dyn ShaderProgram, model: Mat4) -> RenderResult<()> {
        program.set_uniform("u_modelView", (self.view.view * model).into())?;
        program.set_uniform("u_projMatrix", self.view.projection.into())?;
        program.set_uniform("u_invProjMatrix", self.view.projection.inverse().into())?;
        program.set_uniform("u_viewport", self.view.viewport.into())
    }
}
