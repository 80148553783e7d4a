//! A recording backend that needs no GPU.
//!
//! Programs built by [`HeadlessBackend`] check every call against the composed
//! shader's declarations and append what happened to a shared event log, so the
//! whole draw path can be exercised and inspected in tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use crate::buffer::{AttributeData, ShaderDataType, UniformValue};
use crate::color_maps::ColorMap;
use crate::error::{RenderError, RenderResult};
use crate::materials::MaterialRegistry;
use crate::program::{RenderBackend, ShaderProgram};
use crate::shader::ComposedShader;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Build { program: String },
    Attribute { program: String, name: String, data: AttributeData },
    Uniform { program: String, name: String, value: UniformValue },
    Texture { program: String, name: String, color_map: String },
    Material { program: String, material: String },
    Draw { program: String, instances: usize, vertices: u32 },
}

type EventLog = Arc<Mutex<Vec<BackendEvent>>>;

fn record(log: &EventLog, event: BackendEvent) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(event);
}

/// Backend that records instead of rendering.
///
/// Clones share the same event log.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    log: EventLog,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of every event so far.
    pub fn events(&self) -> Vec<BackendEvent> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets recorded events.
    pub fn clear(&self) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Labels of programs built so far, in build order.
    pub fn builds(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BackendEvent::Build { program } => Some(program),
                _ => None,
            })
            .collect()
    }

    /// How many times a program with this label was built.
    pub fn build_count(&self, label: &str) -> usize {
        self.builds().iter().filter(|l| *l == label).count()
    }

    /// Labels of programs drawn so far, in draw order.
    pub fn draws(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BackendEvent::Draw { program, .. } => Some(program),
                _ => None,
            })
            .collect()
    }

    /// The last data uploaded to an attribute on a program with this label.
    pub fn last_attribute(&self, label: &str, name: &str) -> Option<AttributeData> {
        self.events().into_iter().rev().find_map(|e| match e {
            BackendEvent::Attribute {
                program,
                name: n,
                data,
            } if program == label && n == name => Some(data),
            _ => None,
        })
    }

    /// How many times an attribute was uploaded on programs with this label.
    pub fn attribute_count(&self, label: &str, name: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| {
                matches!(e, BackendEvent::Attribute { program, name: n, .. }
                    if program == label && n == name)
            })
            .count()
    }

    /// The last value set for a uniform on a program with this label.
    pub fn last_uniform(&self, label: &str, name: &str) -> Option<UniformValue> {
        self.events().into_iter().rev().find_map(|e| match e {
            BackendEvent::Uniform {
                program,
                name: n,
                value,
            } if program == label && n == name => Some(value),
            _ => None,
        })
    }
}

impl RenderBackend for HeadlessBackend {
    fn request_program(&mut self, shader: &ComposedShader) -> RenderResult<Box<dyn ShaderProgram>> {
        record(
            &self.log,
            BackendEvent::Build {
                program: shader.label().to_string(),
            },
        );
        Ok(Box::new(HeadlessProgram {
            shader: shader.clone(),
            attributes: HashMap::new(),
            uniforms: HashSet::new(),
            textures: HashSet::new(),
            log: Arc::clone(&self.log),
        }))
    }
}

struct HeadlessProgram {
    shader: ComposedShader,
    attributes: HashMap<String, usize>,
    uniforms: HashSet<String>,
    textures: HashSet<String>,
    log: EventLog,
}

impl HeadlessProgram {
    fn check_type(&self, name: &str, expected: ShaderDataType, actual: ShaderDataType) -> RenderResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(RenderError::TypeMismatch {
                program: self.shader.label().to_string(),
                name: name.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    fn missing(&self, name: &str) -> RenderError {
        RenderError::MissingInput {
            program: self.shader.label().to_string(),
            name: name.to_string(),
        }
    }
}

impl ShaderProgram for HeadlessProgram {
    fn label(&self) -> &str {
        self.shader.label()
    }

    fn set_attribute(&mut self, name: &str, data: AttributeData) -> RenderResult<()> {
        let decl = self
            .shader
            .attribute(name)
            .ok_or_else(|| RenderError::UnknownAttribute {
                program: self.shader.label().to_string(),
                name: name.to_string(),
            })?;
        self.check_type(name, decl.data_type, data.data_type())?;
        self.attributes.insert(name.to_string(), data.len());
        record(
            &self.log,
            BackendEvent::Attribute {
                program: self.shader.label().to_string(),
                name: name.to_string(),
                data,
            },
        );
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()> {
        let decl = self
            .shader
            .uniform(name)
            .ok_or_else(|| RenderError::UnknownUniform {
                program: self.shader.label().to_string(),
                name: name.to_string(),
            })?;
        self.check_type(name, decl.data_type, value.data_type())?;
        self.uniforms.insert(name.to_string());
        record(
            &self.log,
            BackendEvent::Uniform {
                program: self.shader.label().to_string(),
                name: name.to_string(),
                value,
            },
        );
        Ok(())
    }

    fn set_texture_from_colormap(&mut self, texture: &str, color_map: &ColorMap) -> RenderResult<()> {
        if !self.shader.has_texture(texture) {
            return Err(RenderError::UnknownTexture {
                program: self.shader.label().to_string(),
                name: texture.to_string(),
            });
        }
        self.textures.insert(texture.to_string());
        record(
            &self.log,
            BackendEvent::Texture {
                program: self.shader.label().to_string(),
                name: texture.to_string(),
                color_map: color_map.name.clone(),
            },
        );
        Ok(())
    }

    fn set_material(&mut self, material: &str) -> RenderResult<()> {
        if !MaterialRegistry::builtin().has(material) {
            return Err(RenderError::UnknownMaterial(material.to_string()));
        }
        if self.shader.has_texture("t_matcap") {
            self.textures.insert("t_matcap".to_string());
        }
        record(
            &self.log,
            BackendEvent::Material {
                program: self.shader.label().to_string(),
                material: material.to_string(),
            },
        );
        Ok(())
    }

    fn draw(&mut self) -> RenderResult<()> {
        let mut instances: Option<(&str, usize)> = None;
        for decl in self.shader.attributes() {
            let len = *self
                .attributes
                .get(&decl.name)
                .ok_or_else(|| self.missing(&decl.name))?;
            match instances {
                None => instances = Some((decl.name.as_str(), len)),
                Some((_, expected)) if expected != len => {
                    return Err(RenderError::AttributeLengthMismatch {
                        program: self.shader.label().to_string(),
                        name: decl.name.clone(),
                        expected,
                        actual: len,
                    });
                }
                Some(_) => {}
            }
        }
        if let Some(decl) = self
            .shader
            .uniforms()
            .iter()
            .find(|d| !self.uniforms.contains(&d.name))
        {
            return Err(self.missing(&decl.name));
        }
        if let Some(texture) = self
            .shader
            .textures()
            .iter()
            .find(|t| !self.textures.contains(*t))
        {
            return Err(self.missing(texture));
        }

        record(
            &self.log,
            BackendEvent::Draw {
                program: self.shader.label().to_string(),
                instances: instances.map_or(0, |(_, n)| n),
                vertices: self.shader.vertices_per_instance(),
            },
        );
        Ok(())
    }
}
