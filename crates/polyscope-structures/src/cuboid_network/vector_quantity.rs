//! Vector quantities on cuboid network nodes or edges.

use std::any::Any;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::Vec3;
use polyscope_core::{
    PersistentCache, PersistentValue, PolyscopeError, Quantity, QuantityKind, Result, ScaledValue,
    VectorMapper, VectorType,
};
use polyscope_render::{
    AttributeData, MaterialRegistry, ProgramSlot, ProgramVariant, RenderContext, RenderResult,
    DEFAULT_MATERIAL,
};

use super::geometry::CuboidGeometry;
use super::pick::InfoRow;
use super::quantity::{quantity_key, CuboidNetworkQuantity, CuboidView, ElementDomain};

const DEFAULT_VECTOR_COLOR: Vec3 = Vec3::new(0.8, 0.2, 0.2);

fn default_length(vector_type: VectorType) -> ScaledValue<f32> {
    match vector_type {
        VectorType::Standard => ScaledValue::relative(0.02),
        VectorType::Ambient => ScaledValue::absolute(1.0),
    }
}

/// A vector per node or per edge, drawn as arrows.
///
/// Node vectors are rooted at the nodes, edge vectors at the edge midpoints.
pub struct CuboidVectorQuantity {
    name: String,
    structure_name: String,
    domain: ElementDomain,
    vectors: Vec<Vec3>,
    roots: Vec<Vec3>,
    mapper: VectorMapper,
    length: PersistentValue<ScaledValue<f32>>,
    radius: PersistentValue<ScaledValue<f32>>,
    color: PersistentValue<Vec3>,
    material: PersistentValue<String>,
    enabled: bool,
    program: ProgramSlot,
}

impl CuboidVectorQuantity {
    /// Creates a vector quantity. `vectors` must hold one entry per element of `domain`.
    pub fn new(
        name: impl Into<String>,
        structure_name: impl Into<String>,
        domain: ElementDomain,
        vectors: Vec<Vec3>,
        vector_type: VectorType,
        view: &CuboidView<'_>,
    ) -> Result<Self> {
        let expected = domain.len(view.geometry);
        if vectors.len() != expected {
            return Err(PolyscopeError::SizeMismatch {
                expected,
                actual: vectors.len(),
            });
        }

        let name = name.into();
        let structure_name = structure_name.into();
        let key = |field: &str| quantity_key(&structure_name, &name, field);
        let length = PersistentValue::new(key("length"), default_length(vector_type));
        let radius = PersistentValue::new(key("radius"), ScaledValue::relative(0.0025));
        let color = PersistentValue::new(key("color"), DEFAULT_VECTOR_COLOR);
        let material = PersistentValue::new(key("material"), DEFAULT_MATERIAL.to_string());

        let mut quantity = Self {
            mapper: VectorMapper::new(&vectors, vector_type),
            name,
            structure_name,
            domain,
            vectors,
            roots: Vec::new(),
            length,
            radius,
            color,
            material,
            enabled: false,
            program: ProgramSlot::default(),
        };
        quantity.compute_roots(view.geometry);
        Ok(quantity)
    }

    fn compute_roots(&mut self, geometry: &CuboidGeometry) {
        self.roots = match self.domain {
            ElementDomain::Node => geometry.nodes().to_vec(),
            ElementDomain::Edge => (0..geometry.num_edges())
                .map(|e| geometry.edge_midpoint(e))
                .collect(),
        };
    }

    pub fn vectors(&self) -> &[Vec3] {
        &self.vectors
    }

    /// Where each arrow starts, in the network's object space.
    pub fn roots(&self) -> &[Vec3] {
        &self.roots
    }

    pub fn vector_type(&self) -> VectorType {
        self.mapper.vector_type()
    }

    pub fn mapper(&self) -> &VectorMapper {
        &self.mapper
    }

    /// Arrow length multiplier.
    pub fn length(&self) -> ScaledValue<f32> {
        *self.length.get()
    }

    pub fn set_length(&mut self, length: f32, relative: bool) -> &mut Self {
        self.length.set(ScaledValue::new(length, relative));
        self
    }

    pub fn radius(&self) -> ScaledValue<f32> {
        *self.radius.get()
    }

    pub fn set_radius(&mut self, radius: f32, relative: bool) -> &mut Self {
        self.radius.set(ScaledValue::new(radius, relative));
        self
    }

    pub fn color(&self) -> Vec3 {
        *self.color.get()
    }

    pub fn set_color(&mut self, color: Vec3) -> &mut Self {
        self.color.set(color);
        self
    }

    pub fn material(&self) -> &str {
        self.material.get()
    }

    /// Changes the arrow material; unknown names are rejected.
    pub fn set_material(&mut self, material: &str) -> Result<&mut Self> {
        if !MaterialRegistry::builtin().has(material) {
            return Err(PolyscopeError::UnknownMaterial(material.to_string()));
        }
        self.material.set(material.to_string());
        self.program.invalidate();
        Ok(self)
    }

    /// Writes every non-zero vector with its root, one per line, after `#` headers.
    ///
    /// Relative radius and length are resolved against `length_scale`, the
    /// owning network's current length scale.
    pub fn write_to<W: Write>(&self, out: &mut W, length_scale: f32) -> Result<()> {
        writeln!(
            out,
            "#Vectors written by polyscope at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(out, "#quantity {} on {}", self.name, self.structure_name)?;
        writeln!(
            out,
            "#displayradius {}",
            self.radius.get().as_absolute(length_scale)
        )?;
        writeln!(
            out,
            "#displaylength {}",
            self.length.get().as_absolute(length_scale)
        )?;
        for (root, v) in self.roots.iter().zip(&self.vectors) {
            if *v != Vec3::ZERO {
                writeln!(out, "{} {} {} {} {} {}", root.x, root.y, root.z, v.x, v.y, v.z)?;
            }
        }
        Ok(())
    }

    fn vector_row(&self, index: usize) -> Option<InfoRow> {
        self.vectors.get(index).map(|v| {
            InfoRow::new(self.name.clone(), format!("{v}, magnitude {}", v.length()))
        })
    }

    /// Writes the vectors to a file; see [`Self::write_to`].
    pub fn write_to_file(&self, path: impl AsRef<Path>, length_scale: f32) -> Result<()> {
        let path = path.as_ref();
        log::info!("writing vector quantity '{}' to {}", self.name, path.display());
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out, length_scale)?;
        out.flush()?;
        Ok(())
    }
}

impl Quantity for CuboidVectorQuantity {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn structure_name(&self) -> &str {
        &self.structure_name
    }

    fn kind(&self) -> QuantityKind {
        QuantityKind::Vector
    }

    fn nice_name(&self) -> String {
        format!("{} ({} vector)", self.name, self.domain.as_str())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_dominant(&self) -> bool {
        false
    }

    fn refresh(&mut self) {
        self.program.invalidate();
    }

    fn data_size(&self) -> usize {
        self.vectors.len()
    }
}

impl CuboidNetworkQuantity for CuboidVectorQuantity {
    fn domain(&self) -> ElementDomain {
        self.domain
    }

    fn draw(&mut self, view: &CuboidView<'_>, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let roots = &self.roots;
        let mapper = &self.mapper;
        let vectors = &self.vectors;
        let material = self.material.get();

        let program = self.program.get_or_build(|| {
            let mut program = ctx.build_program(ProgramVariant::VectorArrow, view.depth_write)?;
            program.set_attribute("a_vector_root", AttributeData::Vec3(roots.clone()))?;
            program.set_attribute(
                "a_vector",
                AttributeData::Vec3(vectors.iter().map(|v| mapper.map(*v)).collect()),
            )?;
            program.set_material(material)?;
            Ok(program)
        })?;
        ctx.set_view_uniforms(program, view.transform)?;
        program.set_uniform("u_radius", self.radius.get().as_absolute(view.length_scale).into())?;
        program.set_uniform(
            "u_lengthMult",
            self.length.get().as_absolute(view.length_scale).into(),
        )?;
        program.set_uniform("u_baseColor", (*self.color.get()).into())?;
        program.draw()
    }

    fn node_info(&self, node: usize) -> Option<InfoRow> {
        match self.domain {
            ElementDomain::Node => self.vector_row(node),
            ElementDomain::Edge => None,
        }
    }

    fn edge_info(&self, edge: usize) -> Option<InfoRow> {
        match self.domain {
            ElementDomain::Edge => self.vector_row(edge),
            ElementDomain::Node => None,
        }
    }

    fn geometry_changed(&mut self, view: &CuboidView<'_>) {
        self.program.invalidate();
        self.compute_roots(view.geometry);
    }

    fn orientations_changed(&mut self) {}

    fn invalidate_programs(&mut self) {
        self.program.invalidate();
    }

    fn load_persistent(&mut self, cache: &PersistentCache) {
        self.length.load_from(cache);
        self.radius.load_from(cache);
        self.color.load_from(cache);
        self.material.load_from(cache);
        if !MaterialRegistry::builtin().has(self.material.get()) {
            log::warn!(
                "persisted material '{}' for '{}' is unknown, using '{DEFAULT_MATERIAL}'",
                self.material.get(),
                self.name
            );
            self.material =
                PersistentValue::new(self.material.key().to_string(), DEFAULT_MATERIAL.to_string());
        }
        self.program.invalidate();
    }

    fn save_persistent(&self, cache: &mut PersistentCache) {
        self.length.save_to(cache);
        self.radius.save_to(cache);
        self.color.save_to(cache);
        self.material.save_to(cache);
    }
}
