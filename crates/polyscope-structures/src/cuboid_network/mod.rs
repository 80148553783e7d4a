//! Cuboid network structure.
//!
//! A cuboid network is a set of nodes joined by edges, where each edge is drawn
//! as an oriented rectangular box. The box cross-section spans `width` along
//! the binormal and `height` along the normal; the normal comes from the
//! edge's up direction made perpendicular to the edge.

mod color_quantity;
mod geometry;
mod pick;
mod quantity;
mod scalar_quantity;
mod vector_quantity;

use std::io::Write;
use std::path::Path;

use glam::{Mat4, Vec2, Vec3};
use polyscope_core::{
    unique_prefix, DataType, PersistentCache, PersistentValue, PickAllocator, PolyscopeError,
    Quantity, Result, ScaledValue, Structure, VectorType,
};
use polyscope_render::{
    index_to_vec, AttributeData, MaterialRegistry, ProgramSlot, ProgramVariant, RenderContext,
    RenderResult, DEFAULT_MATERIAL,
};

pub use color_quantity::CuboidColorQuantity;
pub use geometry::{
    lift_2d, line_edges, loop_edges, CuboidGeometry, EdgeGeometryBuffers, NodeGeometryBuffers,
    DEFAULT_ORIENTATION,
};
pub use pick::{decode_local, resolve_edge_hit, CuboidPickElement, CuboidPickInfo, InfoRow};
pub use quantity::{CuboidNetworkQuantity, CuboidQuantity, CuboidView, ElementDomain};
pub use scalar_quantity::{default_color_map, CuboidScalarQuantity};
pub use vector_quantity::CuboidVectorQuantity;

use quantity::draw_cuboid_program;

/// Registry type name of cuboid networks.
pub const CUBOID_NETWORK_TYPE: &str = "Cuboid Network";

const DEFAULT_COLOR: Vec3 = Vec3::new(0.2, 0.5, 0.8);

/// Persisted drawing parameters of one network.
struct CuboidNetworkParams {
    color: PersistentValue<Vec3>,
    height: PersistentValue<ScaledValue<f32>>,
    width: PersistentValue<ScaledValue<f32>>,
    material: PersistentValue<String>,
    depth_write: bool,
}

impl CuboidNetworkParams {
    fn new(name: &str) -> Self {
        let prefix = unique_prefix(CUBOID_NETWORK_TYPE, name);
        Self {
            color: PersistentValue::new(format!("{prefix}color"), DEFAULT_COLOR),
            height: PersistentValue::new(format!("{prefix}height"), ScaledValue::relative(0.005)),
            width: PersistentValue::new(format!("{prefix}width"), ScaledValue::relative(0.1)),
            material: PersistentValue::new(format!("{prefix}material"), DEFAULT_MATERIAL.to_string()),
            depth_write: true,
        }
    }

    fn view<'a>(&'a self, geometry: &'a CuboidGeometry, transform: Mat4) -> CuboidView<'a> {
        let length_scale = geometry.length_scale(transform);
        CuboidView {
            geometry,
            transform,
            length_scale,
            width: self.width.get().as_absolute(length_scale),
            height: self.height.get().as_absolute(length_scale),
            material: self.material.get(),
            depth_write: self.depth_write,
        }
    }

    fn load(&mut self, cache: &PersistentCache) {
        self.color.load_from(cache);
        self.height.load_from(cache);
        self.width.load_from(cache);
        self.material.load_from(cache);
        if !MaterialRegistry::builtin().has(self.material.get()) {
            log::warn!(
                "persisted material '{}' is unknown, using '{DEFAULT_MATERIAL}'",
                self.material.get()
            );
            self.material = PersistentValue::new(
                self.material.key().to_string(),
                DEFAULT_MATERIAL.to_string(),
            );
        }
    }

    fn save(&self, cache: &mut PersistentCache) {
        self.color.save_to(cache);
        self.height.save_to(cache);
        self.width.save_to(cache);
        self.material.save_to(cache);
    }
}

/// A network of nodes joined by box-shaped edges.
pub struct CuboidNetwork {
    name: String,
    geometry: CuboidGeometry,
    configuration_errors: Vec<PolyscopeError>,

    enabled: bool,
    transform: Mat4,
    params: CuboidNetworkParams,
    quantities: Vec<CuboidQuantity>,

    // Programs
    edge_program: ProgramSlot,
    edge_pick_program: ProgramSlot,
    node_pick_program: ProgramSlot,
    pick_start: Option<u64>,
}

impl CuboidNetwork {
    /// Creates a network from nodes, edges, and one up direction per edge.
    ///
    /// Edges with out-of-range node indices and a mismatched orientation count
    /// are logged and recorded in [`Self::configuration_errors`]; the network
    /// is still built.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<Vec3>,
        edges: Vec<[u32; 2]>,
        orientations: Vec<Vec3>,
    ) -> Self {
        let name = name.into();
        let (geometry, configuration_errors) =
            CuboidGeometry::new(&name, nodes, edges, orientations);
        for err in &configuration_errors {
            log::error!("{CUBOID_NETWORK_TYPE} '{name}': {err}");
        }

        Self {
            params: CuboidNetworkParams::new(&name),
            name,
            geometry,
            configuration_errors,
            enabled: true,
            transform: Mat4::IDENTITY,
            quantities: Vec::new(),
            edge_program: ProgramSlot::default(),
            edge_pick_program: ProgramSlot::default(),
            node_pick_program: ProgramSlot::default(),
            pick_start: None,
        }
    }

    /// Creates a network as a connected line (0-1-2-3-...).
    pub fn new_line(name: impl Into<String>, nodes: Vec<Vec3>, orientations: Vec<Vec3>) -> Self {
        let edges = line_edges(nodes.len());
        Self::new(name, nodes, edges, orientations)
    }

    /// Creates a network as a closed loop (0-1-2-...-n-0).
    pub fn new_loop(name: impl Into<String>, nodes: Vec<Vec3>, orientations: Vec<Vec3>) -> Self {
        let edges = loop_edges(nodes.len());
        Self::new(name, nodes, edges, orientations)
    }

    /// Creates a network in the XY plane; every edge points its normal along +Z.
    pub fn new_2d(name: impl Into<String>, nodes: &[Vec2], edges: Vec<[u32; 2]>) -> Self {
        let orientations = vec![DEFAULT_ORIENTATION; edges.len()];
        Self::new(name, lift_2d(nodes), edges, orientations)
    }

    /// Planar version of [`Self::new_line`].
    pub fn new_line_2d(name: impl Into<String>, nodes: &[Vec2]) -> Self {
        Self::new_2d(name, nodes, line_edges(nodes.len()))
    }

    /// Planar version of [`Self::new_loop`].
    pub fn new_loop_2d(name: impl Into<String>, nodes: &[Vec2]) -> Self {
        Self::new_2d(name, nodes, loop_edges(nodes.len()))
    }

    /// Returns the structure name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn geometry(&self) -> &CuboidGeometry {
        &self.geometry
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.geometry.num_nodes()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.geometry.num_edges()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Vec3] {
        self.geometry.nodes()
    }

    #[must_use]
    pub fn edges(&self) -> &[[u32; 2]] {
        self.geometry.edges()
    }

    #[must_use]
    pub fn orientations(&self) -> &[Vec3] {
        self.geometry.orientations()
    }

    #[must_use]
    pub fn node_degrees(&self) -> &[usize] {
        self.geometry.node_degrees()
    }

    /// Problems found while building the network.
    #[must_use]
    pub fn configuration_errors(&self) -> &[PolyscopeError] {
        &self.configuration_errors
    }

    // Parameters

    /// Gets the base color.
    #[must_use]
    pub fn color(&self) -> Vec3 {
        *self.params.color.get()
    }

    /// Sets the base color.
    pub fn set_color(&mut self, color: Vec3) -> &mut Self {
        self.params.color.set(color);
        self
    }

    /// Replaces the default color without marking it as user-set.
    pub fn set_default_color(&mut self, color: Vec3) -> &mut Self {
        self.params.color.set_default(color);
        self
    }

    /// Box extent along the binormal.
    #[must_use]
    pub fn width(&self) -> ScaledValue<f32> {
        *self.params.width.get()
    }

    pub fn set_width(&mut self, width: f32, relative: bool) -> &mut Self {
        self.params.width.set(ScaledValue::new(width, relative));
        self
    }

    /// Box extent along the normal.
    #[must_use]
    pub fn height(&self) -> ScaledValue<f32> {
        *self.params.height.get()
    }

    pub fn set_height(&mut self, height: f32, relative: bool) -> &mut Self {
        self.params.height.set(ScaledValue::new(height, relative));
        self
    }

    #[must_use]
    pub fn material(&self) -> &str {
        self.params.material.get()
    }

    /// Sets the material of the network and its cuboid quantities.
    pub fn set_material(&mut self, material: &str) -> Result<&mut Self> {
        if !MaterialRegistry::builtin().has(material) {
            return Err(PolyscopeError::UnknownMaterial(material.to_string()));
        }
        self.params.material.set(material.to_string());
        self.invalidate_all();
        Ok(self)
    }

    #[must_use]
    pub fn depth_write(&self) -> bool {
        self.params.depth_write
    }

    /// Toggles exact per-fragment depth; off is faster but occlusion is approximate.
    pub fn set_depth_write(&mut self, depth_write: bool) -> &mut Self {
        if self.params.depth_write != depth_write {
            self.params.depth_write = depth_write;
            self.invalidate_all();
        }
        self
    }

    // Geometry updates

    /// Moves the nodes. The count must match the current node count.
    pub fn update_node_positions(&mut self, positions: Vec<Vec3>) -> Result<()> {
        self.geometry.set_node_positions(positions)?;
        self.edge_program.invalidate();
        self.edge_pick_program.invalidate();
        self.node_pick_program.invalidate();
        let view = self.params.view(&self.geometry, self.transform);
        for quantity in &mut self.quantities {
            quantity.as_quantity_mut().geometry_changed(&view);
        }
        Ok(())
    }

    /// Replaces the per-edge up directions. The count must match the edge count.
    pub fn update_orientations(&mut self, orientations: Vec<Vec3>) -> Result<()> {
        self.geometry.set_orientations(orientations)?;
        self.edge_program.invalidate();
        self.edge_pick_program.invalidate();
        for quantity in &mut self.quantities {
            quantity.as_quantity_mut().orientations_changed();
        }
        Ok(())
    }

    fn invalidate_all(&mut self) {
        self.edge_program.invalidate();
        self.edge_pick_program.invalidate();
        self.node_pick_program.invalidate();
        for quantity in &mut self.quantities {
            quantity.as_quantity_mut().invalidate_programs();
        }
    }

    // Quantities

    fn insert_quantity(&mut self, quantity: CuboidQuantity) -> &mut CuboidQuantity {
        let existing = self
            .quantities
            .iter()
            .position(|q| q.name() == quantity.name());
        let index = if let Some(index) = existing {
            log::info!(
                "replacing quantity '{}' on {CUBOID_NETWORK_TYPE} '{}'",
                quantity.name(),
                self.name
            );
            self.quantities[index] = quantity;
            index
        } else {
            self.quantities.push(quantity);
            self.quantities.len() - 1
        };
        &mut self.quantities[index]
    }

    fn add_scalar(
        &mut self,
        name: String,
        domain: ElementDomain,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&mut CuboidQuantity> {
        let quantity =
            CuboidScalarQuantity::new(name, &self.name, domain, values, data_type, &self.geometry)?;
        Ok(self.insert_quantity(CuboidQuantity::Scalar(quantity)))
    }

    fn add_color(
        &mut self,
        name: String,
        domain: ElementDomain,
        colors: Vec<Vec3>,
    ) -> Result<&mut CuboidQuantity> {
        let quantity = CuboidColorQuantity::new(name, &self.name, domain, colors, &self.geometry)?;
        Ok(self.insert_quantity(CuboidQuantity::Color(quantity)))
    }

    fn add_vector(
        &mut self,
        name: String,
        domain: ElementDomain,
        vectors: Vec<Vec3>,
        vector_type: VectorType,
    ) -> Result<&mut CuboidQuantity> {
        let view = self.params.view(&self.geometry, self.transform);
        let quantity =
            CuboidVectorQuantity::new(name, &self.name, domain, vectors, vector_type, &view)?;
        Ok(self.insert_quantity(CuboidQuantity::Vector(quantity)))
    }

    /// Adds a scalar per node, blended along each edge when drawn.
    pub fn add_node_scalar_quantity(
        &mut self,
        name: impl Into<String>,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&mut CuboidQuantity> {
        self.add_scalar(name.into(), ElementDomain::Node, values, data_type)
    }

    /// Adds a scalar per edge.
    pub fn add_edge_scalar_quantity(
        &mut self,
        name: impl Into<String>,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&mut CuboidQuantity> {
        self.add_scalar(name.into(), ElementDomain::Edge, values, data_type)
    }

    /// Adds a color per node, blended along each edge when drawn.
    pub fn add_node_color_quantity(
        &mut self,
        name: impl Into<String>,
        colors: Vec<Vec3>,
    ) -> Result<&mut CuboidQuantity> {
        self.add_color(name.into(), ElementDomain::Node, colors)
    }

    /// Adds a color per edge.
    pub fn add_edge_color_quantity(
        &mut self,
        name: impl Into<String>,
        colors: Vec<Vec3>,
    ) -> Result<&mut CuboidQuantity> {
        self.add_color(name.into(), ElementDomain::Edge, colors)
    }

    /// Adds a vector per node, drawn from the node.
    pub fn add_node_vector_quantity(
        &mut self,
        name: impl Into<String>,
        vectors: Vec<Vec3>,
        vector_type: VectorType,
    ) -> Result<&mut CuboidQuantity> {
        self.add_vector(name.into(), ElementDomain::Node, vectors, vector_type)
    }

    /// Adds a vector per edge, drawn from the edge midpoint.
    pub fn add_edge_vector_quantity(
        &mut self,
        name: impl Into<String>,
        vectors: Vec<Vec3>,
        vector_type: VectorType,
    ) -> Result<&mut CuboidQuantity> {
        self.add_vector(name.into(), ElementDomain::Edge, vectors, vector_type)
    }

    /// Adds in-plane node vectors.
    pub fn add_node_vector_quantity_2d(
        &mut self,
        name: impl Into<String>,
        vectors: &[Vec2],
        vector_type: VectorType,
    ) -> Result<&mut CuboidQuantity> {
        self.add_node_vector_quantity(name, lift_2d(vectors), vector_type)
    }

    /// Adds in-plane edge vectors.
    pub fn add_edge_vector_quantity_2d(
        &mut self,
        name: impl Into<String>,
        vectors: &[Vec2],
        vector_type: VectorType,
    ) -> Result<&mut CuboidQuantity> {
        self.add_edge_vector_quantity(name, lift_2d(vectors), vector_type)
    }

    /// Gets a quantity by name.
    #[must_use]
    pub fn quantity(&self, name: &str) -> Option<&CuboidQuantity> {
        self.quantities.iter().find(|q| q.name() == name)
    }

    /// Gets a quantity by name for changing its parameters.
    ///
    /// Enable quantities through [`Self::set_quantity_enabled`] so only one
    /// dominant quantity is shown at a time.
    pub fn quantity_mut(&mut self, name: &str) -> Option<&mut CuboidQuantity> {
        self.quantities.iter_mut().find(|q| q.name() == name)
    }

    /// All quantities in insertion order.
    #[must_use]
    pub fn quantities(&self) -> &[CuboidQuantity] {
        &self.quantities
    }

    /// Shows or hides a quantity. Showing a scalar or color quantity hides any
    /// other scalar or color quantity.
    pub fn set_quantity_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let index = self
            .quantities
            .iter()
            .position(|q| q.name() == name)
            .ok_or_else(|| PolyscopeError::QuantityNotFound(name.to_string(), self.name.clone()))?;

        if enabled && self.quantities[index].is_dominant() {
            for (i, other) in self.quantities.iter_mut().enumerate() {
                if i != index && other.is_dominant() {
                    other.as_quantity_mut().set_enabled(false);
                }
            }
        }
        self.quantities[index].as_quantity_mut().set_enabled(enabled);
        Ok(())
    }

    /// Removes a quantity and drops its programs.
    pub fn remove_quantity(&mut self, name: &str, error_if_absent: bool) -> Result<()> {
        match self.quantities.iter().position(|q| q.name() == name) {
            Some(index) => {
                self.quantities.remove(index);
                Ok(())
            }
            None if error_if_absent => Err(PolyscopeError::QuantityNotFound(
                name.to_string(),
                self.name.clone(),
            )),
            None => Ok(()),
        }
    }

    /// Removes every quantity.
    pub fn remove_all_quantities(&mut self) {
        self.quantities.clear();
    }

    // Drawing

    /// Draws the network and its enabled quantities.
    ///
    /// The base boxes are skipped while a scalar or color quantity is enabled.
    pub fn draw(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let view = self.params.view(&self.geometry, self.transform);

        let dominant_shown = self
            .quantities
            .iter()
            .any(|q| q.is_enabled() && q.is_dominant());
        if !dominant_shown {
            let color = *self.params.color.get();
            draw_cuboid_program(
                &mut self.edge_program,
                ProgramVariant::BaseColor,
                &view,
                ctx,
                |_| Ok(()),
                |program| program.set_uniform("u_baseColor", color.into()),
            )?;
        }

        for quantity in &mut self.quantities {
            if quantity.is_enabled() {
                quantity.as_quantity_mut().draw(&view, ctx)?;
            }
        }
        Ok(())
    }

    /// Reserves this network's pick indices: nodes first, then edges.
    ///
    /// Pick programs are rebuilt if the range moved.
    pub fn prepare_pick(&mut self, pick: &mut PickAllocator) -> u64 {
        let count = (self.num_nodes() + self.num_edges()) as u64;
        let start = pick.request_range(CUBOID_NETWORK_TYPE, &self.name, count);
        if self.pick_start != Some(start) {
            self.edge_pick_program.invalidate();
            self.node_pick_program.invalidate();
            self.pick_start = Some(start);
        }
        start
    }

    /// Start of the pick range, once one is assigned.
    #[must_use]
    pub fn pick_start(&self) -> Option<u64> {
        self.pick_start
    }

    /// Draws nodes and edges into the pick buffer.
    pub fn draw_pick(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let start = self.prepare_pick(ctx.pick);
        let view = self.params.view(&self.geometry, self.transform);
        let geometry = &self.geometry;
        let num_nodes = geometry.num_nodes();

        if num_nodes > 0 {
            let program = self.node_pick_program.get_or_build(|| {
                let mut program = ctx.build_program(ProgramVariant::NodePick, view.depth_write)?;
                geometry.node_buffers().fill(program.as_mut())?;
                let colors = (0..num_nodes as u64).map(|i| index_to_vec(start + i)).collect();
                program.set_attribute("a_color", AttributeData::Vec3(colors))?;
                Ok(program)
            })?;
            ctx.set_view_uniforms(program, view.transform)?;
            program.set_uniform("u_pointRadius", view.width.into())?;
            program.draw()?;
        }

        if geometry.num_edges() > 0 {
            let program = self.edge_pick_program.get_or_build(|| {
                let mut program = ctx.build_program(ProgramVariant::EdgePick, view.depth_write)?;
                geometry.edge_buffers().fill(program.as_mut())?;

                let edge_base = start + num_nodes as u64;
                let mut tail_colors = Vec::with_capacity(geometry.num_edges());
                let mut tip_colors = Vec::with_capacity(geometry.num_edges());
                let mut edge_colors = Vec::with_capacity(geometry.num_edges());
                for (e, &[tail, tip]) in geometry.edges().iter().enumerate() {
                    let edge_color = index_to_vec(edge_base + e as u64);
                    // ends without a node report the edge itself
                    let end_color = |node: u32| {
                        if geometry.has_node(node) {
                            index_to_vec(start + u64::from(node))
                        } else {
                            edge_color
                        }
                    };
                    tail_colors.push(end_color(tail));
                    tip_colors.push(end_color(tip));
                    edge_colors.push(edge_color);
                }
                program.set_attribute("a_color_tail", AttributeData::Vec3(tail_colors))?;
                program.set_attribute("a_color_tip", AttributeData::Vec3(tip_colors))?;
                program.set_attribute("a_color_edge", AttributeData::Vec3(edge_colors))?;
                Ok(program)
            })?;
            ctx.set_view_uniforms(program, view.transform)?;
            program.set_uniform("u_wn", view.height.into())?;
            program.set_uniform("u_wb", view.width.into())?;
            program.draw()?;
        }
        Ok(())
    }

    /// Decodes a structure-local pick index.
    pub fn decode_local(&self, local: u64) -> Result<CuboidPickElement> {
        decode_local(&self.name, local, self.num_nodes(), self.num_edges())
    }

    /// Decodes a global pick index against this network's range.
    pub fn decode_global(&self, global: u64) -> Result<CuboidPickElement> {
        let start = self
            .pick_start
            .filter(|&start| global >= start)
            .ok_or_else(|| PolyscopeError::BadPickIndex {
                structure: self.name.clone(),
                index: global,
            })?;
        self.decode_local(global - start)
    }

    /// The element reported for a hit at `edge_param` along `edge`.
    pub fn resolve_edge_hit(&self, edge: usize, edge_param: f32) -> Result<CuboidPickElement> {
        let endpoints = self.edges().get(edge).ok_or_else(|| PolyscopeError::BadPickIndex {
            structure: self.name.clone(),
            index: (self.num_nodes() + edge) as u64,
        })?;
        Ok(resolve_edge_hit(edge, *endpoints, self.num_nodes(), edge_param))
    }

    // Export

    fn vector_quantity(&self, name: &str) -> Result<&CuboidVectorQuantity> {
        self.quantity(name)
            .and_then(CuboidQuantity::as_vector)
            .ok_or_else(|| PolyscopeError::QuantityNotFound(name.to_string(), self.name.clone()))
    }

    /// Writes a vector quantity as text; relative sizes in the headers use the
    /// network's current length scale.
    pub fn write_vector_quantity_to<W: Write>(&self, name: &str, out: &mut W) -> Result<()> {
        self.vector_quantity(name)?.write_to(out, self.length_scale())
    }

    /// Writes a vector quantity to a text file.
    pub fn write_vector_quantity(&self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        self.vector_quantity(name)?
            .write_to_file(path, self.length_scale())
    }

    /// Describes the element at a structure-local pick index.
    pub fn build_pick_info(&self, local: u64) -> Result<CuboidPickInfo> {
        let element = self.decode_local(local)?;
        let world = |p: Vec3| self.transform.transform_point3(p);

        let mut rows = Vec::new();
        match element {
            CuboidPickElement::Node(i) => {
                rows.push(InfoRow::new("node index", i.to_string()));
                rows.push(InfoRow::new("position", world(self.nodes()[i]).to_string()));
                rows.push(InfoRow::new("degree", self.node_degrees()[i].to_string()));
                rows.extend(self.quantities.iter().filter_map(|q| q.as_quantity().node_info(i)));
            }
            CuboidPickElement::Edge(e) => {
                let [tail, tip] = self.edges()[e];
                let (tail_pos, tip_pos) = self.geometry.edge_endpoints(e);
                rows.push(InfoRow::new("edge index", e.to_string()));
                rows.push(InfoRow::new("tail", format!("#{tail} {}", world(tail_pos))));
                rows.push(InfoRow::new("tip", format!("#{tip} {}", world(tip_pos))));
                rows.extend(self.quantities.iter().filter_map(|q| q.as_quantity().edge_info(e)));
            }
        }

        Ok(CuboidPickInfo {
            structure: self.name.clone(),
            element,
            rows,
        })
    }
}

impl Structure for CuboidNetwork {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        CUBOID_NETWORK_TYPE
    }

    fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        self.geometry.bounding_box(self.transform)
    }

    fn length_scale(&self) -> f32 {
        self.geometry.length_scale(self.transform)
    }

    fn transform(&self) -> Mat4 {
        self.transform
    }

    fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn refresh(&mut self) {
        self.invalidate_all();
    }

    fn load_persistent(&mut self, cache: &PersistentCache) {
        self.params.load(cache);
        for quantity in &mut self.quantities {
            quantity.as_quantity_mut().load_persistent(cache);
        }
        self.invalidate_all();
    }

    fn save_persistent(&self, cache: &mut PersistentCache) {
        self.params.save(cache);
        for quantity in &self.quantities {
            quantity.as_quantity().save_persistent(cache);
        }
    }
}

#[cfg(test)]
mod tests {
    use polyscope_render::{HeadlessBackend, ShaderLibrary, UniformValue, ViewParameters};

    use super::*;

    struct Harness {
        shaders: ShaderLibrary,
        backend: HeadlessBackend,
        view: ViewParameters,
        pick: PickAllocator,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                shaders: ShaderLibrary::with_builtin_programs().unwrap(),
                backend: HeadlessBackend::new(),
                view: ViewParameters::default(),
                pick: PickAllocator::new(),
            }
        }

        fn context(&mut self) -> RenderContext<'_> {
            RenderContext {
                backend: &mut self.backend,
                shaders: &self.shaders,
                view: &self.view,
                pick: &mut self.pick,
            }
        }

        fn draw(&mut self, network: &mut CuboidNetwork) {
            network.draw(&mut self.context()).unwrap();
        }

        fn draw_pick(&mut self, network: &mut CuboidNetwork) {
            network.draw_pick(&mut self.context()).unwrap();
        }

        fn float_uniform(&self, program: &str, name: &str) -> f32 {
            match self.backend.last_uniform(program, name) {
                Some(UniformValue::Float(v)) => v,
                other => panic!("{program}/{name}: {other:?}"),
            }
        }
    }

    fn unit_square() -> CuboidNetwork {
        let nodes = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        CuboidNetwork::new_loop("square", nodes, vec![Vec3::Z; 4])
    }

    #[test]
    fn test_cuboid_network_creation() {
        let cn = unit_square();
        assert_eq!(cn.num_nodes(), 4);
        assert_eq!(cn.num_edges(), 4);
        assert_eq!(cn.node_degrees(), &[2, 2, 2, 2]);
        assert!(cn.configuration_errors().is_empty());
        assert_eq!(
            cn.bounding_box(),
            Some((Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)))
        );
        assert_eq!(cn.type_name(), "Cuboid Network");
        assert_eq!(cn.width(), ScaledValue::relative(0.1));
        assert_eq!(cn.height(), ScaledValue::relative(0.005));
        assert_eq!(cn.material(), "clay");
        assert!(cn.depth_write());
    }

    #[test]
    fn test_cuboid_network_line_and_2d() {
        let line =
            CuboidNetwork::new_line("line", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![Vec3::Z; 2]);
        assert_eq!(line.edges(), &[[0, 1], [1, 2]]);
        assert_eq!(line.node_degrees(), &[1, 2, 1]);

        let flat = CuboidNetwork::new_loop_2d("flat", &[Vec2::ZERO, Vec2::X, Vec2::Y]);
        assert_eq!(flat.num_edges(), 3);
        assert_eq!(flat.orientations(), &[Vec3::Z; 3]);
        assert_eq!(flat.nodes()[2], Vec3::Y);
    }

    #[test]
    fn test_bad_edges_are_recorded() {
        let cn = CuboidNetwork::new(
            "bad",
            vec![Vec3::ZERO, Vec3::X],
            vec![[0, 1], [0, 9]],
            vec![Vec3::Z],
        );
        assert_eq!(cn.num_edges(), 2);
        assert_eq!(cn.configuration_errors().len(), 2);
        assert_eq!(cn.orientations().len(), 2);
    }

    #[test]
    fn test_bad_edges_draw_and_pick_best_effort() {
        let mut h = Harness::new();
        let mut cn = CuboidNetwork::new(
            "bad",
            vec![Vec3::X, Vec3::Y],
            vec![[0, 1], [0, 9]],
            vec![Vec3::Z; 2],
        );

        h.draw(&mut cn);
        let tail = h.backend.last_attribute("cuboid/base_color", "a_position_tail");
        assert_eq!(tail, Some(AttributeData::Vec3(vec![Vec3::X, Vec3::X])));
        let tip = h.backend.last_attribute("cuboid/base_color", "a_position_tip");
        assert_eq!(tip, Some(AttributeData::Vec3(vec![Vec3::Y, Vec3::ZERO])));

        cn.add_node_scalar_quantity("temp", vec![1.0, 2.0], DataType::Standard)
            .unwrap();
        cn.set_quantity_enabled("temp", true).unwrap();
        h.draw(&mut cn);
        let tip = h.backend.last_attribute("cuboid/node_scalar", "a_value_tip");
        assert_eq!(tip, Some(AttributeData::Float(vec![2.0, 0.0])));

        h.draw_pick(&mut cn);
        let start = cn.pick_start().unwrap();
        let edge_base = start + 2;
        let tail = h.backend.last_attribute("cuboid/edge_pick", "a_color_tail");
        assert_eq!(
            tail,
            Some(AttributeData::Vec3(vec![index_to_vec(start); 2]))
        );
        let tip = h.backend.last_attribute("cuboid/edge_pick", "a_color_tip");
        assert_eq!(
            tip,
            Some(AttributeData::Vec3(vec![
                index_to_vec(start + 1),
                index_to_vec(edge_base + 1),
            ]))
        );
        assert_eq!(
            cn.resolve_edge_hit(1, 0.95).unwrap(),
            CuboidPickElement::Edge(1)
        );
    }

    #[test]
    fn test_quantity_attributes_upload_once() {
        let mut h = Harness::new();
        let mut cn = unit_square();
        cn.add_node_color_quantity("tint", vec![Vec3::ONE; 4]).unwrap();
        cn.set_quantity_enabled("tint", true).unwrap();
        h.draw(&mut cn);
        h.draw(&mut cn);
        h.draw(&mut cn);
        assert_eq!(h.backend.attribute_count("cuboid/node_color", "a_color_tail"), 1);

        cn.add_edge_scalar_quantity("load", vec![0.0; 4], DataType::Standard)
            .unwrap();
        cn.set_quantity_enabled("load", true).unwrap();
        h.draw(&mut cn);
        h.draw(&mut cn);
        assert_eq!(h.backend.attribute_count("cuboid/edge_scalar", "a_value"), 1);
        let scalar_draws = h.backend.draws().into_iter().filter(|d| d == "cuboid/edge_scalar");
        assert_eq!(scalar_draws.count(), 2);
    }

    #[test]
    fn test_node_pick_radius_is_box_width() {
        let mut h = Harness::new();
        let mut cn = unit_square();
        cn.set_width(0.2, false);
        h.draw_pick(&mut cn);
        let radius = h.float_uniform("cuboid/node_pick", "u_pointRadius");
        assert!((radius - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_vector_export_follows_transform() {
        let mut cn = CuboidNetwork::new_line(
            "line",
            vec![Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)],
            vec![Vec3::Z; 2],
        );
        cn.add_node_vector_quantity("v", vec![Vec3::Y; 3], VectorType::Standard)
            .unwrap();
        cn.set_transform(Mat4::from_scale(Vec3::splat(10.0)));

        let mut out = Vec::new();
        cn.write_vector_quantity_to("v", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let length: f32 = text
            .lines()
            .find_map(|l| l.strip_prefix("#displaylength "))
            .unwrap()
            .parse()
            .unwrap();
        assert!((cn.length_scale() - 20.0).abs() < 1e-4);
        assert!((length - 0.02 * cn.length_scale()).abs() < 1e-5);

        let mut out = Vec::new();
        assert!(matches!(
            cn.write_vector_quantity_to("missing", &mut out),
            Err(PolyscopeError::QuantityNotFound(..))
        ));
    }

    #[test]
    fn test_base_draw_builds_once() {
        let mut h = Harness::new();
        let mut cn = unit_square();
        h.draw(&mut cn);
        h.draw(&mut cn);
        assert_eq!(h.backend.build_count("cuboid/base_color"), 1);
        assert_eq!(h.backend.draws(), vec!["cuboid/base_color", "cuboid/base_color"]);

        let wb = h.float_uniform("cuboid/base_color", "u_wb");
        assert!((wb - 0.1 * 2.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_network_draws_nothing() {
        let mut h = Harness::new();
        let mut cn = unit_square();
        cn.set_enabled(false);
        h.draw(&mut cn);
        h.draw_pick(&mut cn);
        assert!(h.backend.events().is_empty());
    }

    #[test]
    fn test_position_update_rebuilds_every_program_once() {
        let mut h = Harness::new();
        let mut cn = unit_square();
        cn.add_node_scalar_quantity("s", vec![0.0, 1.0, 2.0, 3.0], DataType::Standard)
            .unwrap();
        cn.add_edge_vector_quantity("v", vec![Vec3::Y; 4], VectorType::Standard)
            .unwrap();
        cn.set_quantity_enabled("v", true).unwrap();
        h.draw(&mut cn);
        cn.set_quantity_enabled("s", true).unwrap();
        h.draw(&mut cn);
        h.draw_pick(&mut cn);

        h.backend.clear();
        cn.update_node_positions(cn.nodes().iter().map(|p| *p * 2.0).collect())
            .unwrap();
        cn.set_quantity_enabled("s", false).unwrap();
        h.draw(&mut cn);
        cn.set_quantity_enabled("s", true).unwrap();
        h.draw(&mut cn);
        h.draw(&mut cn);
        h.draw_pick(&mut cn);
        h.draw_pick(&mut cn);

        for label in [
            "cuboid/base_color",
            "cuboid/node_scalar",
            "cuboid/vector_arrow",
            "cuboid/node_pick",
            "cuboid/edge_pick",
        ] {
            assert_eq!(h.backend.build_count(label), 1, "{label}");
        }

        let wb = h.float_uniform("cuboid/node_scalar", "u_wb");
        assert!((wb - 0.2 * 2.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_position_update_size_mismatch_changes_nothing() {
        let mut cn = unit_square();
        let err = cn.update_node_positions(vec![Vec3::ZERO; 5]).unwrap_err();
        assert!(matches!(err, PolyscopeError::SizeMismatch { expected: 4, actual: 5 }));
        assert_eq!(cn.nodes()[1], Vec3::X);
    }

    #[test]
    fn test_orientation_update_only_touches_up_direction_programs() {
        let mut h = Harness::new();
        let mut cn = unit_square();
        cn.add_edge_color_quantity("c", vec![Vec3::X; 4]).unwrap();
        cn.add_node_vector_quantity("v", vec![Vec3::Z; 4], VectorType::Ambient)
            .unwrap();
        cn.set_quantity_enabled("v", true).unwrap();
        h.draw(&mut cn);
        cn.set_quantity_enabled("c", true).unwrap();
        h.draw(&mut cn);
        h.draw_pick(&mut cn);

        h.backend.clear();
        assert!(cn.update_orientations(vec![Vec3::Y; 3]).is_err());
        cn.update_orientations(vec![Vec3::Y; 4]).unwrap();
        h.draw(&mut cn);
        h.draw_pick(&mut cn);
        cn.set_quantity_enabled("c", false).unwrap();
        h.draw(&mut cn);

        assert_eq!(h.backend.build_count("cuboid/edge_color"), 1);
        assert_eq!(h.backend.build_count("cuboid/edge_pick"), 1);
        assert_eq!(h.backend.build_count("cuboid/base_color"), 1);
        assert_eq!(h.backend.build_count("cuboid/node_pick"), 0);
        assert_eq!(h.backend.build_count("cuboid/vector_arrow"), 0);
    }

    #[test]
    fn test_dominant_quantities_are_exclusive() {
        let mut h = Harness::new();
        let mut cn = unit_square();
        cn.add_node_scalar_quantity("a", vec![0.0; 4], DataType::Standard)
            .unwrap();
        cn.add_edge_color_quantity("b", vec![Vec3::ONE; 4]).unwrap();
        cn.add_edge_vector_quantity("v", vec![Vec3::X; 4], VectorType::Standard)
            .unwrap();

        cn.set_quantity_enabled("a", true).unwrap();
        cn.set_quantity_enabled("v", true).unwrap();
        cn.set_quantity_enabled("b", true).unwrap();
        assert!(!cn.quantity("a").unwrap().is_enabled());
        assert!(cn.quantity("b").unwrap().is_enabled());
        assert!(cn.quantity("v").unwrap().is_enabled());

        h.draw(&mut cn);
        assert_eq!(h.backend.draws(), vec!["cuboid/edge_color", "cuboid/vector_arrow"]);

        assert!(matches!(
            cn.set_quantity_enabled("nope", true),
            Err(PolyscopeError::QuantityNotFound(..))
        ));
    }

    #[test]
    fn test_add_quantity_size_mismatch_attaches_nothing() {
        let mut cn = unit_square();
        assert!(cn
            .add_edge_scalar_quantity("s", vec![1.0; 3], DataType::Standard)
            .is_err());
        assert!(cn.add_node_color_quantity("c", vec![Vec3::ONE; 5]).is_err());
        assert!(cn
            .add_node_vector_quantity_2d("v", &[Vec2::X; 2], VectorType::Standard)
            .is_err());
        assert!(cn.quantities().is_empty());
    }

    #[test]
    fn test_same_name_replaces_quantity() {
        let mut cn = unit_square();
        cn.add_node_scalar_quantity("q", vec![0.0; 4], DataType::Standard)
            .unwrap();
        cn.add_edge_color_quantity("q", vec![Vec3::ONE; 4]).unwrap();
        assert_eq!(cn.quantities().len(), 1);
        assert!(cn.quantity("q").unwrap().as_color().is_some());

        cn.remove_quantity("q", true).unwrap();
        assert!(cn.remove_quantity("q", true).is_err());
        assert!(cn.remove_quantity("q", false).is_ok());
    }

    #[test]
    fn test_scalar_scenario_through_network() {
        let mut cn = unit_square();
        let scalar = cn
            .add_node_scalar_quantity("s", vec![0.0, 1.0, 2.0, 3.0], DataType::Standard)
            .unwrap()
            .as_scalar_mut()
            .unwrap();
        assert_eq!(scalar.data_range(), (0.0, 3.0));
        scalar.set_map_range((-1.0, 1.0));
        scalar.reset_map_range();
        assert_eq!(scalar.viz_range(), scalar.data_range());
    }

    #[test]
    fn test_color_map_change_rebuilds_scalar_program() {
        let mut h = Harness::new();
        let mut cn = unit_square();
        cn.add_edge_scalar_quantity("s", vec![0.0, 1.0, 2.0, 3.0], DataType::Standard)
            .unwrap();
        cn.set_quantity_enabled("s", true).unwrap();
        h.draw(&mut cn);
        cn.quantity_mut("s")
            .and_then(CuboidQuantity::as_scalar_mut)
            .unwrap()
            .set_color_map("reds")
            .unwrap();
        h.draw(&mut cn);
        assert_eq!(h.backend.build_count("cuboid/edge_scalar"), 2);
        assert!(h.backend.events().contains(&polyscope_render::BackendEvent::Texture {
            program: "cuboid/edge_scalar".into(),
            name: "t_colormap".into(),
            color_map: "reds".into(),
        }));
    }

    #[test]
    fn test_material_and_depth_changes_rebuild_everything() {
        let mut h = Harness::new();
        let mut cn = unit_square();
        h.draw(&mut cn);
        assert!(matches!(
            cn.set_material("velvet"),
            Err(PolyscopeError::UnknownMaterial(_))
        ));
        cn.set_material("candy").unwrap();
        h.draw(&mut cn);
        assert_eq!(h.backend.build_count("cuboid/base_color"), 2);

        cn.set_depth_write(false);
        h.draw(&mut cn);
        cn.set_depth_write(false);
        h.draw(&mut cn);
        assert_eq!(h.backend.build_count("cuboid/base_color/no_depth"), 1);
    }

    #[test]
    fn test_pick_round_trip() {
        let mut h = Harness::new();
        let mut other = CuboidNetwork::new_line("other", vec![Vec3::ZERO, Vec3::X], vec![Vec3::Z]);
        let mut cn = unit_square();
        assert!(cn.decode_global(1).is_err());

        h.draw_pick(&mut other);
        h.draw_pick(&mut cn);
        let start = cn.pick_start().unwrap();
        assert_eq!(start, 4);
        assert_eq!(h.pick.lookup(start + 5), Some(("Cuboid Network", "square", 5)));

        assert_eq!(cn.decode_global(start).unwrap(), CuboidPickElement::Node(0));
        assert_eq!(cn.decode_global(start + 4).unwrap(), CuboidPickElement::Edge(0));
        assert!(cn.decode_global(start - 1).is_err());
        assert!(cn.decode_global(start + 8).is_err());

        assert_eq!(cn.resolve_edge_hit(1, 0.1).unwrap(), CuboidPickElement::Node(1));
        assert_eq!(cn.resolve_edge_hit(1, 0.9).unwrap(), CuboidPickElement::Node(2));
        assert_eq!(cn.resolve_edge_hit(1, 0.5).unwrap(), CuboidPickElement::Edge(1));
        assert!(matches!(
            cn.resolve_edge_hit(4, 0.5),
            Err(PolyscopeError::BadPickIndex { .. })
        ));
    }

    #[test]
    fn test_pick_info_rows() {
        let mut cn = unit_square();
        cn.add_node_scalar_quantity("temp", vec![0.0, 1.0, 2.0, 3.0], DataType::Standard)
            .unwrap();
        cn.add_edge_scalar_quantity("flux", vec![5.0, 6.0, 7.0, 8.0], DataType::Standard)
            .unwrap();

        let node = cn.build_pick_info(2).unwrap();
        assert_eq!(node.element, CuboidPickElement::Node(2));
        assert_eq!(node.row("node index"), Some("2"));
        assert_eq!(node.row("degree"), Some("2"));
        assert_eq!(node.row("temp"), Some("2"));
        assert_eq!(node.row("flux"), None);

        let edge = cn.build_pick_info(5).unwrap();
        assert_eq!(edge.element, CuboidPickElement::Edge(1));
        assert_eq!(edge.row("tail"), Some("#1 [1, 0, 0]"));
        assert_eq!(edge.row("flux"), Some("6"));
        assert_eq!(edge.row("temp"), None);

        assert!(matches!(
            cn.build_pick_info(8),
            Err(PolyscopeError::BadPickIndex { index: 8, .. })
        ));
    }

    #[test]
    fn test_persistent_round_trip() {
        let mut cn = unit_square();
        cn.set_color(Vec3::new(1.0, 0.0, 0.0))
            .set_width(0.3, false);
        cn.set_default_color(Vec3::ONE);
        let mut cache = PersistentCache::new();
        cn.save_persistent(&mut cache);
        assert!(cache.contains("Cuboid Network#square#color"));
        assert!(cache.contains("Cuboid Network#square#width"));
        assert!(!cache.contains("Cuboid Network#square#height"));

        let mut fresh = unit_square();
        fresh.set_default_color(Vec3::ONE);
        fresh.load_persistent(&cache);
        assert_eq!(fresh.color(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(fresh.width(), ScaledValue::absolute(0.3));
        assert_eq!(fresh.height(), ScaledValue::relative(0.005));
    }

    #[test]
    fn test_nice_names() {
        let mut cn = unit_square();
        cn.add_edge_vector_quantity_2d("w", &[Vec2::X; 4], VectorType::Standard)
            .unwrap();
        let q = cn.quantity("w").unwrap();
        assert_eq!(q.as_quantity().nice_name(), "w (edge vector)");
        assert_eq!(q.as_vector().unwrap().vectors()[0], Vec3::X);
    }
}
