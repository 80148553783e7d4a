//! The quantity seam of a cuboid network.

use glam::Mat4;
use polyscope_core::{unique_prefix, PersistentCache, Quantity};
use polyscope_render::{ProgramSlot, ProgramVariant, RenderContext, RenderResult, ShaderProgram};

use super::color_quantity::CuboidColorQuantity;
use super::geometry::CuboidGeometry;
use super::pick::InfoRow;
use super::scalar_quantity::CuboidScalarQuantity;
use super::vector_quantity::CuboidVectorQuantity;

/// Which elements a quantity's data lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementDomain {
    Node,
    Edge,
}

impl ElementDomain {
    /// Number of elements of this domain in `geometry`.
    pub fn len(self, geometry: &CuboidGeometry) -> usize {
        match self {
            Self::Node => geometry.num_nodes(),
            Self::Edge => geometry.num_edges(),
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Edge => "edge",
        }
    }
}

/// The parent network's state a quantity needs to draw.
#[derive(Debug, Clone, Copy)]
pub struct CuboidView<'a> {
    pub geometry: &'a CuboidGeometry,
    pub transform: Mat4,
    pub length_scale: f32,
    /// Absolute box extent along the binormal.
    pub width: f32,
    /// Absolute box extent along the normal.
    pub height: f32,
    pub material: &'a str,
    pub depth_write: bool,
}

/// Behavior every cuboid network quantity provides to its parent.
pub trait CuboidNetworkQuantity: Quantity {
    /// Where the data lives.
    fn domain(&self) -> ElementDomain;

    /// Draws the quantity, building its program first if needed.
    fn draw(&mut self, view: &CuboidView<'_>, ctx: &mut RenderContext<'_>) -> RenderResult<()>;

    /// Pick row for a node, if this quantity is defined on nodes.
    fn node_info(&self, node: usize) -> Option<InfoRow>;

    /// Pick row for an edge, if this quantity is defined on edges.
    fn edge_info(&self, edge: usize) -> Option<InfoRow>;

    /// Node positions changed.
    fn geometry_changed(&mut self, view: &CuboidView<'_>);

    /// Edge up directions changed.
    fn orientations_changed(&mut self);

    /// Drops every cached program.
    fn invalidate_programs(&mut self);

    fn load_persistent(&mut self, _cache: &PersistentCache) {}

    fn save_persistent(&self, _cache: &mut PersistentCache) {}
}

/// A quantity attached to a cuboid network.
pub enum CuboidQuantity {
    Scalar(CuboidScalarQuantity),
    Color(CuboidColorQuantity),
    Vector(CuboidVectorQuantity),
}

impl CuboidQuantity {
    pub fn as_quantity(&self) -> &dyn CuboidNetworkQuantity {
        match self {
            Self::Scalar(q) => q,
            Self::Color(q) => q,
            Self::Vector(q) => q,
        }
    }

    pub fn as_quantity_mut(&mut self) -> &mut dyn CuboidNetworkQuantity {
        match self {
            Self::Scalar(q) => q,
            Self::Color(q) => q,
            Self::Vector(q) => q,
        }
    }

    pub fn name(&self) -> &str {
        self.as_quantity().name()
    }

    pub fn domain(&self) -> ElementDomain {
        self.as_quantity().domain()
    }

    pub fn is_enabled(&self) -> bool {
        self.as_quantity().is_enabled()
    }

    pub fn is_dominant(&self) -> bool {
        self.as_quantity().is_dominant()
    }

    pub fn as_scalar(&self) -> Option<&CuboidScalarQuantity> {
        match self {
            Self::Scalar(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_scalar_mut(&mut self) -> Option<&mut CuboidScalarQuantity> {
        match self {
            Self::Scalar(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&CuboidColorQuantity> {
        match self {
            Self::Color(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_color_mut(&mut self) -> Option<&mut CuboidColorQuantity> {
        match self {
            Self::Color(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&CuboidVectorQuantity> {
        match self {
            Self::Vector(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_vector_mut(&mut self) -> Option<&mut CuboidVectorQuantity> {
        match self {
            Self::Vector(q) => Some(q),
            _ => None,
        }
    }
}

/// Persistent key of one field of a quantity.
pub(crate) fn quantity_key(structure: &str, quantity: &str, field: &str) -> String {
    format!(
        "{}{quantity}#{field}",
        unique_prefix(super::CUBOID_NETWORK_TYPE, structure)
    )
}

/// Draws one cuboid-template program from `slot`.
///
/// `fill` runs once per build after the edge geometry and material are bound;
/// `set_uniforms` runs every draw after the view and box extent uniforms.
pub(crate) fn draw_cuboid_program<F, U>(
    slot: &mut ProgramSlot,
    variant: ProgramVariant,
    view: &CuboidView<'_>,
    ctx: &mut RenderContext<'_>,
    fill: F,
    set_uniforms: U,
) -> RenderResult<()>
where
    F: FnOnce(&mut dyn ShaderProgram) -> RenderResult<()>,
    U: FnOnce(&mut dyn ShaderProgram) -> RenderResult<()>,
{
    let program = slot.get_or_build(|| {
        let mut program = ctx.build_program(variant, view.depth_write)?;
        view.geometry.edge_buffers().fill(program.as_mut())?;
        program.set_material(view.material)?;
        fill(program.as_mut())?;
        Ok(program)
    })?;
    ctx.set_view_uniforms(program, view.transform)?;
    program.set_uniform("u_wn", view.height.into())?;
    program.set_uniform("u_wb", view.width.into())?;
    set_uniforms(program)?;
    program.draw()
}

/// Per-edge tail and tip values gathered from per-node data.
///
/// Missing endpoints read `fallback`.
pub(crate) fn gather_endpoints<T: Copy>(
    geometry: &CuboidGeometry,
    node_values: &[T],
    fallback: T,
) -> (Vec<T>, Vec<T>) {
    let at = |i: u32| node_values.get(i as usize).copied().unwrap_or(fallback);
    geometry
        .edges()
        .iter()
        .map(|&[tail, tip]| (at(tail), at(tip)))
        .unzip()
}
