//! Color quantities on cuboid network nodes or edges.

use std::any::Any;

use glam::Vec3;
use polyscope_core::{PolyscopeError, Quantity, QuantityKind, Result};
use polyscope_render::{AttributeData, ProgramSlot, ProgramVariant, RenderContext, RenderResult};

use super::geometry::CuboidGeometry;
use super::pick::InfoRow;
use super::quantity::{
    draw_cuboid_program, gather_endpoints, CuboidNetworkQuantity, CuboidView, ElementDomain,
};

/// An RGB color per node or per edge.
pub struct CuboidColorQuantity {
    name: String,
    structure_name: String,
    domain: ElementDomain,
    colors: Vec<Vec3>,
    node_average: Vec<Vec3>,
    enabled: bool,
    program: ProgramSlot,
}

impl CuboidColorQuantity {
    /// Creates a color quantity. `colors` must hold one entry per element of `domain`.
    pub fn new(
        name: impl Into<String>,
        structure_name: impl Into<String>,
        domain: ElementDomain,
        colors: Vec<Vec3>,
        geometry: &CuboidGeometry,
    ) -> Result<Self> {
        let expected = domain.len(geometry);
        if colors.len() != expected {
            return Err(PolyscopeError::SizeMismatch {
                expected,
                actual: colors.len(),
            });
        }
        let mut quantity = Self {
            name: name.into(),
            structure_name: structure_name.into(),
            domain,
            colors,
            node_average: Vec::new(),
            enabled: false,
            program: ProgramSlot::default(),
        };
        quantity.compute_node_average(geometry);
        Ok(quantity)
    }

    fn compute_node_average(&mut self, geometry: &CuboidGeometry) {
        if self.domain != ElementDomain::Edge {
            return;
        }
        let mut sums = vec![Vec3::ZERO; geometry.num_nodes()];
        for (&[tail, tip], &color) in geometry.edges().iter().zip(&self.colors) {
            for endpoint in [tail, tip] {
                if let Some(sum) = sums.get_mut(endpoint as usize) {
                    *sum += color;
                }
            }
        }
        for (sum, &degree) in sums.iter_mut().zip(geometry.node_degrees()) {
            *sum = if degree == 0 {
                Vec3::ZERO
            } else {
                *sum / degree as f32
            };
        }
        self.node_average = sums;
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    /// Mean of the incident edge colors at each node. Empty for node colors.
    pub fn node_average(&self) -> &[Vec3] {
        &self.node_average
    }

    fn color_row(&self, index: usize) -> Option<InfoRow> {
        self.colors.get(index).map(|c| {
            InfoRow::new(
                self.name.clone(),
                format!("({:.3}, {:.3}, {:.3})", c.x, c.y, c.z),
            )
        })
    }
}

impl Quantity for CuboidColorQuantity {
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
        QuantityKind::Color
    }

    fn nice_name(&self) -> String {
        format!("{} ({} color)", self.name, self.domain.as_str())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_dominant(&self) -> bool {
        true
    }

    fn refresh(&mut self) {
        self.program.invalidate();
    }

    fn data_size(&self) -> usize {
        self.colors.len()
    }
}

impl CuboidNetworkQuantity for CuboidColorQuantity {
    fn domain(&self) -> ElementDomain {
        self.domain
    }

    fn draw(&mut self, view: &CuboidView<'_>, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let colors = &self.colors;
        let domain = self.domain;
        let variant = match domain {
            ElementDomain::Node => ProgramVariant::NodeColor,
            ElementDomain::Edge => ProgramVariant::EdgeColor,
        };

        draw_cuboid_program(
            &mut self.program,
            variant,
            view,
            ctx,
            |program| match domain {
                ElementDomain::Node => {
                    let (tail, tip) = gather_endpoints(view.geometry, colors, Vec3::ZERO);
                    program.set_attribute("a_color_tail", AttributeData::Vec3(tail))?;
                    program.set_attribute("a_color_tip", AttributeData::Vec3(tip))
                }
                ElementDomain::Edge => {
                    program.set_attribute("a_color", AttributeData::Vec3(colors.clone()))
                }
            },
            |_| Ok(()),
        )
    }

    fn node_info(&self, node: usize) -> Option<InfoRow> {
        match self.domain {
            ElementDomain::Node => self.color_row(node),
            ElementDomain::Edge => None,
        }
    }

    fn edge_info(&self, edge: usize) -> Option<InfoRow> {
        match self.domain {
            ElementDomain::Edge => self.color_row(edge),
            ElementDomain::Node => None,
        }
    }

    fn geometry_changed(&mut self, view: &CuboidView<'_>) {
        self.program.invalidate();
        self.compute_node_average(view.geometry);
    }

    fn orientations_changed(&mut self) {
        self.program.invalidate();
    }

    fn invalidate_programs(&mut self) {
        self.program.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuboid_network::geometry::line_edges;

    fn path() -> CuboidGeometry {
        let nodes = vec![Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)];
        CuboidGeometry::new("path", nodes, line_edges(3), vec![Vec3::Z; 2]).0
    }

    #[test]
    fn test_node_color_quantity() {
        let g = path();
        let q = CuboidColorQuantity::new("rgb", "path", ElementDomain::Node, vec![Vec3::X, Vec3::Y, Vec3::Z], &g)
            .unwrap();
        assert_eq!(q.data_size(), 3);
        assert!(q.is_dominant());
        assert!(q.node_average().is_empty());
        assert_eq!(q.nice_name(), "rgb (node color)");
        assert_eq!(
            q.node_info(1),
            Some(InfoRow::new("rgb", "(0.000, 1.000, 0.000)"))
        );
        assert_eq!(q.edge_info(0), None);
    }

    #[test]
    fn test_edge_color_average() {
        let g = path();
        let q = CuboidColorQuantity::new("c", "path", ElementDomain::Edge, vec![Vec3::X, Vec3::Y], &g).unwrap();
        assert_eq!(q.node_average(), &[Vec3::X, Vec3::new(0.5, 0.5, 0.0), Vec3::Y]);
        assert!(q.edge_info(1).is_some());
    }

    #[test]
    fn test_color_size_mismatch() {
        let g = path();
        assert!(matches!(
            CuboidColorQuantity::new("c", "path", ElementDomain::Edge, vec![Vec3::X; 3], &g),
            Err(PolyscopeError::SizeMismatch { expected: 2, actual: 3 })
        ));
    }
}
