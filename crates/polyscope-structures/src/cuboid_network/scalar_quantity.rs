//! Scalar quantities on cuboid network nodes or edges.

use std::any::Any;

use polyscope_core::{
    robust_min_max, DataType, PersistentCache, PersistentValue, PolyscopeError, Quantity,
    QuantityKind, Result, ROBUST_RANGE_FRACTION,
};
use polyscope_render::{
    AttributeData, ColorMapRegistry, ProgramSlot, ProgramVariant, RenderContext, RenderError,
    RenderResult,
};

use super::geometry::CuboidGeometry;
use super::pick::InfoRow;
use super::quantity::{
    draw_cuboid_program, gather_endpoints, quantity_key, CuboidNetworkQuantity, CuboidView,
    ElementDomain,
};

/// The color map a scalar starts with for each data type.
pub fn default_color_map(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Standard => "viridis",
        DataType::Symmetric => "coolwarm",
        DataType::Magnitude => "blues",
    }
}

/// A scalar value per node or per edge, drawn through a color map.
///
/// Node scalars blend linearly along each edge between the two endpoint values.
pub struct CuboidScalarQuantity {
    name: String,
    structure_name: String,
    domain: ElementDomain,
    values: Vec<f32>,
    node_average: Vec<f32>,
    data_type: DataType,
    data_range: (f64, f64),
    viz_range: PersistentValue<(f64, f64)>,
    color_map: PersistentValue<String>,
    enabled: bool,
    program: ProgramSlot,
}

impl CuboidScalarQuantity {
    /// Creates a scalar quantity. `values` must hold one entry per element of `domain`.
    pub fn new(
        name: impl Into<String>,
        structure_name: impl Into<String>,
        domain: ElementDomain,
        values: Vec<f32>,
        data_type: DataType,
        geometry: &CuboidGeometry,
    ) -> Result<Self> {
        let expected = domain.len(geometry);
        if values.len() != expected {
            return Err(PolyscopeError::SizeMismatch {
                expected,
                actual: values.len(),
            });
        }

        let name = name.into();
        let structure_name = structure_name.into();
        let as_f64: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
        let data_range = robust_min_max(&as_f64, ROBUST_RANGE_FRACTION);

        let mut quantity = Self {
            viz_range: PersistentValue::new(
                quantity_key(&structure_name, &name, "viz_range"),
                data_type.default_viz_range(data_range),
            ),
            color_map: PersistentValue::new(
                quantity_key(&structure_name, &name, "cmap"),
                default_color_map(data_type).to_string(),
            ),
            name,
            structure_name,
            domain,
            values,
            node_average: Vec::new(),
            data_type,
            data_range,
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
        let mut sums = vec![0.0_f32; geometry.num_nodes()];
        for (&[tail, tip], &value) in geometry.edges().iter().zip(&self.values) {
            for endpoint in [tail, tip] {
                if let Some(sum) = sums.get_mut(endpoint as usize) {
                    *sum += value;
                }
            }
        }
        for (sum, &degree) in sums.iter_mut().zip(geometry.node_degrees()) {
            *sum = if degree == 0 { 0.0 } else { *sum / degree as f32 };
        }
        self.node_average = sums;
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Robust min/max of the data.
    pub fn data_range(&self) -> (f64, f64) {
        self.data_range
    }

    /// The range mapped onto the color map.
    pub fn viz_range(&self) -> (f64, f64) {
        *self.viz_range.get()
    }

    pub fn set_map_range(&mut self, range: (f64, f64)) -> &mut Self {
        self.viz_range.set(range);
        self
    }

    /// Restores the range implied by the data type.
    pub fn reset_map_range(&mut self) -> &mut Self {
        self.viz_range
            .set(self.data_type.default_viz_range(self.data_range));
        self
    }

    pub fn color_map(&self) -> &str {
        self.color_map.get()
    }

    /// Switches the color map; unknown names are rejected.
    pub fn set_color_map(&mut self, name: &str) -> Result<&mut Self> {
        if !ColorMapRegistry::builtin().contains(name) {
            return Err(PolyscopeError::UnknownColorMap(name.to_string()));
        }
        self.color_map.set(name.to_string());
        self.program.invalidate();
        Ok(self)
    }

    /// Mean of the incident edge values at each node. Empty for node scalars.
    pub fn node_average(&self) -> &[f32] {
        &self.node_average
    }

    fn value_row(&self, index: usize) -> Option<InfoRow> {
        self.values
            .get(index)
            .map(|v| InfoRow::new(self.name.clone(), v.to_string()))
    }
}

impl Quantity for CuboidScalarQuantity {
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
        QuantityKind::Scalar
    }

    fn nice_name(&self) -> String {
        format!("{} ({} scalar)", self.name, self.domain.as_str())
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
        self.values.len()
    }
}

impl CuboidNetworkQuantity for CuboidScalarQuantity {
    fn domain(&self) -> ElementDomain {
        self.domain
    }

    fn draw(&mut self, view: &CuboidView<'_>, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let color_map = ColorMapRegistry::builtin()
            .get(self.color_map.get())
            .ok_or_else(|| RenderError::UnknownColorMap(self.color_map.get().clone()))?;
        let (low, high) = *self.viz_range.get();
        let values = &self.values;
        let domain = self.domain;
        let variant = match domain {
            ElementDomain::Node => ProgramVariant::NodeScalar,
            ElementDomain::Edge => ProgramVariant::EdgeScalar,
        };

        draw_cuboid_program(
            &mut self.program,
            variant,
            view,
            ctx,
            |program| {
                match domain {
                    ElementDomain::Node => {
                        let (tail, tip) = gather_endpoints(view.geometry, values, 0.0);
                        program.set_attribute("a_value_tail", AttributeData::Float(tail))?;
                        program.set_attribute("a_value_tip", AttributeData::Float(tip))?;
                    }
                    ElementDomain::Edge => {
                        program.set_attribute("a_value", AttributeData::Float(values.clone()))?;
                    }
                }
                program.set_texture_from_colormap("t_colormap", color_map)
            },
            |program| {
                program.set_uniform("u_rangeLow", (low as f32).into())?;
                program.set_uniform("u_rangeHigh", (high as f32).into())
            },
        )
    }

    fn node_info(&self, node: usize) -> Option<InfoRow> {
        match self.domain {
            ElementDomain::Node => self.value_row(node),
            ElementDomain::Edge => None,
        }
    }

    fn edge_info(&self, edge: usize) -> Option<InfoRow> {
        match self.domain {
            ElementDomain::Edge => self.value_row(edge),
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

    fn load_persistent(&mut self, cache: &PersistentCache) {
        self.viz_range.load_from(cache);
        self.color_map.load_from(cache);
        if !ColorMapRegistry::builtin().contains(self.color_map.get()) {
            log::warn!(
                "persisted color map '{}' for '{}' is unknown, using '{}'",
                self.color_map.get(),
                self.name,
                default_color_map(self.data_type)
            );
            self.color_map = PersistentValue::new(
                self.color_map.key().to_string(),
                default_color_map(self.data_type).to_string(),
            );
        }
        self.program.invalidate();
    }

    fn save_persistent(&self, cache: &mut PersistentCache) {
        self.viz_range.save_to(cache);
        self.color_map.save_to(cache);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::cuboid_network::geometry::loop_edges;

    fn square() -> CuboidGeometry {
        let nodes = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        CuboidGeometry::new("sq", nodes, loop_edges(4), vec![Vec3::Z; 4]).0
    }

    #[test]
    fn test_node_scalar_ranges() {
        let g = square();
        let mut q = CuboidScalarQuantity::new(
            "temp",
            "sq",
            ElementDomain::Node,
            vec![0.0, 1.0, 2.0, 3.0],
            DataType::Standard,
            &g,
        )
        .unwrap();
        assert_eq!(q.data_range(), (0.0, 3.0));
        assert_eq!(q.viz_range(), (0.0, 3.0));
        assert_eq!(q.color_map(), "viridis");

        q.set_map_range((1.0, 2.0));
        assert_eq!(q.viz_range(), (1.0, 2.0));
        q.reset_map_range();
        assert_eq!(q.viz_range(), q.data_range());
        assert_eq!(q.nice_name(), "temp (node scalar)");
    }

    #[test]
    fn test_magnitude_and_symmetric_ranges() {
        let g = square();
        let magnitude = CuboidScalarQuantity::new(
            "m",
            "sq",
            ElementDomain::Edge,
            vec![2.0, 4.0, 6.0, 8.0],
            DataType::Magnitude,
            &g,
        )
        .unwrap();
        assert_eq!(magnitude.viz_range(), (0.0, 8.0));
        assert_eq!(magnitude.color_map(), "blues");

        let symmetric = CuboidScalarQuantity::new(
            "s",
            "sq",
            ElementDomain::Edge,
            vec![-5.0, 1.0, 2.0, 3.0],
            DataType::Symmetric,
            &g,
        )
        .unwrap();
        assert_eq!(symmetric.viz_range(), (-5.0, 5.0));
        assert_eq!(symmetric.color_map(), "coolwarm");
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let g = square();
        let result = CuboidScalarQuantity::new(
            "bad",
            "sq",
            ElementDomain::Edge,
            vec![1.0; 3],
            DataType::Standard,
            &g,
        );
        assert!(matches!(
            result,
            Err(PolyscopeError::SizeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_edge_scalar_node_average() {
        let g = square();
        let q = CuboidScalarQuantity::new(
            "e",
            "sq",
            ElementDomain::Edge,
            vec![1.0, 2.0, 3.0, 4.0],
            DataType::Standard,
            &g,
        )
        .unwrap();
        // node 0 touches edges 0 and 3
        assert_eq!(q.node_average(), &[2.5, 1.5, 2.5, 3.5]);
        assert_eq!(q.edge_info(2), Some(InfoRow::new("e", "3")));
        assert_eq!(q.node_info(2), None);
    }

    #[test]
    fn test_isolated_node_average_is_zero() {
        let nodes = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let (g, _) = CuboidGeometry::new("iso", nodes, vec![[0, 1]], vec![Vec3::Z]);
        let q = CuboidScalarQuantity::new("e", "iso", ElementDomain::Edge, vec![4.0], DataType::Standard, &g)
            .unwrap();
        assert_eq!(q.node_average(), &[4.0, 4.0, 0.0]);
    }

    #[test]
    fn test_color_map_validation_and_persistence() {
        let g = square();
        let mut q = CuboidScalarQuantity::new(
            "t",
            "sq",
            ElementDomain::Node,
            vec![0.0; 4],
            DataType::Standard,
            &g,
        )
        .unwrap();
        assert!(matches!(
            q.set_color_map("not-a-map"),
            Err(PolyscopeError::UnknownColorMap(_))
        ));
        assert_eq!(q.color_map(), "viridis");
        q.set_color_map("reds").unwrap();

        let mut cache = PersistentCache::new();
        q.save_persistent(&mut cache);
        assert_eq!(
            cache.get::<String>("Cuboid Network#sq#t#cmap"),
            Some("reds".to_string())
        );

        let mut fresh = CuboidScalarQuantity::new(
            "t",
            "sq",
            ElementDomain::Node,
            vec![0.0; 4],
            DataType::Standard,
            &g,
        )
        .unwrap();
        fresh.load_persistent(&cache);
        assert_eq!(fresh.color_map(), "reds");
    }
}
