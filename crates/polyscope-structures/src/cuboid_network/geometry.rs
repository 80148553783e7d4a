//! Cuboid network geometry and the per-instance buffers built from it.

use glam::{Mat4, Vec2, Vec3};
use polyscope_core::{PolyscopeError, Result};
use polyscope_render::{AttributeData, RenderResult, ShaderProgram};

/// Orientation used when none is given or the given count is short.
pub const DEFAULT_ORIENTATION: Vec3 = Vec3::Z;

/// Nodes, edges, and per-edge up directions.
///
/// Edge topology is fixed at construction. Edges whose endpoints are out of
/// range are kept; the missing endpoint contributes nothing to node degrees
/// and sits at the origin in every buffer.
#[derive(Debug, Clone)]
pub struct CuboidGeometry {
    nodes: Vec<Vec3>,
    edges: Vec<[u32; 2]>,
    orientations: Vec<Vec3>,
    node_degrees: Vec<usize>,
}

impl CuboidGeometry {
    /// Builds the geometry and returns it with every configuration problem found.
    pub fn new(
        structure: &str,
        nodes: Vec<Vec3>,
        edges: Vec<[u32; 2]>,
        mut orientations: Vec<Vec3>,
    ) -> (Self, Vec<PolyscopeError>) {
        let mut errors = Vec::new();
        let num_nodes = nodes.len();

        for (edge, &[tail, tip]) in edges.iter().enumerate() {
            if tail as usize >= num_nodes || tip as usize >= num_nodes {
                errors.push(PolyscopeError::BadEdgeIndex {
                    structure: structure.to_string(),
                    edge,
                    tail: tail as usize,
                    tip: tip as usize,
                    num_nodes,
                });
            }
        }

        if orientations.len() != edges.len() {
            errors.push(PolyscopeError::SizeMismatch {
                expected: edges.len(),
                actual: orientations.len(),
            });
            orientations.resize(edges.len(), DEFAULT_ORIENTATION);
        }

        let mut geometry = Self {
            nodes,
            edges,
            orientations,
            node_degrees: Vec::new(),
        };
        geometry.compute_degrees();
        (geometry, errors)
    }

    fn compute_degrees(&mut self) {
        let mut degrees = vec![0; self.nodes.len()];
        for &[tail, tip] in &self.edges {
            for endpoint in [tail, tip] {
                if let Some(d) = degrees.get_mut(endpoint as usize) {
                    *d += 1;
                }
            }
        }
        self.node_degrees = degrees;
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Vec3] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }

    #[must_use]
    pub fn orientations(&self) -> &[Vec3] {
        &self.orientations
    }

    /// Number of edges incident to each node; a self loop counts twice.
    #[must_use]
    pub fn node_degrees(&self) -> &[usize] {
        &self.node_degrees
    }

    /// Position of a node, or the origin if the index is out of range.
    #[must_use]
    pub fn node(&self, index: u32) -> Vec3 {
        self.nodes.get(index as usize).copied().unwrap_or(Vec3::ZERO)
    }

    /// Returns true if `index` names an existing node.
    #[must_use]
    pub fn has_node(&self, index: u32) -> bool {
        (index as usize) < self.nodes.len()
    }

    /// Tail and tip positions of an edge.
    #[must_use]
    pub fn edge_endpoints(&self, edge: usize) -> (Vec3, Vec3) {
        let [tail, tip] = self.edges[edge];
        (self.node(tail), self.node(tip))
    }

    /// Midpoint of an edge.
    #[must_use]
    pub fn edge_midpoint(&self, edge: usize) -> Vec3 {
        let (tail, tip) = self.edge_endpoints(edge);
        0.5 * (tail + tip)
    }

    /// Replaces node positions; the count must not change.
    pub fn set_node_positions(&mut self, positions: Vec<Vec3>) -> Result<()> {
        if positions.len() != self.nodes.len() {
            return Err(PolyscopeError::SizeMismatch {
                expected: self.nodes.len(),
                actual: positions.len(),
            });
        }
        self.nodes = positions;
        Ok(())
    }

    /// Replaces the per-edge up directions; the count must equal the edge count.
    pub fn set_orientations(&mut self, orientations: Vec<Vec3>) -> Result<()> {
        if orientations.len() != self.edges.len() {
            return Err(PolyscopeError::SizeMismatch {
                expected: self.edges.len(),
                actual: orientations.len(),
            });
        }
        self.orientations = orientations;
        Ok(())
    }

    /// World-space axis-aligned bounds of the nodes under `transform`.
    #[must_use]
    pub fn bounding_box(&self, transform: Mat4) -> Option<(Vec3, Vec3)> {
        let mut points = self.nodes.iter().map(|p| transform.transform_point3(*p));
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Twice the largest distance from the bounding box center to a node.
    #[must_use]
    pub fn length_scale(&self, transform: Mat4) -> f32 {
        let Some((min, max)) = self.bounding_box(transform) else {
            return 1.0;
        };
        let center = 0.5 * (min + max);
        let max_sq = self
            .nodes
            .iter()
            .map(|p| transform.transform_point3(*p).distance_squared(center))
            .fold(0.0_f32, f32::max);
        2.0 * max_sq.sqrt()
    }

    /// Expands the geometry into one entry per edge.
    #[must_use]
    pub fn edge_buffers(&self) -> EdgeGeometryBuffers {
        let mut buffers = EdgeGeometryBuffers {
            tail: Vec::with_capacity(self.edges.len()),
            tip: Vec::with_capacity(self.edges.len()),
            up: self.orientations.clone(),
        };
        for &[tail, tip] in &self.edges {
            buffers.tail.push(self.node(tail));
            buffers.tip.push(self.node(tip));
        }
        buffers
    }

    #[must_use]
    pub fn node_buffers(&self) -> NodeGeometryBuffers {
        NodeGeometryBuffers {
            positions: self.nodes.clone(),
        }
    }
}

/// Lifts 2D positions into the XY plane.
#[must_use]
pub fn lift_2d(points: &[Vec2]) -> Vec<Vec3> {
    points.iter().map(|p| p.extend(0.0)).collect()
}

/// Edges `0-1, 1-2, ...` through `n` nodes.
#[must_use]
pub fn line_edges(n: usize) -> Vec<[u32; 2]> {
    (0..n.saturating_sub(1))
        .map(|i| [i as u32, (i + 1) as u32])
        .collect()
}

/// Edges `0-1, ..., (n-1)-0` through `n` nodes.
#[must_use]
pub fn loop_edges(n: usize) -> Vec<[u32; 2]> {
    (0..n).map(|i| [i as u32, ((i + 1) % n) as u32]).collect()
}

/// Per-edge instance data for every cuboid program.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeometryBuffers {
    pub tail: Vec<Vec3>,
    pub tip: Vec<Vec3>,
    pub up: Vec<Vec3>,
}

impl EdgeGeometryBuffers {
    /// Binds `a_position_tail`, `a_position_tip`, and `a_up_direction`.
    pub fn fill(&self, program: &mut dyn ShaderProgram) -> RenderResult<()> {
        program.set_attribute("a_position_tail", AttributeData::Vec3(self.tail.clone()))?;
        program.set_attribute("a_position_tip", AttributeData::Vec3(self.tip.clone()))?;
        program.set_attribute("a_up_direction", AttributeData::Vec3(self.up.clone()))
    }
}

/// Per-node instance data for the node pick program.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGeometryBuffers {
    pub positions: Vec<Vec3>,
}

impl NodeGeometryBuffers {
    /// Binds `a_position`.
    pub fn fill(&self, program: &mut dyn ShaderProgram) -> RenderResult<()> {
        program.set_attribute("a_position", AttributeData::Vec3(self.positions.clone()))
    }
}
