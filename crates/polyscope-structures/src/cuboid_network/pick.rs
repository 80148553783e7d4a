//! Decoding pick indices into nodes and edges.

use std::fmt;

use polyscope_core::{PolyscopeError, Result};
use polyscope_render::PICK_END_FRACTION;

/// The element a pick landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CuboidPickElement {
    Node(usize),
    Edge(usize),
}

impl fmt::Display for CuboidPickElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(i) => write!(f, "node #{i}"),
            Self::Edge(i) => write!(f, "edge #{i}"),
        }
    }
}

/// Splits a structure-local pick index: nodes come first, then edges.
pub fn decode_local(
    structure: &str,
    local: u64,
    num_nodes: usize,
    num_edges: usize,
) -> Result<CuboidPickElement> {
    let bad = || PolyscopeError::BadPickIndex {
        structure: structure.to_string(),
        index: local,
    };
    let local = usize::try_from(local).map_err(|_| bad())?;
    if local < num_nodes {
        Ok(CuboidPickElement::Node(local))
    } else if local - num_nodes < num_edges {
        Ok(CuboidPickElement::Edge(local - num_nodes))
    } else {
        Err(bad())
    }
}

/// Which element a hit on an edge box reports, given the hit's parameter
/// along the edge (0 at the tail, 1 at the tip).
///
/// Hits near either end report the node there. Ends that reference a
/// missing node fall back to the edge.
pub fn resolve_edge_hit(
    edge: usize,
    endpoints: [u32; 2],
    num_nodes: usize,
    edge_param: f32,
) -> CuboidPickElement {
    let [tail, tip] = endpoints;
    if edge_param < PICK_END_FRACTION && (tail as usize) < num_nodes {
        CuboidPickElement::Node(tail as usize)
    } else if edge_param >= 1.0 - PICK_END_FRACTION && (tip as usize) < num_nodes {
        CuboidPickElement::Node(tip as usize)
    } else {
        CuboidPickElement::Edge(edge)
    }
}

/// One label/value line of pick information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRow {
    pub label: String,
    pub value: String,
}

impl InfoRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Everything a UI shows about a picked element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuboidPickInfo {
    pub structure: String,
    pub element: CuboidPickElement,
    /// Geometry rows first, then one row per quantity defined on the element.
    pub rows: Vec<InfoRow>,
}

impl CuboidPickInfo {
    /// Looks up a row by label.
    pub fn row(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}
