//! polyscope-rs cuboid networks: nodes joined by edges drawn as oriented boxes.
//!
//! A cuboid network is a graph whose edges are rendered as rectangular boxes
//! running from a tail node to a tip node. Each edge carries an up direction
//! that fixes the box's rotation about the edge axis, so width and height are
//! meaningful. Scalars, colors, and vectors can be attached to nodes or edges.
//!
//! # Quick Start
//!
//! ```no_run
//! use polyscope::*;
//!
//! fn main() -> Result<()> {
//!     init()?;
//!
//!     let nodes = vec![
//!         Vec3::new(0.0, 0.0, 0.0),
//!         Vec3::new(1.0, 0.0, 0.0),
//!         Vec3::new(1.0, 1.0, 0.0),
//!     ];
//!     let network = register_cuboid_network_line("beam", nodes, vec![Vec3::Z; 2])?;
//!     network.set_width(0.05, true);
//!     network.add_edge_scalar_quantity("stress", vec![0.2, 0.9], DataType::Standard)?;
//!
//!     // Any RenderBackend works; the headless one records what would be drawn.
//!     let mut backend = HeadlessBackend::new();
//!     draw_cuboid_networks(&mut backend, &ViewParameters::default())?;
//!
//!     shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - A **structure** is a geometric object in the scene; here, a [`CuboidNetwork`].
//! - A **quantity** is data associated with a structure: [`CuboidScalarQuantity`],
//!   [`CuboidColorQuantity`], or [`CuboidVectorQuantity`].
//!
//! Registered structures live in a global context. Handles returned by the
//! `register_*` functions hold only a name and look the structure up on use.

// Graphics code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod cuboid_network;
mod init;
mod persistence;
mod render;

pub use cuboid_network::*;
pub use init::{init, is_initialized, shutdown};
pub use persistence::{load_persistent_cache, save_persistent_cache};
pub use render::{
    draw_cuboid_networks, draw_pick_cuboid_networks, pick_global_index, shader_library,
};

// Re-export core types
pub use polyscope_core::{
    error::{PolyscopeError, Result},
    persistent::{PersistentCache, ScaledValue},
    pick::PickAllocator,
    quantity::{Quantity, QuantityKind},
    remap::{DataType, VectorType},
    state::{with_context, with_context_mut, Context},
    structure::Structure,
    Mat4, Vec2, Vec3, Vec4,
};

// Re-export render types
pub use polyscope_render::{
    index_to_vec, vec_to_index, BackendEvent, ColorMapRegistry, HeadlessBackend, MaterialRegistry,
    ProgramVariant, RenderBackend, ShaderProgram, UniformValue, ViewParameters,
};

// Re-export structures
pub use polyscope_structures::cuboid_network::lift_2d;
pub use polyscope_structures::{
    CuboidColorQuantity, CuboidNetwork, CuboidNetworkQuantity, CuboidPickElement, CuboidPickInfo,
    CuboidQuantity, CuboidScalarQuantity, CuboidVectorQuantity, ElementDomain, InfoRow,
    CUBOID_NETWORK_TYPE,
};
