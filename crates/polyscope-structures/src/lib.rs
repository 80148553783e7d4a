//! Structure implementations for polyscope-rs.
//!
//! This crate provides the cuboid network: nodes joined by edges drawn as
//! oriented boxes, with scalar, color, and vector quantities on nodes or edges.

// Graphics code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod cuboid_network;

pub use cuboid_network::{
    CuboidColorQuantity, CuboidNetwork, CuboidNetworkQuantity, CuboidPickElement, CuboidPickInfo,
    CuboidQuantity, CuboidScalarQuantity, CuboidVectorQuantity, ElementDomain, InfoRow,
    CUBOID_NETWORK_TYPE,
};
