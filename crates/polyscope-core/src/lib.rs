//! Core abstractions for polyscope-rs.
//!
//! This crate provides the fundamental traits and types used throughout polyscope-rs:
//! - [`Structure`] trait for geometric objects (cuboid networks)
//! - [`Quantity`] trait for data associated with structures (scalars, vectors, colors)
//! - Global state management, structure registry, and pick index allocation
//! - Persistent visualization parameters and value remapping

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Field names like structure_name are descriptive
#![allow(clippy::struct_field_names)]

pub mod color;
pub mod error;
pub mod persistent;
pub mod pick;
pub mod quantity;
pub mod registry;
pub mod remap;
pub mod state;
pub mod structure;

pub use color::{hsv_to_rgb, UniqueColorSequence};
pub use error::{PolyscopeError, Result};
pub use persistent::{PersistentCache, PersistentValue, ScaledValue};
pub use pick::{PickAllocator, PickRange};
pub use quantity::{Quantity, QuantityKind};
pub use registry::Registry;
pub use remap::{robust_min_max, DataType, VectorMapper, VectorType, ROBUST_RANGE_FRACTION};
pub use state::{
    init_context, is_initialized, shutdown_context, try_with_context, try_with_context_mut,
    with_context, with_context_mut, Context,
};
pub use structure::{unique_prefix, Structure};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
