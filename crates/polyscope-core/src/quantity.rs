//! Quantity trait and related types.
//!
//! A [`Quantity`] represents data associated with a structure, such as scalar values,
//! vector fields, or colors.

use std::any::Any;

/// The kind of quantity (for categorization and UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantityKind {
    /// Scalar values (single float per element).
    Scalar,
    /// Vector values (Vec3 per element).
    Vector,
    /// Color values (RGB per element).
    Color,
}

/// Data associated with a structure that can be visualized.
pub trait Quantity: Any + Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the name of this quantity.
    fn name(&self) -> &str;

    /// Returns the name of the parent structure.
    fn structure_name(&self) -> &str;

    /// Returns the kind of this quantity.
    fn kind(&self) -> QuantityKind;

    /// Display name including where the data lives, e.g. `"temp (node scalar)"`.
    fn nice_name(&self) -> String;

    /// Returns whether this quantity is currently enabled/visible.
    fn is_enabled(&self) -> bool;

    /// Sets the enabled state of this quantity.
    fn set_enabled(&mut self, enabled: bool);

    /// Whether this quantity replaces the structure's own base drawing when enabled.
    fn is_dominant(&self) -> bool;

    /// Drops cached GPU resources so they are rebuilt on next use.
    fn refresh(&mut self);

    /// Returns the number of data elements.
    fn data_size(&self) -> usize;
}
