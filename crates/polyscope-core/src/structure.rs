//! Structure trait and related types.
//!
//! A [`Structure`] represents a geometric object in the scene, such as a cuboid network.

use std::any::Any;

use glam::{Mat4, Vec3};

use crate::persistent::PersistentCache;

/// A geometric object that can be visualized in polyscope.
///
/// Structures are the primary objects managed by polyscope. Each structure has:
/// - A unique name within its type
/// - A transform matrix for positioning in the scene
/// - Visibility state
/// - Persisted visualization parameters
pub trait Structure: Any + Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the unique name of this structure.
    fn name(&self) -> &str;

    /// Returns the type name of this structure (e.g., "`Cuboid Network`").
    fn type_name(&self) -> &'static str;

    /// Returns the axis-aligned bounding box in world coordinates.
    ///
    /// Returns `None` if the structure has no spatial extent.
    fn bounding_box(&self) -> Option<(Vec3, Vec3)>;

    /// Returns a characteristic length scale for this structure.
    fn length_scale(&self) -> f32;

    /// Returns the current model transform matrix.
    fn transform(&self) -> Mat4;

    /// Sets the model transform matrix.
    fn set_transform(&mut self, transform: Mat4);

    /// Returns whether this structure is currently visible.
    fn is_enabled(&self) -> bool;

    /// Sets the visibility of this structure.
    fn set_enabled(&mut self, enabled: bool);

    /// Drops cached GPU resources of the structure and all its quantities.
    fn refresh(&mut self);

    /// Resets the transform to identity.
    fn reset_transform(&mut self) {
        self.set_transform(Mat4::IDENTITY);
    }

    /// Restores persisted visualization parameters from the cache.
    fn load_persistent(&mut self, _cache: &PersistentCache) {}

    /// Writes manually changed visualization parameters to the cache.
    fn save_persistent(&self, _cache: &mut PersistentCache) {}
}

/// Prefix used for all persistent keys belonging to one structure instance.
#[must_use]
pub fn unique_prefix(type_name: &str, name: &str) -> String {
    format!("{type_name}#{name}#")
}
