//! Global state management for polyscope.

use std::sync::{OnceLock, RwLock};

use glam::Vec3;

use crate::color::UniqueColorSequence;
use crate::error::{PolyscopeError, Result};
use crate::persistent::PersistentCache;
use crate::pick::PickAllocator;
use crate::registry::Registry;

/// Global context singleton.
static CONTEXT: OnceLock<RwLock<Context>> = OnceLock::new();

/// The global context containing all polyscope state.
pub struct Context {
    /// Whether polyscope has been initialized.
    pub initialized: bool,

    /// The structure registry.
    pub registry: Registry,

    /// Global pick index ranges.
    pub pick: PickAllocator,

    /// Persisted visualization parameters, keyed by structure prefix.
    pub persistent: PersistentCache,

    /// Default colors handed to new structures.
    pub palette: UniqueColorSequence,

    /// Representative length scale for all registered structures.
    pub length_scale: f32,

    /// Axis-aligned bounding box for all registered structures.
    pub bounding_box: (Vec3, Vec3),
}

impl Default for Context {
    fn default() -> Self {
        Self {
            initialized: false,
            registry: Registry::new(),
            pick: PickAllocator::new(),
            persistent: PersistentCache::new(),
            palette: UniqueColorSequence::new(),
            length_scale: 1.0,
            bounding_box: (Vec3::ZERO, Vec3::ONE),
        }
    }
}

impl Context {
    /// Computes the center of the bounding box.
    pub fn center(&self) -> Vec3 {
        (self.bounding_box.0 + self.bounding_box.1) * 0.5
    }

    /// Updates the global bounding box and length scale from all structures.
    pub fn update_extents(&mut self) {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut has_extent = false;

        for structure in self.registry.iter() {
            if let Some((bb_min, bb_max)) = structure.bounding_box() {
                min = min.min(bb_min);
                max = max.max(bb_max);
                has_extent = true;
            }
        }

        if has_extent {
            self.bounding_box = (min, max);
            self.length_scale = (max - min).length();
        } else {
            self.bounding_box = (Vec3::ZERO, Vec3::ONE);
            self.length_scale = 1.0;
        }
    }
}

/// Initializes the global context.
///
/// Calling this again after [`shutdown_context`] starts a fresh session.
pub fn init_context() -> Result<()> {
    let lock = CONTEXT.get_or_init(|| RwLock::new(Context::default()));
    let mut ctx = lock.write().map_err(|_| PolyscopeError::NotInitialized)?;
    if ctx.initialized {
        return Err(PolyscopeError::AlreadyInitialized);
    }
    *ctx = Context {
        initialized: true,
        ..Context::default()
    };
    Ok(())
}

/// Returns whether the context has been initialized.
pub fn is_initialized() -> bool {
    CONTEXT
        .get()
        .and_then(|lock| lock.read().ok())
        .is_some_and(|ctx| ctx.initialized)
}

/// Access the global context for reading.
///
/// # Panics
///
/// Panics if polyscope has not been initialized.
pub fn with_context<F, R>(f: F) -> R
where
    F: FnOnce(&Context) -> R,
{
    let lock = CONTEXT.get().expect("polyscope not initialized");
    let guard = lock.read().expect("context lock poisoned");
    f(&guard)
}

/// Access the global context for writing.
///
/// # Panics
///
/// Panics if polyscope has not been initialized.
pub fn with_context_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Context) -> R,
{
    let lock = CONTEXT.get().expect("polyscope not initialized");
    let mut guard = lock.write().expect("context lock poisoned");
    f(&mut guard)
}

/// Try to access the global context for reading.
///
/// Returns `NotInitialized` if polyscope has not been initialized.
pub fn try_with_context<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&Context) -> R,
{
    let lock = CONTEXT.get().ok_or(PolyscopeError::NotInitialized)?;
    let guard = lock.read().map_err(|_| PolyscopeError::NotInitialized)?;
    if !guard.initialized {
        return Err(PolyscopeError::NotInitialized);
    }
    Ok(f(&guard))
}

/// Try to access the global context for writing.
///
/// Returns `NotInitialized` if polyscope has not been initialized.
pub fn try_with_context_mut<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&mut Context) -> R,
{
    let lock = CONTEXT.get().ok_or(PolyscopeError::NotInitialized)?;
    let mut guard = lock.write().map_err(|_| PolyscopeError::NotInitialized)?;
    if !guard.initialized {
        return Err(PolyscopeError::NotInitialized);
    }
    Ok(f(&mut guard))
}

/// Shuts down the global context, dropping every structure.
pub fn shutdown_context() {
    if let Some(lock) = CONTEXT.get() {
        if let Ok(mut ctx) = lock.write() {
            ctx.initialized = false;
            ctx.registry.clear();
            ctx.pick.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extents() {
        let mut ctx = Context::default();
        ctx.update_extents();
        assert_eq!(ctx.length_scale, 1.0);
        assert_eq!(ctx.center(), Vec3::splat(0.5));
    }
}
