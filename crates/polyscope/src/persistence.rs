//! Saving and restoring visualization parameters across sessions.

use std::path::Path;

use polyscope_core::{try_with_context_mut, Context, PersistentCache};

use crate::Result;

/// Writes every user-changed parameter of the session to a JSON file.
pub fn save_persistent_cache(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    try_with_context_mut(|ctx| -> Result<()> {
        let Context {
            registry,
            persistent,
            ..
        } = ctx;
        for structure in registry.iter() {
            structure.save_persistent(persistent);
        }
        persistent.save(path)?;
        log::info!("saved {} persistent values to {}", persistent.len(), path.display());
        Ok(())
    })?
}

/// Replaces the session's persistent cache with a JSON file and applies it to
/// every registered structure.
///
/// Structures registered later pick up their values at registration.
pub fn load_persistent_cache(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let cache = PersistentCache::load(path)?;
    try_with_context_mut(|ctx| {
        ctx.persistent = cache;
        let Context {
            registry,
            persistent,
            ..
        } = ctx;
        for structure in registry.iter_mut() {
            structure.load_persistent(persistent);
        }
        log::info!("loaded {} persistent values from {}", persistent.len(), path.display());
    })
}
