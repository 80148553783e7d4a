//! Drawing and picking entry points.
//!
//! The caller owns the backend and the camera; polyscope owns the structures,
//! the composed shader programs, and the global pick index ranges.

use std::sync::OnceLock;

use polyscope_core::{try_with_context, try_with_context_mut, Context};
use polyscope_render::{RenderBackend, RenderContext, RenderError, ShaderLibrary, ViewParameters};

use crate::{CuboidNetwork, CuboidPickInfo, Result, CUBOID_NETWORK_TYPE};

static SHADERS: OnceLock<ShaderLibrary> = OnceLock::new();

/// The built-in program variants, composed on first use.
pub fn shader_library() -> Result<&'static ShaderLibrary> {
    if let Some(library) = SHADERS.get() {
        return Ok(library);
    }
    let library = ShaderLibrary::with_builtin_programs().map_err(RenderError::from)?;
    log::debug!("composed {} shader program variants", library.variant_count());
    Ok(SHADERS.get_or_init(|| library))
}

fn for_each_network<F>(
    backend: &mut dyn RenderBackend,
    view: &ViewParameters,
    mut f: F,
) -> Result<()>
where
    F: FnMut(&mut CuboidNetwork, &mut RenderContext<'_>) -> Result<()>,
{
    let shaders = shader_library()?;
    try_with_context_mut(|ctx| -> Result<()> {
        let Context { registry, pick, .. } = ctx;
        for structure in registry.iter_type_mut(CUBOID_NETWORK_TYPE) {
            if let Some(network) = structure.as_any_mut().downcast_mut::<CuboidNetwork>() {
                let mut render = RenderContext {
                    backend: &mut *backend,
                    shaders,
                    view,
                    pick: &mut *pick,
                };
                f(network, &mut render)?;
            }
        }
        Ok(())
    })?
}

/// Draws every registered cuboid network and its enabled quantities.
pub fn draw_cuboid_networks(backend: &mut dyn RenderBackend, view: &ViewParameters) -> Result<()> {
    for_each_network(backend, view, |network, render| {
        network.draw(render)?;
        Ok(())
    })
}

/// Draws every registered cuboid network into the pick buffer.
///
/// Each network is given its own range of global pick indices; read a pixel
/// back, decode it with [`polyscope_render::vec_to_index`], and pass the
/// result to [`pick_global_index`].
pub fn draw_pick_cuboid_networks(
    backend: &mut dyn RenderBackend,
    view: &ViewParameters,
) -> Result<()> {
    for_each_network(backend, view, |network, render| {
        network.draw_pick(render)?;
        Ok(())
    })
}

/// Resolves a global pick index to the element it names.
///
/// Returns `None` for the background and for indices no cuboid network owns.
pub fn pick_global_index(global: u64) -> Result<Option<CuboidPickInfo>> {
    try_with_context(|ctx| -> Result<Option<CuboidPickInfo>> {
        let Some((type_name, name, local)) = ctx.pick.lookup(global) else {
            return Ok(None);
        };
        if type_name != CUBOID_NETWORK_TYPE {
            return Ok(None);
        }
        let Some(network) = ctx
            .registry
            .get(CUBOID_NETWORK_TYPE, name)
            .and_then(|s| s.as_any().downcast_ref::<CuboidNetwork>())
        else {
            return Ok(None);
        };
        network.build_pick_info(local).map(Some)
    })?
}
