use std::path::Path;

use polyscope_core::{try_with_context, try_with_context_mut, Context, PersistentCache};

use crate::{
    CuboidNetwork, CuboidNetworkQuantity, DataType, Mat4, PolyscopeError, Result, Structure, Vec2,
    Vec3, VectorType, CUBOID_NETWORK_TYPE,
};

fn register(network: CuboidNetwork) -> Result<CuboidNetworkHandle> {
    let name = network.name().to_string();
    try_with_context_mut(|ctx| -> Result<()> {
        let mut network = network;
        network.set_default_color(ctx.palette.next_color());
        network.load_persistent(&ctx.persistent);
        ctx.registry.register(Box::new(network))?;
        ctx.update_extents();
        log::info!("registered {CUBOID_NETWORK_TYPE} '{name}'");
        Ok(())
    })??;
    Ok(CuboidNetworkHandle { name })
}

/// Registers a cuboid network with explicit edges and one up direction per edge.
///
/// Bad edge indices and a mismatched orientation count do not fail
/// registration; see [`CuboidNetwork::configuration_errors`].
pub fn register_cuboid_network(
    name: impl Into<String>,
    nodes: Vec<Vec3>,
    edges: Vec<[u32; 2]>,
    orientations: Vec<Vec3>,
) -> Result<CuboidNetworkHandle> {
    register(CuboidNetwork::new(name, nodes, edges, orientations))
}

/// Registers a cuboid network as a connected line (0-1-2-3-...).
pub fn register_cuboid_network_line(
    name: impl Into<String>,
    nodes: Vec<Vec3>,
    orientations: Vec<Vec3>,
) -> Result<CuboidNetworkHandle> {
    register(CuboidNetwork::new_line(name, nodes, orientations))
}

/// Registers a cuboid network as a closed loop (0-1-2-...-n-0).
pub fn register_cuboid_network_loop(
    name: impl Into<String>,
    nodes: Vec<Vec3>,
    orientations: Vec<Vec3>,
) -> Result<CuboidNetworkHandle> {
    register(CuboidNetwork::new_loop(name, nodes, orientations))
}

/// Registers a cuboid network in the XY plane with +Z up directions.
pub fn register_cuboid_network_2d(
    name: impl Into<String>,
    nodes: &[Vec2],
    edges: Vec<[u32; 2]>,
) -> Result<CuboidNetworkHandle> {
    register(CuboidNetwork::new_2d(name, nodes, edges))
}

/// Planar version of [`register_cuboid_network_line`].
pub fn register_cuboid_network_line_2d(
    name: impl Into<String>,
    nodes: &[Vec2],
) -> Result<CuboidNetworkHandle> {
    register(CuboidNetwork::new_line_2d(name, nodes))
}

/// Planar version of [`register_cuboid_network_loop`].
pub fn register_cuboid_network_loop_2d(
    name: impl Into<String>,
    nodes: &[Vec2],
) -> Result<CuboidNetworkHandle> {
    register(CuboidNetwork::new_loop_2d(name, nodes))
}

/// Gets a registered cuboid network by name.
#[must_use]
pub fn get_cuboid_network(name: &str) -> Option<CuboidNetworkHandle> {
    has_cuboid_network(name).then(|| CuboidNetworkHandle {
        name: name.to_string(),
    })
}

/// Returns true if a cuboid network with this name is registered.
#[must_use]
pub fn has_cuboid_network(name: &str) -> bool {
    try_with_context(|ctx| ctx.registry.contains(CUBOID_NETWORK_TYPE, name)).unwrap_or(false)
}

/// Removes a cuboid network and its quantities.
///
/// A missing network is an error only if `error_if_absent` is set.
pub fn remove_cuboid_network(name: &str, error_if_absent: bool) -> Result<()> {
    try_with_context_mut(|ctx| -> Result<()> {
        let removed = ctx
            .registry
            .remove_checked(CUBOID_NETWORK_TYPE, name, error_if_absent)?;
        if removed.is_some() {
            ctx.pick.release(CUBOID_NETWORK_TYPE, name);
            ctx.update_extents();
            log::info!("removed {CUBOID_NETWORK_TYPE} '{name}'");
        }
        Ok(())
    })?
}

/// Removes every cuboid network.
pub fn remove_all_cuboid_networks() -> Result<()> {
    let names: Vec<String> = try_with_context(|ctx| {
        ctx.registry
            .iter()
            .filter(|s| s.type_name() == CUBOID_NETWORK_TYPE)
            .map(|s| s.name().to_string())
            .collect()
    })?;
    for name in names {
        remove_cuboid_network(&name, false)?;
    }
    Ok(())
}

/// Executes a closure with mutable access to a registered cuboid network.
///
/// Returns `None` if the cuboid network does not exist. Parameters the closure
/// sets are written to the session's persistent cache.
///
/// # Panics
///
/// Panics if polyscope has not been initialized.
pub fn with_cuboid_network<F, R>(name: &str, f: F) -> Option<R>
where
    F: FnOnce(&mut CuboidNetwork) -> R,
{
    polyscope_core::with_context_mut(|ctx| {
        let Context {
            registry,
            persistent,
            ..
        } = ctx;
        let network = registry
            .get_mut(CUBOID_NETWORK_TYPE, name)
            .and_then(|s| s.as_any_mut().downcast_mut::<CuboidNetwork>())?;
        let result = f(network);
        network.save_persistent(persistent);
        Some(result)
    })
}

/// Executes a closure with immutable access to a registered cuboid network.
///
/// Returns `None` if the cuboid network does not exist.
///
/// # Panics
///
/// Panics if polyscope has not been initialized.
pub fn with_cuboid_network_ref<F, R>(name: &str, f: F) -> Option<R>
where
    F: FnOnce(&CuboidNetwork) -> R,
{
    polyscope_core::with_context(|ctx| {
        ctx.registry
            .get(CUBOID_NETWORK_TYPE, name)
            .and_then(|s| s.as_any().downcast_ref::<CuboidNetwork>())
            .map(f)
    })
}

/// Handle for a registered cuboid network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuboidNetworkHandle {
    name: String,
}

impl CuboidNetworkHandle {
    /// Returns the name of this cuboid network.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `f` on the network with the session's persistent cache, then
    /// writes changed parameters back to the cache.
    fn update<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut CuboidNetwork, &PersistentCache) -> Result<R>,
    {
        try_with_context_mut(|ctx| -> Result<R> {
            let Context {
                registry,
                persistent,
                ..
            } = ctx;
            let network = registry
                .get_mut(CUBOID_NETWORK_TYPE, &self.name)
                .and_then(|s| s.as_any_mut().downcast_mut::<CuboidNetwork>())
                .ok_or_else(|| PolyscopeError::StructureNotFound(self.name.clone()))?;
            let result = f(network, persistent)?;
            network.save_persistent(persistent);
            Ok(result)
        })?
    }

    fn apply<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&mut CuboidNetwork),
    {
        if let Err(err) = self.update(|network, _| {
            f(network);
            Ok(())
        }) {
            log::warn!("{CUBOID_NETWORK_TYPE} '{}': {err}", self.name);
        }
        self
    }

    fn refresh_extents() -> Result<()> {
        try_with_context_mut(Context::update_extents)
    }

    /// Sets the base color.
    pub fn set_color(&self, color: Vec3) -> &Self {
        self.apply(|cn| {
            cn.set_color(color);
        })
    }

    /// Sets the box extent along the binormal.
    pub fn set_width(&self, width: f32, is_relative: bool) -> &Self {
        self.apply(|cn| {
            cn.set_width(width, is_relative);
        })
    }

    /// Sets the box extent along the normal.
    pub fn set_height(&self, height: f32, is_relative: bool) -> &Self {
        self.apply(|cn| {
            cn.set_height(height, is_relative);
        })
    }

    /// Sets the material of the network and its cuboid quantities.
    pub fn set_material(&self, material: &str) -> Result<&Self> {
        self.update(|cn, _| cn.set_material(material).map(|_| ()))?;
        Ok(self)
    }

    /// Toggles exact per-fragment depth.
    pub fn set_depth_write(&self, depth_write: bool) -> &Self {
        self.apply(|cn| {
            cn.set_depth_write(depth_write);
        })
    }

    /// Shows or hides the network.
    pub fn set_enabled(&self, enabled: bool) -> &Self {
        self.apply(|cn| cn.set_enabled(enabled))
    }

    /// Sets the model transform.
    pub fn set_transform(&self, transform: Mat4) -> Result<&Self> {
        self.update(|cn, _| {
            cn.set_transform(transform);
            Ok(())
        })?;
        Self::refresh_extents()?;
        Ok(self)
    }

    /// Moves the nodes. The count must match the current node count.
    pub fn update_node_positions(&self, positions: Vec<Vec3>) -> Result<&Self> {
        self.update(|cn, _| cn.update_node_positions(positions))?;
        Self::refresh_extents()?;
        Ok(self)
    }

    /// Replaces the per-edge up directions. The count must match the edge count.
    pub fn update_orientations(&self, orientations: Vec<Vec3>) -> Result<&Self> {
        self.update(|cn, _| cn.update_orientations(orientations))?;
        Ok(self)
    }

    /// Adds a scalar per node.
    pub fn add_node_scalar_quantity(
        &self,
        name: &str,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&Self> {
        self.update(|cn, cache| {
            cn.add_node_scalar_quantity(name, values, data_type)?
                .as_quantity_mut()
                .load_persistent(cache);
            Ok(())
        })?;
        Ok(self)
    }

    /// Adds a scalar per edge.
    pub fn add_edge_scalar_quantity(
        &self,
        name: &str,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&Self> {
        self.update(|cn, cache| {
            cn.add_edge_scalar_quantity(name, values, data_type)?
                .as_quantity_mut()
                .load_persistent(cache);
            Ok(())
        })?;
        Ok(self)
    }

    /// Adds a color per node.
    pub fn add_node_color_quantity(&self, name: &str, colors: Vec<Vec3>) -> Result<&Self> {
        self.update(|cn, _| cn.add_node_color_quantity(name, colors).map(|_| ()))?;
        Ok(self)
    }

    /// Adds a color per edge.
    pub fn add_edge_color_quantity(&self, name: &str, colors: Vec<Vec3>) -> Result<&Self> {
        self.update(|cn, _| cn.add_edge_color_quantity(name, colors).map(|_| ()))?;
        Ok(self)
    }

    /// Adds a vector per node.
    pub fn add_node_vector_quantity(
        &self,
        name: &str,
        vectors: Vec<Vec3>,
        vector_type: VectorType,
    ) -> Result<&Self> {
        self.update(|cn, cache| {
            cn.add_node_vector_quantity(name, vectors, vector_type)?
                .as_quantity_mut()
                .load_persistent(cache);
            Ok(())
        })?;
        Ok(self)
    }

    /// Adds a vector per edge, rooted at the edge midpoint.
    pub fn add_edge_vector_quantity(
        &self,
        name: &str,
        vectors: Vec<Vec3>,
        vector_type: VectorType,
    ) -> Result<&Self> {
        self.update(|cn, cache| {
            cn.add_edge_vector_quantity(name, vectors, vector_type)?
                .as_quantity_mut()
                .load_persistent(cache);
            Ok(())
        })?;
        Ok(self)
    }

    /// Adds in-plane node vectors.
    pub fn add_node_vector_quantity_2d(
        &self,
        name: &str,
        vectors: &[Vec2],
        vector_type: VectorType,
    ) -> Result<&Self> {
        self.add_node_vector_quantity(name, crate::lift_2d(vectors), vector_type)
    }

    /// Adds in-plane edge vectors.
    pub fn add_edge_vector_quantity_2d(
        &self,
        name: &str,
        vectors: &[Vec2],
        vector_type: VectorType,
    ) -> Result<&Self> {
        self.add_edge_vector_quantity(name, crate::lift_2d(vectors), vector_type)
    }

    /// Shows or hides a quantity; showing a scalar or color hides the others.
    pub fn set_quantity_enabled(&self, name: &str, enabled: bool) -> Result<&Self> {
        self.update(|cn, _| cn.set_quantity_enabled(name, enabled))?;
        Ok(self)
    }

    /// Removes a quantity.
    pub fn remove_quantity(&self, name: &str, error_if_absent: bool) -> Result<&Self> {
        self.update(|cn, _| cn.remove_quantity(name, error_if_absent))?;
        Ok(self)
    }

    /// Writes a vector quantity to a text file.
    pub fn write_vector_quantity(&self, quantity: &str, path: impl AsRef<Path>) -> Result<()> {
        self.update(|cn, _| cn.write_vector_quantity(quantity, path))
    }
}
