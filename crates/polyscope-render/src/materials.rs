//! Material names understood by the lighting rules.
//!
//! Materials are matcap lookups. Blendable materials (clay, wax, candy, flat)
//! tint their R/G/B/K matcap channels by the surface color; static materials
//! (mud, ceramic, jade, normal) use one texture for every channel. The texture
//! data itself belongs to the backend; this module only knows which names exist.

use std::collections::HashMap;
use std::sync::OnceLock;

/// The material every structure starts with.
pub const DEFAULT_MATERIAL: &str = "clay";

/// A material definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Whether this is a flat (unlit) material.
    pub is_flat: bool,
    /// Whether this material has separate R/G/B/K matcap channels.
    pub is_blendable: bool,
}

impl Material {
    /// Creates a blendable material.
    pub fn blendable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_flat: false,
            is_blendable: true,
        }
    }

    /// Creates a static (single texture) material.
    pub fn static_mat(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_flat: false,
            is_blendable: false,
        }
    }

    /// Creates a flat (unlit) material. Flat is blendable but skips the matcap.
    pub fn flat(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_flat: true,
            is_blendable: true,
        }
    }
}

/// Registry for managing materials.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    materials: HashMap<String, Material>,
}

impl MaterialRegistry {
    /// Creates a new material registry with default materials.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        for name in ["clay", "wax", "candy"] {
            registry.register(Material::blendable(name));
        }
        for name in ["mud", "ceramic", "jade", "normal"] {
            registry.register(Material::static_mat(name));
        }
        registry.register(Material::flat("flat"));
        registry
    }

    /// Registers a material.
    pub fn register(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    /// Gets a material by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Returns true if a material with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    /// Returns all material names, built-ins first in a stable order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        const BUILTIN_ORDER: &[&str] = &[
            "clay", "wax", "candy", "flat", "mud", "ceramic", "jade", "normal",
        ];
        let mut names: Vec<&str> = BUILTIN_ORDER
            .iter()
            .copied()
            .filter(|n| self.materials.contains_key(*n))
            .collect();
        let mut custom: Vec<&str> = self
            .materials
            .keys()
            .map(String::as_str)
            .filter(|n| !BUILTIN_ORDER.contains(n))
            .collect();
        custom.sort_unstable();
        names.extend(custom);
        names
    }

    /// The built-in materials shared by every session.
    pub fn builtin() -> &'static MaterialRegistry {
        static BUILTIN: OnceLock<MaterialRegistry> = OnceLock::new();
        BUILTIN.get_or_init(MaterialRegistry::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_materials() {
        let registry = MaterialRegistry::builtin();
        assert!(registry.has(DEFAULT_MATERIAL));
        assert!(registry.get("clay").unwrap().is_blendable);
        assert!(!registry.get("jade").unwrap().is_blendable);
        assert!(registry.get("flat").unwrap().is_flat);
        assert_eq!(registry.names().len(), 8);
        assert_eq!(registry.names()[0], "clay");
    }

    #[test]
    fn test_custom_materials_sort_last() {
        let mut registry = MaterialRegistry::new();
        registry.register(Material::static_mat("zinc"));
        registry.register(Material::static_mat("amber"));
        let names = registry.names();
        assert_eq!(&names[8..], &["amber", "zinc"]);
    }
}
