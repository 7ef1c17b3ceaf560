//! # Textures
//!
//! Texture rasters, the gray/tint remap applied when sampling them, and the
//! registry service that owns them. Faces and palettes hold `Arc` references
//! into the registry; rasters are never mutated once registered.

use std::{collections::HashMap, sync::Arc};

mod raster;
mod remap;

pub use raster::TextureRaster;
pub use remap::ColorRemap;

/// Owns every texture raster available to drawing operations.
///
/// The registry is built once per configuration load and then shared
/// read-only; replacing a texture hands out a new `Arc` without disturbing
/// faces that still reference the old one.
#[derive(Debug, Default, Clone)]
pub struct TextureRegistry {
    textures: HashMap<String, Arc<TextureRaster>>,
}

impl TextureRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a raster under `name`, returning the shared handle.
    pub fn insert(&mut self, name: impl Into<String>, raster: TextureRaster) -> Arc<TextureRaster> {
        let raster = Arc::new(raster);
        self.textures.insert(name.into(), raster.clone());
        raster
    }

    /// Looks up a raster by name.
    pub fn get(&self, name: &str) -> Option<Arc<TextureRaster>> {
        self.textures.get(name).cloned()
    }
}
