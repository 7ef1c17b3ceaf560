//! # Material Module
//!
//! Placeable materials and the palette entries describing them.

use std::collections::HashSet;

use image::Rgba;
use serde::{Deserialize, Serialize};

/// Opaque id of a placeable material.
///
/// Id `0` is reserved for [`Material::EMPTY`], meaning "no block".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Material(pub u32);

impl Material {
    /// Sentinel for "no block".
    pub const EMPTY: Material = Material(0);

    /// Whether this is the empty sentinel.
    pub fn is_empty(self) -> bool {
        self == Material::EMPTY
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::EMPTY
    }
}

/// Context a draw call runs in; restricts which materials it may choose.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationTag {
    /// Flat images and maps
    Image,
    /// Textured boxes built from block faces
    Block,
    /// Triangle models
    Statue,
}

/// A material together with its representative color and allowed contexts.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialEntry {
    material: Material,
    color: Rgba<u8>,
    tags: HashSet<OperationTag>,
}

impl MaterialEntry {
    /// Creates an entry.
    ///
    /// # Arguments
    /// * `material` - The material placed when this entry is chosen
    /// * `color` - Precomputed average color of the material's texture
    /// * `tags` - Operations allowed to choose this entry
    pub fn new(material: Material, color: Rgba<u8>, tags: impl IntoIterator<Item = OperationTag>) -> Self {
        MaterialEntry {
            material,
            color,
            tags: tags.into_iter().collect(),
        }
    }

    /// The material placed when this entry is chosen.
    pub fn material(&self) -> Material {
        self.material
    }

    /// Representative color.
    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    /// Whether `tag` may choose this entry.
    pub fn allows(&self, tag: OperationTag) -> bool {
        self.tags.contains(&tag)
    }
}
