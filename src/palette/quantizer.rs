//! # Color Quantizer
//!
//! Maps sampled colors to the closest allowed material.
//!
//! The quantizer holds an immutable palette snapshot behind a shared handle;
//! installing a new palette swaps the snapshot, so a drawing in progress keeps
//! quantizing against the palette it started with. Results are memoized in a
//! fixed-capacity LRU cache guarded by its own lock, independent of the
//! placement queue.

use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex, PoisonError},
};

use image::Rgba;
use log::{debug, info};
use lru::LruCache;

use super::{
    material::{Material, OperationTag},
    matching::Palette,
};
use crate::{config::PlacementConfig, core::MtResource};

/// Cache key: palette generation, requested color and operation.
type CacheKey = (u64, [u8; 4], OperationTag);

/// An installed palette and the generation number it was installed under.
struct PaletteSnapshot {
    generation: u64,
    palette: Arc<Palette>,
}

/// Nearest-material lookup with an optional LRU cache.
///
/// # Examples
///
/// ```
/// use image::Rgba;
/// use voxel_placer::palette::{ColorQuantizer, Material, MaterialEntry, OperationTag, Palette};
///
/// let quantizer = ColorQuantizer::new(32, Some(128));
/// assert!(!quantizer.is_initialized());
///
/// quantizer.install_palette(Palette::new(vec![
///     MaterialEntry::new(Material(1), Rgba([255, 255, 255, 255]), [OperationTag::Image]),
/// ]));
/// assert_eq!(quantizer.quantize(Rgba([240, 240, 240, 255]), OperationTag::Image), Material(1));
/// assert_eq!(quantizer.quantize(Rgba([240, 240, 240, 0]), OperationTag::Image), Material::EMPTY);
/// ```
pub struct ColorQuantizer {
    palette: MtResource<Option<PaletteSnapshot>>,
    alpha_threshold: u8,
    cache: Option<Mutex<LruCache<CacheKey, Material>>>,
}

impl ColorQuantizer {
    /// Creates an uninitialized quantizer.
    ///
    /// # Arguments
    /// * `alpha_threshold` - Colors with alpha below this quantize to `EMPTY`
    /// * `cache_capacity` - LRU capacity; `None` or zero disables caching
    pub fn new(alpha_threshold: u8, cache_capacity: Option<usize>) -> Self {
        ColorQuantizer {
            palette: MtResource::new(None),
            alpha_threshold,
            cache: cache_capacity
                .and_then(NonZeroUsize::new)
                .map(|capacity| Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Creates an uninitialized quantizer from the placement configuration.
    pub fn from_config(config: &PlacementConfig) -> Self {
        Self::new(config.alpha_threshold, config.color_cache_capacity)
    }

    /// Installs a palette, replacing any previous one.
    ///
    /// Cached results for the previous palette are discarded.
    pub fn install_palette(&self, palette: Palette) {
        let entries = palette.len();
        {
            let mut slot = self.palette.get_mut();
            let generation = slot.as_ref().map_or(0, |snapshot| snapshot.generation + 1);
            *slot = Some(PaletteSnapshot {
                generation,
                palette: Arc::new(palette),
            });
        }
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
        info!("Installed palette with {} entries", entries);
    }

    /// Whether a palette has been installed.
    pub fn is_initialized(&self) -> bool {
        self.palette.get().is_some()
    }

    /// The currently installed palette.
    pub fn palette(&self) -> Option<Arc<Palette>> {
        self.palette
            .get()
            .as_ref()
            .map(|snapshot| snapshot.palette.clone())
    }

    /// Number of memoized results.
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| {
            cache.lock().unwrap_or_else(PoisonError::into_inner).len()
        })
    }

    /// Returns the material closest to `color` among those allowed for `tag`.
    ///
    /// Returns `Material::EMPTY` without searching when the color is fully
    /// transparent, its alpha is below the threshold or no palette is
    /// installed, and when no entry is allowed for `tag`.
    pub fn quantize(&self, color: Rgba<u8>, tag: OperationTag) -> Material {
        let alpha = color.0[3];
        if alpha == 0 || alpha < self.alpha_threshold {
            return Material::EMPTY;
        }

        let Some((generation, palette)) = self
            .palette
            .get()
            .as_ref()
            .map(|snapshot| (snapshot.generation, snapshot.palette.clone()))
        else {
            debug!("Quantizing against an uninitialized palette");
            return Material::EMPTY;
        };

        let key = (generation, color.0, tag);
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(material) = cache.get(&key) {
                return *material;
            }
        }

        let material = palette
            .nearest(color, tag)
            .map_or(Material::EMPTY, |entry| entry.material());

        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .put(key, material);
        }
        material
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::MaterialEntry;

    fn palette() -> Palette {
        Palette::new(vec![
            MaterialEntry::new(Material(1), Rgba([0, 0, 0, 255]), [OperationTag::Block, OperationTag::Statue]),
            MaterialEntry::new(Material(2), Rgba([255, 255, 255, 255]), [OperationTag::Block]),
            MaterialEntry::new(Material(3), Rgba([200, 30, 30, 120]), [OperationTag::Block]),
        ])
    }

    #[test]
    fn test_uninitialized_returns_empty() {
        let quantizer = ColorQuantizer::new(1, Some(8));
        assert!(!quantizer.is_initialized());
        assert_eq!(quantizer.quantize(Rgba([1, 2, 3, 255]), OperationTag::Block), Material::EMPTY);
        assert_eq!(quantizer.cached_len(), 0);
    }

    #[test]
    fn test_transparent_returns_empty() {
        for threshold in [0, 32] {
            let quantizer = ColorQuantizer::new(threshold, Some(8));
            quantizer.install_palette(palette());
            for color in [Rgba([0, 0, 0, 0]), Rgba([255, 255, 255, 0]), Rgba([200, 30, 30, 0])] {
                assert_eq!(quantizer.quantize(color, OperationTag::Block), Material::EMPTY);
            }
        }
        let quantizer = ColorQuantizer::new(32, Some(8));
        quantizer.install_palette(palette());
        assert_eq!(quantizer.quantize(Rgba([0, 0, 0, 20]), OperationTag::Block), Material::EMPTY);
        assert_eq!(quantizer.quantize(Rgba([0, 0, 0, 255]), OperationTag::Block), Material(1));
    }

    #[test]
    fn test_quantize_is_deterministic() {
        let quantizer = ColorQuantizer::new(32, Some(8));
        quantizer.install_palette(palette());
        let color = Rgba([180, 170, 160, 255]);
        let first = quantizer.quantize(color, OperationTag::Block);
        let second = quantizer.quantize(color, OperationTag::Block);
        assert_eq!(first, second);
        assert_eq!(first, Material(2));

        let uncached = ColorQuantizer::new(32, None);
        uncached.install_palette(palette());
        assert_eq!(uncached.quantize(color, OperationTag::Block), first);
    }

    #[test]
    fn test_tag_restricts_candidates() {
        let quantizer = ColorQuantizer::new(32, Some(8));
        quantizer.install_palette(palette());
        assert_eq!(quantizer.quantize(Rgba([255, 255, 255, 255]), OperationTag::Statue), Material(1));
        assert_eq!(quantizer.quantize(Rgba([255, 255, 255, 255]), OperationTag::Image), Material::EMPTY);
    }

    #[test]
    fn test_cache_is_bounded() {
        let quantizer = ColorQuantizer::new(32, Some(2));
        quantizer.install_palette(palette());
        for shade in 0..10u8 {
            quantizer.quantize(Rgba([shade, shade, shade, 255]), OperationTag::Block);
        }
        assert_eq!(quantizer.cached_len(), 2);
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let quantizer = ColorQuantizer::new(32, Some(2));
        quantizer.install_palette(palette());
        let dark = Rgba([10, 10, 10, 255]);
        let light = Rgba([250, 250, 250, 255]);
        let black = Rgba([0, 0, 0, 255]);

        assert_eq!(quantizer.quantize(dark, OperationTag::Block), Material(1));
        assert_eq!(quantizer.quantize(light, OperationTag::Block), Material(2));
        // Touching `dark` again leaves `light` as the oldest entry.
        quantizer.quantize(dark, OperationTag::Block);
        quantizer.quantize(black, OperationTag::Block);

        // Swap the palette without bumping the generation: cached keys keep
        // their old answer, evicted ones are recomputed.
        if let Some(snapshot) = quantizer.palette.get_mut().as_mut() {
            snapshot.palette = Arc::new(Palette::new(vec![MaterialEntry::new(
                Material(7),
                Rgba([128, 128, 128, 255]),
                [OperationTag::Block],
            )]));
        }
        assert_eq!(quantizer.quantize(dark, OperationTag::Block), Material(1));
        assert_eq!(quantizer.quantize(light, OperationTag::Block), Material(7));
    }

    #[test]
    fn test_installing_palette_invalidates_cache() {
        let quantizer = ColorQuantizer::new(32, Some(8));
        quantizer.install_palette(palette());
        let gray = Rgba([128, 128, 128, 255]);
        quantizer.quantize(gray, OperationTag::Block);
        assert_eq!(quantizer.cached_len(), 1);

        quantizer.install_palette(Palette::new(vec![MaterialEntry::new(
            Material(9),
            Rgba([128, 128, 128, 255]),
            [OperationTag::Block],
        )]));
        assert_eq!(quantizer.cached_len(), 0);
        assert_eq!(quantizer.quantize(gray, OperationTag::Block), Material(9));
    }
}
