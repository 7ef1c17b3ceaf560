use image::Rgba;

use super::material::{Material, MaterialEntry, OperationTag};
use crate::texture::{ColorRemap, TextureRaster};

/// Weight of the squared alpha difference when the candidate is more
/// transparent than the requested color.
const ALPHA_LOSS_WEIGHT: i64 = 64;

/// Weight of the squared alpha difference when the candidate is more opaque.
const ALPHA_GAIN_WEIGHT: i64 = 4;

/// Perceptually weighted distance between a requested color and a candidate.
///
/// RGB uses the "redmean" approximation: the red and blue weights slide with
/// the mean red of the two colors and green is weighted flat and highest.
/// Losing opacity costs far more than gaining it, so matches lean towards
/// keeping drawings solid.
pub fn color_distance(requested: Rgba<u8>, candidate: Rgba<u8>) -> u64 {
    let [r1, g1, b1, a1] = requested.0.map(i64::from);
    let [r2, g2, b2, a2] = candidate.0.map(i64::from);

    let red_mean = (r1 + r2) / 2;
    let (dr, dg, db) = (r1 - r2, g1 - g2, b1 - b2);
    let rgb = (((512 + red_mean) * dr * dr) >> 8) + 4 * dg * dg + (((767 - red_mean) * db * db) >> 8);

    let da = a1 - a2;
    let alpha = if da > 0 {
        ALPHA_LOSS_WEIGHT * da * da
    } else {
        ALPHA_GAIN_WEIGHT * da * da
    };

    (rgb + alpha) as u64
}

/// Ordered list of materials available for quantization.
///
/// Order is significant: when two entries are equally close, the earlier one
/// wins. A palette is built once per configuration load and never mutated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Palette {
    entries: Vec<MaterialEntry>,
}

impl Palette {
    /// Creates a palette from prepared entries.
    pub fn new(entries: Vec<MaterialEntry>) -> Self {
        Palette { entries }
    }

    /// Builds a palette by averaging each material's representative texture
    /// after applying its remap.
    ///
    /// # Arguments
    /// * `sources` - `(material, texture, remap, tags)` per material, in palette order
    pub fn from_textures<'a, I, T>(sources: I) -> Self
    where
        I: IntoIterator<Item = (Material, &'a TextureRaster, ColorRemap, T)>,
        T: IntoIterator<Item = OperationTag>,
    {
        let entries = sources
            .into_iter()
            .map(|(material, texture, remap, tags)| {
                MaterialEntry::new(material, average_remapped(texture, remap), tags)
            })
            .collect();
        Palette { entries }
    }

    /// Entries in palette order.
    pub fn entries(&self) -> &[MaterialEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry allowed for `tag` closest to `color`; earliest wins ties.
    pub fn nearest(&self, color: Rgba<u8>, tag: OperationTag) -> Option<&MaterialEntry> {
        let mut best: Option<(&MaterialEntry, u64)> = None;
        for entry in self.entries.iter().filter(|entry| entry.allows(tag)) {
            let distance = color_distance(color, entry.color());
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((entry, distance));
            }
        }
        best.map(|(entry, _)| entry)
    }
}

fn average_remapped(texture: &TextureRaster, remap: ColorRemap) -> Rgba<u8> {
    if remap == ColorRemap::None {
        return texture.average_color();
    }
    let mut sums = [0u64; 4];
    let mut count = 0u64;
    for pixel in texture.image().pixels() {
        for (sum, channel) in sums.iter_mut().zip(remap.apply(*pixel).0) {
            *sum += channel as u64;
        }
        count += 1;
    }
    if count == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    Rgba(sums.map(|sum| (sum / count) as u8))
}
