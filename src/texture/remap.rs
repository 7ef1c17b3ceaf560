use image::Rgba;
use serde::{Deserialize, Serialize};

/// Color adjustment applied to sampled texels.
///
/// Foliage and grass textures ship as gray and are tinted by the host; faces
/// and palette entries carry the same remap so sampled and averaged colors
/// agree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorRemap {
    /// Texels are used as-is.
    #[default]
    None,
    /// Texels are collapsed to their luminance.
    Gray,
    /// Texels are multiplied by the given color (alpha untouched).
    Tint([u8; 3]),
}

impl ColorRemap {
    /// Applies the remap to a single color.
    pub fn apply(self, color: Rgba<u8>) -> Rgba<u8> {
        let [r, g, b, a] = color.0;
        match self {
            ColorRemap::None => color,
            ColorRemap::Gray => {
                let luma = luminance(r, g, b);
                Rgba([luma, luma, luma, a])
            }
            ColorRemap::Tint([tr, tg, tb]) => Rgba([
                multiply(r, tr),
                multiply(g, tg),
                multiply(b, tb),
                a,
            ]),
        }
    }
}

/// Rec. 601 luma.
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

fn multiply(channel: u8, tint: u8) -> u8 {
    (channel as u32 * tint as u32 / 255) as u8
}
