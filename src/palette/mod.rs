//! # Palette and Color Quantization
//!
//! Materials, the ordered palette they form, and the quantizer that picks the
//! closest material for a sampled color.
//!
//! ## Key Components
//! - `Material`: opaque placeable id, with the reserved `EMPTY` sentinel
//! - `OperationTag`: draw context restricting eligible materials
//! - `MaterialEntry`: material + average color + allowed tags
//! - `Palette`: ordered entries with the weighted nearest-color search
//! - `ColorQuantizer`: palette snapshot + bounded LRU cache

mod matching;
mod material;
mod quantizer;

pub use matching::{color_distance, Palette};
pub use material::{Material, MaterialEntry, OperationTag};
pub use quantizer::ColorQuantizer;
