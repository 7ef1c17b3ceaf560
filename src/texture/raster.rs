//! Texture rasters sampled during face and triangle texturing.

use std::path::Path;

use image::{ImageResult, Rgba, RgbaImage};

/// A 2D grid of RGBA pixels plus the logical resolution it represents.
///
/// A texture pack may ship a 64x64 image for a block that is logically 16x16;
/// sampling snaps to the logical grid so both draw the same texels.
#[derive(Debug, Clone)]
pub struct TextureRaster {
    image: RgbaImage,
    resolution: u32,
}

impl TextureRaster {
    /// Wraps an image whose logical resolution equals its width.
    pub fn new(image: RgbaImage) -> Self {
        let resolution = image.width().max(1);
        TextureRaster { image, resolution }
    }

    /// Loads a PNG texture from disk, with its logical resolution equal to
    /// its width.
    pub fn load(path: impl AsRef<Path>) -> ImageResult<Self> {
        Ok(Self::new(image::open(path)?.to_rgba8()))
    }

    /// Wraps an image with an explicit logical resolution.
    ///
    /// A resolution of zero is treated as one.
    pub fn with_resolution(image: RgbaImage, resolution: u32) -> Self {
        TextureRaster {
            image,
            resolution: resolution.max(1),
        }
    }

    /// A `width` x `height` raster filled with a single color.
    pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self::new(RgbaImage::from_pixel(width.max(1), height.max(1), color))
    }

    /// Pixel width of the backing image.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Pixel height of the backing image.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Logical resolution used to snap samples.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Backing image.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Samples the raster at normalized texture coordinates.
    ///
    /// `u` runs left to right, `v` top to bottom. Coordinates outside
    /// `[0, 1]` are clamped to the edge texel. An empty image samples as
    /// fully transparent.
    pub fn sample(&self, u: f32, v: f32) -> Rgba<u8> {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        let x = Self::snap(u, self.resolution, width);
        let y = Self::snap(v, self.resolution, height);
        *self.image.get_pixel(x, y)
    }

    fn snap(coord: f32, resolution: u32, extent: u32) -> u32 {
        let coord = if coord.is_finite() { coord.clamp(0.0, 1.0) } else { 0.0 };
        let logical = ((coord * resolution as f32) as u32).min(resolution - 1);
        let pixel = (logical as u64 * extent as u64 / resolution as u64) as u32;
        pixel.min(extent - 1)
    }

    /// Average of every texel, alpha included.
    pub fn average_color(&self) -> Rgba<u8> {
        let mut sums = [0u64; 4];
        let mut count = 0u64;
        for pixel in self.image.pixels() {
            for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                *sum += channel as u64;
            }
            count += 1;
        }
        if count == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        Rgba(sums.map(|sum| (sum / count) as u8))
    }
}
