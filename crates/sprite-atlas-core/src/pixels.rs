use image::{DynamicImage, RgbaImage};

use crate::dedup::PixelContent;
use crate::error::{AtlasError, Result};
use crate::model::Rect;

/// Decoded RGBA8 frame: row-major, top-left origin, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw RGBA bytes; `pixels.len()` must be `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(AtlasError::InvalidBuffer {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Full-buffer rect (`used_pixels` is the area, not the opaque count).
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Alpha channel at `(x, y)`. Coordinates must be inside the buffer.
    #[inline]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixels[(y as usize * self.width as usize + x as usize) * 4 + 3]
    }

    /// RGBA bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }

    /// Borrowed view of `rect` for content comparison. `rect` must lie inside the buffer.
    pub fn content(&self, rect: &Rect) -> PixelContent<'_> {
        let stride = self.width as usize * 4;
        let start = rect.y as usize * stride + rect.x as usize * 4;
        PixelContent::strided(
            rect.width as u32,
            rect.height as u32,
            stride,
            &self.pixels[start.min(self.pixels.len())..],
        )
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }
}

impl From<&DynamicImage> for PixelBuffer {
    fn from(img: &DynamicImage) -> Self {
        Self::from(img.to_rgba8())
    }
}

/// Decodes encoded image bytes (any format the `image` crate reads) into RGBA8.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer> {
    let img = image::load_from_memory(bytes)?;
    Ok(PixelBuffer::from(&img))
}

/// Like [`decode`], but reports failures as [`AtlasError::Decode`] tagged with `key`.
pub fn decode_keyed(key: &str, bytes: &[u8]) -> Result<PixelBuffer> {
    decode(bytes).map_err(|e| AtlasError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}
