//! Background image resource: big-endian RGB565 pixels, shipped either raw or
//! zlib compressed (miniz_oxide) to keep flash usage down. Loaded once at
//! startup into the heap and dropped with the app.

use alloc::vec::Vec;

use embedded_graphics::{
    image::{ImageRaw, ImageRawBE},
    pixelcolor::Rgb565,
    prelude::Size,
};
use miniz_oxide::inflate::{decompress_to_vec_zlib_with_limit, TINFLStatus};

const BYTES_PER_PIXEL: usize = 2;

/// Side of the bundled dial bitmap, sized for the 466x466 panel.
pub const DIAL_IMAGE_SIZE: u32 = 466;

/// Dial bitmap (ring plus minute and hour ticks on black), zlib compressed.
pub static DIAL_IMAGE_ZLIB: &[u8] = include_bytes!("../assets/dial_466.rgb565.zlib");

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceError {
    ZeroWidth,
    SizeMismatch { expected: usize, actual: usize },
    Inflate(TINFLStatus),
}

impl From<TINFLStatus> for ResourceError {
    fn from(status: TINFLStatus) -> Self {
        Self::Inflate(status)
    }
}

pub struct ImageResource {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageResource {
    /// Copies uncompressed pixels. Height follows from the length.
    pub fn from_raw(bytes: &[u8], width: u32) -> Result<Self, ResourceError> {
        if width == 0 {
            return Err(ResourceError::ZeroWidth);
        }
        let row = width as usize * BYTES_PER_PIXEL;
        if bytes.len() % row != 0 {
            let rows = bytes.len() / row + 1;
            return Err(ResourceError::SizeMismatch {
                expected: rows * row,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            pixels: bytes.to_vec(),
            width,
            height: (bytes.len() / row) as u32,
        })
    }

    /// Inflates a zlib stream that must hold exactly `width * height` pixels.
    pub fn from_zlib(bytes: &[u8], width: u32, height: u32) -> Result<Self, ResourceError> {
        if width == 0 {
            return Err(ResourceError::ZeroWidth);
        }
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        let pixels = decompress_to_vec_zlib_with_limit(bytes, expected).map_err(|e| {
            tracing::warn!(status = ?e.status, "background image failed to inflate");
            ResourceError::from(e.status)
        })?;
        if pixels.len() != expected {
            return Err(ResourceError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        tracing::debug!(width, height, compressed = bytes.len(), "background image loaded");
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn image(&self) -> ImageRawBE<'_, Rgb565> {
        ImageRaw::new(&self.pixels, self.width)
    }
}
