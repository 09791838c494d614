// RGB565 framebuffer in RAM (PSRAM on the watch).
//
// The watch face is composed here and the dirty region is then streamed to the
// panel by the co5300 driver. Keeping drawing and flushing apart lets the face
// render on the host in tests as well.

use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    primitives::Rectangle,
    Pixel,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameBufferError {
    SizeMismatch { expected: usize, actual: usize },
}

pub struct FrameBuffer<'fb> {
    buf: &'fb mut [u16],
    width: u32,
    height: u32,
}

impl<'fb> FrameBuffer<'fb> {
    /// Wraps `buf` as a `width` x `height` surface; the slice must be exactly that size.
    pub fn new(buf: &'fb mut [u16], width: u32, height: u32) -> Result<Self, FrameBufferError> {
        let expected = (width as usize) * (height as usize);
        if buf.len() != expected {
            return Err(FrameBufferError::SizeMismatch {
                expected,
                actual: buf.len(),
            });
        }
        Ok(Self { buf, width, height })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, p: Point) -> Option<usize> {
        if p.x < 0 || p.y < 0 {
            return None;
        }
        let (x, y) = (p.x as u32, p.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn pixel(&self, p: Point) -> Option<Rgb565> {
        self.index(p).map(|i| Rgb565::from(RawU16::new(self.buf[i])))
    }

    // Raw storage of one row, used by the panel flush.
    pub fn row(&self, y: u32) -> &[u16] {
        let w = self.width as usize;
        let start = (y as usize) * w;
        &self.buf[start..start + w]
    }

    pub fn as_slice(&self) -> &[u16] {
        self.buf
    }
}

impl OriginDimensions for FrameBuffer<'_> {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.index(p) {
                self.buf[i] = c.into_storage();
            }
        }
        Ok(())
    }

    // Row fill instead of the default per-pixel path
    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if area.size.width == 0 || area.size.height == 0 {
            return Ok(());
        }
        let raw = color.into_storage();
        let fbw = self.width as usize;
        let x0 = area.top_left.x as usize;
        let w = area.size.width as usize;
        for ry in 0..area.size.height as usize {
            let base = (area.top_left.y as usize + ry) * fbw + x0;
            self.buf[base..base + w].fill(raw);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color.into_storage());
        Ok(())
    }
}
