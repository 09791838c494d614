//! Static background under the hands.

use embedded_graphics::{
    image::{Image, ImageRawBE},
    pixelcolor::Rgb565,
    prelude::{DrawTarget, Primitive},
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    Drawable,
};

use crate::{
    config::Palette,
    resource::ImageResource,
    trig::{normalize_angle, polar_point, TRIG_MAX_ANGLE},
};

/// Procedural dial: an outer ring and twelve hour marks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DialStyle {
    pub face: Rgb565,
    pub marks: Rgb565,
    pub radius: i32,
    pub mark_len: i32,
    // 12, 3, 6 and 9 o'clock
    pub major_mark_len: i32,
}

impl DialStyle {
    /// Dial filling the shorter side of `frame`, with marks scaled to match.
    pub fn for_frame(frame: Rectangle, palette: &Palette) -> Self {
        let radius = (frame.size.width.min(frame.size.height) / 2) as i32 - 2;
        Self {
            face: palette.background,
            marks: palette.dial,
            radius,
            mark_len: (radius / 12).max(2),
            major_mark_len: (radius / 6).max(4),
        }
    }

    fn draw<D>(&self, target: &mut D, frame: Rectangle) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.fill_solid(&frame, self.face)?;

        let center = frame.center();
        if self.radius <= 0 {
            return Ok(());
        }
        Circle::with_center(center, (2 * self.radius + 1) as u32)
            .into_styled(PrimitiveStyle::with_stroke(self.marks, 1))
            .draw(target)?;

        for hour in 0..12 {
            let major = hour % 3 == 0;
            let len = if major { self.major_mark_len } else { self.mark_len };
            let width = if major { 3 } else { 1 };
            // hour 0 at 12 o'clock
            let angle = normalize_angle(hour * TRIG_MAX_ANGLE / 12 - TRIG_MAX_ANGLE / 4);
            let outer = polar_point(center, angle, self.radius - 2);
            let inner = polar_point(center, angle, self.radius - 2 - len);
            Line::new(inner, outer)
                .into_styled(PrimitiveStyle::with_stroke(self.marks, width))
                .draw(target)?;
        }
        Ok(())
    }
}

pub enum Background<'a> {
    Solid(Rgb565),
    Dial(DialStyle),
    /// Raster centered in the frame; `fill` covers whatever the image does not.
    Image { raw: ImageRawBE<'a, Rgb565>, fill: Rgb565 },
}

impl<'a> Background<'a> {
    pub fn image(resource: &'a ImageResource, fill: Rgb565) -> Self {
        Background::Image {
            raw: resource.image(),
            fill,
        }
    }

    pub fn draw<D>(&self, target: &mut D, frame: Rectangle) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match self {
            Background::Solid(color) => target.fill_solid(&frame, *color),
            Background::Dial(style) => style.draw(target, frame),
            Background::Image { raw, fill } => {
                target.fill_solid(&frame, *fill)?;
                Image::with_center(raw, frame.center()).draw(target)
            }
        }
    }
}

impl Default for Background<'_> {
    fn default() -> Self {
        Background::Solid(Palette::MONO.background)
    }
}
