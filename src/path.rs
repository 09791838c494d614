//! Rotatable closed polygons used for the clock hands.
//!
//! A `PathInfo` is the static outline, relative to the hand's pivot.
//! `HandPath` adds the runtime pivot offset, scale and rotation, and knows how
//! to fill and outline itself on any `DrawTarget`.

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::{DrawTarget, Point, Primitive, Size},
    primitives::{Line, PrimitiveStyle, Rectangle},
    Drawable,
};
use heapless::Vec;

use crate::trig::{normalize_angle, rotate_point};

/// Upper bound on outline points; transforms never allocate.
pub const MAX_PATH_POINTS: usize = 8;

#[derive(Debug)]
pub struct PathInfo {
    pub points: &'static [Point],
}

impl PathInfo {
    pub const fn new(points: &'static [Point]) -> Self {
        Self { points }
    }
}

#[derive(Debug, Clone)]
pub struct HandPath {
    info: &'static PathInfo,
    scale: i32,
    offset: Point,
    rotation: i32,
}

impl HandPath {
    pub fn new(info: &'static PathInfo, scale: i32) -> Self {
        debug_assert!(
            info.points.len() <= MAX_PATH_POINTS,
            "path outline has more than MAX_PATH_POINTS points"
        );
        Self {
            info,
            scale: scale.max(1),
            offset: Point::zero(),
            rotation: 0,
        }
    }

    /// Moves the pivot. Rotation is kept.
    pub fn move_to(&mut self, pivot: Point) {
        self.offset = pivot;
    }

    /// Sets the absolute rotation, replacing the previous one.
    pub fn rotate_to(&mut self, angle: i32) {
        self.rotation = normalize_angle(angle);
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Outline in screen coordinates: scaled, rotated, then moved to the pivot.
    pub fn points(&self) -> Vec<Point, MAX_PATH_POINTS> {
        let mut out = Vec::new();
        for &p in self.info.points.iter().take(MAX_PATH_POINTS) {
            let p = rotate_point(p * self.scale, self.rotation) + self.offset;
            // capacity is guaranteed by take()
            let _ = out.push(p);
        }
        out
    }

    pub fn bounding_box(&self) -> Rectangle {
        let pts = self.points();
        let Some(first) = pts.first().copied() else {
            return Rectangle::new(self.offset, Size::zero());
        };
        let (min, max) = pts.iter().fold((first, first), |(min, max), p| {
            (min.component_min(*p), max.component_max(*p))
        });
        Rectangle::with_corners(min, max)
    }

    /// Even-odd scanline fill.
    ///
    /// Each edge covers the half-open row range `[ymin, ymax)`, except on the
    /// polygon's last row where `(ymin, ymax]` is used so the bottom row is
    /// not lost.
    pub fn draw_filled<D>(&self, target: &mut D, color: Rgb565) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let pts = self.points();
        let n = pts.len();
        if n < 3 {
            return Ok(());
        }

        let min_y = pts.iter().map(|p| p.y).min().unwrap_or(0);
        let max_y = pts.iter().map(|p| p.y).max().unwrap_or(0);

        for y in min_y..=max_y {
            let last_row = y == max_y;
            let mut xs: Vec<i32, MAX_PATH_POINTS> = Vec::new();

            for i in 0..n {
                let a = pts[i];
                let b = pts[(i + 1) % n];
                if a.y == b.y {
                    continue;
                }
                let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };
                let crosses = if last_row {
                    y > lo.y && y <= hi.y
                } else {
                    y >= lo.y && y < hi.y
                };
                if !crosses {
                    continue;
                }
                let x = lo.x + (y - lo.y) * (hi.x - lo.x) / (hi.y - lo.y);
                let _ = xs.push(x);
            }

            xs.sort_unstable();
            for span in xs.chunks_exact(2) {
                let (x0, x1) = (span[0], span[1]);
                let width = (x1 - x0 + 1) as u32;
                target.fill_solid(&Rectangle::new(Point::new(x0, y), Size::new(width, 1)), color)?;
            }
        }
        Ok(())
    }

    /// One-pixel closed outline.
    pub fn draw_outline<D>(&self, target: &mut D, color: Rgb565) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let pts = self.points();
        let n = pts.len();
        if n < 2 {
            return Ok(());
        }
        let style = PrimitiveStyle::with_stroke(color, 1);
        for i in 0..n {
            Line::new(pts[i], pts[(i + 1) % n])
                .into_styled(style)
                .draw(target)?;
        }
        Ok(())
    }
}
