//! Analog clock face renderer.
//!
//! Holds the three hand angles and hand outlines. Each second tick turns the
//! wall-clock time into angles and asks the host to redraw the layers whose
//! hand moved; drawing happens later, when the host visits those layers.
//!
//! Angles are in `trig` units, a full turn being `TRIG_MAX_ANGLE`. The hour
//! hand runs on a 24 hour dial.

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::{DrawTarget, Point, Primitive, Size},
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    Drawable, Pixel,
};

use crate::{
    app::WatchFaceHandlers,
    config::{FaceConfig, Palette},
    layer::{Invalidate, LayerId},
    path::{HandPath, PathInfo},
    time::WallTime,
    trig::{normalize_angle, polar_point, TRIG_MAX_ANGLE},
};

pub static HOUR_HAND_POINTS: PathInfo = PathInfo::new(&[
    Point::new(4, 0),
    Point::new(8, -30),
    Point::new(0, -45),
    Point::new(-8, -30),
    Point::new(-4, 0),
]);

pub static MINUTE_HAND_POINTS: PathInfo = PathInfo::new(&[
    Point::new(4, 14),
    Point::new(4, -55),
    Point::new(0, -65),
    Point::new(-4, -55),
    Point::new(-4, 14),
]);

pub static SECOND_HAND_POINTS: PathInfo = PathInfo::new(&[
    Point::new(2, 12),
    Point::new(2, -70),
    Point::new(-2, -70),
    Point::new(-2, 12),
]);

// Second-hand pointer line, radii from the pivot
pub const SECOND_LINE_TIP: i32 = 70;
pub const SECOND_LINE_TAIL: i32 = -12;

// Center hub
pub const HUB_FILL_RADIUS: i32 = 7;
pub const HUB_STROKE_RADIUS: i32 = 3;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AngleState {
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl AngleState {
    pub fn from_time(t: WallTime) -> Self {
        let (h, m, s) = (t.hour() as i32, t.minute() as i32, t.second() as i32);
        Self {
            hour: normalize_angle((h * 60 + m) * TRIG_MAX_ANGLE / (24 * 60)),
            // minutes + seconds: one turn per hour, creeping every second
            minute: normalize_angle((m * 60 + s) * TRIG_MAX_ANGLE / (60 * 60)),
            second: normalize_angle(s * TRIG_MAX_ANGLE / 60),
        }
    }
}

pub struct ClockFaceRenderer {
    config: FaceConfig,
    pivot: Point,
    angles: AngleState,
    hour_hand: HandPath,
    minute_hand: HandPath,
    second_hand: HandPath,
}

impl ClockFaceRenderer {
    pub fn new(config: FaceConfig) -> Self {
        let scale = config.effective_scale();
        Self {
            config,
            pivot: Point::zero(),
            angles: AngleState::default(),
            hour_hand: HandPath::new(&HOUR_HAND_POINTS, scale),
            minute_hand: HandPath::new(&MINUTE_HAND_POINTS, scale),
            second_hand: HandPath::new(&SECOND_HAND_POINTS, scale),
        }
    }

    /// Binds every hand to `center` and takes the starting angles from `now`.
    pub fn initialize(&mut self, center: Point, now: WallTime) {
        self.pivot = center;
        self.hour_hand.move_to(center);
        self.minute_hand.move_to(center);
        self.second_hand.move_to(center);
        self.angles = AngleState::from_time(now);
        tracing::debug!(
            x = center.x,
            y = center.y,
            hour = self.angles.hour,
            minute = self.angles.minute,
            "clock face initialized"
        );
    }

    /// Recomputes the angles for `now`. Hour and minute layers are marked
    /// dirty only when their angle changed; the seconds layer always is.
    pub fn update_angles<I>(&mut self, now: WallTime, dirty: &mut I)
    where
        I: Invalidate + ?Sized,
    {
        let next = AngleState::from_time(now);

        if next.hour != self.angles.hour {
            self.angles.hour = next.hour;
            dirty.mark_dirty(LayerId::Hour);
        }
        if next.minute != self.angles.minute {
            self.angles.minute = next.minute;
            dirty.mark_dirty(LayerId::Minute);
        }
        self.angles.second = next.second;
        dirty.mark_dirty(LayerId::Seconds);

        tracing::trace!(second = self.angles.second, "angles updated");
    }

    pub fn angles(&self) -> AngleState {
        self.angles
    }

    pub fn pivot(&self) -> Point {
        self.pivot
    }

    pub fn config(&self) -> &FaceConfig {
        &self.config
    }

    /// Hour hand plus the center hub.
    pub fn draw_hour_layer<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let palette = self.config.palette;
        draw_hand(target, &mut self.hour_hand, self.angles.hour, &palette)?;

        let scale = self.config.effective_scale();
        circle(self.pivot, HUB_FILL_RADIUS * scale)
            .into_styled(PrimitiveStyle::with_fill(palette.hand_fill))
            .draw(target)?;
        circle(self.pivot, HUB_STROKE_RADIUS * scale)
            .into_styled(PrimitiveStyle::with_stroke(palette.hand_stroke, 1))
            .draw(target)
    }

    pub fn draw_minute_layer<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let palette = self.config.palette;
        draw_hand(target, &mut self.minute_hand, self.angles.minute, &palette)
    }

    /// Filled tail, thin pointer line and a dot at the pivot.
    pub fn draw_seconds_layer<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let palette = self.config.palette;
        let scale = self.config.effective_scale();

        self.second_hand.rotate_to(self.angles.second);
        self.second_hand.draw_filled(target, palette.second_fill)?;

        // trig angle 0 is 3 o'clock, hand angle 0 is 12 o'clock
        let angle = normalize_angle(self.angles.second - TRIG_MAX_ANGLE / 4);
        let tail = polar_point(self.pivot, angle, SECOND_LINE_TAIL * scale);
        let tip = polar_point(self.pivot, angle, SECOND_LINE_TIP * scale);
        Line::new(tail, tip)
            .into_styled(PrimitiveStyle::with_stroke(palette.second_stroke, 1))
            .draw(target)?;

        Pixel(self.pivot, palette.second_stroke).draw(target)
    }

    /// Square around the pivot that any hand can reach, clipped to `frame`.
    pub fn redraw_bounds(&self, frame: Rectangle) -> Rectangle {
        let half = (SECOND_LINE_TIP + 2) * self.config.effective_scale();
        let side = (2 * half + 1) as u32;
        Rectangle::with_center(self.pivot, Size::new(side, side)).intersection(&frame)
    }
}

/// Rotates `hand` to `angle`, fills it and strokes its outline.
pub fn draw_hand<D>(
    target: &mut D,
    hand: &mut HandPath,
    angle: i32,
    palette: &Palette,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    hand.rotate_to(angle);
    hand.draw_filled(target, palette.hand_fill)?;
    hand.draw_outline(target, palette.hand_stroke)
}

#[inline]
fn circle(center: Point, radius: i32) -> Circle {
    Circle::with_center(center, (2 * radius + 1) as u32)
}

impl WatchFaceHandlers for ClockFaceRenderer {
    fn on_init(&mut self, frame: Rectangle, now: WallTime, _dirty: &mut dyn Invalidate) {
        self.initialize(frame.center(), now);
    }

    fn on_tick(&mut self, now: WallTime, dirty: &mut dyn Invalidate) {
        self.update_angles(now, dirty);
    }

    fn on_draw_hour<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_hour_layer(target)
    }

    fn on_draw_minute<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_minute_layer(target)
    }

    fn on_draw_seconds<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_seconds_layer(target)
    }

    fn redraw_bounds(&self, frame: Rectangle) -> Rectangle {
        ClockFaceRenderer::redraw_bounds(self, frame)
    }
}
