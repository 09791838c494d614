//! Host side of the watch face: a tiny event loop that owns the background,
//! tracks dirty layers and calls into a `WatchFaceHandlers` implementation.
//!
//! Everything is synchronous. The firmware main loop calls `tick` once per
//! elapsed second and `render` whenever it wants pixels; `render` hands back
//! the region that changed so only that part is flushed to the panel.

use embedded_graphics::{
    draw_target::DrawTargetExt, pixelcolor::Rgb565, prelude::DrawTarget, primitives::Rectangle,
};

use crate::{
    background::Background,
    layer::{DirtyLayers, Invalidate, LayerId},
    time::WallTime,
};

/// Callbacks a watch face registers with the host.
pub trait WatchFaceHandlers {
    /// Called once before the first frame. `frame` is the whole screen.
    fn on_init(&mut self, frame: Rectangle, now: WallTime, dirty: &mut dyn Invalidate);

    /// Called once per second with the current time.
    fn on_tick(&mut self, now: WallTime, dirty: &mut dyn Invalidate);

    fn on_draw_hour<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>;

    fn on_draw_minute<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>;

    fn on_draw_seconds<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>;

    fn on_deinit(&mut self) {}

    /// Part of `frame` that hand layers can touch.
    fn redraw_bounds(&self, frame: Rectangle) -> Rectangle {
        frame
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AppState {
    Created,
    Running,
    Stopped,
}

pub struct WatchApp<'a, H> {
    handler: H,
    background: Background<'a>,
    frame: Rectangle,
    dirty: DirtyLayers,
    state: AppState,
}

impl<'a, H: WatchFaceHandlers> WatchApp<'a, H> {
    pub fn new(handler: H, background: Background<'a>, frame: Rectangle) -> Self {
        Self {
            handler,
            background,
            frame,
            dirty: DirtyLayers::empty(),
            state: AppState::Created,
        }
    }

    /// Runs the init handler and schedules a full first frame.
    pub fn start(&mut self, now: WallTime) {
        if self.state != AppState::Created {
            tracing::warn!(state = ?self.state, "watch app already started");
            return;
        }
        self.handler.on_init(self.frame, now, &mut self.dirty);
        self.dirty = DirtyLayers::all();
        self.state = AppState::Running;
        tracing::info!(
            width = self.frame.size.width,
            height = self.frame.size.height,
            "watch app started"
        );
    }

    pub fn tick(&mut self, now: WallTime) {
        if self.state != AppState::Running {
            return;
        }
        self.handler.on_tick(now, &mut self.dirty);
    }

    /// Recomposes the screen if any layer is dirty.
    ///
    /// Layers share one surface, so a dirty hand means the background and
    /// every hand are redrawn bottom to top inside the damage region: the
    /// whole frame when the background is dirty, the handler's
    /// `redraw_bounds` otherwise. Returns the region to flush.
    pub fn render<D>(&mut self, target: &mut D) -> Result<Option<Rectangle>, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.state != AppState::Running || self.dirty.is_empty() {
            return Ok(None);
        }

        let dirty = self.dirty.take();
        let region = if dirty.contains(LayerId::Background) {
            self.frame
        } else {
            self.handler.redraw_bounds(self.frame)
        };

        if let Err(e) = self.composite(target, region) {
            // keep the request so the next pass retries
            self.dirty = dirty;
            return Err(e);
        }
        Ok(Some(region))
    }

    fn composite<D>(&mut self, target: &mut D, region: Rectangle) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let mut clipped = target.clipped(&region);
        for layer in LayerId::ALL {
            match layer {
                LayerId::Background => self.background.draw(&mut clipped, self.frame)?,
                LayerId::Hour => self.handler.on_draw_hour(&mut clipped)?,
                LayerId::Minute => self.handler.on_draw_minute(&mut clipped)?,
                LayerId::Seconds => self.handler.on_draw_seconds(&mut clipped)?,
            }
        }
        Ok(())
    }

    /// Host-side invalidation, e.g. after the panel was switched back on.
    pub fn mark_dirty(&mut self, layer: LayerId) {
        self.dirty.mark(layer);
    }

    pub fn set_background(&mut self, background: Background<'a>) {
        self.background = background;
        self.dirty.mark(LayerId::Background);
    }

    /// Runs the deinit handler. Later ticks and renders do nothing.
    pub fn stop(&mut self) {
        if self.state == AppState::Running {
            self.handler.on_deinit();
            tracing::info!("watch app stopped");
        }
        self.state = AppState::Stopped;
        self.dirty = DirtyLayers::empty();
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn dirty(&self) -> DirtyLayers {
        self.dirty
    }

    pub fn frame(&self) -> Rectangle {
        self.frame
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::FaceConfig, face::ClockFaceRenderer, framebuffer::FrameBuffer};
    use embedded_graphics::{
        pixelcolor::RgbColor,
        prelude::{OriginDimensions, Point, Size},
        Pixel,
    };

    #[derive(Default)]
    struct Recorder {
        inits: u32,
        ticks: u32,
        deinits: u32,
        draws: Vec<LayerId>,
        mark_on_tick: Option<LayerId>,
    }

    impl WatchFaceHandlers for Recorder {
        fn on_init(&mut self, _frame: Rectangle, _now: WallTime, _dirty: &mut dyn Invalidate) {
            self.inits += 1;
        }

        fn on_tick(&mut self, _now: WallTime, dirty: &mut dyn Invalidate) {
            self.ticks += 1;
            if let Some(layer) = self.mark_on_tick {
                dirty.mark_dirty(layer);
            }
        }

        fn on_draw_hour<D>(&mut self, _target: &mut D) -> Result<(), D::Error>
        where
            D: DrawTarget<Color = Rgb565>,
        {
            self.draws.push(LayerId::Hour);
            Ok(())
        }

        fn on_draw_minute<D>(&mut self, _target: &mut D) -> Result<(), D::Error>
        where
            D: DrawTarget<Color = Rgb565>,
        {
            self.draws.push(LayerId::Minute);
            Ok(())
        }

        fn on_draw_seconds<D>(&mut self, _target: &mut D) -> Result<(), D::Error>
        where
            D: DrawTarget<Color = Rgb565>,
        {
            self.draws.push(LayerId::Seconds);
            Ok(())
        }

        fn on_deinit(&mut self) {
            self.deinits += 1;
        }

        fn redraw_bounds(&self, _frame: Rectangle) -> Rectangle {
            Rectangle::new(Point::new(2, 2), Size::new(4, 4))
        }
    }

    // Rejects the first `failures` draws, then accepts everything
    struct FlakyTarget {
        failures: u32,
    }

    impl OriginDimensions for FlakyTarget {
        fn size(&self) -> Size {
            Size::new(8, 8)
        }
    }

    impl DrawTarget for FlakyTarget {
        type Color = Rgb565;
        type Error = ();

        fn draw_iter<I>(&mut self, _pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(());
            }
            Ok(())
        }
    }

    fn frame() -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(8, 8))
    }

    #[test]
    fn nothing_happens_before_start() {
        let mut buf = [0u16; 64];
        let mut fb = FrameBuffer::new(&mut buf, 8, 8).unwrap();
        let mut app = WatchApp::new(Recorder::default(), Background::Solid(Rgb565::RED), frame());

        app.tick(WallTime::MIDNIGHT);
        assert_eq!(app.render(&mut fb).unwrap(), None);
        assert_eq!(app.handler().ticks, 0);
        assert_eq!(app.state(), AppState::Created);
    }

    #[test]
    fn first_frame_is_full_and_in_z_order() {
        let mut buf = [0u16; 64];
        let mut fb = FrameBuffer::new(&mut buf, 8, 8).unwrap();
        let mut app = WatchApp::new(Recorder::default(), Background::Solid(Rgb565::RED), frame());

        app.start(WallTime::MIDNIGHT);
        assert_eq!(app.handler().inits, 1);
        assert_eq!(app.dirty(), DirtyLayers::all());

        assert_eq!(app.render(&mut fb).unwrap(), Some(frame()));
        assert_eq!(
            app.handler().draws,
            vec![LayerId::Hour, LayerId::Minute, LayerId::Seconds]
        );
        assert_eq!(fb.pixel(Point::new(7, 7)), Some(Rgb565::RED));

        // nothing dirty any more
        assert!(app.dirty().is_empty());
        assert_eq!(app.render(&mut fb).unwrap(), None);
    }

    #[test]
    fn hand_only_redraw_is_clipped_to_bounds() {
        let mut buf = [0u16; 64];
        let mut fb = FrameBuffer::new(&mut buf, 8, 8).unwrap();
        let handler = Recorder {
            mark_on_tick: Some(LayerId::Seconds),
            ..Recorder::default()
        };
        let mut app = WatchApp::new(handler, Background::Solid(Rgb565::RED), frame());
        app.start(WallTime::MIDNIGHT);
        app.render(&mut fb).unwrap();

        app.set_background(Background::Solid(Rgb565::GREEN));
        app.dirty = DirtyLayers::empty();
        app.tick(WallTime::MIDNIGHT);
        let region = app.render(&mut fb).unwrap();
        assert_eq!(region, Some(Rectangle::new(Point::new(2, 2), Size::new(4, 4))));

        // background repainted only inside the region
        assert_eq!(fb.pixel(Point::new(3, 3)), Some(Rgb565::GREEN));
        assert_eq!(fb.pixel(Point::new(0, 0)), Some(Rgb565::RED));
        assert_eq!(app.handler().draws.len(), 6);
    }

    #[test]
    fn quiet_tick_renders_nothing() {
        let mut buf = [0u16; 64];
        let mut fb = FrameBuffer::new(&mut buf, 8, 8).unwrap();
        let mut app = WatchApp::new(Recorder::default(), Background::Solid(Rgb565::RED), frame());
        app.start(WallTime::MIDNIGHT);
        app.render(&mut fb).unwrap();

        app.tick(WallTime::MIDNIGHT);
        assert_eq!(app.handler().ticks, 1);
        assert_eq!(app.render(&mut fb).unwrap(), None);
    }

    #[test]
    fn failed_render_is_retried() {
        let mut target = FlakyTarget { failures: 1 };
        let mut app = WatchApp::new(Recorder::default(), Background::Solid(Rgb565::RED), frame());
        app.start(WallTime::MIDNIGHT);

        assert_eq!(app.render(&mut target), Err(()));
        assert_eq!(app.dirty(), DirtyLayers::all());
        assert!(app.handler().draws.is_empty());

        assert_eq!(app.render(&mut target), Ok(Some(frame())));
        assert!(app.dirty().is_empty());
        assert_eq!(app.handler().draws.len(), 3);
    }

    #[test]
    fn stop_runs_deinit_once_and_freezes() {
        let mut buf = [0u16; 64];
        let mut fb = FrameBuffer::new(&mut buf, 8, 8).unwrap();
        let mut app = WatchApp::new(Recorder::default(), Background::Solid(Rgb565::RED), frame());
        app.start(WallTime::MIDNIGHT);

        app.stop();
        app.stop();
        assert_eq!(app.handler().deinits, 1);
        assert_eq!(app.state(), AppState::Stopped);

        app.tick(WallTime::MIDNIGHT);
        app.mark_dirty(LayerId::Hour);
        assert_eq!(app.render(&mut fb).unwrap(), None);
        assert_eq!(app.handler().ticks, 0);

        // a stopped app cannot be restarted
        app.start(WallTime::MIDNIGHT);
        assert_eq!(app.handler().inits, 1);
    }

    #[test]
    fn clock_face_end_to_end() {
        const W: u32 = 144;
        const H: u32 = 168;
        let mut buf = vec![0u16; (W * H) as usize];
        let mut fb = FrameBuffer::new(&mut buf, W, H).unwrap();
        let screen = Rectangle::new(Point::zero(), Size::new(W, H));
        let face = ClockFaceRenderer::new(FaceConfig::DEFAULT);
        let mut app = WatchApp::new(face, Background::Solid(Rgb565::BLUE), screen);

        app.start(WallTime::new(0, 0, 0).unwrap());
        assert_eq!(app.handler().pivot(), screen.center());
        assert_eq!(app.render(&mut fb).unwrap(), Some(screen));

        let c = app.handler().pivot();
        assert_eq!(fb.pixel(Point::new(0, 0)), Some(Rgb565::BLUE));
        // second pointer drawn last, on top of the hour and minute hands
        assert_eq!(fb.pixel(c + Point::new(0, -30)), Some(Rgb565::WHITE));
        assert_eq!(fb.pixel(c + Point::new(0, -68)), Some(Rgb565::WHITE));

        app.tick(WallTime::new(0, 0, 15).unwrap());
        let region = app.render(&mut fb).unwrap().unwrap();
        assert_eq!(region, app.handler().redraw_bounds(screen));
        // old second pointer erased, new one at 3 o'clock
        assert_eq!(fb.pixel(c + Point::new(0, -68)), Some(Rgb565::BLUE));
        assert_eq!(fb.pixel(c + Point::new(60, 0)), Some(Rgb565::WHITE));
    }
}
