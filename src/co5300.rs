// CO5300 AMOLED panel driver (Standard SPI, no D/C pin).
//
// Wiring on Waveshare ESP32-S3 Touch AMOLED 1.43" (CO5300):
//   CS  = GPIO9
//   SCK = GPIO10
//   IO0/MOSI = GPIO11
//   RST = GPIO21
//
// Protocol (Standard SPI):
//   Every write begins with [0x02, 0x00, CMD, 0x00], then N data bytes.
//   Example: [0x02, 0x00, 0x11, 0x00] -> Sleep Out
//            [0x02, 0x00, 0x3A, 0x00, 0x55] -> Pixel Format = 16bpp (RGB565)
// Geometry: panel is 466 x 466 logical pixels, GRAM columns start at 6.
// Datasheet: https://admin.osptek.com/uploads/CO_5300_Datasheet_V0_00_20230328_07edb82936.pdf


use embedded_graphics::{
    prelude::{Dimensions, Point, Size},
    primitives::Rectangle,
};
use embedded_hal::{
    delay::DelayNs,
    digital::OutputPin,
    spi::{Operation, SpiDevice},
};

use crate::framebuffer::FrameBuffer;

pub const CO5300_WIDTH: u16 = 466;
pub const CO5300_HEIGHT: u16 = 466;

const CMD_SWRESET: u8 = 0x01;
const CMD_SLPOUT: u8 = 0x11;
const CMD_NORON: u8 = 0x13;
const CMD_DISPOFF: u8 = 0x28;
const CMD_DISPON: u8 = 0x29;
const CMD_CASET: u8 = 0x2A;
const CMD_RASET: u8 = 0x2B;
const CMD_RAMWR: u8 = 0x2C;
const CMD_MADCTL: u8 = 0x36;
const CMD_COLMOD: u8 = 0x3A;
const CMD_RAMWRC: u8 = 0x3C;
const CMD_WRDISBV: u8 = 0x51;
const CMD_WRCTRLD: u8 = 0x53;

const PANEL_X_OFFSET: u16 = 6;

// Pixel bytes per SPI transaction; lives on the stack during a flush
const STAGE_BYTES: usize = 4096;

#[derive(Debug)]
pub enum Co5300Error<SpiE, GpioE> {
    Spi(SpiE),
    Gpio(GpioE),
    OutOfBounds,
}

/// Panel handle. Owns the SPI device (CS is handled by the `SpiDevice`
/// implementation) and the optional reset line. Pixels come from a
/// [`FrameBuffer`] via [`Co5300Display::flush`].
pub struct Co5300Display<SPI, RST> {
    spi: SPI,
    rst: Option<RST>,
    w: u16,
    h: u16,
    x_off: u16,
    y_off: u16,
}

impl<SPI, RST> Co5300Display<SPI, RST>
where
    SPI: SpiDevice<u8>,
    RST: OutputPin,
{
    /// Create + init the panel. Call once at startup; the panel ends up on,
    /// at full brightness, with the full window selected.
    pub fn new(
        spi: SPI,
        rst: Option<RST>,
        delay: &mut impl DelayNs,
        width: u16,
        height: u16,
    ) -> Result<Self, Co5300Error<SPI::Error, RST::Error>> {
        if width == 0 || height == 0 {
            return Err(Co5300Error::OutOfBounds);
        }

        let mut this = Self {
            spi,
            rst,
            w: width,
            h: height,
            x_off: PANEL_X_OFFSET,
            y_off: 0,
        };

        // Hard reset sequence
        if let Some(r) = this.rst.as_mut() {
            r.set_high().map_err(Co5300Error::Gpio)?;
            delay.delay_ms(2);
            r.set_low().map_err(Co5300Error::Gpio)?;
            delay.delay_ms(80);
            r.set_high().map_err(Co5300Error::Gpio)?;
            delay.delay_ms(200);
        }

        this.cmd(CMD_SWRESET, &[])?;
        delay.delay_ms(150);

        this.cmd(CMD_SLPOUT, &[])?;
        delay.delay_ms(180);

        this.cmd(CMD_COLMOD, &[0x55])?;
        delay.delay_ms(2);

        // vendor SPI mode control
        this.cmd(0xC4, &[0x80])?;
        this.cmd(CMD_NORON, &[])?;

        this.cmd(CMD_WRCTRLD, &[0x20])?;
        delay.delay_ms(1);

        // vendor HBM brightness enable
        this.cmd(0x63, &[0xFF])?;
        delay.delay_ms(1);

        // dark until the panel is on
        this.cmd(CMD_WRDISBV, &[0x00])?;
        delay.delay_ms(1);

        this.cmd(CMD_DISPON, &[])?;
        delay.delay_ms(200);

        this.cmd(CMD_WRDISBV, &[0xFF])?;
        this.cmd(CMD_MADCTL, &[0x00])?;

        this.set_window_raw(0, 0, width - 1, height - 1)?;

        tracing::debug!(width, height, "co5300 initialised");
        Ok(this)
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.w
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.h
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(self.w as u32, self.h as u32))
    }

    pub fn release(self) -> (SPI, Option<RST>) {
        (self.spi, self.rst)
    }

    // Window in panel coordinates, inclusive; applies the GRAM offsets
    fn set_window_raw(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        if x0 > x1 || y0 > y1 || x1 >= self.w || y1 >= self.h {
            return Err(Co5300Error::OutOfBounds);
        }

        let x0p = x0 + self.x_off;
        let x1p = x1 + self.x_off;
        let y0p = y0 + self.y_off;
        let y1p = y1 + self.y_off;

        let [xs_hi, xs_lo] = x0p.to_be_bytes();
        let [xe_hi, xe_lo] = x1p.to_be_bytes();
        let [ys_hi, ys_lo] = y0p.to_be_bytes();
        let [ye_hi, ye_lo] = y1p.to_be_bytes();

        self.cmd(CMD_CASET, &[xs_hi, xs_lo, xe_hi, xe_lo])?;
        self.cmd(CMD_RASET, &[ys_hi, ys_lo, ye_hi, ye_lo])?;
        Ok(())
    }

    /// Pushes `area` of `fb` to the panel. The area is clipped to the panel
    /// and widened to even start/end columns and rows, which the controller
    /// requires. An area outside the panel is a no-op.
    pub fn flush(
        &mut self,
        fb: &FrameBuffer<'_>,
        area: Rectangle,
    ) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        if fb.width() != self.w as u32 || fb.height() != self.h as u32 {
            return Err(Co5300Error::OutOfBounds);
        }

        let clipped = area.intersection(&self.bounds());
        let Some(br) = clipped.bottom_right() else {
            return Ok(());
        };
        let (x0, y0) = (clipped.top_left.x as u16, clipped.top_left.y as u16);
        let (x1, y1) = (br.x as u16, br.y as u16);

        // Expand to even boundaries
        let ax0 = x0 & !1;
        let ay0 = y0 & !1;
        let ax1 = (x1 | 1).min(self.w - 1);
        let ay1 = (y1 | 1).min(self.h - 1);

        self.set_window_raw(ax0, ay0, ax1, ay1)?;

        let mut stage = [0u8; STAGE_BYTES];
        let mut filled = 0usize;
        let mut opcode = CMD_RAMWR;

        for y in ay0..=ay1 {
            let row = &fb.row(y as u32)[ax0 as usize..=ax1 as usize];
            for px in row {
                if filled + 2 > stage.len() {
                    self.ram_write(opcode, &stage[..filled])?;
                    opcode = CMD_RAMWRC;
                    filled = 0;
                }
                stage[filled..filled + 2].copy_from_slice(&px.to_be_bytes());
                filled += 2;
            }
        }
        if filled > 0 {
            self.ram_write(opcode, &stage[..filled])?;
        }
        Ok(())
    }

    /// Pushes the whole frame buffer.
    pub fn flush_all(
        &mut self,
        fb: &FrameBuffer<'_>,
    ) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        self.flush(fb, fb.bounding_box())
    }

    // adjustable brightness (0-255)
    pub fn set_brightness(&mut self, bright: u8) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        self.cmd(CMD_WRDISBV, &[bright])
    }

    // Quick blank/unblank without sleep
    pub fn display_off(&mut self) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        self.cmd(CMD_DISPOFF, &[])
    }

    pub fn display_on(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        self.cmd(CMD_DISPON, &[])?;
        delay.delay_ms(10);
        Ok(())
    }

    // ---- Low-level helpers ----

    fn ram_write(&mut self, opcode: u8, data: &[u8]) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        let hdr: [u8; 4] = [0x02, 0x00, opcode, 0x00];
        self.spi
            .transaction(&mut [Operation::Write(&hdr), Operation::Write(data)])
            .map_err(Co5300Error::Spi)
    }

    fn cmd(&mut self, cmd: u8, data: &[u8]) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        let hdr: [u8; 4] = [0x02, 0x00, cmd, 0x00];
        if data.is_empty() {
            self.spi.write(&hdr).map_err(Co5300Error::Spi)
        } else {
            self.spi
                .transaction(&mut [Operation::Write(&hdr), Operation::Write(data)])
                .map_err(Co5300Error::Spi)
        }
    }
}

/// Panel at its native 466x466 resolution.
pub fn new_with_defaults<SPI, RST>(
    spi: SPI,
    rst: Option<RST>,
    delay: &mut impl DelayNs,
) -> Result<Co5300Display<SPI, RST>, Co5300Error<SPI::Error, RST::Error>>
where
    SPI: SpiDevice<u8>,
    RST: OutputPin,
{
    Co5300Display::new(spi, rst, delay, CO5300_WIDTH, CO5300_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_graphics::{
        pixelcolor::{Rgb565, RgbColor},
        prelude::{DrawTarget, IntoStorage, Primitive},
        primitives::PrimitiveStyle,
        Drawable,
    };
    use embedded_hal::spi::{self, ErrorKind};

    // Records each CS-asserted transaction as one byte string
    #[derive(Default)]
    struct FakeSpi {
        frames: Vec<Vec<u8>>,
    }

    impl spi::ErrorType for FakeSpi {
        type Error = ErrorKind;
    }

    impl SpiDevice<u8> for FakeSpi {
        fn transaction(&mut self, ops: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
            let mut frame = Vec::new();
            for op in ops.iter() {
                match op {
                    Operation::Write(bytes) => frame.extend_from_slice(bytes),
                    Operation::DelayNs(_) => {}
                    _ => return Err(ErrorKind::Other),
                }
            }
            self.frames.push(frame);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePin {
        levels: Vec<bool>,
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.levels.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.levels.push(true);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeDelay {
        total_ns: u64,
    }

    impl DelayNs for FakeDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    fn opcodes(frames: &[Vec<u8>]) -> Vec<u8> {
        frames.iter().map(|f| f[2]).collect()
    }

    fn panel(w: u16, h: u16) -> Co5300Display<FakeSpi, FakePin> {
        let mut delay = FakeDelay::default();
        let mut display =
            Co5300Display::new(FakeSpi::default(), Some(FakePin::default()), &mut delay, w, h)
                .unwrap();
        display.spi.frames.clear();
        display
    }

    #[test]
    fn init_sequence() {
        let mut delay = FakeDelay::default();
        let display =
            new_with_defaults(FakeSpi::default(), Some(FakePin::default()), &mut delay).unwrap();
        let (spi, rst) = display.release();

        assert_eq!(rst.unwrap().levels, vec![true, false, true]);
        assert!(delay.total_ns >= 800_000_000);
        assert_eq!(
            opcodes(&spi.frames),
            vec![0x01, 0x11, 0x3A, 0xC4, 0x13, 0x53, 0x63, 0x51, 0x29, 0x51, 0x36, 0x2A, 0x2B]
        );
        assert!(spi.frames.iter().all(|f| f[0] == 0x02 && f[1] == 0x00 && f[3] == 0x00));
        assert_eq!(spi.frames[2], vec![0x02, 0x00, 0x3A, 0x00, 0x55]);
        // 0..=465 shifted by the column offset
        assert_eq!(&spi.frames[11][4..], &[0x00, 0x06, 0x01, 0xD7]);
        assert_eq!(&spi.frames[12][4..], &[0x00, 0x00, 0x01, 0xD1]);
    }

    #[test]
    fn init_without_reset_pin() {
        let mut delay = FakeDelay::default();
        let display: Co5300Display<FakeSpi, FakePin> =
            Co5300Display::new(FakeSpi::default(), None, &mut delay, 32, 32).unwrap();
        assert_eq!(display.release().0.frames[0], vec![0x02, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn flush_widens_to_even_window() {
        let mut buf = vec![0u16; 16 * 16];
        let mut fb = FrameBuffer::new(&mut buf, 16, 16).unwrap();
        fb.draw_iter([embedded_graphics::Pixel(Point::new(3, 3), Rgb565::RED)])
            .unwrap();

        let mut display = panel(16, 16);
        display
            .flush(&fb, Rectangle::new(Point::new(3, 3), Size::new(1, 1)))
            .unwrap();

        let frames = &display.spi.frames;
        assert_eq!(opcodes(frames), vec![0x2A, 0x2B, 0x2C]);
        assert_eq!(&frames[0][4..], &[0x00, 2 + 6, 0x00, 3 + 6]);
        assert_eq!(&frames[1][4..], &[0x00, 2, 0x00, 3]);

        // 2x2 block, big-endian, red at (3,3)
        let red = Rgb565::RED.into_storage().to_be_bytes();
        assert_eq!(&frames[2][4..], &[0, 0, 0, 0, 0, 0, red[0], red[1]]);
    }

    #[test]
    fn flush_splits_into_continue_writes() {
        let mut buf = vec![0u16; 64 * 64];
        let mut fb = FrameBuffer::new(&mut buf, 64, 64).unwrap();
        fb.clear(Rgb565::GREEN).unwrap();

        let mut display = panel(64, 64);
        display.flush_all(&fb).unwrap();

        let frames = &display.spi.frames;
        // 64*64*2 bytes in 4096-byte chunks
        assert_eq!(opcodes(frames), vec![0x2A, 0x2B, 0x2C, 0x3C]);
        let payload: usize = frames[2..].iter().map(|f| f.len() - 4).sum();
        assert_eq!(payload, 64 * 64 * 2);
        let green = Rgb565::GREEN.into_storage().to_be_bytes();
        assert_eq!(&frames[3][4..6], &green);
    }

    #[test]
    fn flush_clips_to_panel() {
        let mut buf = vec![0u16; 8 * 8];
        let mut fb = FrameBuffer::new(&mut buf, 8, 8).unwrap();
        Rectangle::new(Point::new(6, 6), Size::new(2, 2))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::BLUE))
            .draw(&mut fb)
            .unwrap();

        let mut display = panel(8, 8);
        display
            .flush(&fb, Rectangle::new(Point::new(5, 5), Size::new(10, 10)))
            .unwrap();
        let frames = &display.spi.frames;
        assert_eq!(&frames[0][4..], &[0x00, 4 + 6, 0x00, 7 + 6]);
        assert_eq!(frames[2].len() - 4, 4 * 4 * 2);

        // nothing on screen
        display.spi.frames.clear();
        display
            .flush(&fb, Rectangle::new(Point::new(20, 20), Size::new(4, 4)))
            .unwrap();
        assert!(display.spi.frames.is_empty());
    }

    #[test]
    fn flush_rejects_foreign_frame_buffer() {
        let mut buf = vec![0u16; 4 * 4];
        let fb = FrameBuffer::new(&mut buf, 4, 4).unwrap();
        let mut display = panel(8, 8);
        assert!(matches!(display.flush_all(&fb), Err(Co5300Error::OutOfBounds)));
    }

    #[test]
    fn power_commands() {
        let mut display = panel(8, 8);
        let mut delay = FakeDelay::default();
        display.set_brightness(0x40).unwrap();
        display.display_off().unwrap();
        display.display_on(&mut delay).unwrap();
        let frames = &display.spi.frames;
        assert_eq!(frames[0], vec![0x02, 0x00, 0x51, 0x00, 0x40]);
        assert_eq!(opcodes(&frames[1..]), vec![0x28, 0x29]);
    }
}
