//! Analog watch face firmware
//! ========================================
//! needs to be run in WSL2 terminal
//! source ~/export-esp.sh
//! ========================================
//!
//! Reads the time from the PCF85063 at boot and hourly after that, and draws the hour,
//! minute and second hands over a dial on the CO5300 panel once a second.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

// Application descriptor checked by the bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

use analog_watchface::{
    app::WatchApp,
    background::{Background, DialStyle},
    co5300::{CO5300_HEIGHT, CO5300_WIDTH},
    config::FaceConfig,
    display::{now_ms, setup_display},
    face::ClockFaceRenderer,
    framebuffer::FrameBuffer,
    logging::PrintSubscriber,
    resource::{ImageResource, DIAL_IMAGE_SIZE, DIAL_IMAGE_ZLIB},
    rtc_pcf85063::{unix_to_datetime, Pcf85063},
    time::{MonotonicClock, SecondTicker, TimeSource},
    wiring::{init_board_pins, BoardPins},
};

use embedded_graphics::prelude::Dimensions;
use esp_backtrace as _;
use esp_hal::{
    i2c::master::{Config as I2cConfig, I2c},
    main, psram,
    time::Rate,
    Blocking, Config,
};
use esp_println::println;
use tracing::{Dispatch, Level};

extern crate alloc;
use alloc::{boxed::Box, vec};

// Hands are outlined for a ~144px screen
const FACE_SCALE: i32 = 3;

// Re-read the RTC this often to cancel system timer drift
const RTC_RESYNC_SECS: u32 = 3_600;

// Library events (RTC trust, image loading, app lifecycle) go to the console
static LOGGER: PrintSubscriber = PrintSubscriber::new(print_line, Level::INFO);

fn print_line(line: core::fmt::Arguments<'_>) {
    println!("{}", line);
}

fn read_rtc_unix<I: embedded_hal::i2c::I2c>(rtc: &mut Pcf85063<I>) -> Option<u32>
where
    I::Error: core::fmt::Debug,
{
    match rtc.read_unix() {
        Ok(Some(unix)) => {
            let dt = unix_to_datetime(unix);
            println!(
                "[RTC] {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
            );
            Some(unix)
        }
        // already logged by the driver
        Ok(None) => None,
        Err(e) => {
            println!("[RTC] read failed: {:?}", e);
            None
        }
    }
}

#[main]
fn main() -> ! {
    let peripherals = esp_hal::init(Config::default());

    esp_alloc::psram_allocator!(&peripherals.PSRAM, psram);

    if tracing::dispatcher::set_global_default(Dispatch::from_static(&LOGGER)).is_err() {
        println!("[LOG] subscriber already set");
    }

    let BoardPins { display, rtc } = init_board_pins(peripherals);

    // -------------------- RTC --------------------
    let i2c: I2c<'static, Blocking> = I2c::new(
        rtc.i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(400)),
    )
    .expect("I2C0 config rejected")
    .with_sda(rtc.sda)
    .with_scl(rtc.scl);
    let mut rtc = Pcf85063::new(i2c);

    // Without a trusted RTC the face starts at midnight
    let boot_unix = read_rtc_unix(&mut rtc).unwrap_or(0);
    let mut clock = MonotonicClock::new(boot_unix, now_ms);

    // -------------------- Display --------------------
    let (w, h) = (CO5300_WIDTH as u32, CO5300_HEIGHT as u32);
    let buf: &'static mut [u16] = Box::leak(vec![0u16; (w * h) as usize].into_boxed_slice());
    let mut fb = FrameBuffer::new(buf, w, h).expect("frame buffer size");
    let mut panel = setup_display(display);

    let frame = fb.bounding_box();
    let config = FaceConfig::DEFAULT.with_scale(FACE_SCALE);

    // Bundled dial bitmap; the procedural dial stands in if it fails to load
    let dial_image = ImageResource::from_zlib(DIAL_IMAGE_ZLIB, DIAL_IMAGE_SIZE, DIAL_IMAGE_SIZE).ok();
    let background = match &dial_image {
        Some(image) => Background::image(image, config.palette.background),
        None => Background::Dial(DialStyle::for_frame(frame, &config.palette)),
    };

    let mut app = WatchApp::new(ClockFaceRenderer::new(config), background, frame);
    app.start(clock.now());

    let mut ticker = SecondTicker::new(now_ms());
    let mut since_resync = 0u32;

    loop {
        let damage = match app.render(&mut fb) {
            Ok(damage) => damage,
            Err(never) => match never {},
        };
        if let Some(area) = damage {
            if let Err(e) = panel.flush(&fb, area) {
                println!("[LCD] flush failed: {:?}", e);
            }
        }

        // Idle until the next second boundary
        let elapsed = loop {
            if let Some(n) = ticker.poll(now_ms()) {
                break n;
            }
            core::hint::spin_loop();
        };

        since_resync = since_resync.saturating_add(elapsed);
        if since_resync >= RTC_RESYNC_SECS {
            since_resync = 0;
            if let Some(unix) = read_rtc_unix(&mut rtc) {
                clock.set(unix);
            }
        }

        app.tick(clock.now());
    }
}
