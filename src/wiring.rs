//! Board pin mapping for the Waveshare ESP32-S3 Touch AMOLED 1.43" watch.
//! The following wiring is assumed:
//! - CO5300 CS   => GPIO9
//! - CO5300 SCK  => GPIO10
//! - CO5300 IO0  => GPIO11 (Standard SPI, IO1..IO3 unused)
//! - CO5300 RST  => GPIO21
//! - Panel EN    => GPIO42
//! - PCF85063 SDA => GPIO47
//! - PCF85063 SCL => GPIO48

use esp_hal::{
    gpio::{Level, Output, OutputConfig},
    peripherals::{Peripherals, DMA_CH0, GPIO10, GPIO11, GPIO47, GPIO48, I2C0, SPI2},
};

pub struct DisplayPins<'a> {
    pub spi2: SPI2<'a>,
    pub cs: Output<'a>,
    pub clk: GPIO10<'a>,
    pub do0: GPIO11<'a>,
    pub rst: Output<'a>,
    pub en: Output<'a>,
    pub dma_ch0: DMA_CH0<'a>,
}

pub struct RtcPins<'a> {
    pub i2c0: I2C0<'a>,
    pub sda: GPIO47<'a>,
    pub scl: GPIO48<'a>,
}

pub struct BoardPins<'a> {
    pub display: DisplayPins<'a>,
    pub rtc: RtcPins<'a>,
}

pub fn init_board_pins(p: Peripherals) -> BoardPins<'static> {
    // CS idles high; panel stays powered down until setup_display toggles EN
    let cs = Output::new(p.GPIO9, Level::High, OutputConfig::default());
    let rst = Output::new(p.GPIO21, Level::High, OutputConfig::default());
    let en = Output::new(p.GPIO42, Level::Low, OutputConfig::default());

    BoardPins {
        display: DisplayPins {
            spi2: p.SPI2,
            cs,
            clk: p.GPIO10,
            do0: p.GPIO11,
            rst,
            en,
            dma_ch0: p.DMA_CH0,
        },
        rtc: RtcPins {
            i2c0: p.I2C0,
            sda: p.GPIO47,
            scl: p.GPIO48,
        },
    }
}
