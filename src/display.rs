//! Display setup for the CO5300 AMOLED panel, plus the board's delay and clock helpers.

use esp_hal::{
    dma::{DmaRxBuf, DmaTxBuf},
    dma_buffers,
    gpio::Output,
    spi::{
        master::{Config, Spi, SpiDmaBus},
        Mode,
    },
    time::Rate,
    timer::systimer::{SystemTimer, Unit},
    Blocking,
};

use embedded_hal::delay::DelayNs;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};

use crate::co5300::{self, Co5300Display};
use crate::wiring::DisplayPins;

// SPI @ 60 MHz, Mode 0; 40 MHz is the known-stable fallback
const SPI_FREQ_HZ: u32 = 60_000_000;

pub type SpiDev<'a> = ExclusiveDevice<SpiDmaBus<'a, Blocking>, Output<'a>, NoDelay>;
pub type DisplayType<'a> = Co5300Display<SpiDev<'a>, Output<'a>>;

/// Milliseconds since boot from the system timer.
pub fn now_ms() -> u64 {
    let t = SystemTimer::unit_value(Unit::Unit0);
    t.saturating_mul(1000) / SystemTimer::ticks_per_second()
}

// Delay measured against the system timer, accurate regardless of CPU clock.
pub struct TimerDelay;

impl DelayNs for TimerDelay {
    fn delay_ns(&mut self, ns: u32) {
        let ticks = (ns as u64 * SystemTimer::ticks_per_second()).div_ceil(1_000_000_000);
        let start = SystemTimer::unit_value(Unit::Unit0);
        while SystemTimer::unit_value(Unit::Unit0).wrapping_sub(start) < ticks {
            core::hint::spin_loop();
        }
    }
}

pub fn setup_display(display_pins: DisplayPins<'static>) -> DisplayType<'static> {
    let DisplayPins {
        spi2,
        cs,
        clk,
        do0,
        rst,
        mut en,
        dma_ch0,
    } = display_pins;

    let mut delay = TimerDelay;

    // quick toggle EN pin so the panel rails start from a known state
    en.set_low();
    delay.delay_ms(10);
    en.set_high();
    delay.delay_ms(100);

    let spi = Spi::new(
        spi2,
        Config::default()
            .with_frequency(Rate::from_hz(SPI_FREQ_HZ))
            .with_mode(Mode::_0),
    )
    .expect("SPI2 config rejected")
    .with_sck(clk)
    .with_mosi(do0)
    .with_dma(dma_ch0);

    // Flush chunks are at most 4 KiB of pixels plus the header
    let (rx_buf, rx_desc, tx_buf, tx_desc) = dma_buffers!(32, 8192);
    let rx = DmaRxBuf::new(rx_desc, rx_buf).expect("DMA rx buffer");
    let tx = DmaTxBuf::new(tx_desc, tx_buf).expect("DMA tx buffer");

    let spi_bus: SpiDmaBus<'static, Blocking> = spi.with_buffers(rx, tx);
    let spi_dev = ExclusiveDevice::new(spi_bus, cs, NoDelay).expect("CS pin");

    co5300::new_with_defaults(spi_dev, Some(rst), &mut delay).expect("CO5300 init failed")
}
