#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app;
pub mod background;
pub mod co5300;
pub mod config;
pub mod face;
pub mod framebuffer;
pub mod layer;
pub mod logging;
pub mod path;
pub mod resource;
pub mod rtc_pcf85063;
pub mod time;
pub mod trig;

#[cfg(feature = "firmware")]
pub mod display;
#[cfg(feature = "firmware")]
pub mod wiring;
