//! Face configuration: hand geometry scale and the color palette.
//!
//! The hand outlines are defined for a ~144px wide screen. Boards with a
//! larger panel bump `scale` instead of carrying a second set of outlines.

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

/// Colors used by the background and the three hand layers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub hand_fill: Rgb565,
    pub hand_stroke: Rgb565,
    pub second_fill: Rgb565,
    pub second_stroke: Rgb565,
    pub background: Rgb565,
    pub dial: Rgb565,
}

impl Palette {
    // White hands with black edges, black second tail with a white pointer
    pub const MONO: Palette = Palette {
        hand_fill: Rgb565::WHITE,
        hand_stroke: Rgb565::BLACK,
        second_fill: Rgb565::BLACK,
        second_stroke: Rgb565::WHITE,
        background: Rgb565::BLACK,
        dial: Rgb565::WHITE,
    };
}

impl Default for Palette {
    fn default() -> Self {
        Self::MONO
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceConfig {
    /// Integer multiplier applied to every hand point and radius (min 1).
    pub scale: i32,
    pub palette: Palette,
}

impl FaceConfig {
    pub const DEFAULT: FaceConfig = FaceConfig {
        scale: 1,
        palette: Palette::MONO,
    };

    pub const fn with_scale(mut self, scale: i32) -> Self {
        self.scale = if scale < 1 { 1 } else { scale };
        self
    }

    // Guards against hand-built configs with a zero or negative scale
    pub(crate) const fn effective_scale(&self) -> i32 {
        if self.scale < 1 { 1 } else { self.scale }
    }
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_clamped_to_one() {
        assert_eq!(FaceConfig::DEFAULT.with_scale(0).scale, 1);
        assert_eq!(FaceConfig::DEFAULT.with_scale(-4).scale, 1);
        assert_eq!(FaceConfig::DEFAULT.with_scale(3).scale, 3);

        let raw = FaceConfig { scale: 0, palette: Palette::MONO };
        assert_eq!(raw.effective_scale(), 1);
    }
}
