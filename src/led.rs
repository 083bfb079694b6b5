//! Indicator LED seam.
//!
//! The addressable LED protocol needs cycle-exact timing, so the bit-banging
//! itself lives with the board support code. The runtime only hands it a
//! color through [`RgbLed`].

use palette::Srgb;

/// Trait for abstracting the indicator LED hardware.
///
/// Implement this for your LED driver (bit-banged WS2812, SPI, PWM, etc.).
pub trait RgbLed {
    /// Shows `color` on the LED.
    ///
    /// The call is blocking and cannot fail; handle hardware errors internally.
    fn set_color(&mut self, color: Srgb<u8>);
}

/// Reorders a color into the green-red-blue byte order WS2812-style LEDs
/// expect on the wire.
#[inline]
pub fn to_grb(color: Srgb<u8>) -> [u8; 3] {
    [color.green, color.red, color.blue]
}
