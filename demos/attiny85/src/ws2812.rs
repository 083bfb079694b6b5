use core::arch::asm;

use ir_beacon::{RgbLed, Srgb, to_grb};

/// Single WS2812 pixel on a PORTB line, bit-banged for an 8 MHz core.
///
/// One cycle is 125 ns. A `1` holds the line high for 6 cycles, a `0` for 3;
/// the low phase is whatever the loop costs, well inside the reset threshold.
/// Interrupts are masked for the whole transfer.
pub struct Ws2812<const PIN: u8>;

impl<const PIN: u8> Ws2812<PIN> {
    pub const fn new() -> Self {
        Self
    }

    fn write_grb(&mut self, grb: [u8; 3]) {
        avr_device::interrupt::free(|_| {
            for byte in grb {
                for bit in (0..u8::BITS).rev() {
                    if byte & (1 << bit) != 0 {
                        unsafe {
                            asm!(
                                "sbi 0x18, {pin}",
                                ".rept 4",
                                "nop",
                                ".endr",
                                "cbi 0x18, {pin}",
                                pin = const PIN,
                            );
                        }
                    } else {
                        unsafe {
                            asm!(
                                "sbi 0x18, {pin}",
                                "nop",
                                "cbi 0x18, {pin}",
                                ".rept 3",
                                "nop",
                                ".endr",
                                pin = const PIN,
                            );
                        }
                    }
                }
            }
        });
    }
}

impl<const PIN: u8> RgbLed for Ws2812<PIN> {
    fn set_color(&mut self, color: Srgb<u8>) {
        self.write_grb(to_grb(color));
    }
}
