//! ATtiny85 power-band emulator.
//!
//! Broadcasts the selected identity on PB3, shows its color on the WS2812 on
//! PB2, cycles identities with the button on PB4, and sleeps (~40 µA) after
//! the idle frame budget until the button is pressed again.
//!
//! Fuses: L 0xE2, H 0xDF, E 0xFF (8 MHz internal oscillator).

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

use panic_halt as _;

use ir_beacon::{Beacon, BeaconConfig, BeaconParts, SleepLatch, TickCounter};

mod board;
mod ws2812;

use board::{Board, PortBInput, PortBOutput};
use ws2812::Ws2812;

static TICKS: TickCounter = TickCounter::new();
static SLEEP_LATCH: SleepLatch = SleepLatch::new();

#[avr_device::interrupt(attiny85)]
fn TIMER0_COMPA() {
    TICKS.tick();
}

#[avr_device::interrupt(attiny85)]
fn PCINT0() {
    Board::clear_sleep_enable();
    SLEEP_LATCH.disarm();
}

#[avr_device::entry]
fn main() -> ! {
    // `take` only fails on a second call.
    let Some(dp) = avr_device::attiny85::Peripherals::take() else {
        loop {
            avr_device::asm::sleep();
        }
    };

    let config = BeaconConfig::DEFAULT;

    let parts = BeaconParts {
        ir: PortBOutput::<{ board::IR }>,
        button: PortBInput::<{ board::BUTTON }>,
        led_power: PortBOutput::<{ board::LED_POWER }>,
        led: Ws2812::<{ board::LED_DATA }>::new(),
        platform: Board::new(dp, config.timer()),
    };

    let mut beacon = Beacon::new(parts, &TICKS, &SLEEP_LATCH, config);

    // Infallible pins; init cannot fail on this board.
    let _ = beacon.init();

    unsafe { avr_device::interrupt::enable() };

    beacon.run()
}
