//! ATtiny85 wiring and register setup.
//!
//! ```text
//!         RESET  VCC
//!  IR     PB3    PB2   LED data
//!  Button PB4    PB1
//!         GND    PB0   LED power
//! ```

use core::convert::Infallible;

use avr_device::attiny85;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use ir_beacon::{Platform, TimerConfig};

pub const LED_POWER: u8 = 0;
pub const LED_DATA: u8 = 2;
pub const IR: u8 = 3;
pub const BUTTON: u8 = 4;

const OUTPUTS: u8 = (1 << LED_POWER) | (1 << LED_DATA) | (1 << IR);

const MCUCR_SM1: u8 = 1 << 4;
const MCUCR_SE: u8 = 1 << 5;
const GIMSK_PCIE: u8 = 1 << 5;
const TIMSK_OCIE0A: u8 = 1 << 4;
const ADCSRA_ADEN: u8 = 1 << 7;

fn portb() -> &'static attiny85::portb::RegisterBlock {
    // SAFETY: PORTB bits are only touched from the main loop; the ISRs never
    // access it.
    unsafe { &*attiny85::PORTB::ptr() }
}

/// One PORTB line driven as a push-pull output.
pub struct PortBOutput<const N: u8>;

impl<const N: u8> ErrorType for PortBOutput<N> {
    type Error = Infallible;
}

impl<const N: u8> OutputPin for PortBOutput<N> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        portb()
            .portb
            .modify(|r, w| unsafe { w.bits(r.bits() & !(1 << N)) });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        portb()
            .portb
            .modify(|r, w| unsafe { w.bits(r.bits() | (1 << N)) });
        Ok(())
    }
}

/// One PORTB line read as an input.
pub struct PortBInput<const N: u8>;

impl<const N: u8> ErrorType for PortBInput<N> {
    type Error = Infallible;
}

impl<const N: u8> InputPin for PortBInput<N> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(portb().pinb.read().bits() & (1 << N) != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(portb().pinb.read().bits() & (1 << N) == 0)
    }
}

/// Register-level setup for the tick timer, wake interrupt and sleep mode.
pub struct Board {
    dp: attiny85::Peripherals,
    timer: TimerConfig,
}

impl Board {
    pub fn new(dp: attiny85::Peripherals, timer: TimerConfig) -> Self {
        Self { dp, timer }
    }

    /// Clears the sleep enable bit. Called from the wake interrupt.
    pub fn clear_sleep_enable() {
        // SAFETY: MCUCR is otherwise only written by `prepare_sleep`.
        let cpu = unsafe { &*attiny85::CPU::ptr() };
        cpu.mcucr.modify(|r, w| unsafe { w.bits(r.bits() & !MCUCR_SE) });
    }
}

impl DelayNs for Board {
    fn delay_ns(&mut self, ns: u32) {
        avr_device::asm::delay_cycles(self.timer.cycles_for_ns(ns));
    }
}

impl Platform for Board {
    fn configure_peripherals(&mut self) {
        let dp = &self.dp;

        dp.PORTB
            .portb
            .modify(|r, w| unsafe { w.bits(r.bits() | (1 << BUTTON)) });
        dp.PORTB.ddrb.write(|w| unsafe { w.bits(OUTPUTS) });

        dp.ADC
            .adcsra
            .modify(|r, w| unsafe { w.bits(r.bits() & !ADCSRA_ADEN) });

        // CTC mode, clk/1024, compare match A interrupt.
        dp.TC0.tccr0a.write(|w| unsafe { w.bits(0b0000_0010) });
        dp.TC0.tccr0b.write(|w| unsafe { w.bits(0b0000_0101) });
        dp.TC0.ocr0a.write(|w| unsafe { w.bits(self.timer.compare) });
        dp.TC0.timsk.write(|w| unsafe { w.bits(TIMSK_OCIE0A) });
    }

    fn enable_wake_interrupt(&mut self) {
        let dp = &self.dp;
        dp.EXINT
            .gimsk
            .modify(|r, w| unsafe { w.bits(r.bits() | GIMSK_PCIE) });
        dp.EXINT
            .pcmsk
            .modify(|r, w| unsafe { w.bits(r.bits() | (1 << BUTTON)) });
    }

    fn prepare_sleep(&mut self) {
        // Power-down, sleep enabled.
        self.dp
            .CPU
            .mcucr
            .modify(|r, w| unsafe { w.bits(r.bits() | MCUCR_SM1 | MCUCR_SE) });
    }

    fn halt(&mut self) {
        avr_device::asm::sleep();
    }
}
