//! Shared test infrastructure for ir-beacon integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use ir_beacon::{
    Beacon, BeaconConfig, BeaconError, BeaconParts, Platform, RgbLed, ServiceOutcome, SleepLatch, Srgb,
    TickCounter,
};

// ============================================================================
// Hardware Event Log
// ============================================================================

/// Everything the runtime did to the hardware, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwEvent {
    Ir(bool),
    LedPower(bool),
    LedColor(Srgb<u8>),
    ConfigurePeripherals,
    EnableWake,
    PrepareSleep,
    Halt,
    DelayMs(u32),
}

pub type EventLog = Rc<RefCell<heapless::Vec<HwEvent, 2048>>>;

pub fn new_log() -> EventLog {
    Rc::new(RefCell::new(heapless::Vec::new()))
}

fn record(log: &EventLog, event: HwEvent) {
    let mut log = log.borrow_mut();
    if log.is_full() {
        log.clear();
    }
    let _ = log.push(event);
}

// ============================================================================
// Mock Lines
// ============================================================================

/// Error reported by a mock line with an injected fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Output line that logs every level change
///
/// While `fault` holds a level, driving the line to that level fails and
/// nothing is logged.
pub struct MockOutput {
    log: EventLog,
    make: fn(bool) -> HwEvent,
    fault: Rc<Cell<Option<bool>>>,
}

impl MockOutput {
    fn drive(&mut self, level: bool) -> Result<(), MockPinError> {
        if self.fault.get() == Some(level) {
            return Err(MockPinError);
        }
        record(&self.log, (self.make)(level));
        Ok(())
    }
}

impl ErrorType for MockOutput {
    type Error = MockPinError;
}

impl OutputPin for MockOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

/// Button line whose level the test controls
pub struct MockButton {
    level: Rc<Cell<bool>>,
}

impl ErrorType for MockButton {
    type Error = Infallible;
}

impl InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}

// ============================================================================
// Mock LED
// ============================================================================

/// Mock LED that records all color changes for testing
pub struct MockLed {
    log: EventLog,
}

impl RgbLed for MockLed {
    fn set_color(&mut self, color: Srgb<u8>) {
        record(&self.log, HwEvent::LedColor(color));
    }
}

// ============================================================================
// Mock Platform
// ============================================================================

/// Platform that logs setup calls; `halt` returns immediately
pub struct MockPlatform {
    log: EventLog,
}

impl DelayNs for MockPlatform {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        record(&self.log, HwEvent::DelayMs(ms));
    }
}

impl Platform for MockPlatform {
    fn configure_peripherals(&mut self) {
        record(&self.log, HwEvent::ConfigurePeripherals);
    }

    fn enable_wake_interrupt(&mut self) {
        record(&self.log, HwEvent::EnableWake);
    }

    fn prepare_sleep(&mut self) {
        record(&self.log, HwEvent::PrepareSleep);
    }

    fn halt(&mut self) {
        record(&self.log, HwEvent::Halt);
    }
}

// ============================================================================
// Test Rig
// ============================================================================

pub type TestBeacon<'a> = Beacon<'a, MockOutput, MockButton, MockOutput, MockLed, MockPlatform>;

/// Interrupt-shared state, owned by the test so the beacon can borrow it
pub struct Shared {
    pub ticks: TickCounter,
    pub latch: SleepLatch,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            ticks: TickCounter::new(),
            latch: SleepLatch::new(),
        }
    }
}

/// Handles the test keeps after the mocks move into the beacon
pub struct HwHandles {
    pub log: EventLog,
    pub button: Rc<Cell<bool>>,
    pub ir_fault: Rc<Cell<Option<bool>>>,
    pub led_power_fault: Rc<Cell<Option<bool>>>,
}

impl HwHandles {
    /// Makes driving the IR line to `level` fail; `None` clears the fault
    pub fn fail_ir(&self, level: Option<bool>) {
        self.ir_fault.set(level);
    }

    /// Makes driving the LED rail to `level` fail; `None` clears the fault
    pub fn fail_led_power(&self, level: Option<bool>) {
        self.led_power_fault.set(level);
    }

    /// Releases (true) or presses (false) the button
    pub fn set_button_high(&self, high: bool) {
        self.button.set(high);
    }

    pub fn events(&self) -> Vec<HwEvent> {
        self.log.borrow().iter().copied().collect()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn ir_levels(&self) -> Vec<bool> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                HwEvent::Ir(level) => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub fn last_color(&self) -> Option<Srgb<u8>> {
        self.log.borrow().iter().rev().find_map(|e| match e {
            HwEvent::LedColor(color) => Some(*color),
            _ => None,
        })
    }

    pub fn count(&self, event: HwEvent) -> usize {
        self.log.borrow().iter().filter(|e| **e == event).count()
    }
}

pub fn build_beacon<'a>(shared: &'a Shared, config: BeaconConfig) -> (TestBeacon<'a>, HwHandles) {
    let log = new_log();
    let button = Rc::new(Cell::new(true));
    let ir_fault = Rc::new(Cell::new(None));
    let led_power_fault = Rc::new(Cell::new(None));

    let parts = BeaconParts {
        ir: MockOutput {
            log: log.clone(),
            make: HwEvent::Ir,
            fault: ir_fault.clone(),
        },
        button: MockButton {
            level: button.clone(),
        },
        led_power: MockOutput {
            log: log.clone(),
            make: HwEvent::LedPower,
            fault: led_power_fault.clone(),
        },
        led: MockLed { log: log.clone() },
        platform: MockPlatform { log: log.clone() },
    };

    let beacon = Beacon::new(parts, &shared.ticks, &shared.latch, config);
    (
        beacon,
        HwHandles {
            log,
            button,
            ir_fault,
            led_power_fault,
        },
    )
}

/// Builds a beacon with the default config and runs `init`
pub fn started_beacon(shared: &Shared) -> (TestBeacon<'_>, HwHandles) {
    let (mut beacon, hw) = build_beacon(shared, BeaconConfig::DEFAULT);
    beacon.init().unwrap();
    (beacon, hw)
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Delivers enough timer interrupts for one step and services once
pub fn try_step(
    beacon: &mut TestBeacon<'_>,
    shared: &Shared,
) -> Result<ServiceOutcome, BeaconError> {
    for _ in 0..beacon.config().tick_threshold() {
        shared.ticks.tick();
    }
    beacon.service()
}

/// Like [`try_step`], for steps that must succeed
pub fn step(beacon: &mut TestBeacon<'_>, shared: &Shared) -> ServiceOutcome {
    try_step(beacon, shared).unwrap()
}

/// Steps `n` times, asserting none of them put the beacon to sleep
pub fn step_n(beacon: &mut TestBeacon<'_>, shared: &Shared, n: usize) {
    for _ in 0..n {
        let outcome = step(beacon, shared);
        assert!(
            matches!(outcome, ServiceOutcome::Transmitted { .. }),
            "unexpected outcome {:?}",
            outcome
        );
    }
}

/// Holds the button down for one step, then lets it go
pub fn press(beacon: &mut TestBeacon<'_>, shared: &Shared, hw: &HwHandles) -> ServiceOutcome {
    hw.set_button_high(false);
    let outcome = step(beacon, shared);
    hw.set_button_high(true);
    outcome
}

/// Expected frame for `code`, MSB-first over 28 bits
pub fn expected_frame(code: [u8; 4]) -> Vec<bool> {
    (0..28)
        .map(|i| (code[i / 8] >> (7 - (i % 8))) & 1 == 1)
        .collect()
}
