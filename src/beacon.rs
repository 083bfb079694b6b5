//! The beacon runtime: one owner for all main-loop state.
//!
//! Provides [`Beacon`], which ties the tick gate, the transmission state
//! machine, the button monitor and the power manager to the board's lines.
//! Also defines the [`Platform`] trait for the pieces that only the board
//! support code can do (peripheral setup, sleep mode selection, halting).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, ErrorKind, InputPin, OutputPin};

use crate::config::BeaconConfig;
use crate::identity::{IdentityIndex, IdentityProfile};
use crate::input::{ButtonMonitor, ButtonState};
use crate::led::RgbLed;
use crate::power::{PowerError, PowerManager, PowerState, SleepLatch};
use crate::tick::TickCounter;
use crate::transmitter::{FrameEvent, Transmitter};

/// Board operations the runtime cannot express through `embedded-hal`.
///
/// Register-level setup is fixed for a given board, so these take no
/// arguments and cannot fail.
pub trait Platform: DelayNs {
    /// Applies the fixed peripheral setup: tick timer, unused peripherals off.
    fn configure_peripherals(&mut self);

    /// Enables the button's pin-change interrupt as the wake source.
    fn enable_wake_interrupt(&mut self);

    /// Selects the lowest-power sleep mode and sets the sleep enable bit.
    fn prepare_sleep(&mut self);

    /// Suspends the CPU until any enabled interrupt fires.
    fn halt(&mut self);
}

/// The hardware a [`Beacon`] drives.
pub struct BeaconParts<IR, BTN, PWR, L, P> {
    /// Infrared emitter line.
    pub ir: IR,
    /// Selection button line, pulled up; low while pressed.
    pub button: BTN,
    /// Switch for the LED supply rail.
    pub led_power: PWR,
    /// Indicator LED driver.
    pub led: L,
    /// Board support.
    pub platform: P,
}

/// Result of one [`Beacon::service`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceOutcome {
    /// Not enough ticks yet; nothing happened.
    Idle,

    /// One bit went out on the infrared line.
    Transmitted {
        /// Level driven for this bit.
        level: bool,
        /// Frame bookkeeping after the bit.
        event: FrameEvent,
        /// Whether a button press was handled this cycle.
        pressed: bool,
    },

    /// The idle frame budget ran out; LED power is cut and the latch armed.
    /// Halt until an interrupt fires.
    EnteredSleep,

    /// Still sleeping (no wake interrupt yet). Halt again.
    Asleep,

    /// Woke up and reinitialized.
    Woke,
}

/// Errors from runtime operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconError {
    /// Power transition rejected.
    Power(PowerError),
    /// A GPIO line reported an error.
    Pin(ErrorKind),
}

impl core::fmt::Display for BeaconError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BeaconError::Power(err) => write!(f, "power error: {}", err),
            BeaconError::Pin(kind) => write!(f, "pin error: {}", kind),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BeaconError {}

#[cfg(feature = "defmt")]
impl defmt::Format for BeaconError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            BeaconError::Power(err) => defmt::write!(f, "Power({})", err),
            BeaconError::Pin(kind) => defmt::write!(f, "Pin({})", defmt::Debug2Format(kind)),
        }
    }
}

impl From<PowerError> for BeaconError {
    fn from(err: PowerError) -> Self {
        BeaconError::Power(err)
    }
}

fn pin_error<E: embedded_hal::digital::Error>(err: E) -> BeaconError {
    BeaconError::Pin(err.kind())
}

/// Broadcasts the selected identity and handles selection and sleep.
///
/// Owns every line it drives. The only state shared with interrupt handlers
/// is the borrowed [`TickCounter`] and [`SleepLatch`].
///
/// # Type Parameters
/// * `'a` - Lifetime of the interrupt-shared counter and latch
/// * `IR` - Infrared output line
/// * `BTN` - Button input line
/// * `PWR` - LED supply switch line
/// * `L` - Indicator LED driver
/// * `P` - Board support
pub struct Beacon<'a, IR, BTN, PWR, L, P> {
    ir: IR,
    button: BTN,
    led_power: PWR,
    led: L,
    platform: P,
    ticks: &'a TickCounter,
    power: PowerManager<'a>,
    config: BeaconConfig,
    transmitter: Transmitter,
    input: ButtonMonitor,
    selected: IdentityIndex,
}

impl<'a, IR, BTN, PWR, L, P> Beacon<'a, IR, BTN, PWR, L, P>
where
    IR: OutputPin,
    BTN: InputPin,
    PWR: OutputPin,
    L: RgbLed,
    P: Platform,
{
    /// Creates a beacon. Touches no hardware; call [`init`](Self::init) next.
    ///
    /// `config` was validated when it was built, so this cannot fail.
    pub fn new(
        parts: BeaconParts<IR, BTN, PWR, L, P>,
        ticks: &'a TickCounter,
        latch: &'a SleepLatch,
        config: BeaconConfig,
    ) -> Self {
        Self {
            ir: parts.ir,
            button: parts.button,
            led_power: parts.led_power,
            led: parts.led,
            platform: parts.platform,
            ticks,
            power: PowerManager::new(latch),
            config,
            transmitter: Transmitter::new(),
            input: ButtonMonitor::new(),
            selected: config.default_identity(),
        }
    }

    /// Brings the device to its power-on state.
    ///
    /// Powers the LED rail, applies the peripheral setup, resets every counter,
    /// selects the default identity and shows its color. Safe to repeat; every
    /// wake runs it again.
    ///
    /// The counters and the selection are reset before any line is touched,
    /// so a failing line never leaves pre-sleep state behind.
    pub fn init(&mut self) -> Result<(), BeaconError> {
        self.reset_state();

        let settle_ms = self.config.settle_delay_ms();
        self.platform.delay_ms(settle_ms);

        self.led_power.set_high().map_err(pin_error)?;
        self.ir.set_low().map_err(pin_error)?;
        self.platform.configure_peripherals();

        self.platform.delay_ms(settle_ms);

        // Ticks counted during the settle delays are stale.
        self.ticks.reset();
        self.led.set_color(self.selected.profile().color);

        self.platform.enable_wake_interrupt();

        debug!("init: identity {}", self.selected.get());
        Ok(())
    }

    /// Runs one main-loop pass.
    ///
    /// # Returns
    /// * `Ok(ServiceOutcome::Idle)` - Tick gate closed
    /// * `Ok(ServiceOutcome::Transmitted { .. })` - One bit sent
    /// * `Ok(ServiceOutcome::EnteredSleep)` / `Ok(ServiceOutcome::Asleep)` - Halt now
    /// * `Ok(ServiceOutcome::Woke)` - Reinitialized after a wake interrupt
    /// * `Err` - A line failed
    pub fn service(&mut self) -> Result<ServiceOutcome, BeaconError> {
        if self.power.is_sleeping() {
            return self.service_sleeping();
        }

        if !self.ticks.take_due(self.config.tick_threshold()) {
            return Ok(ServiceOutcome::Idle);
        }

        let level = self.transmitter.current_bit(self.selected.profile());
        self.ir.set_state(level.into()).map_err(pin_error)?;

        let event = self.transmitter.advance(self.config.repeat_limit());
        if event == FrameEvent::Exhausted {
            self.enter_sleep()?;
            return Ok(ServiceOutcome::EnteredSleep);
        }

        let pressed = self.poll_button()?;

        Ok(ServiceOutcome::Transmitted {
            level,
            event,
            pressed,
        })
    }

    /// Runs the main loop forever, halting whenever the beacon sleeps.
    ///
    /// Errors are dropped after logging; the device has nowhere to report them
    /// and the next pass, or the next wake, starts from a consistent state.
    pub fn run(&mut self) -> ! {
        loop {
            match self.service() {
                Ok(ServiceOutcome::EnteredSleep) | Ok(ServiceOutcome::Asleep) => {
                    self.platform.halt();
                }
                Ok(_) => {}
                Err(_err) => {
                    warn!("service failed: {}", _err);
                }
            }
        }
    }

    /// Active → Sleeping: cuts the LED rail and arms the wake latch.
    ///
    /// The button pull-up stays enabled so the pin-change interrupt can fire.
    /// The transition happens even if a line fails; the first line error is
    /// returned afterwards.
    fn enter_sleep(&mut self) -> Result<(), BeaconError> {
        let ir = self.ir.set_low().map_err(pin_error);
        let rail = self.led_power.set_low().map_err(pin_error);
        self.platform.prepare_sleep();
        self.power.enter_sleep()?;

        info!("idle for {} frames, sleeping", self.config.repeat_limit());
        ir.and(rail)
    }

    /// Sleeping → Active: full [`init`](Self::init), then the state change.
    ///
    /// If init fails the beacon stays sleeping with the latch clear, so the
    /// next pass tries again.
    fn wake(&mut self) -> Result<(), BeaconError> {
        self.init()?;
        self.power.wake()?;

        info!("woke up");
        Ok(())
    }

    fn service_sleeping(&mut self) -> Result<ServiceOutcome, BeaconError> {
        if !self.power.wake_pending()? {
            trace!("woke without button, halting again");
            return Ok(ServiceOutcome::Asleep);
        }

        self.wake()?;
        Ok(ServiceOutcome::Woke)
    }

    fn reset_state(&mut self) {
        self.ticks.reset();
        self.transmitter.reset();
        self.input.reset();
        self.selected = self.config.default_identity();
    }

    /// Samples the button and, on a press, advances the selection.
    fn poll_button(&mut self) -> Result<bool, BeaconError> {
        let line_high = self.button.is_high().map_err(pin_error)?;
        let pressed = self.input.sample(line_high);

        if pressed {
            self.select_next();
        }

        Ok(pressed)
    }

    /// Moves to the next identity and restarts its frame from bit 0.
    fn select_next(&mut self) {
        self.transmitter.reset_repeats();
        self.selected = self.selected.next();
        self.led.set_color(self.selected.profile().color);
        self.transmitter.restart_frame();

        debug!("selected identity {}", self.selected.get());
    }

    /// Returns the selected identity index.
    pub fn selected(&self) -> IdentityIndex {
        self.selected
    }

    /// Returns the selected identity's profile.
    pub fn profile(&self) -> &'static IdentityProfile {
        self.selected.profile()
    }

    /// Returns the position within the current frame.
    pub fn bit_index(&self) -> u8 {
        self.transmitter.bit_index()
    }

    /// Returns the frames completed since the last press or init.
    pub fn repeat_count(&self) -> u8 {
        self.transmitter.repeat_count()
    }

    /// Returns the current power state.
    pub fn power_state(&self) -> PowerState {
        self.power.state()
    }

    /// Returns the latest button samples.
    pub fn button_state(&self) -> ButtonState {
        self.input.state()
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    /// Gives the hardware back.
    pub fn release(self) -> BeaconParts<IR, BTN, PWR, L, P> {
        BeaconParts {
            ir: self.ir,
            button: self.button,
            led_power: self.led_power,
            led: self.led,
            platform: self.platform,
        }
    }
}
