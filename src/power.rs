//! Sleep/wake state machine.
//!
//! The device has two power states. [`PowerManager`] owns the transitions
//! between them; the wake interrupt only clears the [`SleepLatch`], and the
//! main loop notices that on its next pass.

use core::cell::Cell;
use critical_section::Mutex;

/// Whether the runtime is broadcasting or suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Transmitting; LED rail powered.
    Active,
    /// LED rail off, CPU halted between wake checks.
    Sleeping,
}

/// Power transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError {
    /// Transition requested from a state that does not allow it.
    InvalidTransition {
        /// The state the manager was in.
        from: PowerState,
    },

    /// Wake requested while the wake interrupt has not fired.
    WakeNotPending,
}

impl core::fmt::Display for PowerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PowerError::InvalidTransition { from } => {
                write!(f, "invalid power transition from {:?}", from)
            }
            PowerError::WakeNotPending => write!(f, "no wake interrupt since sleep"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PowerError {}

/// Sleep-armed flag shared with the wake interrupt.
///
/// Armed by the main loop right before halting; disarmed by the button's
/// pin-change handler. Usable in a `static`.
pub struct SleepLatch {
    armed: Mutex<Cell<bool>>,
}

impl SleepLatch {
    /// Creates a disarmed latch.
    pub const fn new() -> Self {
        Self {
            armed: Mutex::new(Cell::new(false)),
        }
    }

    /// Arms the latch before halting.
    pub fn arm(&self) {
        critical_section::with(|cs| self.armed.borrow(cs).set(true));
    }

    /// Clears the latch. Call this from the wake interrupt and nothing else.
    #[inline]
    pub fn disarm(&self) {
        critical_section::with(|cs| self.armed.borrow(cs).set(false));
    }

    /// Returns `true` while no wake interrupt has fired since [`arm`](Self::arm).
    pub fn is_armed(&self) -> bool {
        critical_section::with(|cs| self.armed.borrow(cs).get())
    }
}

impl Default for SleepLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the power state and performs the two transitions.
pub struct PowerManager<'a> {
    state: PowerState,
    latch: &'a SleepLatch,
}

impl<'a> PowerManager<'a> {
    /// Creates an active manager bound to `latch`.
    pub fn new(latch: &'a SleepLatch) -> Self {
        Self {
            state: PowerState::Active,
            latch,
        }
    }

    /// Active → Sleeping. Arms the latch so only a wake interrupt ends sleep.
    ///
    /// # Errors
    /// `InvalidTransition` if already sleeping.
    pub fn enter_sleep(&mut self) -> Result<(), PowerError> {
        if self.state != PowerState::Active {
            return Err(PowerError::InvalidTransition { from: self.state });
        }

        self.latch.arm();
        self.state = PowerState::Sleeping;
        Ok(())
    }

    /// Returns whether the wake interrupt has fired since sleep was entered.
    ///
    /// `false` means the halt ended for some other reason; the caller should
    /// halt again.
    ///
    /// # Errors
    /// `InvalidTransition` if not sleeping.
    pub fn wake_pending(&self) -> Result<bool, PowerError> {
        if self.state != PowerState::Sleeping {
            return Err(PowerError::InvalidTransition { from: self.state });
        }

        Ok(!self.latch.is_armed())
    }

    /// Sleeping → Active. The caller reinitializes the hardware first and
    /// commits the transition only once that succeeded.
    ///
    /// # Errors
    /// * `InvalidTransition` - Not sleeping
    /// * `WakeNotPending` - The latch is still armed
    pub fn wake(&mut self) -> Result<(), PowerError> {
        if !self.wake_pending()? {
            return Err(PowerError::WakeNotPending);
        }

        self.state = PowerState::Active;
        Ok(())
    }

    /// The current power state.
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Returns true if sleeping.
    pub fn is_sleeping(&self) -> bool {
        self.state == PowerState::Sleeping
    }
}
