//! Tick counter shared between the timer interrupt and the main loop.

use core::cell::Cell;
use critical_section::Mutex;

/// Counter incremented by the periodic timer interrupt.
///
/// The interrupt side only ever calls [`TickCounter::tick`]. The main loop
/// gates its work on [`TickCounter::take_due`], which compares against a small
/// threshold and zeroes the counter, so wrap-around never matters.
pub struct TickCounter {
    count: Mutex<Cell<u8>>,
}

impl TickCounter {
    /// Creates a zeroed counter. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
        }
    }

    /// Records one timer interrupt.
    ///
    /// Call this from the timer compare-match handler and nothing else.
    #[inline]
    pub fn tick(&self) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(count.get().wrapping_add(1));
        });
    }

    /// Consumes the pending ticks if at least `threshold` have accumulated.
    ///
    /// Returns `true` when the main loop should run one state machine step.
    pub fn take_due(&self, threshold: u8) -> bool {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            if count.get() >= threshold {
                count.set(0);
                true
            } else {
                false
            }
        })
    }

    /// Discards any pending ticks.
    pub fn reset(&self) {
        critical_section::with(|cs| self.count.borrow(cs).set(0));
    }

    /// Returns the ticks accumulated since the last reset.
    pub fn pending(&self) -> u8 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}
