//! Frame transmission state machine.
//!
//! Provides [`Transmitter`], which walks the bit index through one identity
//! code per frame and counts completed frames so the runtime knows when the
//! device has been idle long enough to sleep.

use crate::identity::{CODE_BITS, IdentityProfile};

/// Index of the last transmitted bit in a frame.
pub const LAST_BIT: u8 = CODE_BITS - 1;

/// What a single [`Transmitter::advance`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameEvent {
    /// Moved to the next bit within the frame.
    Bit,

    /// Frame finished and the repeat counter was incremented.
    FrameComplete,

    /// Frame finished with the repeat counter already at its limit.
    ///
    /// The caller must enter sleep.
    Exhausted,
}

/// Bit position and repeat bookkeeping for the code being broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transmitter {
    bit_index: u8,
    repeat_count: u8,
}

impl Transmitter {
    /// Creates a transmitter at the start of a fresh frame.
    pub const fn new() -> Self {
        Self {
            bit_index: 0,
            repeat_count: 0,
        }
    }

    /// The level to put on the infrared line for the current bit.
    #[inline]
    pub fn current_bit(&self, profile: &IdentityProfile) -> bool {
        profile.code_bit(self.bit_index)
    }

    /// Steps past the current bit.
    ///
    /// At the last bit the index wraps to 0 and the frame is counted. Once
    /// `repeat_limit` frames have been counted, the next completed frame
    /// reports [`FrameEvent::Exhausted`] instead of counting further.
    pub fn advance(&mut self, repeat_limit: u8) -> FrameEvent {
        if self.bit_index >= LAST_BIT {
            self.bit_index = 0;
            if self.repeat_count >= repeat_limit {
                FrameEvent::Exhausted
            } else {
                self.repeat_count += 1;
                FrameEvent::FrameComplete
            }
        } else {
            self.bit_index += 1;
            FrameEvent::Bit
        }
    }

    /// Starts the frame over from bit 0.
    #[inline]
    pub fn restart_frame(&mut self) {
        self.bit_index = 0;
    }

    /// Clears the idle frame count.
    #[inline]
    pub fn reset_repeats(&mut self) {
        self.repeat_count = 0;
    }

    /// Restores the power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Position within the current frame, `0..=27`.
    pub fn bit_index(&self) -> u8 {
        self.bit_index
    }

    /// Frames completed since the last reset.
    pub fn repeat_count(&self) -> u8 {
        self.repeat_count
    }
}
