//! Button edge detection.

/// Raw and previous samples of the selection button line.
///
/// `true` means the line reads high. With the pull-up enabled that is the
/// released position; pressing pulls the line low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonState {
    /// Sample taken this cycle.
    pub raw_sample: bool,

    /// Sample taken the cycle before.
    pub previous_sample: bool,
}

/// Detects presses as high-to-low transitions between consecutive samples.
///
/// Sampling happens once per consumed tick, which at ~30 Hz is slow enough
/// that contact bounce does not register as extra presses. There is no
/// further filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonMonitor {
    state: ButtonState,
}

impl ButtonMonitor {
    /// Creates a monitor with both samples low, so the first sample never
    /// reports a press.
    pub const fn new() -> Self {
        Self {
            state: ButtonState {
                raw_sample: false,
                previous_sample: false,
            },
        }
    }

    /// Records a new sample and returns `true` on a falling edge.
    pub fn sample(&mut self, line_high: bool) -> bool {
        self.state.raw_sample = line_high;
        let pressed = self.state.previous_sample && !self.state.raw_sample;
        self.state.previous_sample = self.state.raw_sample;
        pressed
    }

    /// Forgets both samples.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The current samples.
    pub fn state(&self) -> ButtonState {
        self.state
    }
}
