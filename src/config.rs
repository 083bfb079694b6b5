//! Runtime constants and their validation.
//!
//! The defaults reproduce the cadence the ride hardware expects: one code bit
//! roughly every 32 ms and a full 28-bit frame in about 0.9 s. They are not
//! tuning knobs; [`BeaconConfig::builder`] exists so boards with a different
//! clock can keep that cadence.

use crate::identity::{CODE_BITS, IDENTITY_COUNT, IdentityIndex};

/// Bit period measured on the reference hardware, in microseconds.
pub const MEASURED_BIT_PERIOD_US: u32 = 32_315;

/// Frame period measured on the reference hardware, in microseconds.
pub const MEASURED_FRAME_PERIOD_US: u32 = 903_000;

/// Periodic timer setup driving the tick interrupt.
///
/// Models a compare-match timer: the interrupt fires every
/// `prescaler * (compare + 1)` core clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    /// Core clock frequency in Hz.
    pub cpu_hz: u32,

    /// Clock divider ahead of the timer.
    pub prescaler: u16,

    /// Compare-match value; the counter runs `0..=compare`.
    pub compare: u8,
}

impl TimerConfig {
    /// 8 MHz internal oscillator, /1024, compare 127 (about 61 Hz).
    pub const DEFAULT: Self = Self {
        cpu_hz: 8_000_000,
        prescaler: 1024,
        compare: 127,
    };

    /// Core clock cycles between two timer interrupts.
    #[inline]
    pub const fn cycles_per_tick(&self) -> u64 {
        self.prescaler as u64 * (self.compare as u64 + 1)
    }

    /// Time between two timer interrupts, in microseconds.
    ///
    /// A stopped clock (`cpu_hz == 0`) never ticks and reports `u32::MAX`.
    pub const fn tick_period_us(&self) -> u32 {
        match (self.cycles_per_tick() * 1_000_000).checked_div(self.cpu_hz as u64) {
            Some(us) => saturate_u32(us),
            None => u32::MAX,
        }
    }

    /// Core clock cycles spanning at least `ns` nanoseconds.
    pub const fn cycles_for_ns(&self, ns: u32) -> u32 {
        saturate_u32((ns as u64 * self.cpu_hz as u64).div_ceil(1_000_000_000))
    }
}

const fn saturate_u32(value: u64) -> u32 {
    if value > u32::MAX as u64 {
        u32::MAX
    } else {
        value as u32
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Tick threshold of zero would run the state machine on every loop pass.
    ZeroTickThreshold,

    /// Default identity is not in the table.
    DefaultIdentityOutOfRange {
        /// The rejected index.
        index: u8,
    },

    /// Timer clock or prescaler of zero.
    ZeroTimerClock,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroTickThreshold => {
                write!(f, "tick threshold must be at least 1")
            }
            ConfigError::DefaultIdentityOutOfRange { index } => {
                write!(
                    f,
                    "default identity {} out of range (0..{})",
                    index, IDENTITY_COUNT
                )
            }
            ConfigError::ZeroTimerClock => {
                write!(f, "timer clock and prescaler must be non-zero")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Validated beacon configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BeaconConfig {
    tick_threshold: u8,
    repeat_limit: u8,
    default_identity: IdentityIndex,
    settle_delay_ms: u32,
    timer: TimerConfig,
}

impl BeaconConfig {
    /// The reference firmware's settings.
    pub const DEFAULT: Self = Self {
        tick_threshold: 2,
        repeat_limit: 10,
        default_identity: IdentityIndex::DEFAULT,
        settle_delay_ms: 100,
        timer: TimerConfig::DEFAULT,
    };

    /// Creates a builder seeded with [`BeaconConfig::DEFAULT`].
    pub fn builder() -> BeaconConfigBuilder {
        BeaconConfigBuilder::new()
    }

    /// Timer interrupts consumed per state machine step.
    pub fn tick_threshold(&self) -> u8 {
        self.tick_threshold
    }

    /// Completed frames allowed before an idle device goes to sleep.
    pub fn repeat_limit(&self) -> u8 {
        self.repeat_limit
    }

    /// Identity selected at power-on and after each wake.
    pub fn default_identity(&self) -> IdentityIndex {
        self.default_identity
    }

    /// Delay before and after peripheral setup during init.
    pub fn settle_delay_ms(&self) -> u32 {
        self.settle_delay_ms
    }

    /// The tick timer setup.
    pub fn timer(&self) -> TimerConfig {
        self.timer
    }

    /// Duration of one transmitted bit, in microseconds. Saturates at
    /// `u32::MAX`.
    pub fn bit_period_us(&self) -> u32 {
        self.timer
            .tick_period_us()
            .saturating_mul(u32::from(self.tick_threshold))
    }

    /// Duration of one full frame, in microseconds. Saturates at `u32::MAX`.
    pub fn frame_period_us(&self) -> u32 {
        self.bit_period_us().saturating_mul(u32::from(CODE_BITS))
    }

    /// Idle time from the last reset until sleep, in microseconds.
    ///
    /// The frame that finds the repeat counter at its limit completes before
    /// sleep, so this spans `repeat_limit + 1` frames.
    pub fn idle_timeout_us(&self) -> u64 {
        u64::from(self.frame_period_us()) * (u64::from(self.repeat_limit) + 1)
    }
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Builder for [`BeaconConfig`].
#[derive(Debug, Clone, Copy)]
pub struct BeaconConfigBuilder {
    tick_threshold: u8,
    repeat_limit: u8,
    default_identity: u8,
    settle_delay_ms: u32,
    timer: TimerConfig,
}

impl BeaconConfigBuilder {
    /// Creates a builder with the reference settings.
    pub fn new() -> Self {
        let defaults = BeaconConfig::DEFAULT;
        Self {
            tick_threshold: defaults.tick_threshold,
            repeat_limit: defaults.repeat_limit,
            default_identity: defaults.default_identity.get(),
            settle_delay_ms: defaults.settle_delay_ms,
            timer: defaults.timer,
        }
    }

    /// Sets the number of timer interrupts per bit.
    pub fn tick_threshold(mut self, ticks: u8) -> Self {
        self.tick_threshold = ticks;
        self
    }

    /// Sets the idle frame budget.
    pub fn repeat_limit(mut self, frames: u8) -> Self {
        self.repeat_limit = frames;
        self
    }

    /// Sets the power-on identity.
    pub fn default_identity(mut self, index: u8) -> Self {
        self.default_identity = index;
        self
    }

    /// Sets the init settle delay.
    pub fn settle_delay_ms(mut self, millis: u32) -> Self {
        self.settle_delay_ms = millis;
        self
    }

    /// Sets the tick timer parameters.
    pub fn timer(mut self, timer: TimerConfig) -> Self {
        self.timer = timer;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    /// * `ZeroTickThreshold` - Tick threshold is zero
    /// * `DefaultIdentityOutOfRange` - Default identity is not in the table
    /// * `ZeroTimerClock` - Timer clock or prescaler is zero
    pub fn build(self) -> Result<BeaconConfig, ConfigError> {
        if self.tick_threshold == 0 {
            return Err(ConfigError::ZeroTickThreshold);
        }

        if self.timer.cpu_hz == 0 || self.timer.prescaler == 0 {
            return Err(ConfigError::ZeroTimerClock);
        }

        let default_identity = IdentityIndex::new(self.default_identity).map_err(|_| {
            ConfigError::DefaultIdentityOutOfRange {
                index: self.default_identity,
            }
        })?;

        Ok(BeaconConfig {
            tick_threshold: self.tick_threshold,
            repeat_limit: self.repeat_limit,
            default_identity,
            settle_delay_ms: self.settle_delay_ms,
            timer: self.timer,
        })
    }
}

impl Default for BeaconConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within_percent(actual: u32, expected: u32, percent: u32) -> bool {
        let diff = actual.abs_diff(expected);
        diff * 100 <= expected * percent
    }

    #[test]
    fn default_tick_is_about_16ms() {
        assert_eq!(TimerConfig::DEFAULT.tick_period_us(), 16_384);
    }

    #[test]
    fn default_cadence_matches_measured_timing() {
        let config = BeaconConfig::DEFAULT;
        assert!(within_percent(config.bit_period_us(), MEASURED_BIT_PERIOD_US, 3));
        assert!(within_percent(config.frame_period_us(), MEASURED_FRAME_PERIOD_US, 3));
    }

    #[test]
    fn builder_defaults_equal_default() {
        assert_eq!(BeaconConfig::builder().build().unwrap(), BeaconConfig::DEFAULT);
    }

    #[test]
    fn builder_rejects_zero_threshold() {
        let result = BeaconConfig::builder().tick_threshold(0).build();
        assert_eq!(result, Err(ConfigError::ZeroTickThreshold));
    }

    #[test]
    fn builder_rejects_bad_default_identity() {
        let result = BeaconConfig::builder().default_identity(9).build();
        assert_eq!(
            result,
            Err(ConfigError::DefaultIdentityOutOfRange { index: 9 })
        );
    }

    #[test]
    fn builder_rejects_zero_prescaler() {
        let timer = TimerConfig {
            prescaler: 0,
            ..TimerConfig::DEFAULT
        };
        let result = BeaconConfig::builder().timer(timer).build();
        assert_eq!(result, Err(ConfigError::ZeroTimerClock));
    }

    #[test]
    fn stopped_clock_reports_max_period() {
        let timer = TimerConfig {
            cpu_hz: 0,
            ..TimerConfig::DEFAULT
        };
        assert_eq!(timer.tick_period_us(), u32::MAX);
    }

    #[test]
    fn slow_clock_saturates_periods() {
        let timer = TimerConfig {
            cpu_hz: 1,
            prescaler: u16::MAX,
            compare: u8::MAX,
        };
        let config = BeaconConfig::builder()
            .timer(timer)
            .tick_threshold(u8::MAX)
            .build()
            .unwrap();

        assert_eq!(timer.tick_period_us(), u32::MAX);
        assert_eq!(config.bit_period_us(), u32::MAX);
        assert_eq!(config.frame_period_us(), u32::MAX);
        assert_eq!(
            config.idle_timeout_us(),
            u64::from(u32::MAX) * (u64::from(config.repeat_limit()) + 1)
        );
    }

    #[test]
    fn cycles_for_ns_rounds_up() {
        let timer = TimerConfig::DEFAULT;
        assert_eq!(timer.cycles_for_ns(1), 1);
        assert_eq!(timer.cycles_for_ns(125), 1);
        assert_eq!(timer.cycles_for_ns(126), 2);
        assert_eq!(timer.cycles_for_ns(1_000_000), 8_000);
        assert_eq!(timer.cycles_for_ns(u32::MAX), 34_359_739);
    }

    #[test]
    fn idle_timeout_is_about_ten_seconds() {
        let timeout_ms = BeaconConfig::DEFAULT.idle_timeout_us() / 1000;
        assert!((9_000..=11_000).contains(&timeout_ms));
    }
}
