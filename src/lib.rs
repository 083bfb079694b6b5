#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`IdentityProfile`**: A fixed color + 28-bit infrared code pair; six live in `IDENTITIES`
//! - **`IdentityIndex`**: An always-valid index into the table that wraps on `next()`
//! - **`TickCounter`**: Counter bumped by the timer interrupt and drained by the main loop
//! - **`Transmitter`**: Walks the bit index through a frame and counts idle frames
//! - **`ButtonMonitor`**: Turns once-per-tick button samples into press events
//! - **`PowerManager`**: Explicit `Active`/`Sleeping` transitions around a `SleepLatch`
//! - **`Beacon`**: Owns the lines and runs the whole loop
//! - **`RgbLed`** / **`Platform`**: Traits to implement for your board
//!
//! Digital lines and delays come from `embedded-hal` 1.0. Colors are
//! `Srgb<u8>` from `palette`, exactly as stored in the identity table.

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;

#[macro_use]
mod fmt;

pub mod beacon;
pub mod config;
pub mod identity;
pub mod input;
pub mod led;
pub mod power;
pub mod tick;
pub mod transmitter;

pub use beacon::{Beacon, BeaconError, BeaconParts, Platform, ServiceOutcome};
pub use config::{BeaconConfig, BeaconConfigBuilder, ConfigError, TimerConfig};
pub use identity::{CODE_BITS, IDENTITIES, IDENTITY_COUNT, IdentityError, IdentityIndex, IdentityProfile};
pub use input::{ButtonMonitor, ButtonState};
pub use led::{RgbLed, to_grb};
pub use power::{PowerError, PowerManager, PowerState, SleepLatch};
pub use tick::TickCounter;
pub use transmitter::{FrameEvent, Transmitter};
