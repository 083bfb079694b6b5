//! The fixed identity table.
//!
//! Each identity pairs an indicator color with the 28-bit code the receiving
//! hardware uses to recognise the wearer. All toys of the same kind transmit
//! the same code, so the table is compile-time constant and never edited at
//! runtime.

use palette::Srgb;

/// Number of significant bits in every identity code.
pub const CODE_BITS: u8 = 28;

/// Number of entries in [`IDENTITIES`].
pub const IDENTITY_COUNT: usize = 6;

/// A broadcastable identity: display color plus infrared code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityProfile {
    /// Human-readable name of the character this code unlocks.
    pub name: &'static str,

    /// Indicator color, tuned for a 3 V supply (close to the blue LED's Vf).
    pub color: Srgb<u8>,

    /// Code bytes, MSB-first. Only the first [`CODE_BITS`] bits are sent.
    pub code: [u8; 4],
}

impl IdentityProfile {
    /// Creates a profile from a name, an RGB triple and four code bytes.
    pub const fn new(name: &'static str, rgb: (u8, u8, u8), code: [u8; 4]) -> Self {
        Self {
            name,
            color: Srgb::new(rgb.0, rgb.1, rgb.2),
            code,
        }
    }

    /// Returns bit `index` of the code, reading MSB-first across the bytes.
    ///
    /// `index` must be below [`CODE_BITS`]; larger values read the unused
    /// trailing bits (or wrap into byte 0 past 31).
    #[inline]
    pub fn code_bit(&self, index: u8) -> bool {
        let byte = self.code[usize::from(index >> 3) & 0x03];
        (byte << (index & 7)) & 0x80 != 0
    }

    /// Iterates over one full frame of code bits in transmission order.
    pub fn frame_bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..CODE_BITS).map(move |i| self.code_bit(i))
    }
}

/// The six identities, in button-cycling order.
pub const IDENTITIES: [IdentityProfile; IDENTITY_COUNT] = [
    IdentityProfile::new("Naked", (10, 20, 50), [0xE3, 0x04, 0x21, 0x00]), // white
    IdentityProfile::new("Base", (0, 20, 0), [0xE3, 0x00, 0xA0, 0x00]),    // green
    IdentityProfile::new("Spiderman", (0, 0, 80), [0xE3, 0x00, 0x01, 0x00]), // blue
    IdentityProfile::new("Ironman", (10, 0, 0), [0xE3, 0x04, 0x00, 0x00]), // red
    IdentityProfile::new("DrStrange", (10, 20, 0), [0xE3, 0x54, 0x00, 0x00]), // orange
    IdentityProfile::new("Wakanda", (10, 0, 50), [0xE3, 0x50, 0x20, 0x00]), // purple
];

/// Identity lookup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdentityError {
    /// Index is not below [`IDENTITY_COUNT`].
    OutOfRange {
        /// The rejected index.
        index: u8,
    },
}

impl core::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IdentityError::OutOfRange { index } => {
                write!(
                    f,
                    "identity index {} out of range (0..{})",
                    index, IDENTITY_COUNT
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IdentityError {}

/// Index into [`IDENTITIES`], always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IdentityIndex(u8);

impl IdentityIndex {
    /// Selection used at power-on and after every wake from sleep.
    pub const DEFAULT: Self = IdentityIndex(1);

    /// Validates `index` against the table size.
    pub const fn new(index: u8) -> Result<Self, IdentityError> {
        if (index as usize) < IDENTITY_COUNT {
            Ok(IdentityIndex(index))
        } else {
            Err(IdentityError::OutOfRange { index })
        }
    }

    /// The raw index.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The next identity in cycling order, wrapping after the last.
    #[inline]
    pub const fn next(self) -> Self {
        if self.0 as usize >= IDENTITY_COUNT - 1 {
            IdentityIndex(0)
        } else {
            IdentityIndex(self.0 + 1)
        }
    }

    /// The profile this index selects.
    #[inline]
    pub fn profile(self) -> &'static IdentityProfile {
        &IDENTITIES[usize::from(self.0)]
    }
}

impl Default for IdentityIndex {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for IdentityIndex {
    type Error = IdentityError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        IdentityIndex::new(index)
    }
}

impl From<IdentityIndex> for u8 {
    fn from(index: IdentityIndex) -> Self {
        index.0
    }
}
