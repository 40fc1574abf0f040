//! Link and bridge configuration.
//!
//! Both configs are plain `Copy` values with `const` constructors so they can
//! live in `static`s on the firmware side. Zero for either rate-limit field
//! disables rate limiting.

use rosbridge_proto::{NameLengthDigits, FLAG_PUBLISH, FLAG_SUBSCRIBE};

/// Frame delimiter used when none is configured.
pub const DEFAULT_DELIMITER: u8 = b'\n';

/// Silence after which a connected link is declared lost (2 s).
pub const DEFAULT_LIVENESS_TIMEOUT_US: u64 = 2_000_000;

/// Largest chunk written to the port per flush.
pub const DEFAULT_MAX_BYTES_PER_CHUNK: u32 = 64;

/// Chunks released per second.
pub const DEFAULT_MAX_CHUNKS_PER_SECOND: u32 = 100;

/// Error type for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Name length width outside the supported range.
    InvalidNameDigits(u8),
    /// A zero liveness timeout would drop the link on every tick.
    ZeroLivenessTimeout,
    /// Delimiter collides with bytes that always occur inside frames.
    DelimiterConflict(u8),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidNameDigits(d) => write!(
                f,
                "name length width {} outside {}..={}",
                d,
                NameLengthDigits::MIN,
                NameLengthDigits::MAX
            ),
            Self::ZeroLivenessTimeout => write!(f, "liveness timeout is zero"),
            Self::DelimiterConflict(b) => write!(f, "delimiter 0x{:02x} occurs inside frames", b),
        }
    }
}

/// Transport-level settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Byte that ends a frame on streaming links.
    pub delimiter: u8,
    /// Inactivity window before the link counts as lost.
    pub liveness_timeout_us: u64,
    /// Upper bound on bytes per write. 0 disables rate limiting.
    pub max_bytes_per_chunk: u32,
    /// Upper bound on writes per second. 0 disables rate limiting.
    pub max_chunks_per_second: u32,
}

impl LinkConfig {
    /// Defaults: `\n` delimiter, 2 s timeout, 64 bytes x 100 chunks/s.
    pub const fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            liveness_timeout_us: DEFAULT_LIVENESS_TIMEOUT_US,
            max_bytes_per_chunk: DEFAULT_MAX_BYTES_PER_CHUNK,
            max_chunks_per_second: DEFAULT_MAX_CHUNKS_PER_SECOND,
        }
    }

    pub const fn with_delimiter(self, delimiter: u8) -> Self {
        Self { delimiter, ..self }
    }

    pub const fn with_liveness_timeout_us(self, liveness_timeout_us: u64) -> Self {
        Self {
            liveness_timeout_us,
            ..self
        }
    }

    pub const fn with_rate_limit(self, max_bytes_per_chunk: u32, max_chunks_per_second: u32) -> Self {
        Self {
            max_bytes_per_chunk,
            max_chunks_per_second,
            ..self
        }
    }

    /// Release the whole outgoing buffer on every flush.
    pub const fn unlimited(self) -> Self {
        self.with_rate_limit(0, 0)
    }

    /// Whether outgoing bytes are paced.
    #[inline]
    pub const fn is_rate_limited(&self) -> bool {
        self.max_bytes_per_chunk != 0 && self.max_chunks_per_second != 0
    }

    /// Minimum spacing between chunk releases, `None` when unlimited.
    pub const fn min_chunk_interval_us(&self) -> Option<u64> {
        if self.is_rate_limited() {
            Some(1_000_000 / self.max_chunks_per_second as u64)
        } else {
            None
        }
    }

    /// Reject settings that cannot work on a real link.
    ///
    /// ASCII digits and the flag bytes appear in every frame, so none of them
    /// can serve as the delimiter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.liveness_timeout_us == 0 {
            return Err(ConfigError::ZeroLivenessTimeout);
        }
        let d = self.delimiter;
        if d.is_ascii_digit() || d == FLAG_PUBLISH || d == FLAG_SUBSCRIBE {
            return Err(ConfigError::DelimiterConflict(d));
        }
        Ok(())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Envelope settings shared by both ends of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// Width of the topic name length field.
    pub name_digits: NameLengthDigits,
}

impl BridgeConfig {
    pub const fn new() -> Self {
        Self {
            name_digits: NameLengthDigits::DEFAULT,
        }
    }

    /// Use a different name length width (1 to 3 digits).
    pub const fn with_name_digits(self, digits: u8) -> Result<Self, ConfigError> {
        match NameLengthDigits::new(digits) {
            Some(name_digits) => Ok(Self { name_digits }),
            None => Err(ConfigError::InvalidNameDigits(digits)),
        }
    }
}
