//! Receiver volume on the RAOP dB scale

use std::fmt;

/// Volume level in dB (-144.0 = silent, 0.0 = max)
///
/// Construction validates the range; there is no clamping.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Volume(f64);

impl Volume {
    /// Minimum volume (silent)
    pub const MIN: Self = Self(-144.0);
    /// Maximum volume
    pub const MAX: Self = Self(0.0);
    /// Default volume
    pub const DEFAULT: Self = Self(-30.0);

    /// Create a volume level, rejecting values outside `[-144, 0]` and NaN
    #[must_use]
    pub fn new(db: f64) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0).contains(&db).then_some(Self(db))
    }

    /// Get as dB
    #[must_use]
    pub fn as_db(&self) -> f64 {
        self.0
    }

    /// Body of the `SET_PARAMETER` request carrying this volume
    ///
    /// Negative zero is written as `0.000000`.
    #[must_use]
    pub fn to_parameter(&self) -> String {
        // -0.0 + 0.0 == +0.0
        format!("volume: {:.6}\r\n", self.0 + 0.0)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} dB", self.0)
    }
}
