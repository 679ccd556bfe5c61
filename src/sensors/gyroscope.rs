//! Gyroscope full-scale range
//!
//! The device configuration carries the raw `FS_SEL` code; calibration maps it
//! to the range in degrees per second that the DMP scale factors are derived
//! from.

/// Gyroscope full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroFullScale {
    /// ±250°/s range
    Dps250 = 0,
    /// ±500°/s range
    Dps500 = 1,
    /// ±1000°/s range
    Dps1000 = 2,
    /// ±2000°/s range
    Dps2000 = 3,
}

impl GyroFullScale {
    /// Decode the `FS_SEL` register code
    ///
    /// Returns `None` for codes the motion library does not recognize.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Dps250),
            1 => Some(Self::Dps500),
            2 => Some(Self::Dps1000),
            3 => Some(Self::Dps2000),
            _ => None,
        }
    }

    /// Register code of this range
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Get the maximum value in °/s
    #[must_use]
    pub const fn max_value(self) -> u16 {
        match self {
            Self::Dps250 => 250,
            Self::Dps500 => 500,
            Self::Dps1000 => 1000,
            Self::Dps2000 => 2000,
        }
    }

    /// Range as used by the calibration encoder
    #[must_use]
    pub fn range_dps(self) -> f32 {
        f32::from(self.max_value())
    }
}
