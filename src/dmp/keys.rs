//! Symbolic DMP memory keys
//!
//! The DMP firmware exposes its tunables at fixed memory locations. The
//! motion library refers to them by symbolic key; the platform resolves each
//! key to an address for the firmware image it loaded. `D_<bank>_<offset>`
//! keys are plain data words whose address is encoded in the name, while the
//! `CFG_*`, `FCFG_*` and `CPASS_MTX_*` keys patch firmware instructions and
//! move between firmware builds.

/// DMP memory key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(non_camel_case_types)]
pub enum DmpKey {
    /// FIFO-ready interrupt enable opcode
    Cfg6,
    /// Motion interrupt enable opcode
    Cfg7,
    /// Motion detector restart sequence
    Cfg18,
    /// Gyroscope axis routing
    Fcfg1,
    /// Accelerometer axis routing
    Fcfg2,
    /// Gyroscope axis sign
    Fcfg3,
    /// Bias tracker selection
    Fcfg5,
    /// Accelerometer axis sign
    Fcfg7,
    /// Gyroscope reciprocal scale factor
    D_0_24,
    /// Quaternion scalar seed
    D_0_96,
    /// Gyroscope scale factor
    D_0_104,
    /// Accelerometer scale factor
    D_0_108,
    /// Gyroscope dead zone
    D_0_163,
    /// Motion detector accumulators
    D_1_96,
    /// Motion duration
    D_1_106,
    /// Accelerometer reset word (only on some firmware)
    D_1_152,
    /// Accelerometer byte order
    D_1_236,
    /// Compass mounting matrix cell (0, 0)
    CpassMtx00,
    /// Compass mounting matrix cell (0, 1)
    CpassMtx01,
    /// Compass mounting matrix cell (0, 2)
    CpassMtx02,
    /// Compass mounting matrix cell (1, 0)
    CpassMtx10,
    /// Compass mounting matrix cell (1, 1)
    CpassMtx11,
    /// Compass mounting matrix cell (1, 2)
    CpassMtx12,
    /// Compass mounting matrix cell (2, 0)
    CpassMtx20,
    /// Compass mounting matrix cell (2, 1)
    CpassMtx21,
    /// Compass mounting matrix cell (2, 2)
    CpassMtx22,
}

impl DmpKey {
    /// Compass mounting matrix cells in row-major order
    pub const COMPASS_MATRIX: [Self; 9] = [
        Self::CpassMtx00,
        Self::CpassMtx01,
        Self::CpassMtx02,
        Self::CpassMtx10,
        Self::CpassMtx11,
        Self::CpassMtx12,
        Self::CpassMtx20,
        Self::CpassMtx21,
        Self::CpassMtx22,
    ];

    /// Address of a `D_<bank>_<offset>` data key (`bank * 256 + offset`)
    ///
    /// Returns `None` for firmware-dependent keys, which the platform has to
    /// resolve from its own key table.
    #[must_use]
    pub const fn data_address(self) -> Option<u16> {
        match self {
            Self::D_0_24 => Some(24),
            Self::D_0_96 => Some(96),
            Self::D_0_104 => Some(104),
            Self::D_0_108 => Some(108),
            Self::D_0_163 => Some(163),
            Self::D_1_96 => Some(256 + 96),
            Self::D_1_106 => Some(256 + 106),
            Self::D_1_152 => Some(256 + 152),
            Self::D_1_236 => Some(256 + 236),
            _ => None,
        }
    }
}
