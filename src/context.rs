//! Motion processing context
//!
//! Host-side state shared by every component: the Q30 calibration matrices
//! and scale factors produced by the calibration encoder, the motion /
//! no-motion state, the bias-update strategy and the enabled DMP interrupt
//! sources. Interrupt callbacks receive a mutable reference to it.

use bitflags::bitflags;

use crate::interrupt::InterruptSources;

/// 1.0 in Q30 fixed point
pub const Q30_ONE: i32 = 1 << 30;

/// Default compass calibration diagonal and sensitivity (0.3 in Q30)
pub const DEFAULT_COMPASS_SENS: i32 = 322_122_560;

/// Default motion duration written to the DMP on motion reset
pub const DEFAULT_MOTION_DURATION: u16 = 1536;

/// Default no-motion threshold
pub const DEFAULT_NO_MOTION_THRESHOLD: u16 = 20;

/// Motion state reported to the application
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// Device is moving
    #[default]
    Moving,
    /// Device has been still for the configured duration
    NoMotion,
}

/// Internal no-motion detector state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InternalMotionState {
    /// Moving
    #[default]
    Moving,
    /// Still, bias not yet computed
    NoMotion,
    /// Still, bias computation running
    BiasInProgress,
}

bitflags! {
    /// Automatic gyroscope / compass bias-update strategies
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BiasMode: u16 {
        /// Gyro bias from no-motion periods
        const NO_MOTION = 0x0001;
        /// Gyro bias from gravity
        const GRAVITY = 0x0002;
        /// Gyro bias from temperature
        const TEMPERATURE = 0x0004;
        /// Gyro bias from a low-pass filter (gyro-only systems)
        const LPF = 0x0008;
        /// Compass bias from motion
        const MAG_FROM_MOTION = 0x0010;
        /// Compass bias from gyroscope
        const MAG_FROM_GYRO = 0x0020;
        /// Learn the temperature slope
        const LEARN_FROM_TEMPERATURE = 0x0040;
        /// Progressive no-motion tracker
        const PROGRESSIVE_NO_MOTION = 0x0200;
        /// Fast no-motion tracker
        const FAST_NO_MOTION = 0x0400;

        /// Both compass strategies
        const MAG = Self::MAG_FROM_MOTION.bits() | Self::MAG_FROM_GYRO.bits();
    }
}

/// Host-side motion processing state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionContext {
    /// Gyroscope calibration matrix (Q30)
    pub gyro_cal: [i32; 9],
    /// Gyroscope orientation only, entries in `{-1, 0, 1}` scaled to Q30
    pub gyro_orient: [i32; 9],
    /// Accelerometer calibration matrix (Q30)
    pub accel_cal: [i32; 9],
    /// Compass calibration matrix (Q30)
    pub compass_cal: [i32; 9],

    /// Gyroscope sensitivity (range · 32768)
    pub gyro_sens: i32,
    /// Accelerometer sensitivity
    pub accel_sens: i32,
    /// Compass sensitivity (Q30)
    pub compass_sens: i32,
    /// Gyroscope scale factor written to the DMP
    pub gyro_sf: i32,

    /// Reported motion state
    pub motion_state: MotionState,
    /// Last motion state change flag
    pub motion_state_change: MotionState,
    /// No-motion detector state
    pub internal_motion_state: InternalMotionState,
    /// Tick of the last no-motion accelerometer event or motion reset
    pub no_motion_accel_time: u32,
    /// Motion duration written to the DMP
    pub motion_duration: u16,
    /// No-motion threshold
    pub no_motion_threshold: u16,

    /// Enabled bias-update strategies
    pub bias_mode: BiasMode,
    /// Enabled DMP interrupt sources
    pub interrupt_sources: InterruptSources,
    /// Factory temperature-compensation coefficients are available
    pub factory_temp_comp: bool,
    /// Gyro dead-zone control; overrides the low-pass dead zone
    pub dead_zone: bool,
}

impl Default for MotionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionContext {
    /// Context with the library defaults
    #[must_use]
    pub const fn new() -> Self {
        let mut compass_cal = [0; 9];
        compass_cal[0] = DEFAULT_COMPASS_SENS;
        compass_cal[4] = DEFAULT_COMPASS_SENS;
        compass_cal[8] = DEFAULT_COMPASS_SENS;

        Self {
            gyro_cal: [0; 9],
            gyro_orient: [0; 9],
            accel_cal: [0; 9],
            compass_cal,
            gyro_sens: 0,
            accel_sens: 0,
            compass_sens: DEFAULT_COMPASS_SENS,
            gyro_sf: 0,
            motion_state: MotionState::Moving,
            motion_state_change: MotionState::Moving,
            internal_motion_state: InternalMotionState::Moving,
            no_motion_accel_time: 0,
            motion_duration: DEFAULT_MOTION_DURATION,
            no_motion_threshold: DEFAULT_NO_MOTION_THRESHOLD,
            bias_mode: BiasMode::empty(),
            interrupt_sources: InterruptSources::empty(),
            factory_temp_comp: false,
            dead_zone: false,
        }
    }

    /// Restrict a requested bias mode to what the hardware can support
    ///
    /// Compass strategies need a compass; the LPF tracker only runs on
    /// systems without one.
    #[must_use]
    pub fn constrain_bias_mode(mode: BiasMode, compass_present: bool) -> BiasMode {
        if compass_present {
            mode - BiasMode::LPF
        } else {
            mode - BiasMode::MAG
        }
    }
}
