//! Sensor selection types
//!
//! [`SensorMask`] names every axis the motion library can switch on or off,
//! plus the DMP processing bit. Only whole sensors may be toggled: a mask
//! that covers part of a three-axis group is rejected by
//! [`MotionProcessor::set_active_sensors`](crate::MotionProcessor::set_active_sensors).

pub mod gyroscope;

pub use gyroscope::GyroFullScale;

use bitflags::bitflags;

bitflags! {
    /// Requested sensor axes and DMP processing
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SensorMask: u32 {
        /// Accelerometer Z axis
        const Z_ACCEL = 0x0001;
        /// Accelerometer Y axis
        const Y_ACCEL = 0x0002;
        /// Accelerometer X axis
        const X_ACCEL = 0x0004;
        /// DMP sensor fusion
        const DMP_PROCESSOR = 0x0008;
        /// Gyroscope Z axis
        const Z_GYRO = 0x0010;
        /// Gyroscope Y axis
        const Y_GYRO = 0x0020;
        /// Gyroscope X axis
        const X_GYRO = 0x0040;
        /// Compass X axis
        const X_COMPASS = 0x0080;
        /// Compass Y axis
        const Y_COMPASS = 0x0100;
        /// Compass Z axis
        const Z_COMPASS = 0x0200;
        /// Pressure X axis
        const X_PRESSURE = 0x0400;
        /// Pressure Y axis
        const Y_PRESSURE = 0x0800;
        /// Pressure Z axis
        const Z_PRESSURE = 0x1000;

        /// All gyroscope axes
        const THREE_AXIS_GYRO = Self::X_GYRO.bits() | Self::Y_GYRO.bits() | Self::Z_GYRO.bits();
        /// All accelerometer axes
        const THREE_AXIS_ACCEL = Self::X_ACCEL.bits() | Self::Y_ACCEL.bits() | Self::Z_ACCEL.bits();
        /// All compass axes
        const THREE_AXIS_COMPASS =
            Self::X_COMPASS.bits() | Self::Y_COMPASS.bits() | Self::Z_COMPASS.bits();
        /// All pressure axes
        const THREE_AXIS_PRESSURE =
            Self::X_PRESSURE.bits() | Self::Y_PRESSURE.bits() | Self::Z_PRESSURE.bits();
        /// Gyroscope and accelerometer
        const SIX_AXIS = Self::THREE_AXIS_GYRO.bits() | Self::THREE_AXIS_ACCEL.bits();
        /// Gyroscope, accelerometer and compass
        const NINE_AXIS = Self::SIX_AXIS.bits() | Self::THREE_AXIS_COMPASS.bits();
    }
}

impl SensorMask {
    /// Sensor groups that can only be switched as a whole, in validation order
    pub const GROUPS: [Self; 3] = [
        Self::THREE_AXIS_ACCEL,
        Self::THREE_AXIS_COMPASS,
        Self::THREE_AXIS_PRESSURE,
    ];

    /// True when `group` is requested on some but not all of its axes
    #[must_use]
    pub fn partially_covers(self, group: Self) -> bool {
        let covered = self & group;
        !covered.is_empty() && covered != group
    }

    /// True when any gyroscope axis is requested
    #[must_use]
    pub fn has_gyro(self) -> bool {
        self.intersects(Self::THREE_AXIS_GYRO)
    }

    /// True when DMP processing is requested
    #[must_use]
    pub fn has_dmp(self) -> bool {
        self.contains(Self::DMP_PROCESSOR)
    }
}
