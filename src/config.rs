//! Device configuration
//!
//! Describes the physical board: how each sensor is mounted, which slave
//! devices hang off the auxiliary bus, and the ranges they were configured
//! with. The motion library only reads this; it is owned by the caller and
//! handed to [`MotionProcessor::new`](crate::MotionProcessor::new).

use crate::dmp::calibration::IDENTITY;
use crate::dmp::Orientation;

/// Fixed-point range reported by a slave driver
///
/// The value is `mantissa + fraction / 10000`, e.g. 2 g is `{2, 0}` and
/// 9.83 units is `{9, 8300}`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveRange {
    /// Integer part
    pub mantissa: i32,
    /// Fractional part in units of 1/10000
    pub fraction: i32,
}

impl SlaveRange {
    /// Create a range from its integer and 1/10000 parts
    #[must_use]
    pub const fn new(mantissa: i32, fraction: i32) -> Self {
        Self { mantissa, fraction }
    }

    /// Range as a float
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f32(self) -> f32 {
        self.mantissa as f32 + self.fraction as f32 / 10000.0
    }
}

/// Byte order of a slave's data registers
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endian {
    /// Most significant byte first
    #[default]
    Big,
    /// Least significant byte first
    Little,
}

/// Bus a slave is wired to
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveBus {
    /// Shares the host's bus
    #[default]
    Primary,
    /// Sits behind the motion processor's auxiliary I2C master
    Secondary,
}

/// A slave sensor (accelerometer, compass, pressure) attached to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveDescriptor {
    /// Full-scale range of the slave
    pub range: SlaveRange,
    /// Data byte order
    pub endian: Endian,
    /// Wiring
    pub bus: SlaveBus,
    /// Mounting matrix relative to the device body
    pub orientation: Orientation,
}

impl Default for SlaveDescriptor {
    fn default() -> Self {
        Self {
            range: SlaveRange::default(),
            endian: Endian::Big,
            bus: SlaveBus::Primary,
            orientation: IDENTITY,
        }
    }
}

impl SlaveDescriptor {
    /// Slave with the given range, identity mounting, big endian, primary bus
    #[must_use]
    pub const fn new(range: SlaveRange) -> Self {
        Self {
            range,
            endian: Endian::Big,
            bus: SlaveBus::Primary,
            orientation: IDENTITY,
        }
    }

    /// Set the mounting matrix
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the wiring and byte order
    #[must_use]
    pub fn with_bus(mut self, bus: SlaveBus, endian: Endian) -> Self {
        self.bus = bus;
        self.endian = endian;
        self
    }
}

/// Board-level configuration consumed by the motion library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// Gyroscope mounting matrix
    pub gyro_orientation: Orientation,
    /// Raw gyroscope `FS_SEL` code (see [`GyroFullScale`](crate::GyroFullScale))
    pub gyro_full_scale: u8,
    /// Factory sensitivity trim; 0 means the part uses the nominal sensitivity
    pub gyro_sens_trim: u16,
    /// Factory temperature-compensation offsets
    pub offset_tc: [i8; 3],
    /// Accelerometer slave, if fitted
    pub accel: Option<SlaveDescriptor>,
    /// Compass slave, if fitted
    pub compass: Option<SlaveDescriptor>,
    /// Pressure slave, if fitted
    pub pressure: Option<SlaveDescriptor>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            gyro_orientation: IDENTITY,
            gyro_full_scale: crate::GyroFullScale::Dps2000.code(),
            gyro_sens_trim: 0,
            offset_tc: [0; 3],
            accel: None,
            compass: None,
            pressure: None,
        }
    }
}

impl DeviceConfig {
    /// Attach an accelerometer
    #[must_use]
    pub fn with_accel(mut self, accel: SlaveDescriptor) -> Self {
        self.accel = Some(accel);
        self
    }

    /// Attach a compass
    #[must_use]
    pub fn with_compass(mut self, compass: SlaveDescriptor) -> Self {
        self.compass = Some(compass);
        self
    }

    /// Attach a pressure sensor
    #[must_use]
    pub fn with_pressure(mut self, pressure: SlaveDescriptor) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Set the gyroscope mounting matrix
    #[must_use]
    pub fn with_gyro_orientation(mut self, orientation: Orientation) -> Self {
        self.gyro_orientation = orientation;
        self
    }

    /// True when a compass is fitted
    #[must_use]
    pub const fn compass_present(&self) -> bool {
        self.compass.is_some()
    }
}
