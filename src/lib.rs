#![no_std]
#![warn(missing_docs)]
//! Orchestration layer for InvenSense-style motion coprocessors (DMP).
//!
//! The crate drives the fixed-function Digital Motion Processor found in the
//! MPU-3050/6050/9150 family: it gates operations behind a lifecycle state
//! machine, encodes sensor mounting matrices into the opcode blobs the DMP
//! firmware expects, reconciles which sensors are active, and pumps the FIFO
//! on every interrupt while dispatching registered consumers.
//!
//! Everything below the device-memory level (bus transport, FIFO packet
//! parsing, bias estimation) is reached through the traits in [`interface`].
//!
//! # Example
//!
//! ```ignore
//! use motion_dmp::{DeviceConfig, MotionProcessor, SensorMask};
//!
//! let mut mpl = MotionProcessor::new(platform, DeviceConfig::default());
//! mpl.serial_start("/dev/i2c-1")?;
//! mpl.dmp_open()?;
//! mpl.apply_calibration()?;
//! mpl.set_active_sensors(SensorMask::NINE_AXIS | SensorMask::DMP_PROCESSOR)?;
//! mpl.dmp_start()?;
//! loop {
//!     mpl.update()?;
//! }
//! ```

pub mod config;
pub mod context;
pub mod device;
pub mod dmp;
pub mod interface;
pub mod interrupt;
pub mod sensors;
pub mod state;

// Re-export main types
pub use config::{DeviceConfig, Endian, SlaveBus, SlaveDescriptor, SlaveRange};
pub use context::{BiasMode, InternalMotionState, MotionContext, MotionState};
pub use device::{ModeChangeCallback, MotionProcessor, MotionStateCallback, UpdateReport};
pub use dmp::{DmpKey, Orientation};
pub use interface::{
    AccelSlaveConfig, BusError, DmpMemory, DmpMemoryBus, I2cInterface, MemoryRegisters,
    MotionPlatform, SlaveIrq,
};
pub use interrupt::{InterruptCallback, InterruptSource, InterruptSources, MAX_INTERRUPT_CALLBACKS};
pub use sensors::{GyroFullScale, SensorMask};
pub use state::{DeviceState, StateMachine};

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Device I/O failure reported by the platform (passed through unchanged)
    Bus(E),
    /// Operation invoked outside the lifecycle state it requires
    ImproperState,
    /// Unrecognized enum or configuration value
    InvalidParameter,
    /// Partial axis-group enable requested; only whole sensors can be toggled
    FeatureNotImplemented,
    /// A sensor group was requested but no slave device is described for it
    SerialDeviceNotRecognized,
    /// The interrupt callback registry is at capacity
    CallbackRegistryFull,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
