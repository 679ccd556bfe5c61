//! Platform and bus interfaces
//!
//! The motion library drives hardware only through two traits:
//!
//! - [`DmpMemory`]: keyed writes into DMP memory
//! - [`MotionPlatform`]: transport, FIFO, interrupt and slave-sensor services
//!
//! Both are normally implemented by the board support layer. This module also
//! ships the register-level building blocks such a layer needs: an I2C
//! [`RegisterInterface`] and [`DmpMemoryBus`], which turns keyed writes into
//! banked `MEM_BANK_SEL` / `MEM_START_ADDR` / `MEM_R_W` register traffic.

use device_driver::RegisterInterface;

use crate::dmp::DmpKey;
use crate::interrupt::InterruptSource;
use crate::sensors::SensorMask;

/// I2C address with the AD0 pin low
pub const I2C_ADDRESS_AD0_LOW: u8 = 0x68;

/// I2C address with the AD0 pin high
pub const I2C_ADDRESS_AD0_HIGH: u8 = 0x69;

/// Largest register write [`I2cInterface`] sends in one transaction
pub const I2C_MAX_WRITE_LEN: usize = 32;

/// Keyed access to DMP memory
pub trait DmpMemory {
    /// Error reported by the underlying bus
    type Error;

    /// Write `data` starting at the location named by `key`
    ///
    /// # Errors
    ///
    /// Returns the bus error if the write fails or the key cannot be resolved.
    fn write_memory(&mut self, key: DmpKey, data: &[u8]) -> Result<(), Self::Error>;

    /// True if the loaded firmware exposes `key`
    fn key_supported(&self, key: DmpKey) -> bool;
}

/// Data-ready interrupt mode of a slave accelerometer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveIrq {
    /// No interrupt
    None,
    /// Interrupt on every new sample
    DataReady,
}

/// Accelerometer slave reconfiguration request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelSlaveConfig {
    /// Output data rate used while running
    OdrResume {
        /// Rate in mHz
        millihertz: u32,
    },
    /// Interrupt mode used while running
    IrqResume(SlaveIrq),
}

/// Services the motion library consumes from the board support layer
///
/// Every fallible method reports the same error type as the DMP memory
/// writer, so the motion library can surface it as
/// [`Error::Bus`](crate::Error::Bus).
pub trait MotionPlatform: DmpMemory {
    /// Open the physical link identified by `port`
    ///
    /// # Errors
    ///
    /// Returns the transport error if the link cannot be opened.
    fn open(&mut self, port: &str) -> Result<(), Self::Error>;

    /// Close the physical link
    ///
    /// # Errors
    ///
    /// Returns the transport error if the link cannot be closed cleanly.
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Read up to `max_packets` FIFO packets and run them through the
    /// processing pipeline
    ///
    /// # Errors
    ///
    /// Returns the bus error on a failed FIFO read.
    fn read_and_process_fifo(&mut self, max_packets: u16) -> Result<u16, Self::Error>;

    /// True if `source` has fired since it was last cleared
    fn interrupt_triggered(&self, source: InterruptSource) -> bool;

    /// Acknowledge `source`
    fn clear_interrupt(&mut self, source: InterruptSource);

    /// Query the overall FIFO status
    ///
    /// # Errors
    ///
    /// Returns the bus error on a failed read, or a platform error when the
    /// FIFO has overflowed.
    fn fifo_status(&mut self) -> Result<(), Self::Error>;

    /// Current FIFO rate divider
    fn fifo_rate(&self) -> u16;

    /// Set the FIFO rate divider
    ///
    /// # Errors
    ///
    /// Returns the bus error if the rate cannot be programmed.
    fn set_fifo_rate(&mut self, rate: u16) -> Result<(), Self::Error>;

    /// Reset and reinitialize the FIFO hardware
    ///
    /// # Errors
    ///
    /// Returns the bus error on failure.
    fn init_fifo_hardware(&mut self) -> Result<(), Self::Error>;

    /// Reconfigure the accelerometer slave; `apply` pushes the change to
    /// hardware immediately instead of on the next resume
    ///
    /// # Errors
    ///
    /// Returns the bus error on failure.
    fn configure_accel(&mut self, config: AccelSlaveConfig, apply: bool)
    -> Result<(), Self::Error>;

    /// Internal sampling rate in Hz
    fn sampling_rate_hz(&self) -> u32;

    /// Power up and start `sensors`
    ///
    /// # Errors
    ///
    /// Returns the bus error on failure.
    fn start_sensors(&mut self, sensors: SensorMask) -> Result<(), Self::Error>;

    /// Stop `sensors`
    ///
    /// # Errors
    ///
    /// Returns the bus error on failure.
    fn stop_sensors(&mut self, sensors: SensorMask) -> Result<(), Self::Error>;

    /// Route (or stop routing) DMP interrupts to the host
    ///
    /// # Errors
    ///
    /// Returns the bus error on failure.
    fn configure_dmp_interrupt(&mut self, enable: bool) -> Result<(), Self::Error>;

    /// Millisecond tick counter
    fn tick_count(&self) -> u32;
}

/// I2C register interface
///
/// A register write carries at most [`I2C_MAX_WRITE_LEN`] data bytes; the
/// rest of a longer slice is not sent. [`DmpMemoryBus`] stays well below
/// that limit.
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create an interface at the default address (0x68, AD0 pin low)
    ///
    /// # Example
    /// ```ignore
    /// let interface = I2cInterface::default(i2c);
    /// let memory = DmpMemoryBus::new(interface, MemoryRegisters::MPU6050, resolve_key);
    /// ```
    pub const fn default(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS_AD0_LOW,
        }
    }

    /// Create an interface at the alternative address (0x69, AD0 pin high)
    pub const fn alternative(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS_AD0_HIGH,
        }
    }

    /// Create an interface at a custom device address
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Device address in use
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Consume the interface and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterInterface for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[address], read_data)
    }

    /// Write `address` followed by up to [`I2C_MAX_WRITE_LEN`] bytes
    ///
    /// Bytes past the limit are dropped without an error. Split longer
    /// writes first.
    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut buffer = [0u8; I2C_MAX_WRITE_LEN + 1];
        buffer[0] = address;
        let len = write_data.len().min(I2C_MAX_WRITE_LEN);
        buffer[1..=len].copy_from_slice(&write_data[..len]);

        self.i2c.write(self.address, &buffer[..=len])
    }
}

/// Register addresses of the DMP memory window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryRegisters {
    /// `MEM_BANK_SEL`
    pub bank_sel: u8,
    /// `MEM_START_ADDR`
    pub start_addr: u8,
    /// `MEM_R_W`, auto-incrementing data port
    pub r_w: u8,
}

impl MemoryRegisters {
    /// MPU-6050 / MPU-3050 family memory window
    pub const MPU6050: Self = Self {
        bank_sel: 0x6D,
        start_addr: 0x6E,
        r_w: 0x6F,
    };

    /// ICM-20948 memory window (user bank 0)
    pub const ICM20948: Self = Self {
        bank_sel: 0x7E,
        start_addr: 0x7C,
        r_w: 0x7D,
    };
}

/// Error from [`DmpMemoryBus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError<E> {
    /// Register access failed
    Interface(E),
    /// The key has no address in the loaded firmware
    UnmappedKey(DmpKey),
}

impl<E> From<E> for BusError<E> {
    fn from(error: E) -> Self {
        Self::Interface(error)
    }
}

/// [`DmpMemory`] over any `device-driver` register interface
///
/// Keys are resolved to DMP addresses by `resolve`, which describes the
/// firmware image loaded on the device. [`DmpKey::data_address`] is a valid
/// resolver for firmware that only uses the fixed data keys.
pub struct DmpMemoryBus<I> {
    interface: I,
    registers: MemoryRegisters,
    resolve: fn(DmpKey) -> Option<u16>,
}

impl<I> DmpMemoryBus<I> {
    /// Largest burst written through `MEM_R_W` in one transfer
    pub const MAX_CHUNK_SIZE: usize = 16;

    /// Size of one DMP memory bank
    pub const BANK_SIZE: usize = 256;

    /// Wrap a register interface
    pub const fn new(
        interface: I,
        registers: MemoryRegisters,
        resolve: fn(DmpKey) -> Option<u16>,
    ) -> Self {
        Self {
            interface,
            registers,
            resolve,
        }
    }

    /// Consume the bus and return the register interface
    pub fn release(self) -> I {
        self.interface
    }
}

impl<I> DmpMemoryBus<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Write `data` at a raw DMP address
    ///
    /// The data is split into bursts of at most [`Self::MAX_CHUNK_SIZE`]
    /// bytes that never cross a bank boundary; each burst re-selects bank and
    /// start address.
    ///
    /// # Errors
    ///
    /// Returns the interface error of the first failing register write.
    pub fn write_at(&mut self, address: u16, data: &[u8]) -> Result<(), I::Error> {
        let mut written = 0;

        while written < data.len() {
            #[allow(clippy::cast_possible_truncation)]
            let current = address.wrapping_add(written as u16);
            let [bank, offset] = current.to_be_bytes();

            let room_in_bank = Self::BANK_SIZE - usize::from(offset);
            let chunk_size = (data.len() - written)
                .min(Self::MAX_CHUNK_SIZE)
                .min(room_in_bank);
            let chunk = &data[written..written + chunk_size];

            self.interface
                .write_register(self.registers.bank_sel, 8, &[bank])?;
            self.interface
                .write_register(self.registers.start_addr, 8, &[offset])?;
            #[allow(clippy::cast_possible_truncation)]
            let size_bits = 8 * chunk_size as u32;
            self.interface
                .write_register(self.registers.r_w, size_bits, chunk)?;

            #[cfg(feature = "defmt")]
            defmt::trace!(
                "DMP write: addr=0x{:04X} len={}",
                current,
                chunk_size
            );

            written += chunk_size;
        }

        Ok(())
    }
}

impl<I> DmpMemory for DmpMemoryBus<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    type Error = BusError<I::Error>;

    fn write_memory(&mut self, key: DmpKey, data: &[u8]) -> Result<(), Self::Error> {
        let address = (self.resolve)(key).ok_or(BusError::UnmappedKey(key))?;
        self.write_at(address, data)?;
        Ok(())
    }

    fn key_supported(&self, key: DmpKey) -> bool {
        (self.resolve)(key).is_some()
    }
}
