//! High-level motion processing API
//!
//! [`MotionProcessor`] owns the platform, the board configuration and the
//! [`MotionContext`], and sequences every operation through the
//! [`StateMachine`]:
//!
//! ```text
//! serial_start ──► dmp_open ──► apply_calibration / set_bias_update
//!                                  │
//!                                  ▼
//!                     set_active_sensors ──► dmp_start ──► update() ...
//! ```
//!
//! Failures are returned immediately. Writes that already reached the
//! device are not rolled back; re-running the whole operation restores a
//! consistent state.

use crate::Error;
use crate::config::DeviceConfig;
use crate::context::{BiasMode, InternalMotionState, MotionContext, MotionState};
use crate::dmp::opcodes::{
    DINA0C, DINA2D, DINA35, DINA3D, DINA55, DINA7D, DINA80, DINAD8, DINAFE,
};
use crate::dmp::{DmpKey, Orientation, calibration};
use crate::interface::{AccelSlaveConfig, MotionPlatform, SlaveIrq};
use crate::interrupt::{CallbackRegistry, InterruptCallback, InterruptSource, InterruptSources};
use crate::sensors::{GyroFullScale, SensorMask};
use crate::state::{DeviceState, StateMachine};

/// FIFO packet budget per [`MotionProcessor::update`] when the DMP is
/// requested; large enough to drain the FIFO
const DRAIN_BUDGET: u16 = 100;

/// Quaternion scalar seed (1.0 in Q30) written on motion reset
const QUAT_SCALAR_SEED: i32 = 0x4000_0000;

/// Gyro dead zone with the low-pass bias tracker
const LPF_DEAD_ZONE: u8 = 0x02;

/// Gyro dead zone with dead-zone control on
const CONTROL_DEAD_ZONE: u8 = 0x08;

/// Called with `(old, new)` before a sensor mask change is committed
pub type ModeChangeCallback<E> = fn(SensorMask, SensorMask) -> Result<(), Error<E>>;

/// Called whenever the reported motion state is set
pub type MotionStateCallback = fn(MotionState);

/// Outcome of one [`MotionProcessor::update`] pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpdateReport {
    /// FIFO packets consumed
    pub packets: u16,
    /// The motion processor raised an interrupt and callbacks were run
    pub dmp_interrupt: bool,
}

/// Motion processing library instance for one device
pub struct MotionProcessor<P: MotionPlatform> {
    platform: P,
    config: DeviceConfig,
    ctx: MotionContext,
    state: StateMachine,
    callbacks: CallbackRegistry,
    requested_sensors: SensorMask,
    mode_change: Option<ModeChangeCallback<P::Error>>,
    motion_callback: Option<MotionStateCallback>,
}

impl<P: MotionPlatform> MotionProcessor<P> {
    /// Create an instance in the `SerialClosed` state
    ///
    /// No hardware is touched until [`serial_start`](Self::serial_start).
    pub const fn new(platform: P, config: DeviceConfig) -> Self {
        Self {
            platform,
            config,
            ctx: MotionContext::new(),
            state: StateMachine::new(),
            callbacks: CallbackRegistry::new(),
            requested_sensors: SensorMask::empty(),
            mode_change: None,
            motion_callback: None,
        }
    }

    /// Consume the instance and return the platform
    pub fn release(self) -> P {
        self.platform
    }

    /// Shared access to the platform (the open serial handle)
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// Exclusive access to the platform
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Current lifecycle state
    pub const fn state(&self) -> DeviceState {
        self.state.state()
    }

    /// Motion processing context
    pub const fn context(&self) -> &MotionContext {
        &self.ctx
    }

    /// Mutable motion processing context
    pub fn context_mut(&mut self) -> &mut MotionContext {
        &mut self.ctx
    }

    /// Board configuration
    pub const fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Replace the board configuration
    ///
    /// Takes effect on the next calibration or sensor change. The stored
    /// bias mode is restricted to the new compass presence right away; the
    /// tracker bytes in DMP memory follow on the next
    /// [`set_bias_update`](Self::set_bias_update).
    pub fn set_config(&mut self, config: DeviceConfig) {
        self.ctx.bias_mode =
            MotionContext::constrain_bias_mode(self.ctx.bias_mode, config.compass_present());
        self.config = config;
    }

    /// Sensors requested by the last successful
    /// [`set_active_sensors`](Self::set_active_sensors)
    pub const fn requested_sensors(&self) -> SensorMask {
        self.requested_sensors
    }

    /// True if any gyroscope axis is requested
    pub fn gyro_present(&self) -> bool {
        self.requested_sensors.has_gyro()
    }

    // ---- Lifecycle ------------------------------------------------------

    /// Open the serial link
    ///
    /// Does nothing if the link is already open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the platform cannot open `port`; the state
    /// falls back to `SerialClosed`.
    pub fn serial_start(&mut self, port: &str) -> Result<(), Error<P::Error>> {
        if self.state.state() >= DeviceState::SerialOpened {
            return Ok(());
        }

        self.state.transition(DeviceState::SerialOpened)?;
        if let Err(e) = self.platform.open(port) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Serial open failed, closing");
            self.state.transition(DeviceState::SerialClosed)?;
            return Err(Error::Bus(e));
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Serial link opened");

        Ok(())
    }

    /// Close the serial link from any state
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the platform fails to close the link. The
    /// state is `SerialClosed` either way.
    pub fn serial_stop(&mut self) -> Result<(), Error<P::Error>> {
        if self.state.state() == DeviceState::SerialClosed {
            return Ok(());
        }

        self.state.transition(DeviceState::SerialClosed)?;
        self.platform.close().map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Serial close failed");
            Error::Bus(e)
        })
    }

    /// Reset the motion library and move to `DmpOpened`
    ///
    /// The context returns to its defaults and every interrupt callback is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImproperState`] unless the state is `SerialOpened`.
    pub fn dmp_open(&mut self) -> Result<(), Error<P::Error>> {
        self.state.require(DeviceState::SerialOpened)?;

        self.ctx = MotionContext::new();
        self.ctx.no_motion_accel_time = self.platform.tick_count();
        self.callbacks.clear();
        self.state.transition(DeviceState::DmpOpened)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP opened");

        Ok(())
    }

    /// Start the requested sensors and move to `DmpStarted`
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] unless the state is `DmpOpened`
    /// - [`Error::Bus`] if starting the sensors or resetting motion fails
    pub fn dmp_start(&mut self) -> Result<(), Error<P::Error>> {
        self.state.require(DeviceState::DmpOpened)?;

        self.platform.start_sensors(self.requested_sensors)?;
        self.reset_motion()?;
        self.state.transition(DeviceState::DmpStarted)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP started");

        Ok(())
    }

    /// Stop every sensor and move back to `DmpOpened`
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] unless the state is `DmpStarted`
    /// - [`Error::Bus`] if stopping the sensors fails
    pub fn dmp_stop(&mut self) -> Result<(), Error<P::Error>> {
        self.state.require(DeviceState::DmpStarted)?;

        self.platform.stop_sensors(SensorMask::all())?;
        self.state.transition(DeviceState::DmpOpened)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP stopped");

        Ok(())
    }

    /// Shut the motion library down, stopping it first if running
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] below `DmpOpened`
    /// - [`Error::Bus`] if stopping the sensors fails
    pub fn dmp_close(&mut self) -> Result<(), Error<P::Error>> {
        match self.state.state() {
            DeviceState::DmpStarted => self.dmp_stop()?,
            DeviceState::DmpOpened => {}
            _ => return Err(Error::ImproperState),
        }
        self.state.transition(DeviceState::SerialOpened)
    }

    // ---- Calibration ----------------------------------------------------

    /// Encode and write the gyroscope calibration
    ///
    /// `range_dps` is the full-scale range in degrees per second; the
    /// configured `gyro_sens_trim` is applied on top.
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] unless the state is `DmpOpened`
    /// - [`Error::InvalidParameter`] for a malformed orientation
    /// - [`Error::Bus`] on a failed write
    pub fn set_gyro_calibration(
        &mut self,
        range_dps: f32,
        orientation: &Orientation,
    ) -> Result<(), Error<P::Error>> {
        self.state.require(DeviceState::DmpOpened)?;
        calibration::write_gyro_calibration(
            &mut self.platform,
            &mut self.ctx,
            range_dps,
            self.config.gyro_sens_trim,
            orientation,
        )
    }

    /// Encode and write the accelerometer calibration
    ///
    /// `range_g` is the full-scale range in g. The axis patches are only
    /// written when an accelerometer slave is configured.
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] unless the state is `DmpOpened`
    /// - [`Error::InvalidParameter`] for a malformed orientation
    /// - [`Error::Bus`] on a failed write
    pub fn set_accel_calibration(
        &mut self,
        range_g: f32,
        orientation: &Orientation,
    ) -> Result<(), Error<P::Error>> {
        self.state.require(DeviceState::DmpOpened)?;
        calibration::write_accel_calibration(
            &mut self.platform,
            &mut self.ctx,
            range_g,
            orientation,
            self.config.accel.is_some(),
        )
    }

    /// Encode and write the compass calibration
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] unless the state is `DmpOpened`
    /// - [`Error::InvalidParameter`] for a malformed orientation
    /// - [`Error::Bus`] on a failed cell write
    pub fn set_compass_calibration(
        &mut self,
        range: f32,
        orientation: &Orientation,
    ) -> Result<(), Error<P::Error>> {
        self.state.require(DeviceState::DmpOpened)?;
        calibration::write_compass_calibration(&mut self.platform, &mut self.ctx, range, orientation)
    }

    /// Calibrate every configured sensor from the board configuration
    ///
    /// Runs gyroscope, then accelerometer and compass when fitted, and stops
    /// at the first failure.
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] unless the state is `DmpOpened`; nothing is
    ///   written or updated in that case
    /// - [`Error::InvalidParameter`] for an unknown gyro full-scale code
    /// - [`Error::Bus`] on a failed write
    #[allow(clippy::cast_possible_truncation)]
    pub fn apply_calibration(&mut self) -> Result<(), Error<P::Error>> {
        self.state.require(DeviceState::DmpOpened)?;

        let Some(full_scale) = GyroFullScale::from_code(self.config.gyro_full_scale) else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Unrecognized gyro full scale: {=u8:#04x}",
                self.config.gyro_full_scale
            );
            return Err(Error::InvalidParameter);
        };

        let accel = self.config.accel;
        let compass = self.config.compass;

        if let Some(accel) = accel {
            // Sensitivity for +/- range, halved for the firmware's 2 g basis
            self.ctx.accel_sens = (accel.range.to_f32() * 65536.0) as i32 / 2;
        }
        if let Some(compass) = compass {
            self.ctx.compass_sens = (compass.range.to_f32() * 32768.0) as i32;
        }

        let gyro_orientation = self.config.gyro_orientation;
        self.set_gyro_calibration(full_scale.range_dps(), &gyro_orientation)?;

        if let Some(accel) = accel {
            self.set_accel_calibration(accel.range.to_f32(), &accel.orientation)?;
        }
        if let Some(compass) = compass {
            self.set_compass_calibration(compass.range.to_f32(), &compass.orientation)?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Calibration applied");

        Ok(())
    }

    /// Tell the DMP the accelerometer's byte order
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] while the serial link is closed
    /// - [`Error::SerialDeviceNotRecognized`] without an accelerometer slave
    /// - [`Error::Bus`] on a failed write
    pub fn apply_endian_accel(&mut self) -> Result<(), Error<P::Error>> {
        self.state.require_at_least(DeviceState::SerialOpened)?;
        let accel = self.config.accel.ok_or(Error::SerialDeviceNotRecognized)?;
        calibration::write_accel_endian(&mut self.platform, &accel)
    }

    // ---- Sensors --------------------------------------------------------

    /// Register (or clear) the callback run before a sensor mask change
    pub fn set_mode_change_callback(&mut self, callback: Option<ModeChangeCallback<P::Error>>) {
        self.mode_change = callback;
    }

    /// Select which sensors are active
    ///
    /// Accelerometer, compass and pressure axes can only be toggled as whole
    /// groups. When the DMP is running the new set takes effect immediately
    /// and motion state is reset.
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] below `DmpOpened`
    /// - [`Error::FeatureNotImplemented`] for a partial axis group
    /// - [`Error::SerialDeviceNotRecognized`] for a group with no slave
    /// - whatever the mode-change callback returns
    /// - [`Error::Bus`] on a failed platform call; the sensors may then be
    ///   left partially switched
    pub fn set_active_sensors(&mut self, sensors: SensorMask) -> Result<(), Error<P::Error>> {
        self.state.require_at_least(DeviceState::DmpOpened)?;

        let fitted = [
            self.config.accel.is_some(),
            self.config.compass.is_some(),
            self.config.pressure.is_some(),
        ];
        for (group, present) in SensorMask::GROUPS.into_iter().zip(fitted) {
            if sensors.partially_covers(group) {
                return Err(Error::FeatureNotImplemented);
            }
            if sensors.intersects(group) && !present {
                return Err(Error::SerialDeviceNotRecognized);
            }
        }

        let old = self.requested_sensors;
        let running = self.state.state() == DeviceState::DmpStarted;

        if sensors.has_dmp() && !old.has_dmp() {
            let millihertz = self.platform.sampling_rate_hz().saturating_mul(1000);
            self.platform
                .configure_accel(AccelSlaveConfig::OdrResume { millihertz }, running)?;
            self.platform
                .configure_accel(AccelSlaveConfig::IrqResume(SlaveIrq::None), running)?;
            self.platform.init_fifo_hardware()?;
        }

        if let Some(callback) = self.mode_change {
            callback(old, sensors)?;
        }

        let fifo_rate = self.platform.fifo_rate();
        self.requested_sensors = sensors;

        if running {
            self.platform.start_sensors(sensors)?;
            self.reset_motion()?;
            self.platform.stop_sensors(!sensors)?;
        }

        self.platform.set_fifo_rate(fifo_rate)?;

        if !sensors.has_dmp() && sensors.intersects(SensorMask::THREE_AXIS_ACCEL) {
            self.platform
                .configure_accel(AccelSlaveConfig::IrqResume(SlaveIrq::DataReady), running)?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Active sensors: {=u32:#06x} -> {=u32:#06x}",
            old.bits(),
            sensors.bits()
        );

        Ok(())
    }

    // ---- Data pump ------------------------------------------------------

    /// Process pending FIFO data and dispatch interrupt callbacks
    ///
    /// Drains the FIFO when the DMP is requested, otherwise processes a
    /// single packet. If the motion processor interrupt fired, every
    /// registered callback runs once, in registration order.
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] unless the state is `DmpStarted`; nothing
    ///   is read and no callback runs
    /// - [`Error::Bus`] from the FIFO read or the final status query
    pub fn update(&mut self) -> Result<UpdateReport, Error<P::Error>> {
        self.state.require(DeviceState::DmpStarted)?;

        let budget = if self.requested_sensors.has_dmp() {
            DRAIN_BUDGET
        } else {
            1
        };
        let packets = self.platform.read_and_process_fifo(budget)?;

        if self.platform.interrupt_triggered(InterruptSource::Aux1) {
            self.platform.clear_interrupt(InterruptSource::Aux1);
        }

        let dmp_interrupt = self.platform.interrupt_triggered(InterruptSource::Mpu);
        if dmp_interrupt {
            self.platform.clear_interrupt(InterruptSource::Mpu);
            self.callbacks.dispatch(&mut self.ctx);
        }

        self.platform.fifo_status()?;

        #[cfg(feature = "defmt")]
        defmt::trace!("Update: {=u16} packets, irq={=bool}", packets, dmp_interrupt);

        Ok(UpdateReport {
            packets,
            dmp_interrupt,
        })
    }

    /// Register a callback run on every motion processor interrupt
    ///
    /// Registering the same callback twice runs it twice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CallbackRegistryFull`] once
    /// [`MAX_INTERRUPT_CALLBACKS`](crate::MAX_INTERRUPT_CALLBACKS) are held.
    pub fn register_interrupt_callback(
        &mut self,
        callback: InterruptCallback,
    ) -> Result<(), Error<P::Error>> {
        self.callbacks.register(callback)
    }

    /// Remove a previously registered interrupt callback
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if it was never registered.
    pub fn unregister_interrupt_callback(
        &mut self,
        callback: InterruptCallback,
    ) -> Result<(), Error<P::Error>> {
        self.callbacks.unregister(callback)
    }

    /// Number of registered interrupt callbacks
    pub fn interrupt_callback_count(&self) -> usize {
        self.callbacks.len()
    }

    // ---- Motion ---------------------------------------------------------

    /// Force the motion state back to moving and restart the DMP's motion
    /// detector
    ///
    /// Called at start-up and whenever the active sensors change while
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on the first failed write. The host-side state
    /// is already reset by then and earlier writes are kept.
    pub fn reset_motion(&mut self) -> Result<(), Error<P::Error>> {
        self.ctx.motion_state = MotionState::Moving;
        self.ctx.motion_state_change = MotionState::Moving;
        self.ctx.no_motion_accel_time = self.platform.tick_count();

        self.platform
            .write_memory(DmpKey::Cfg18, &[DINAD8 + 2, DINA0C, DINAD8 + 1])?;
        self.platform
            .write_memory(DmpKey::D_1_106, &self.ctx.motion_duration.to_be_bytes())?;
        self.platform.write_memory(DmpKey::D_1_96, &[0; 8])?;
        self.platform
            .write_memory(DmpKey::D_0_96, &QUAT_SCALAR_SEED.to_be_bytes())?;

        self.set_motion_state(MotionState::Moving);
        Ok(())
    }

    /// Set the reported motion state and notify the motion callback
    pub fn set_motion_state(&mut self, state: MotionState) {
        if self.ctx.motion_state != state {
            self.ctx.motion_state_change = state;
        }
        self.ctx.motion_state = state;
        self.ctx.internal_motion_state = match state {
            MotionState::Moving => InternalMotionState::Moving,
            MotionState::NoMotion => match self.ctx.internal_motion_state {
                InternalMotionState::BiasInProgress => InternalMotionState::BiasInProgress,
                _ => InternalMotionState::NoMotion,
            },
        };

        if let Some(callback) = self.motion_callback {
            callback(state);
        }
    }

    /// Register (or clear) the motion state callback
    pub fn set_motion_callback(&mut self, callback: Option<MotionStateCallback>) {
        self.motion_callback = callback;
    }

    // ---- Bias tracking --------------------------------------------------

    /// Select the automatic bias-update strategies
    ///
    /// The progressive no-motion tracker is never enabled, and the fast
    /// no-motion tracker can only be kept, not switched on, from here.
    /// Compass strategies are dropped without a compass and the low-pass
    /// tracker is dropped with one. With factory temperature compensation
    /// available, temperature slope learning is dropped as well.
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] unless the state is `DmpOpened`
    /// - [`Error::Bus`] on a failed write
    pub fn set_bias_update(&mut self, mode: BiasMode) -> Result<(), Error<P::Error>> {
        self.state.require(DeviceState::DmpOpened)?;

        let mut mode = mode - BiasMode::PROGRESSIVE_NO_MOTION - BiasMode::FAST_NO_MOTION;
        if self.ctx.bias_mode.contains(BiasMode::FAST_NO_MOTION) {
            mode |= BiasMode::FAST_NO_MOTION;
        }
        mode = MotionContext::constrain_bias_mode(mode, self.config.compass_present());
        self.ctx.bias_mode = mode;

        let lpf = mode.contains(BiasMode::LPF);
        let tracker = if lpf {
            [DINA80 + 2, DINA2D, DINA55, DINA7D]
        } else {
            [DINA80 + 7, DINA2D, DINA35, DINA3D]
        };
        self.platform.write_memory(DmpKey::Fcfg5, &tracker)?;

        let dead_zone = if self.ctx.dead_zone {
            CONTROL_DEAD_ZONE
        } else if lpf {
            LPF_DEAD_ZONE
        } else {
            0
        };
        self.platform.write_memory(DmpKey::D_0_163, &[dead_zone])?;

        self.ctx.factory_temp_comp = self.config.offset_tc.iter().any(|&tc| tc != 0);
        if self.ctx.factory_temp_comp {
            #[cfg(feature = "defmt")]
            defmt::debug!("Factory temperature compensation available");
            self.ctx.bias_mode -= BiasMode::LEARN_FROM_TEMPERATURE;
        }

        Ok(())
    }

    // ---- DMP interrupts -------------------------------------------------

    /// Enable or disable the DMP interrupt on motion / no-motion transitions
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] below `DmpOpened`
    /// - [`Error::Bus`] on a failed platform call or write
    pub fn set_motion_interrupt(&mut self, on: bool) -> Result<(), Error<P::Error>> {
        self.set_dmp_interrupt(InterruptSources::MOTION, DmpKey::Cfg7, on)
    }

    /// Enable or disable the DMP interrupt on FIFO packet ready
    ///
    /// # Errors
    ///
    /// - [`Error::ImproperState`] below `DmpOpened`
    /// - [`Error::Bus`] on a failed platform call or write
    pub fn set_fifo_interrupt(&mut self, on: bool) -> Result<(), Error<P::Error>> {
        self.set_dmp_interrupt(InterruptSources::FIFO, DmpKey::Cfg6, on)
    }

    fn set_dmp_interrupt(
        &mut self,
        source: InterruptSources,
        key: DmpKey,
        on: bool,
    ) -> Result<(), Error<P::Error>> {
        self.state.require_at_least(DeviceState::DmpOpened)?;

        if on {
            self.platform.configure_dmp_interrupt(true)?;
            self.ctx.interrupt_sources |= source;
        } else {
            self.ctx.interrupt_sources -= source;
            if self.ctx.interrupt_sources.is_empty() {
                self.platform.configure_dmp_interrupt(false)?;
            }
        }

        self.platform
            .write_memory(key, &[if on { DINAFE } else { DINAD8 }])?;
        Ok(())
    }
}
