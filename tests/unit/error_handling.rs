//! Unit tests for error propagation and recovery

use crate::common::{MockError, nine_axis_config, opened_processor, started_processor};
use motion_dmp::{BiasMode, DeviceState, DmpKey, Error, InterruptSource, SensorMask};

#[test]
fn test_bus_error_conversion() {
    let error: Error<MockError> = MockError::Transport.into();
    assert_eq!(error, Error::Bus(MockError::Transport));
}

#[test]
fn test_calibration_write_failure_recovery() {
    let (mut mpl, platform) = opened_processor(nine_axis_config());
    platform.fail_next_write();

    // First write fails, nothing reaches the device
    let result = mpl.apply_calibration();
    assert_eq!(result, Err(Error::Bus(MockError::Communication)));
    assert!(platform.memory_writes().is_empty());

    // Re-running the whole operation restores a consistent state
    mpl.apply_calibration().unwrap();
    assert_eq!(platform.written_keys().len(), 17);
    assert_eq!(mpl.state(), DeviceState::DmpOpened);
}

#[test]
fn test_failure_does_not_change_state() {
    let (mut mpl, platform) = opened_processor(nine_axis_config());
    platform.fail_next_write();

    assert!(mpl.set_bias_update(BiasMode::NO_MOTION).is_err());
    assert_eq!(mpl.state(), DeviceState::DmpOpened);

    mpl.set_bias_update(BiasMode::NO_MOTION).unwrap();
    assert_eq!(
        platform.written_keys(),
        vec![DmpKey::Fcfg5, DmpKey::D_0_163]
    );
}

#[test]
fn test_fifo_overflow_then_recovery() {
    let (mut mpl, platform) = started_processor(
        nine_axis_config(),
        SensorMask::SIX_AXIS | SensorMask::DMP_PROCESSOR,
    );
    platform.set_packets_available(10);
    platform.fail_next_fifo_status();

    assert_eq!(mpl.update(), Err(Error::Bus(MockError::FifoOverflow)));
    assert_eq!(mpl.state(), DeviceState::DmpStarted);

    // Packets consumed by the failed pass are not replayed
    platform.set_packets_available(4);
    assert_eq!(mpl.update().unwrap().packets, 4);
}

#[test]
fn test_fifo_read_error_then_recovery() {
    let (mut mpl, platform) = started_processor(
        nine_axis_config(),
        SensorMask::SIX_AXIS | SensorMask::DMP_PROCESSOR,
    );
    platform.raise_interrupt(InterruptSource::Mpu);
    platform.fail_next_fifo_read();

    assert!(mpl.update().is_err());

    let report = mpl.update().unwrap();
    assert!(report.dmp_interrupt);
    assert_eq!(platform.fifo_read_count(), 2);
}

#[test]
fn test_dmp_start_failure_partial_writes() {
    let (mut mpl, platform) = opened_processor(nine_axis_config());
    mpl.set_active_sensors(SensorMask::SIX_AXIS).unwrap();
    platform.fail_write_to(DmpKey::D_0_96);

    assert_eq!(mpl.dmp_start(), Err(Error::Bus(MockError::Communication)));
    assert_eq!(mpl.state(), DeviceState::DmpOpened);
    // Sensors were started and three reset writes landed; nothing is undone
    assert_eq!(platform.written_keys().len(), 3);

    mpl.dmp_start().unwrap();
    assert_eq!(mpl.state(), DeviceState::DmpStarted);
}
