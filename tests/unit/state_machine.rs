//! Unit tests for the lifecycle state machine

use crate::common::{
    MockError, Operation, create_mock_processor, nine_axis_config, opened_processor,
    started_processor,
};
use motion_dmp::{DeviceConfig, DeviceState, Error, SensorMask, StateMachine};

#[test]
fn test_initial_state() {
    let (mpl, platform) = create_mock_processor(DeviceConfig::default());
    assert_eq!(mpl.state(), DeviceState::SerialClosed);
    assert!(platform.operations().is_empty());
}

#[test]
fn test_state_ordering() {
    assert!(DeviceState::SerialClosed < DeviceState::SerialOpened);
    assert!(DeviceState::SerialOpened < DeviceState::DmpOpened);
    assert!(DeviceState::DmpOpened < DeviceState::DmpStarted);
}

#[test]
fn test_transition_rules() {
    let mut sm = StateMachine::new();

    // Skipping a step is rejected
    let r: Result<(), Error<()>> = sm.transition(DeviceState::DmpOpened);
    assert_eq!(r, Err(Error::ImproperState));
    assert_eq!(sm.state(), DeviceState::SerialClosed);

    for target in [
        DeviceState::SerialOpened,
        DeviceState::DmpOpened,
        DeviceState::DmpStarted,
    ] {
        let r: Result<(), Error<()>> = sm.transition(target);
        assert!(r.is_ok());
    }

    // Same state is a no-op
    let r: Result<(), Error<()>> = sm.transition(DeviceState::DmpStarted);
    assert!(r.is_ok());

    // Two steps back is rejected, one step back is fine
    let r: Result<(), Error<()>> = sm.transition(DeviceState::SerialOpened);
    assert_eq!(r, Err(Error::ImproperState));
    let r: Result<(), Error<()>> = sm.transition(DeviceState::DmpOpened);
    assert!(r.is_ok());

    // Closing is always allowed
    let r: Result<(), Error<()>> = sm.transition(DeviceState::SerialClosed);
    assert!(r.is_ok());
    assert_eq!(sm.state(), DeviceState::SerialClosed);
}

#[test]
fn test_serial_start_opens_transport() {
    let (mut mpl, platform) = create_mock_processor(DeviceConfig::default());

    mpl.serial_start("/dev/i2c-1").unwrap();
    assert_eq!(mpl.state(), DeviceState::SerialOpened);
    assert_eq!(
        platform.operations(),
        vec![Operation::Open("/dev/i2c-1".to_string())]
    );

    // Already open: nothing happens
    mpl.serial_start("/dev/i2c-2").unwrap();
    assert_eq!(platform.operations().len(), 1);
}

#[test]
fn test_serial_start_failure_falls_back_to_closed() {
    let (mut mpl, platform) = create_mock_processor(DeviceConfig::default());
    platform.fail_next_open();

    let result = mpl.serial_start("mock");
    assert_eq!(result, Err(Error::Bus(MockError::Transport)));
    assert_eq!(mpl.state(), DeviceState::SerialClosed);

    // Retrying works once the transport recovers
    mpl.serial_start("mock").unwrap();
    assert_eq!(mpl.state(), DeviceState::SerialOpened);
}

#[test]
fn test_dmp_open_requires_serial() {
    let (mut mpl, _platform) = create_mock_processor(DeviceConfig::default());
    assert_eq!(mpl.dmp_open(), Err(Error::ImproperState));
    assert_eq!(mpl.state(), DeviceState::SerialClosed);
}

#[test]
fn test_dmp_open_resets_context() {
    let (mut mpl, platform) = create_mock_processor(DeviceConfig::default());
    mpl.serial_start("mock").unwrap();
    mpl.context_mut().gyro_sens = 1234;
    platform.set_tick(42);

    mpl.dmp_open().unwrap();
    assert_eq!(mpl.state(), DeviceState::DmpOpened);
    assert_eq!(mpl.context().gyro_sens, 0);
    assert_eq!(mpl.context().motion_duration, 1536);
    assert_eq!(mpl.context().no_motion_accel_time, 42);

    // Opening twice is an error
    assert_eq!(mpl.dmp_open(), Err(Error::ImproperState));
}

#[test]
fn test_start_stop_close_cycle() {
    let (mut mpl, platform) = opened_processor(nine_axis_config());
    mpl.set_active_sensors(SensorMask::SIX_AXIS).unwrap();
    platform.clear_operations();

    mpl.dmp_start().unwrap();
    assert_eq!(mpl.state(), DeviceState::DmpStarted);
    assert_eq!(
        platform.operations().first(),
        Some(&Operation::StartSensors(SensorMask::SIX_AXIS))
    );

    mpl.dmp_stop().unwrap();
    assert_eq!(mpl.state(), DeviceState::DmpOpened);
    assert_eq!(
        platform.operations().last(),
        Some(&Operation::StopSensors(SensorMask::all()))
    );

    mpl.dmp_close().unwrap();
    assert_eq!(mpl.state(), DeviceState::SerialOpened);
}

#[test]
fn test_dmp_close_stops_running_device() {
    let (mut mpl, platform) = started_processor(DeviceConfig::default(), SensorMask::THREE_AXIS_GYRO);

    mpl.dmp_close().unwrap();
    assert_eq!(mpl.state(), DeviceState::SerialOpened);
    assert_eq!(
        platform.operations(),
        vec![Operation::StopSensors(SensorMask::all())]
    );
}

#[test]
fn test_lifecycle_operations_reject_wrong_state() {
    let (mut mpl, platform) = create_mock_processor(DeviceConfig::default());
    assert_eq!(mpl.dmp_start(), Err(Error::ImproperState));
    assert_eq!(mpl.dmp_stop(), Err(Error::ImproperState));
    assert_eq!(mpl.dmp_close(), Err(Error::ImproperState));

    mpl.serial_start("mock").unwrap();
    assert_eq!(mpl.dmp_start(), Err(Error::ImproperState));
    assert_eq!(mpl.dmp_close(), Err(Error::ImproperState));

    mpl.dmp_open().unwrap();
    assert_eq!(mpl.dmp_stop(), Err(Error::ImproperState));

    // Only the open call reached the platform
    assert_eq!(platform.operations().len(), 1);
}

#[test]
fn test_serial_stop_from_any_state() {
    let (mut mpl, platform) = started_processor(DeviceConfig::default(), SensorMask::THREE_AXIS_GYRO);

    mpl.serial_stop().unwrap();
    assert_eq!(mpl.state(), DeviceState::SerialClosed);
    assert_eq!(platform.operations(), vec![Operation::Close]);

    // Already closed: the transport is not touched again
    mpl.serial_stop().unwrap();
    assert_eq!(platform.operations().len(), 1);
}

#[test]
fn test_serial_stop_reports_close_failure() {
    let (mut mpl, platform) = opened_processor(DeviceConfig::default());
    platform.fail_next_close();

    assert_eq!(mpl.serial_stop(), Err(Error::Bus(MockError::Transport)));
    assert_eq!(mpl.state(), DeviceState::SerialClosed);
}

#[test]
fn test_dmp_start_failure_keeps_opened_state() {
    let (mut mpl, platform) = opened_processor(DeviceConfig::default());
    platform.fail_next_start();

    assert_eq!(mpl.dmp_start(), Err(Error::Bus(MockError::Communication)));
    assert_eq!(mpl.state(), DeviceState::DmpOpened);
}
