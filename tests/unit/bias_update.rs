//! Unit tests for bias-update strategy selection

use crate::common::{
    MockError, create_mock_processor, nine_axis_config, opened_processor, started_processor,
};
use motion_dmp::dmp::opcodes::{DINA2D, DINA35, DINA3D, DINA55, DINA7D, DINA80};
use motion_dmp::{BiasMode, DeviceConfig, DmpKey, Error, SensorMask};

#[test]
fn test_requires_dmp_opened() {
    let (mut mpl, platform) = create_mock_processor(nine_axis_config());
    mpl.serial_start("mock").unwrap();
    assert_eq!(
        mpl.set_bias_update(BiasMode::NO_MOTION),
        Err(Error::ImproperState)
    );

    let (mut running, running_platform) =
        started_processor(nine_axis_config(), SensorMask::SIX_AXIS);
    assert_eq!(
        running.set_bias_update(BiasMode::NO_MOTION),
        Err(Error::ImproperState)
    );

    assert!(platform.memory_writes().is_empty());
    assert!(running_platform.memory_writes().is_empty());
    assert!(running.context().bias_mode.is_empty());
}

#[test]
fn test_standard_tracker_with_compass() {
    let (mut mpl, platform) = opened_processor(nine_axis_config());

    mpl.set_bias_update(BiasMode::NO_MOTION | BiasMode::GRAVITY | BiasMode::LPF | BiasMode::MAG)
        .unwrap();

    // LPF is dropped once a compass is fitted
    assert_eq!(
        mpl.context().bias_mode,
        BiasMode::NO_MOTION | BiasMode::GRAVITY | BiasMode::MAG
    );
    assert_eq!(
        platform.memory_writes(),
        vec![
            (DmpKey::Fcfg5, vec![DINA80 + 7, DINA2D, DINA35, DINA3D]),
            (DmpKey::D_0_163, vec![0]),
        ]
    );
}

#[test]
fn test_lpf_tracker_without_compass() {
    let (mut mpl, platform) = opened_processor(DeviceConfig::default());

    mpl.set_bias_update(BiasMode::LPF | BiasMode::MAG_FROM_GYRO)
        .unwrap();

    assert_eq!(mpl.context().bias_mode, BiasMode::LPF);
    assert_eq!(
        platform.memory_writes(),
        vec![
            (DmpKey::Fcfg5, vec![DINA80 + 2, DINA2D, DINA55, DINA7D]),
            (DmpKey::D_0_163, vec![0x02]),
        ]
    );
}

#[test]
fn test_progressive_tracker_never_enabled() {
    let (mut mpl, _platform) = opened_processor(nine_axis_config());

    mpl.set_bias_update(BiasMode::NO_MOTION | BiasMode::PROGRESSIVE_NO_MOTION)
        .unwrap();
    assert_eq!(mpl.context().bias_mode, BiasMode::NO_MOTION);
}

#[test]
fn test_fast_tracker_only_kept() {
    let (mut mpl, _platform) = opened_processor(nine_axis_config());

    // Cannot be switched on from here
    mpl.set_bias_update(BiasMode::FAST_NO_MOTION | BiasMode::GRAVITY)
        .unwrap();
    assert_eq!(mpl.context().bias_mode, BiasMode::GRAVITY);

    // Already active: survives a mode change
    mpl.context_mut().bias_mode = BiasMode::FAST_NO_MOTION;
    mpl.set_bias_update(BiasMode::TEMPERATURE).unwrap();
    assert_eq!(
        mpl.context().bias_mode,
        BiasMode::FAST_NO_MOTION | BiasMode::TEMPERATURE
    );
}

#[test]
fn test_factory_temperature_compensation() {
    let config = DeviceConfig {
        offset_tc: [0, -3, 0],
        ..nine_axis_config()
    };
    let (mut mpl, _platform) = opened_processor(config);

    mpl.set_bias_update(BiasMode::TEMPERATURE | BiasMode::LEARN_FROM_TEMPERATURE)
        .unwrap();
    assert!(mpl.context().factory_temp_comp);
    assert_eq!(mpl.context().bias_mode, BiasMode::TEMPERATURE);
}

#[test]
fn test_slope_learning_kept_without_factory_data() {
    let (mut mpl, _platform) = opened_processor(nine_axis_config());

    mpl.set_bias_update(BiasMode::TEMPERATURE | BiasMode::LEARN_FROM_TEMPERATURE)
        .unwrap();
    assert!(!mpl.context().factory_temp_comp);
    assert!(
        mpl.context()
            .bias_mode
            .contains(BiasMode::LEARN_FROM_TEMPERATURE)
    );
}

#[test]
fn test_write_failure_keeps_stored_mode() {
    let (mut mpl, platform) = opened_processor(DeviceConfig::default());
    platform.fail_write_to(DmpKey::D_0_163);

    assert_eq!(
        mpl.set_bias_update(BiasMode::LPF),
        Err(Error::Bus(MockError::Communication))
    );
    assert_eq!(mpl.context().bias_mode, BiasMode::LPF);
    assert_eq!(platform.written_keys(), vec![DmpKey::Fcfg5]);
}

#[test]
fn test_dead_zone_control_overrides_lpf() {
    let (mut mpl, platform) = opened_processor(DeviceConfig::default());
    mpl.context_mut().dead_zone = true;

    mpl.set_bias_update(BiasMode::LPF).unwrap();
    assert_eq!(platform.last_write(DmpKey::D_0_163), Some(vec![0x08]));

    mpl.set_bias_update(BiasMode::GRAVITY).unwrap();
    assert_eq!(platform.last_write(DmpKey::D_0_163), Some(vec![0x08]));

    mpl.context_mut().dead_zone = false;
    mpl.set_bias_update(BiasMode::GRAVITY).unwrap();
    assert_eq!(platform.last_write(DmpKey::D_0_163), Some(vec![0]));
}

#[test]
fn test_adding_compass_drops_lpf() {
    let (mut mpl, _platform) = opened_processor(DeviceConfig::default());
    mpl.set_bias_update(BiasMode::LPF | BiasMode::GRAVITY).unwrap();
    assert_eq!(mpl.context().bias_mode, BiasMode::LPF | BiasMode::GRAVITY);

    mpl.set_config(nine_axis_config());
    assert!(mpl.config().compass_present());
    assert_eq!(mpl.context().bias_mode, BiasMode::GRAVITY);
}

#[test]
fn test_removing_compass_drops_mag() {
    let (mut mpl, platform) = opened_processor(nine_axis_config());
    mpl.set_bias_update(BiasMode::NO_MOTION | BiasMode::MAG).unwrap();
    assert_eq!(mpl.context().bias_mode, BiasMode::NO_MOTION | BiasMode::MAG);
    platform.clear_operations();

    mpl.set_config(DeviceConfig::default());
    assert_eq!(mpl.context().bias_mode, BiasMode::NO_MOTION);
    // Host side only
    assert!(platform.memory_writes().is_empty());
}
