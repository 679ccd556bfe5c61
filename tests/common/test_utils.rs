//! Test utilities and helper functions

use crate::common::mock_interface::MockPlatform;
use motion_dmp::{
    DeviceConfig, Endian, MotionProcessor, SensorMask, SlaveBus, SlaveDescriptor, SlaveRange,
};

/// Accelerometer slave: +/- 2 g, identity mounting
pub fn default_accel() -> SlaveDescriptor {
    SlaveDescriptor::new(SlaveRange::new(2, 0))
}

/// Compass slave: 9830.4 units full scale, identity mounting
pub fn default_compass() -> SlaveDescriptor {
    SlaveDescriptor::new(SlaveRange::new(9830, 4000))
}

/// Pressure slave on the auxiliary bus
pub fn default_pressure() -> SlaveDescriptor {
    SlaveDescriptor::new(SlaveRange::new(1100, 0)).with_bus(SlaveBus::Secondary, Endian::Big)
}

/// Board with gyro, accelerometer and compass, 2000 dps
pub fn nine_axis_config() -> DeviceConfig {
    DeviceConfig::default()
        .with_accel(default_accel())
        .with_compass(default_compass())
}

/// Create a mock processor in the `SerialClosed` state
/// Returns (processor, platform) where platform is a clone that shares state with the processor
pub fn create_mock_processor(config: DeviceConfig) -> (MotionProcessor<MockPlatform>, MockPlatform) {
    let platform = MockPlatform::new();
    let platform_clone = platform.clone();
    (MotionProcessor::new(platform, config), platform_clone)
}

/// Create a mock processor in the `DmpOpened` state with a clean operations log
pub fn opened_processor(config: DeviceConfig) -> (MotionProcessor<MockPlatform>, MockPlatform) {
    let (mut mpl, platform) = create_mock_processor(config);
    mpl.serial_start("mock").unwrap();
    mpl.dmp_open().unwrap();
    platform.clear_operations();
    (mpl, platform)
}

/// Create a mock processor in the `DmpStarted` state with `sensors` requested
/// and a clean operations log
pub fn started_processor(
    config: DeviceConfig,
    sensors: SensorMask,
) -> (MotionProcessor<MockPlatform>, MockPlatform) {
    let (mut mpl, platform) = opened_processor(config);
    mpl.set_active_sensors(sensors).unwrap();
    mpl.dmp_start().unwrap();
    platform.clear_operations();
    (mpl, platform)
}
