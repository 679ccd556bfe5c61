//! Calibration encoder
//!
//! Converts sensor mounting matrices and full-scale ranges into the Q30
//! matrices kept in [`MotionContext`] and into the instruction patches and
//! scale-factor words the DMP firmware expects.
//!
//! The pure helpers (`orientation_to_scalar`, `gyro_axis_tables`, ...) are
//! exposed so the encoding can be inspected without a device. The `write_*`
//! functions update the context and push the result to DMP memory; the
//! caller is responsible for checking the device state first.
//!
//! # Axis encodings
//!
//! The gyroscope path routes each body axis to the sensor axis with the
//! strictly largest magnitude in its row, scanning left to right, so a row
//! of zeros falls back to axis 0.
//!
//! The accelerometer path packs a 3-bit code per row into a scalar
//! (row 0 in bits 0..3, row 1 in bits 3..6, row 2 in bits 6..9). The low two
//! bits of a code select the first nonzero column and bit 2 marks it
//! negative. A row of zeros encodes as column 2, positive.

use core::array;

use crate::Error;
use crate::config::{Endian, SlaveBus, SlaveDescriptor};
use crate::context::{MotionContext, Q30_ONE};
use crate::dmp::opcodes::{
    DINA26, DINA2C, DINA36, DINA46, DINA4C, DINA56, DINA66, DINA6C, DINA76, DINAC9, DINACB,
    DINACD,
};
use crate::dmp::{DmpKey, Orientation};
use crate::interface::DmpMemory;

/// Identity mounting matrix
pub const IDENTITY: Orientation = [1, 0, 0, 0, 1, 0, 0, 0, 1];

/// 2^30 as a float, for Q30 conversions
const Q30: f32 = 1_073_741_824.0;

/// Full-scale counts of a 16-bit sensor
const FULL_SCALE_COUNTS: f32 = 32768.0;

/// Nominal gyroscope sensitivity in LSB per dps at the 250 dps range
const NOMINAL_SENS_TRIM: f32 = 32768.0 / 250.0;

/// `0.5 · (π / 180) / 200 · 16384` in Q30
const GYRO_SF_Q30: i64 = 767_603_923;

/// Numerator of the reciprocal gyroscope scale factor
const GYRO_SF_RECIPROCAL: i64 = 23_832_619_764_371;

/// Gyroscope axis routing opcodes, indexed by sensor axis
const GYRO_ROUTE: [u8; 3] = [DINAC9, DINA2C, DINACB];

/// Gyroscope sign opcodes, indexed by body axis
const GYRO_SIGN: [u8; 3] = [DINA36, DINA56, DINA76];

/// Accelerometer axis routing opcodes, indexed by sensor axis
const ACCEL_ROUTE: [u8; 3] = [DINA4C, DINACD, DINA6C];

/// Accelerometer sign opcodes, indexed by body axis
const ACCEL_SIGN: [u8; 3] = [DINA26, DINA46, DINA66];

/// Reject matrices with entries outside `{-1, 0, 1}`
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for any other entry.
pub fn validate_orientation<E>(orientation: &Orientation) -> Result<(), Error<E>> {
    if orientation.iter().all(|v| (-1..=1).contains(v)) {
        Ok(())
    } else {
        Err(Error::InvalidParameter)
    }
}

fn row(orientation: &Orientation, r: usize) -> [i8; 3] {
    [
        orientation[3 * r],
        orientation[3 * r + 1],
        orientation[3 * r + 2],
    ]
}

/// 3-bit accelerometer code for one matrix row
#[must_use]
pub fn row_code(row: [i8; 3]) -> u16 {
    match row.iter().position(|&v| v != 0) {
        Some(axis) => {
            let sign = if row[axis] < 0 { 0b100 } else { 0 };
            #[allow(clippy::cast_possible_truncation)]
            let axis = axis as u16;
            axis | sign
        }
        None => 2,
    }
}

/// Pack the three row codes of a mounting matrix into one scalar
///
/// The identity matrix packs to `0b010_001_000` (136).
#[must_use]
pub fn orientation_to_scalar(orientation: &Orientation) -> u16 {
    row_code(row(orientation, 0))
        | row_code(row(orientation, 1)) << 3
        | row_code(row(orientation, 2)) << 6
}

/// Dominant sensor axis of a row and whether it is negated
///
/// Only a strictly larger magnitude moves the pick, so an all-zero row
/// routes to axis 0, unsigned. [`row_code`] encodes the same row as
/// column 2.
#[must_use]
pub fn dominant_axis(row: [i8; 3]) -> (usize, bool) {
    let mut axis = 0;
    for candidate in 1..3 {
        if row[candidate].unsigned_abs() > row[axis].unsigned_abs() {
            axis = candidate;
        }
    }
    (axis, row[axis] < 0)
}

/// `FCFG_1` routing and `FCFG_3` sign patches for a gyroscope mounting
#[must_use]
pub fn gyro_axis_tables(orientation: &Orientation) -> ([u8; 3], [u8; 3]) {
    let mut route = [0; 3];
    let mut sign = GYRO_SIGN;
    for r in 0..3 {
        let (axis, negative) = dominant_axis(row(orientation, r));
        route[r] = GYRO_ROUTE[axis];
        if negative {
            sign[r] |= 0x01;
        }
    }
    (route, sign)
}

/// `FCFG_2` routing and `FCFG_7` sign patches for an orientation scalar
#[must_use]
pub fn accel_axis_tables(scalar: u16) -> ([u8; 3], [u8; 3]) {
    let mut route = [0; 3];
    let mut sign = ACCEL_SIGN;
    for r in 0..3 {
        let code = (scalar >> (3 * r)) & 0b111;
        // Code 3 never comes out of `row_code`
        route[r] = ACCEL_ROUTE[usize::from(code & 0b11).min(2)];
        if code & 0b100 != 0 {
            sign[r] |= 0x01;
        }
    }
    (route, sign)
}

/// Scale a mounting matrix into Q30, truncating toward zero
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn q30_matrix(scale: f32, orientation: &Orientation) -> [i32; 9] {
    array::from_fn(|i| (scale * f32::from(orientation[i]) * Q30) as i32)
}

/// DMP gyroscope scale factor and its reciprocal for a given sensitivity
///
/// Returns `(gyro_sf, sf)`; `sf` is 0 when `gyro_sens` is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn gyro_scale_factors(gyro_sens: i32) -> (i32, i32) {
    let gyro_sf = (i64::from(gyro_sens) * GYRO_SF_Q30 / (1 << 30)) as i32;
    let sf = if gyro_sens == 0 {
        0
    } else {
        (GYRO_SF_RECIPROCAL / i64::from(gyro_sens)) as i32
    };
    (gyro_sf, sf)
}

/// DMP accelerometer scale factor (`2^30 / accel_sens`, 0 when unset)
#[must_use]
pub fn accel_scale_factor(accel_sens: i32) -> i32 {
    if accel_sens == 0 {
        0
    } else {
        Q30_ONE / accel_sens
    }
}

/// Compass matrix cell patch for one orientation entry
#[must_use]
pub const fn compass_cell_pattern(entry: i8) -> [u8; 4] {
    match entry {
        1 => [64, 0, 0, 0],
        -1 => [64 + 128, 0, 0, 0],
        _ => [0; 4],
    }
}

/// `D_1_236` byte-order word
#[must_use]
pub const fn endian_pattern(endian: Endian) -> [u8; 4] {
    match endian {
        Endian::Little => [0, 64, 0, 0],
        Endian::Big => [0, 0, 64, 0],
    }
}

/// Encode and write the gyroscope calibration
///
/// A nonzero `sens_trim` rescales `range_dps` from the nominal 250 dps
/// sensitivity to the trimmed one before anything else is derived.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] for a malformed orientation (nothing written)
/// - [`Error::Bus`] on the first failing write
#[allow(clippy::cast_possible_truncation)]
pub fn write_gyro_calibration<M: DmpMemory>(
    memory: &mut M,
    ctx: &mut MotionContext,
    range_dps: f32,
    sens_trim: u16,
    orientation: &Orientation,
) -> Result<(), Error<M::Error>> {
    validate_orientation(orientation)?;

    let mut range = range_dps;
    if sens_trim != 0 {
        range *= NOMINAL_SENS_TRIM / f32::from(sens_trim);
    }
    let scale = range / FULL_SCALE_COUNTS;

    ctx.gyro_sens = (range * FULL_SCALE_COUNTS) as i32;
    ctx.gyro_cal = q30_matrix(scale, orientation);
    ctx.gyro_orient = array::from_fn(|i| i32::from(orientation[i]) * Q30_ONE);

    let (route, sign) = gyro_axis_tables(orientation);
    memory.write_memory(DmpKey::Fcfg1, &route)?;
    memory.write_memory(DmpKey::Fcfg3, &sign)?;

    let (gyro_sf, sf) = gyro_scale_factors(ctx.gyro_sens);
    ctx.gyro_sf = gyro_sf;
    memory.write_memory(DmpKey::D_0_104, &gyro_sf.to_be_bytes())?;
    memory.write_memory(DmpKey::D_0_24, &sf.to_be_bytes())?;

    #[cfg(feature = "defmt")]
    defmt::debug!(
        "Gyro calibration: sens={=i32}, sf={=i32}",
        ctx.gyro_sens,
        ctx.gyro_sf
    );

    Ok(())
}

/// Encode and write the accelerometer calibration
///
/// `ctx.accel_sens` must already hold the sensitivity derived from the
/// range; it is only forced to 0 here when `range_g` is 0. The axis patches
/// are written only when `accel_present` is set.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] for a malformed orientation (nothing written)
/// - [`Error::Bus`] on the first failing write
#[allow(clippy::float_cmp)]
pub fn write_accel_calibration<M: DmpMemory>(
    memory: &mut M,
    ctx: &mut MotionContext,
    range_g: f32,
    orientation: &Orientation,
    accel_present: bool,
) -> Result<(), Error<M::Error>> {
    validate_orientation(orientation)?;

    let scale = range_g / FULL_SCALE_COUNTS;

    if memory.key_supported(DmpKey::D_1_152) {
        memory.write_memory(DmpKey::D_1_152, &[0; 4])?;
    }

    if scale == 0.0 {
        ctx.accel_sens = 0;
    }

    if accel_present {
        ctx.accel_cal = q30_matrix(scale, orientation);

        let scalar = orientation_to_scalar(orientation);
        let (route, sign) = accel_axis_tables(scalar);
        memory.write_memory(DmpKey::Fcfg2, &route)?;
        memory.write_memory(DmpKey::Fcfg7, &sign)?;
    }

    // Only the low half-word fits the firmware slot
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let sf = accel_scale_factor(ctx.accel_sens) as u16;
    memory.write_memory(DmpKey::D_0_108, &sf.to_be_bytes())?;

    Ok(())
}

/// Encode and write the compass calibration
///
/// The mounting matrix cells are only written when the firmware exposes
/// them (`CPASS_MTX_00` supported).
///
/// # Errors
///
/// - [`Error::InvalidParameter`] for a malformed orientation (nothing written)
/// - [`Error::Bus`] on the first failing cell write
#[allow(clippy::cast_possible_truncation)]
pub fn write_compass_calibration<M: DmpMemory>(
    memory: &mut M,
    ctx: &mut MotionContext,
    range: f32,
    orientation: &Orientation,
) -> Result<(), Error<M::Error>> {
    validate_orientation(orientation)?;

    let scale = range / FULL_SCALE_COUNTS;
    ctx.compass_cal = q30_matrix(scale, orientation);
    ctx.compass_sens = (scale * Q30) as i32;

    if memory.key_supported(DmpKey::CpassMtx00) {
        for (&key, &entry) in DmpKey::COMPASS_MATRIX.iter().zip(orientation) {
            memory.write_memory(key, &compass_cell_pattern(entry))?;
        }
    }

    Ok(())
}

/// Write the accelerometer byte order
///
/// Slaves on the primary bus are always read big endian; only a secondary
/// bus slave keeps its own byte order.
///
/// # Errors
///
/// Returns [`Error::Bus`] if the write fails.
pub fn write_accel_endian<M: DmpMemory>(
    memory: &mut M,
    accel: &SlaveDescriptor,
) -> Result<(), Error<M::Error>> {
    let endian = match accel.bus {
        SlaveBus::Secondary => accel.endian,
        SlaveBus::Primary => Endian::Big,
    };
    memory.write_memory(DmpKey::D_1_236, &endian_pattern(endian))?;
    Ok(())
}
