//! DMP instruction bytes patched into firmware by the motion library
//!
//! Each `DINAxx` constant is the raw instruction byte `0xxx`. The calibration
//! encoder selects among them to route and sign sensor axes inside the
//! firmware; a few carry an operand in their low bits (e.g. `DINAD8 + 2`).

#![allow(missing_docs)]

pub const DINA0C: u8 = 0x0C;
pub const DINA26: u8 = 0x26;
pub const DINA2C: u8 = 0x2C;
pub const DINA2D: u8 = 0x2D;
pub const DINA35: u8 = 0x35;
pub const DINA36: u8 = 0x36;
pub const DINA3D: u8 = 0x3D;
pub const DINA46: u8 = 0x46;
pub const DINA4C: u8 = 0x4C;
pub const DINA55: u8 = 0x55;
pub const DINA56: u8 = 0x56;
pub const DINA66: u8 = 0x66;
pub const DINA6C: u8 = 0x6C;
pub const DINA76: u8 = 0x76;
pub const DINA7D: u8 = 0x7D;
pub const DINA80: u8 = 0x80;
pub const DINAC9: u8 = 0xC9;
pub const DINACB: u8 = 0xCB;
pub const DINACD: u8 = 0xCD;
pub const DINAD8: u8 = 0xD8;
pub const DINAFE: u8 = 0xFE;
