//! Digital Motion Processor (DMP) memory model
//!
//! The motion library never talks to DMP memory by address. Instead it writes
//! small blobs under symbolic [`DmpKey`]s: instruction patches built from the
//! [`opcodes`] table and big-endian fixed-point words produced by the
//! [`calibration`] encoder.
//!
//! ## Orientation matrices
//!
//! Every sensor carries a 3×3 mounting matrix, row-major, with entries in
//! `{-1, 0, 1}`. Row `r` says which sensor axis (and sign) feeds body axis
//! `r`:
//!
//! ```text
//! [ 1, 0, 0,        identity
//!   0, 1, 0,
//!   0, 0, 1 ]
//!
//! [ 0, 1, 0,        X and Y swapped
//!   1, 0, 0,
//!   0, 0, 1 ]
//! ```

pub mod calibration;
pub mod keys;
pub mod opcodes;

pub use keys::DmpKey;

/// 3×3 row-major sensor mounting matrix with entries in `{-1, 0, 1}`
pub type Orientation = [i8; 9];
